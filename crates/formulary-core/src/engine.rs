use crate::classify::{assemble_lines, LineClassifier, LineRole};
use crate::extraction::PageTokens;
use crate::hierarchy::HierarchyBuilder;
use crate::model::ExtractionResult;
use crate::toc::TocIndexer;
use crate::warnings::WarningCollector;
use crate::ExtractOptions;
use tracing::debug;

/// Drives one document's pages through classification and assembly,
/// strictly in physical order.
///
/// All mode state (front-matter scan, classifier grid, builder hierarchy)
/// lives in this instance; concurrent documents cannot cross-contaminate.
pub struct ExtractionCoordinator {
    classifier: LineClassifier,
    builder: HierarchyBuilder,
    toc: TocIndexer,
    warnings: WarningCollector,
    /// TOC lines are only candidates during the front-matter scan; the
    /// scan ends permanently at the first category header.
    toc_scan: bool,
    front_matter_page_limit: usize,
}

impl ExtractionCoordinator {
    pub fn new(options: &ExtractOptions) -> Self {
        ExtractionCoordinator {
            classifier: LineClassifier::new(options.column_tolerance, options.lenient_rows),
            builder: HierarchyBuilder::new(),
            toc: TocIndexer::new(),
            warnings: WarningCollector::new(),
            toc_scan: true,
            front_matter_page_limit: options.front_matter_page_limit,
        }
    }

    /// Consume every page in order and assemble the final result.
    pub fn run(mut self, pages: &[PageTokens]) -> ExtractionResult {
        for page in pages {
            self.process_page(page);
        }

        debug!(
            candidates = self.builder.data_row_candidates(),
            placed = self.builder.rows_placed(),
            warnings = self.warnings.len(),
            toc_entries = self.toc.len(),
            "extraction complete"
        );

        ExtractionResult {
            categories: self.builder.finish(),
            warnings: self.warnings.into_vec(),
            table_of_contents: self.toc.into_entries(),
        }
    }

    fn process_page(&mut self, page: &PageTokens) {
        if self.toc_scan && page.page_number > self.front_matter_page_limit {
            debug!(page = page.page_number, "front-matter window exhausted");
            self.toc_scan = false;
        }

        let lines = assemble_lines(page);
        let classified =
            self.classifier
                .classify_page(&lines, page.height, self.toc_scan, &mut self.warnings);

        for line in &classified {
            match line.role {
                LineRole::CategoryHeader => {
                    if self.toc_scan {
                        debug!(page = page.page_number, "first category header; toc scan ends");
                        self.toc_scan = false;
                    }
                    self.builder.open_category(line);
                }
                LineRole::SubcategoryHeader => {
                    self.builder.open_sub_category(line, &mut self.warnings);
                }
                LineRole::DataRow => {
                    self.builder.push_row(line, &mut self.warnings);
                }
                LineRole::TocEntry => {
                    self.toc.record(line);
                }
                LineRole::Noise => {}
            }
        }
    }
}
