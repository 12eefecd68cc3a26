use crate::classify::ClassifiedLine;
use crate::model::{Category, SubCategory, WarningReason, UNCATEGORIZED};
use crate::warnings::WarningCollector;
use tracing::debug;

/// Where the builder stands in the category -> subcategory -> row
/// hierarchy. Advances only on headers, never on page breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BuilderState {
    NoOpenCategory,
    CategoryOpen,
    SubcategoryOpen,
}

/// Assembles classified lines into the category tree.
///
/// The open category/subcategory are held as indices into append-only
/// vectors rather than live references; state is trivially inspectable
/// mid-run. Closed nodes are never reopened: a later header with the same
/// name starts a fresh node.
pub struct HierarchyBuilder {
    categories: Vec<Category>,
    state: BuilderState,
    open_category: Option<usize>,
    open_sub_category: Option<usize>,
    data_row_candidates: usize,
    rows_placed: usize,
}

impl HierarchyBuilder {
    pub fn new() -> Self {
        HierarchyBuilder {
            categories: Vec::new(),
            state: BuilderState::NoOpenCategory,
            open_category: None,
            open_sub_category: None,
            data_row_candidates: 0,
            rows_placed: 0,
        }
    }

    /// Closes any open subcategory/category and opens a new category.
    pub fn open_category(&mut self, line: &ClassifiedLine) {
        debug!(page = line.page_number, name = %line.text, "opening category");
        self.categories.push(Category {
            name: line.text.clone(),
            sub_categories: Vec::new(),
        });
        self.open_category = Some(self.categories.len() - 1);
        self.open_sub_category = None;
        self.state = BuilderState::CategoryOpen;
    }

    /// Closes any open subcategory and opens a new one under the current
    /// category. With no category context, records a warning and opens a
    /// synthetic category so the subcategory is not lost.
    pub fn open_sub_category(&mut self, line: &ClassifiedLine, warnings: &mut WarningCollector) {
        if self.state == BuilderState::NoOpenCategory {
            warnings.record(
                line.page_number,
                &line.text,
                WarningReason::SubcategoryWithoutCategory,
                line.context.clone(),
            );
            self.categories.push(Category {
                name: UNCATEGORIZED.to_string(),
                sub_categories: Vec::new(),
            });
            self.open_category = Some(self.categories.len() - 1);
        }

        let cat_idx = self.open_category.expect("category open after transition");
        debug!(page = line.page_number, name = %line.text, "opening subcategory");
        let subs = &mut self.categories[cat_idx].sub_categories;
        subs.push(SubCategory {
            name: line.text.clone(),
            rows: Vec::new(),
        });
        self.open_sub_category = Some(subs.len() - 1);
        self.state = BuilderState::SubcategoryOpen;
    }

    /// Appends a reconciled row to the open subcategory, or records why
    /// it could not be placed. Every call lands the line somewhere; no
    /// data-shaped line is dropped silently.
    pub fn push_row(&mut self, line: &ClassifiedLine, warnings: &mut WarningCollector) {
        self.data_row_candidates += 1;

        if self.state != BuilderState::SubcategoryOpen {
            warnings.record(
                line.page_number,
                &line.text,
                WarningReason::RowBeforeSubcategory,
                line.context.clone(),
            );
            return;
        }

        match &line.cells {
            Some(cells) => {
                let cat_idx = self.open_category.expect("category open in SubcategoryOpen");
                let sub_idx = self
                    .open_sub_category
                    .expect("subcategory open in SubcategoryOpen");
                self.categories[cat_idx].sub_categories[sub_idx]
                    .rows
                    .push(cells.clone());
                self.rows_placed += 1;
            }
            None => {
                warnings.record(
                    line.page_number,
                    &line.text,
                    WarningReason::MalformedRow,
                    line.context.clone(),
                );
            }
        }
    }

    /// Lines classified as data-row candidates so far.
    pub fn data_row_candidates(&self) -> usize {
        self.data_row_candidates
    }

    /// Rows actually placed in the tree so far.
    pub fn rows_placed(&self) -> usize {
        self.rows_placed
    }

    /// Implicitly closes any open nodes and returns the finished tree.
    pub fn finish(self) -> Vec<Category> {
        self.categories
    }
}

impl Default for HierarchyBuilder {
    fn default() -> Self {
        Self::new()
    }
}
