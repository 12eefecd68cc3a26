use crate::classify::grid::ColumnGrid;
use crate::classify::line::TextLine;
use crate::model::{Row, WarningReason};
use crate::warnings::WarningCollector;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::{debug, trace};

/// Height ratio over the running body median above which a line has
/// category-grade type.
const CATEGORY_SCALE: f32 = 1.18;

/// Height ratio over the body median above which a line is visually
/// distinct enough to be a subcategory header.
const SUBCATEGORY_SCALE: f32 = 1.05;

/// Headers are short: at most this many fragments / words.
const MAX_HEADER_FRAGMENTS: usize = 2;
const MAX_HEADER_WORDS: usize = 8;

/// Indent step separating a category header from deeper content.
const INDENT_STEP: f32 = 4.0;

/// Fraction of the page height treated as the top/bottom decoration band.
const DECORATION_BAND: f32 = 0.08;

/// A repeated band line is a running header/footer when it reappears on a
/// later page within this vertical distance.
const REPEAT_Y_TOLERANCE: f32 = 4.0;

static PAGE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:-?\s*\d{1,4}\s*-?|[ivxlcdm]{1,7}|page\s+\d{1,4}(?:\s+of\s+\d{1,4})?|\d{1,4}\s+of\s+\d{1,4})$")
        .unwrap()
});

static TOC_DOTTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^.+?[\s.·]*\.{2,}[\s.·]*[0-9ivxlcdm]{1,7}$").unwrap());

static TOC_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:table\s+of\s+contents|contents|index|formulary\s+index)$").unwrap()
});

static PAGE_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:\d{1,4}|[ivxlcdm]{1,7})$").unwrap());

/// Closed set of roles a line can take. Downstream matches exhaustively,
/// so adding a role is a compile-visible change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRole {
    CategoryHeader,
    SubcategoryHeader,
    DataRow,
    TocEntry,
    Noise,
}

/// One classified line, with whatever its role needs downstream.
#[derive(Debug, Clone)]
pub struct ClassifiedLine {
    pub role: LineRole,
    pub page_number: u32,
    pub text: String,
    /// DataRow only: cells reconciled against the active column grid.
    /// `None` when reconciliation failed or no grid was open; the
    /// hierarchy builder turns that into a warning.
    pub cells: Option<Row>,
    /// Preceding non-blank line, carried as warning context.
    pub context: Option<String>,
}

/// Assigns roles to logical lines from layout and typography cues.
///
/// Carries state across pages: the running body-height median, the active
/// column grid, and the set of decoration lines seen so far. One
/// classifier instance serves exactly one document.
pub struct LineClassifier {
    column_tolerance: f32,
    lenient_rows: bool,
    grid: Option<ColumnGrid>,
    /// Set between a subcategory header and the first table line under it.
    awaiting_grid: bool,
    subcategory_open: bool,
    category_indent: Option<f32>,
    height_samples: Vec<f32>,
    /// Normalized text of band lines -> (page, y) of first sighting.
    seen_band_lines: HashMap<String, (u32, f32)>,
}

impl LineClassifier {
    pub fn new(column_tolerance: f32, lenient_rows: bool) -> Self {
        LineClassifier {
            column_tolerance,
            lenient_rows,
            grid: None,
            awaiting_grid: false,
            subcategory_open: false,
            category_indent: None,
            height_samples: Vec::new(),
            seen_band_lines: HashMap::new(),
        }
    }

    /// Classify one page's lines in reading order.
    pub fn classify_page(
        &mut self,
        lines: &[TextLine],
        page_height: f32,
        toc_mode: bool,
        warnings: &mut WarningCollector,
    ) -> Vec<ClassifiedLine> {
        self.height_samples
            .extend(lines.iter().filter(|l| !l.fragments.is_empty()).map(|l| l.height));
        let body_height = median(&self.height_samples);

        let mut classified = Vec::with_capacity(lines.len());
        let mut prev_text: Option<String> = None;
        // The first category header ends TOC candidacy mid-page; lines
        // below it on the same page already belong to the body.
        let mut toc = toc_mode;

        for line in lines {
            let cl = self.classify_line(line, body_height, page_height, toc, &prev_text, warnings);
            if cl.role == LineRole::CategoryHeader {
                toc = false;
            }
            trace!(page = line.page_number, role = ?cl.role, text = %cl.text, "classified line");
            if !cl.text.is_empty() {
                prev_text = Some(cl.text.clone());
            }
            classified.push(cl);
        }

        classified
    }

    fn classify_line(
        &mut self,
        line: &TextLine,
        body_height: f32,
        page_height: f32,
        toc_mode: bool,
        prev_text: &Option<String>,
        warnings: &mut WarningCollector,
    ) -> ClassifiedLine {
        let text = line.text();
        let make = |role, cells| ClassifiedLine {
            role,
            page_number: line.page_number,
            text: text.clone(),
            cells,
            context: prev_text.clone(),
        };

        if line.fragments.is_empty() || text.trim().is_empty() {
            return make(LineRole::Noise, None);
        }

        // Page decoration: page numbers and running headers/footers live
        // in the top/bottom bands and repeat across pages.
        if self.is_decoration(line, &text, page_height) {
            return make(LineRole::Noise, None);
        }

        if toc_mode {
            if TOC_TITLE.is_match(text.trim()) {
                return make(LineRole::Noise, None);
            }
            if self.is_toc_entry(line, &text) {
                return make(LineRole::TocEntry, None);
            }
        }

        let has_numeric = line.fragments.iter().any(|f| is_numeric_like(&f.text));
        let tall_cat = body_height > 0.0 && line.height >= body_height * CATEGORY_SCALE;
        let tall_sub = body_height > 0.0 && line.height >= body_height * SUBCATEGORY_SCALE;
        let caps = is_all_caps(&text);

        let header_shaped = line.fragments.len() <= MAX_HEADER_FRAGMENTS
            && text.split_whitespace().count() <= MAX_HEADER_WORDS
            && !has_numeric
            && text.chars().any(|c| c.is_alphabetic());

        if header_shaped && (tall_cat || tall_sub || caps) {
            // Caps-only evidence is too weak while scanning front matter;
            // cover pages are full of short all-caps lines.
            if tall_cat || tall_sub || !toc_mode {
                let deeper_than_category = self
                    .category_indent
                    .map(|ci| line.indent() > ci + INDENT_STEP)
                    .unwrap_or(false);

                if (tall_cat || caps) && !deeper_than_category {
                    debug!(page = line.page_number, name = %text, "category header");
                    self.category_indent = Some(line.indent());
                    self.subcategory_open = false;
                    self.grid = None;
                    self.awaiting_grid = false;
                    return make(LineRole::CategoryHeader, None);
                }

                debug!(page = line.page_number, name = %text, "subcategory header");
                self.subcategory_open = true;
                self.grid = None;
                self.awaiting_grid = true;
                return make(LineRole::SubcategoryHeader, None);
            }
        }

        // First all-text multi-fragment line under a fresh subcategory is
        // its printed column-header row; it defines the grid and is
        // consumed rather than emitted as a row.
        if self.awaiting_grid && line.fragments.len() >= 2 && !has_numeric {
            debug!(
                page = line.page_number,
                columns = line.fragments.len(),
                "adopting column grid from header row"
            );
            self.grid = Some(ColumnGrid::from_header(&line.fragments, self.column_tolerance));
            self.awaiting_grid = false;
            return make(LineRole::Noise, None);
        }

        // Data rows: alignment with the open grid, or numeric shape.
        if self.subcategory_open {
            if let Some(grid) = &self.grid {
                if grid.aligns_with(&line.fragments) || has_numeric {
                    let cells = if self.lenient_rows {
                        Some(grid.reconcile_lenient(&line.fragments))
                    } else {
                        grid.reconcile(&line.fragments)
                    };
                    return make(LineRole::DataRow, cells);
                }
            } else if has_numeric && !line.fragments.is_empty() {
                // No column-header row was printed; the first data row
                // fixes the column positions.
                let grid = ColumnGrid::synthesized(&line.fragments, self.column_tolerance);
                let cells = grid.reconcile(&line.fragments);
                self.grid = Some(grid);
                self.awaiting_grid = false;
                return make(LineRole::DataRow, cells);
            }
        } else if line.fragments.len() >= 2 && has_numeric && !tall_cat {
            // Data-shaped with no subcategory open: captured, not dropped,
            // so the builder can record it.
            return make(LineRole::DataRow, None);
        }

        // Header-grade type that fit no rule above.
        if tall_cat {
            warnings.record(
                line.page_number,
                &text,
                WarningReason::UnclassifiableHeader,
                prev_text.clone(),
            );
            return make(LineRole::Noise, None);
        }

        make(LineRole::Noise, None)
    }

    /// Page numbers anywhere in the bands; any band line whose text
    /// reappears on a later page at the same height.
    fn is_decoration(&mut self, line: &TextLine, text: &str, page_height: f32) -> bool {
        if page_height <= 0.0 {
            return false;
        }
        let center = line.vertical_center();
        let in_band = center < page_height * DECORATION_BAND
            || center > page_height * (1.0 - DECORATION_BAND);
        if !in_band {
            return false;
        }

        if PAGE_MARKER.is_match(text.trim()) {
            return true;
        }

        let key = text.split_whitespace().collect::<Vec<_>>().join(" ");
        match self.seen_band_lines.get(&key) {
            Some(&(first_page, first_y))
                if first_page != line.page_number
                    && (first_y - line.y).abs() <= REPEAT_Y_TOLERANCE =>
            {
                true
            }
            _ => {
                self.seen_band_lines
                    .entry(key)
                    .or_insert((line.page_number, line.y));
                false
            }
        }
    }

    /// A text label trailed by a page-number-like token, with or without
    /// a dotted leader.
    fn is_toc_entry(&self, line: &TextLine, text: &str) -> bool {
        if TOC_DOTTED.is_match(text.trim()) {
            return true;
        }
        if line.fragments.len() >= 2 {
            let last = line.fragments.last().unwrap();
            let label_has_alpha = line.fragments[..line.fragments.len() - 1]
                .iter()
                .any(|f| f.text.chars().any(|c| c.is_alphabetic()));
            return label_has_alpha && PAGE_REF.is_match(last.text.trim());
        }
        false
    }
}

/// A fragment reads as numeric when digits hold their own against
/// letters: "500 mg", "$12.40", "QL (30/30)" but not "30-day supply".
fn is_numeric_like(s: &str) -> bool {
    let digits = s.chars().filter(|c| c.is_ascii_digit()).count();
    let alpha = s.chars().filter(|c| c.is_alphabetic()).count();
    digits >= 1 && digits >= alpha
}

fn is_all_caps(s: &str) -> bool {
    let alpha: Vec<char> = s.chars().filter(|c| c.is_alphabetic()).collect();
    alpha.len() >= 4 && alpha.iter().all(|c| c.is_uppercase())
}

fn median(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted[sorted.len() / 2]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::line::LineFragment;

    fn frag(text: &str, x: f32) -> LineFragment {
        LineFragment {
            text: text.into(),
            x,
            width: text.len() as f32 * 5.0,
        }
    }

    fn line(page: u32, index: usize, y: f32, height: f32, frags: Vec<LineFragment>) -> TextLine {
        TextLine {
            page_number: page,
            line_index: index,
            y,
            height,
            fragments: frags,
        }
    }

    /// A body of plain 10pt lines so the median settles at 10.0.
    fn body_lines(page: u32) -> Vec<TextLine> {
        (0..6)
            .map(|i| {
                line(
                    page,
                    i,
                    300.0 + i as f32 * 14.0,
                    10.0,
                    vec![frag("filler body text", 72.0)],
                )
            })
            .collect()
    }

    fn classifier() -> LineClassifier {
        LineClassifier::new(12.0, false)
    }

    #[test]
    fn test_tall_line_is_category_header() {
        let mut c = classifier();
        let mut w = WarningCollector::new();
        let mut lines = body_lines(1);
        lines.push(line(1, 6, 120.0, 14.0, vec![frag("Antibiotics", 72.0)]));
        let out = c.classify_page(&lines, 792.0, false, &mut w);
        assert_eq!(out.last().unwrap().role, LineRole::CategoryHeader);
    }

    #[test]
    fn test_moderately_tall_indented_line_is_subcategory() {
        let mut c = classifier();
        let mut w = WarningCollector::new();
        let mut lines = body_lines(1);
        lines.push(line(1, 6, 120.0, 14.0, vec![frag("Antibiotics", 72.0)]));
        lines.push(line(1, 7, 140.0, 11.0, vec![frag("Penicillins", 90.0)]));
        let out = c.classify_page(&lines, 792.0, false, &mut w);
        assert_eq!(out[out.len() - 2].role, LineRole::CategoryHeader);
        assert_eq!(out.last().unwrap().role, LineRole::SubcategoryHeader);
    }

    #[test]
    fn test_column_header_row_adopted_not_emitted() {
        let mut c = classifier();
        let mut w = WarningCollector::new();
        let mut lines = body_lines(1);
        lines.push(line(1, 6, 120.0, 14.0, vec![frag("Antibiotics", 72.0)]));
        lines.push(line(1, 7, 140.0, 11.0, vec![frag("Penicillins", 90.0)]));
        lines.push(line(
            1,
            8,
            160.0,
            10.0,
            vec![frag("Drug", 72.0), frag("Strength", 220.0)],
        ));
        lines.push(line(
            1,
            9,
            175.0,
            10.0,
            vec![frag("Amoxicillin", 72.0), frag("500 mg", 220.0)],
        ));
        let out = c.classify_page(&lines, 792.0, false, &mut w);
        assert_eq!(out[out.len() - 2].role, LineRole::Noise); // column header absorbed
        let row = out.last().unwrap();
        assert_eq!(row.role, LineRole::DataRow);
        let cells = row.cells.as_ref().unwrap();
        assert_eq!(cells.get("Drug").unwrap(), "Amoxicillin");
        assert_eq!(cells.get("Strength").unwrap(), "500 mg");
    }

    #[test]
    fn test_data_shaped_line_without_subcategory_still_emitted() {
        let mut c = classifier();
        let mut w = WarningCollector::new();
        let mut lines = body_lines(1);
        lines.push(line(
            1,
            6,
            150.0,
            10.0,
            vec![frag("Orphan", 72.0), frag("250 mg", 220.0)],
        ));
        let out = c.classify_page(&lines, 792.0, false, &mut w);
        let last = out.last().unwrap();
        assert_eq!(last.role, LineRole::DataRow);
        assert!(last.cells.is_none());
    }

    #[test]
    fn test_page_number_in_band_is_noise() {
        let mut c = classifier();
        let mut w = WarningCollector::new();
        let mut lines = body_lines(1);
        lines.push(line(1, 6, 770.0, 10.0, vec![frag("17", 300.0)]));
        let out = c.classify_page(&lines, 792.0, false, &mut w);
        assert_eq!(out.last().unwrap().role, LineRole::Noise);
    }

    #[test]
    fn test_running_header_suppressed_on_repeat() {
        let mut c = classifier();
        let mut w = WarningCollector::new();

        // Same banner in the top band of two consecutive pages; it is
        // all-caps, so without suppression it would read as a header.
        let mut p1 = body_lines(1);
        p1.insert(0, line(1, 0, 20.0, 10.0, vec![frag("ACME HEALTH FORMULARY", 72.0)]));
        let out1 = c.classify_page(&p1, 792.0, false, &mut w);

        let mut p2 = body_lines(2);
        p2.insert(0, line(2, 0, 20.0, 10.0, vec![frag("ACME HEALTH FORMULARY", 72.0)]));
        let out2 = c.classify_page(&p2, 792.0, false, &mut w);

        assert_ne!(out1[0].role, LineRole::Noise);
        assert_eq!(out2[0].role, LineRole::Noise);
    }

    #[test]
    fn test_toc_entry_only_in_toc_mode() {
        let mut w = WarningCollector::new();
        let toc_line = || {
            let mut lines = body_lines(1);
            lines.push(line(
                1,
                6,
                150.0,
                10.0,
                vec![frag("Antibiotics", 72.0), frag("12", 400.0)],
            ));
            lines
        };

        let mut c = classifier();
        let out = c.classify_page(&toc_line(), 792.0, true, &mut w);
        assert_eq!(out.last().unwrap().role, LineRole::TocEntry);

        let mut c = classifier();
        let out = c.classify_page(&toc_line(), 792.0, false, &mut w);
        assert_ne!(out.last().unwrap().role, LineRole::TocEntry);
    }

    #[test]
    fn test_dotted_leader_toc_entry() {
        let mut c = classifier();
        let mut w = WarningCollector::new();
        let mut lines = body_lines(1);
        lines.push(line(
            1,
            6,
            150.0,
            10.0,
            vec![frag("Cardiovascular Agents .......... 34", 72.0)],
        ));
        let out = c.classify_page(&lines, 792.0, true, &mut w);
        assert_eq!(out.last().unwrap().role, LineRole::TocEntry);
    }

    #[test]
    fn test_toc_title_is_noise_in_toc_mode() {
        let mut c = classifier();
        let mut w = WarningCollector::new();
        let mut lines = body_lines(1);
        lines.push(line(1, 6, 100.0, 16.0, vec![frag("Table of Contents", 72.0)]));
        let out = c.classify_page(&lines, 792.0, true, &mut w);
        assert_eq!(out.last().unwrap().role, LineRole::Noise);
    }

    #[test]
    fn test_unclassifiable_header_recorded() {
        let mut c = classifier();
        let mut w = WarningCollector::new();
        let mut lines = body_lines(1);
        // Header-grade type, but numeric fragments and no grid to align to
        lines.push(line(
            1,
            6,
            150.0,
            15.0,
            vec![frag("Tier 4 2024", 72.0), frag("17 50", 300.0)],
        ));
        let out = c.classify_page(&lines, 792.0, false, &mut w);
        assert_eq!(out.last().unwrap().role, LineRole::Noise);
        assert_eq!(w.count_of(WarningReason::UnclassifiableHeader), 1);
    }

    #[test]
    fn test_malformed_row_gets_no_cells() {
        let mut c = classifier();
        let mut w = WarningCollector::new();
        let mut lines = body_lines(1);
        lines.push(line(1, 6, 120.0, 14.0, vec![frag("Antibiotics", 72.0)]));
        lines.push(line(1, 7, 140.0, 11.0, vec![frag("Penicillins", 90.0)]));
        lines.push(line(
            1,
            8,
            160.0,
            10.0,
            vec![frag("Drug", 72.0), frag("Strength", 220.0)],
        ));
        // numeric, but nowhere near either column anchor
        lines.push(line(
            1,
            9,
            175.0,
            10.0,
            vec![frag("Stray", 130.0), frag("999", 460.0)],
        ));
        let out = c.classify_page(&lines, 792.0, false, &mut w);
        let last = out.last().unwrap();
        assert_eq!(last.role, LineRole::DataRow);
        assert!(last.cells.is_none());
    }

    #[test]
    fn test_is_numeric_like() {
        assert!(is_numeric_like("500"));
        assert!(is_numeric_like("500 mg"));
        assert!(is_numeric_like("$12.40"));
        assert!(!is_numeric_like("capsule"));
        assert!(!is_numeric_like("30-day supply"));
    }
}
