use crate::classify::line::LineFragment;
use crate::model::Row;

/// A named column anchor, positioned at the left edge of its header cell.
#[derive(Debug, Clone)]
pub struct GridColumn {
    pub name: String,
    pub x: f32,
}

/// The column layout of one subcategory's table.
///
/// Built once per subcategory, from its column-header line when the
/// document prints one, otherwise synthesized from the first data-shaped
/// line. Cells of later rows are matched to the nearest anchor.
#[derive(Debug, Clone)]
pub struct ColumnGrid {
    columns: Vec<GridColumn>,
    tolerance: f32,
}

impl ColumnGrid {
    /// Build a grid from a printed column-header line.
    pub fn from_header(fragments: &[LineFragment], tolerance: f32) -> Self {
        let columns = fragments
            .iter()
            .map(|f| GridColumn {
                name: f.text.clone(),
                x: f.x,
            })
            .collect();
        ColumnGrid { columns, tolerance }
    }

    /// Build a grid from a data row when no column header exists;
    /// columns get positional names.
    pub fn synthesized(fragments: &[LineFragment], tolerance: f32) -> Self {
        let columns = fragments
            .iter()
            .enumerate()
            .map(|(i, f)| GridColumn {
                name: format!("column_{}", i + 1),
                x: f.x,
            })
            .collect();
        ColumnGrid { columns, tolerance }
    }

    pub fn columns(&self) -> &[GridColumn] {
        &self.columns
    }

    /// True when at least half of the fragments (and at least one) sit
    /// within tolerance of some column anchor.
    pub fn aligns_with(&self, fragments: &[LineFragment]) -> bool {
        if fragments.is_empty() {
            return false;
        }
        let aligned = fragments
            .iter()
            .filter(|f| self.distance_to_nearest(f.x) <= self.tolerance)
            .count();
        aligned >= 1 && aligned * 2 >= fragments.len()
    }

    /// Strict reconciliation: every fragment must land within tolerance of
    /// a distinct column. Returns `None` when a fragment matches no column
    /// or two fragments claim the same one; the caller diverts such lines
    /// to warnings. Columns with no fragment are simply absent from the
    /// row (ragged short rows are tolerated).
    pub fn reconcile(&self, fragments: &[LineFragment]) -> Option<Row> {
        let mut assigned: Vec<Option<&str>> = vec![None; self.columns.len()];

        for frag in fragments {
            let (idx, distance) = self.nearest_column(frag.x)?;
            if distance > self.tolerance || assigned[idx].is_some() {
                return None;
            }
            assigned[idx] = Some(frag.text.as_str());
        }

        let mut row = Row::new();
        for (col, value) in self.columns.iter().zip(&assigned) {
            if let Some(value) = value {
                row.insert(col.name.clone(), value.to_string());
            }
        }
        Some(row)
    }

    /// Lenient reconciliation: clamp every fragment to its nearest column
    /// regardless of distance; collisions are joined with a space.
    pub fn reconcile_lenient(&self, fragments: &[LineFragment]) -> Row {
        let mut assigned: Vec<String> = vec![String::new(); self.columns.len()];

        for frag in fragments {
            if let Some((idx, _)) = self.nearest_column(frag.x) {
                if assigned[idx].is_empty() {
                    assigned[idx] = frag.text.clone();
                } else {
                    assigned[idx].push(' ');
                    assigned[idx].push_str(&frag.text);
                }
            }
        }

        let mut row = Row::new();
        for (col, value) in self.columns.iter().zip(assigned) {
            if !value.is_empty() {
                row.insert(col.name.clone(), value);
            }
        }
        row
    }

    fn nearest_column(&self, x: f32) -> Option<(usize, f32)> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, c)| (i, (c.x - x).abs()))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    fn distance_to_nearest(&self, x: f32) -> f32 {
        self.nearest_column(x).map(|(_, d)| d).unwrap_or(f32::MAX)
    }
}
