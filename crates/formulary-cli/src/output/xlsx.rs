use formulary_core::model::{Category, Row};
use rust_xlsxwriter::{Color, Format, FormatBorder, Workbook, XlsxError};
use std::path::Path;
use tracing::debug;

const MIN_COLUMN_WIDTH: f64 = 10.0;
const MAX_COLUMN_WIDTH: f64 = 50.0;

/// Render the category tree as one banded worksheet.
///
/// Each category opens with a merged banner row, each subcategory with a
/// filled sub-header row and its column header row, then data rows in
/// document order.
pub fn render(categories: &[Category], path: &Path) -> Result<(), XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Formulary")?;

    let category_fmt = Format::new()
        .set_bold()
        .set_font_size(12)
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(0x1F4E79));
    let sub_category_fmt = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0xD9E1F2));
    let column_fmt = Format::new()
        .set_bold()
        .set_border_bottom(FormatBorder::Thin);

    let mut row_idx: u32 = 0;
    let mut col_widths: Vec<usize> = Vec::new();

    for category in categories {
        let span = category
            .sub_categories
            .iter()
            .map(|s| column_order(&s.rows).len())
            .max()
            .unwrap_or(0)
            .max(1);

        write_banner(worksheet, row_idx, span, &category.name, &category_fmt)?;
        note_width(&mut col_widths, 0, category.name.len());
        row_idx += 1;

        for sub in &category.sub_categories {
            let columns = column_order(&sub.rows);
            let sub_span = columns.len().max(1);

            write_banner(worksheet, row_idx, sub_span, &sub.name, &sub_category_fmt)?;
            row_idx += 1;

            for (c, column) in columns.iter().enumerate() {
                worksheet.write_string_with_format(row_idx, c as u16, column, &column_fmt)?;
                note_width(&mut col_widths, c, column.len());
            }
            if !columns.is_empty() {
                row_idx += 1;
            }

            for row in &sub.rows {
                for (c, column) in columns.iter().enumerate() {
                    if let Some(value) = row.get(column) {
                        worksheet.write_string(row_idx, c as u16, value)?;
                        note_width(&mut col_widths, c, value.len());
                    }
                }
                row_idx += 1;
            }

            // spacer between subcategory blocks
            row_idx += 1;
        }
    }

    for (c, width) in col_widths.iter().enumerate() {
        let width = (*width as f64 + 2.0).clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH);
        worksheet.set_column_width(c as u16, width)?;
    }

    debug!(path = %path.display(), rows = row_idx, "saving workbook");
    workbook.save(path)?;
    Ok(())
}

fn write_banner(
    worksheet: &mut rust_xlsxwriter::Worksheet,
    row: u32,
    span: usize,
    text: &str,
    format: &Format,
) -> Result<(), XlsxError> {
    if span >= 2 {
        worksheet.merge_range(row, 0, row, (span - 1) as u16, text, format)?;
    } else {
        worksheet.write_string_with_format(row, 0, text, format)?;
    }
    Ok(())
}

/// Column names in first-seen order across a subcategory's rows; ragged
/// rows contribute whatever columns they have.
fn column_order(rows: &[Row]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

fn note_width(widths: &mut Vec<usize>, col: usize, len: usize) {
    if widths.len() <= col {
        widths.resize(col + 1, 0);
    }
    widths[col] = widths[col].max(len);
}

#[cfg(test)]
mod tests {
    use super::*;
    use formulary_core::model::SubCategory;

    fn sample_categories() -> Vec<Category> {
        let mut row1 = Row::new();
        row1.insert("Drug".into(), "Amoxicillin".into());
        row1.insert("Strength".into(), "500 mg".into());
        let mut row2 = Row::new();
        row2.insert("Drug".into(), "Ampicillin".into());
        row2.insert("Tier".into(), "2".into());

        vec![Category {
            name: "Antibiotics".into(),
            sub_categories: vec![SubCategory {
                name: "Penicillins".into(),
                rows: vec![row1, row2],
            }],
        }]
    }

    #[test]
    fn test_column_order_is_first_seen() {
        let categories = sample_categories();
        let columns = column_order(&categories[0].sub_categories[0].rows);
        assert_eq!(columns, vec!["Drug", "Strength", "Tier"]);
    }

    #[test]
    fn test_render_writes_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("formulary.xlsx");

        render(&sample_categories(), &path).unwrap();

        let metadata = std::fs::metadata(&path).unwrap();
        assert!(metadata.len() > 0);
    }

    #[test]
    fn test_render_empty_tree() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.xlsx");

        render(&[], &path).unwrap();
        assert!(path.exists());
    }
}
