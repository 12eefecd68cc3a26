use anyhow::Result;
use formulary_core::model::ExtractionResult;
use std::path::Path;

pub const CATEGORIES_FILE: &str = "extracted_data.json";
pub const WARNINGS_FILE: &str = "extraction_warnings.json";
pub const TOC_FILE: &str = "table_of_contents.json";

/// Write the three interchange files into the document's output
/// directory. Each is independently useful; the categories file alone is
/// enough to re-render the workbook later.
pub fn write(doc_dir: &Path, result: &ExtractionResult) -> Result<()> {
    std::fs::write(
        doc_dir.join(CATEGORIES_FILE),
        serde_json::to_string_pretty(&result.categories)?,
    )?;
    std::fs::write(
        doc_dir.join(WARNINGS_FILE),
        serde_json::to_string_pretty(&result.warnings)?,
    )?;
    std::fs::write(
        doc_dir.join(TOC_FILE),
        serde_json::to_string_pretty(&result.table_of_contents)?,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use formulary_core::model::{Category, SubCategory};

    #[test]
    fn test_write_creates_all_three_files() {
        let dir = tempfile::tempdir().unwrap();
        let result = ExtractionResult {
            categories: vec![Category {
                name: "Antibiotics".into(),
                sub_categories: vec![SubCategory {
                    name: "Penicillins".into(),
                    rows: vec![],
                }],
            }],
            warnings: vec![],
            table_of_contents: vec![],
        };

        write(dir.path(), &result).unwrap();

        let categories = std::fs::read_to_string(dir.path().join(CATEGORIES_FILE)).unwrap();
        let parsed: Vec<Category> = serde_json::from_str(&categories).unwrap();
        assert_eq!(parsed[0].name, "Antibiotics");

        assert_eq!(
            std::fs::read_to_string(dir.path().join(WARNINGS_FILE)).unwrap(),
            "[]"
        );
        assert!(dir.path().join(TOC_FILE).exists());
    }
}
