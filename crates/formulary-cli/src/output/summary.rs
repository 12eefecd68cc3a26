use formulary_core::model::ExtractionResult;
use std::path::Path;

/// Human-readable extraction summary for single-document mode.
pub fn print(pdf_path: &Path, doc_dir: &Path, result: &ExtractionResult) {
    println!("Extracted {}", pdf_path.display());
    println!("  Output directory:  {}", doc_dir.display());
    println!("  TOC entries:       {}", result.table_of_contents.len());
    println!("  Categories:        {}", result.categories.len());
    println!("  Subcategories:     {}", result.total_sub_categories());
    println!("  Rows:              {}", result.total_rows());
    println!("  Warnings:          {}", result.warnings.len());

    if !result.warnings.is_empty() {
        println!("  (see extraction_warnings.json for unplaced lines)");
    }
}
