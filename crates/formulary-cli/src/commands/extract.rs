use anyhow::Context;
use formulary_core::extraction::pdftotext::PdftotextSource;
use formulary_core::model::ExtractionResult;
use formulary_core::{extract_document, ExtractOptions};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::output;

pub fn run(
    pdf_path: &Path,
    output_dir: &Path,
    json_only: bool,
    options: &ExtractOptions,
) -> anyhow::Result<()> {
    let (doc_dir, result) = process_document(pdf_path, output_dir, json_only, options)?;
    output::summary::print(pdf_path, &doc_dir, &result);
    Ok(())
}

/// Extract one document and write all of its outputs into
/// `<output_dir>/<pdf stem>/`. Shared by the extract and batch commands.
///
/// JSON files are written before the workbook, so a rendering failure
/// never invalidates the interchange output already on disk.
pub fn process_document(
    pdf_path: &Path,
    output_dir: &Path,
    json_only: bool,
    options: &ExtractOptions,
) -> anyhow::Result<(PathBuf, ExtractionResult)> {
    let stem = pdf_path
        .file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("invalid PDF file name: {}", pdf_path.display()))?;

    let doc_dir = output_dir.join(stem);
    std::fs::create_dir_all(&doc_dir)
        .with_context(|| format!("failed to create {}", doc_dir.display()))?;

    let pdf_bytes = std::fs::read(pdf_path)
        .with_context(|| format!("failed to read {}", pdf_path.display()))?;

    info!(pdf = %pdf_path.display(), "extracting");
    let source = PdftotextSource::new();
    let result = extract_document(&pdf_bytes, &source, options)
        .with_context(|| format!("extraction failed for {}", pdf_path.display()))?;

    output::json::write(&doc_dir, &result)
        .with_context(|| format!("failed to write JSON outputs to {}", doc_dir.display()))?;

    if !json_only {
        let xlsx_path = doc_dir.join(format!("{stem}.xlsx"));
        output::xlsx::render(&result.categories, &xlsx_path).with_context(|| {
            format!(
                "workbook rendering failed for {} (JSON outputs in {} were kept)",
                pdf_path.display(),
                doc_dir.display()
            )
        })?;
    }

    Ok((doc_dir, result))
}
