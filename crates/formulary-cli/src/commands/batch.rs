use anyhow::{bail, Context};
use formulary_core::ExtractOptions;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::error;

use crate::commands::extract;

/// Process every PDF in a directory. Documents are fully independent, so
/// they fan out over a worker pool; a failing document is reported and
/// counted without aborting its siblings.
pub fn run(
    pdf_dir: &Path,
    output_dir: &Path,
    json_only: bool,
    jobs: Option<usize>,
    options: &ExtractOptions,
) -> anyhow::Result<()> {
    if !pdf_dir.is_dir() {
        bail!("directory not found: {}", pdf_dir.display());
    }

    let mut pdf_files: Vec<PathBuf> = std::fs::read_dir(pdf_dir)
        .with_context(|| format!("failed to read {}", pdf_dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .map(|ext| ext.eq_ignore_ascii_case("pdf"))
                .unwrap_or(false)
        })
        .collect();
    pdf_files.sort();

    if pdf_files.is_empty() {
        bail!("no PDF files found in {}", pdf_dir.display());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs.unwrap_or(0))
        .build()
        .context("failed to build worker pool")?;

    let failed: usize = pool.install(|| {
        pdf_files
            .par_iter()
            .map(|pdf_path| {
                match extract::process_document(pdf_path, output_dir, json_only, options) {
                    Ok((_, result)) => {
                        println!(
                            "{}: {} categories, {} subcategories, {} rows, {} warnings",
                            pdf_path.display(),
                            result.categories.len(),
                            result.total_sub_categories(),
                            result.total_rows(),
                            result.warnings.len()
                        );
                        0
                    }
                    Err(e) => {
                        error!(pdf = %pdf_path.display(), "document failed: {e:#}");
                        1
                    }
                }
            })
            .sum()
    });

    println!(
        "Batch complete: {} processed, {} failed",
        pdf_files.len() - failed,
        failed
    );

    if failed == pdf_files.len() {
        bail!("every document in the batch failed");
    }
    Ok(())
}
