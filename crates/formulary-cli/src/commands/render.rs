use anyhow::Context;
use formulary_core::model::Category;
use std::path::{Path, PathBuf};

use crate::output;

/// Build a workbook from a previously extracted categories JSON file,
/// without touching the source PDF.
pub fn run(json_path: &Path, out: Option<PathBuf>) -> anyhow::Result<()> {
    let bytes = std::fs::read(json_path)
        .with_context(|| format!("failed to read {}", json_path.display()))?;
    let categories: Vec<Category> = serde_json::from_slice(&bytes)
        .with_context(|| format!("{} is not a categories JSON file", json_path.display()))?;

    let out = out.unwrap_or_else(|| json_path.with_extension("xlsx"));
    output::xlsx::render(&categories, &out)?;

    println!("Workbook written to {}", out.display());
    Ok(())
}
