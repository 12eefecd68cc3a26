pub mod classify;
pub mod engine;
pub mod error;
pub mod extraction;
pub mod hierarchy;
pub mod model;
pub mod toc;
pub mod warnings;

use engine::ExtractionCoordinator;
use error::FormularyError;
use extraction::{PageTokens, TokenSource};
use model::ExtractionResult;

/// Boundary configuration for one extraction.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// TOC scanning stops after this many pages even if no category
    /// header has been seen.
    pub front_matter_page_limit: usize,
    /// Maximum horizontal distance, in points, between a cell and its
    /// column anchor.
    pub column_tolerance: f32,
    /// Clamp near-miss cells to the nearest column instead of diverting
    /// the row to warnings. Off by default: strict rejection preserves
    /// the never-silently-corrupt guarantee.
    pub lenient_rows: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        ExtractOptions {
            front_matter_page_limit: 10,
            column_tolerance: 12.0,
            lenient_rows: false,
        }
    }
}

/// Main API entry point: extract the formulary catalog from a PDF.
///
/// Fails only when the document itself is unusable (unreadable bytes, no
/// extractable text). Classification ambiguity never fails extraction;
/// every row either lands in the hierarchy or in the warning list.
pub fn extract_document(
    pdf_bytes: &[u8],
    source: &dyn TokenSource,
    options: &ExtractOptions,
) -> Result<ExtractionResult, FormularyError> {
    let pages = source.token_pages(pdf_bytes)?;

    if pages.iter().all(|p| p.is_empty()) {
        return Err(FormularyError::NoExtractableText);
    }

    Ok(extract_from_tokens(&pages, options))
}

/// The structuring stage alone: classified lines to hierarchy, TOC and
/// warnings. Infallible by design; useful directly when tokens come from
/// somewhere other than a PDF.
pub fn extract_from_tokens(pages: &[PageTokens], options: &ExtractOptions) -> ExtractionResult {
    ExtractionCoordinator::new(options).run(pages)
}
