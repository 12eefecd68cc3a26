pub mod pdftotext;

use crate::error::FormularyError;

/// One positioned text fragment from a page, in PDF points with the
/// origin at the top-left corner (y grows downward).
#[derive(Debug, Clone)]
pub struct TextToken {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    /// Glyph-box height; the classifier uses it as a font-size proxy.
    pub height: f32,
}

/// All tokens from a single page, plus the page geometry needed for
/// margin/decoration heuristics.
#[derive(Debug, Clone)]
pub struct PageTokens {
    pub page_number: usize,
    pub width: f32,
    pub height: f32,
    pub tokens: Vec<TextToken>,
}

impl PageTokens {
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Trait for backends turning PDF bytes into positioned text tokens.
pub trait TokenSource: Send + Sync {
    /// Extract tokens from PDF bytes, one PageTokens per page in
    /// physical order.
    fn token_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageTokens>, FormularyError>;

    /// Name of this extraction backend (for diagnostics).
    fn backend_name(&self) -> &str;
}
