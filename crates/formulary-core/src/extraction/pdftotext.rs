use crate::error::FormularyError;
use crate::extraction::{PageTokens, TextToken, TokenSource};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::Write;
use std::process::Command;
use tracing::debug;

/// Token source backed by pdftotext (poppler-utils).
///
/// Uses `pdftotext -bbox-layout`, which emits one XML element per word
/// with its bounding box. Word-box geometry carries everything the
/// classifier needs: x for indentation/column alignment, box height as a
/// font-size proxy.
pub struct PdftotextSource;

impl PdftotextSource {
    pub fn new() -> Self {
        PdftotextSource
    }

    /// Check if pdftotext is available on the system.
    pub fn is_available() -> bool {
        Command::new("pdftotext")
            .arg("-v")
            .output()
            .map(|o| o.status.success() || !o.stderr.is_empty())
            .unwrap_or(false)
    }
}

impl Default for PdftotextSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenSource for PdftotextSource {
    fn token_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageTokens>, FormularyError> {
        // Write PDF bytes to a temp file; pdftotext needs a seekable input
        let mut tmpfile =
            tempfile::NamedTempFile::new().map_err(|e| FormularyError::Extraction(e.to_string()))?;
        tmpfile
            .write_all(pdf_bytes)
            .map_err(|e| FormularyError::Extraction(e.to_string()))?;

        let output = Command::new("pdftotext")
            .arg("-bbox-layout")
            .arg(tmpfile.path())
            .arg("-") // output to stdout
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    FormularyError::PdftotextNotFound
                } else {
                    FormularyError::Extraction(format!("pdftotext failed: {}", e))
                }
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(FormularyError::PdftotextFailed { code, stderr });
        }

        let xml = String::from_utf8_lossy(&output.stdout);
        let pages = parse_bbox_xml(&xml)?;
        debug!(
            pages = pages.len(),
            tokens = pages.iter().map(|p| p.tokens.len()).sum::<usize>(),
            "pdftotext extraction complete"
        );
        Ok(pages)
    }

    fn backend_name(&self) -> &str {
        "pdftotext"
    }
}

/// Parse `pdftotext -bbox-layout` XML into per-page word tokens.
///
/// Pages are numbered by order of appearance; poppler's `<page>` element
/// carries width/height but no page number.
pub(crate) fn parse_bbox_xml(xml: &str) -> Result<Vec<PageTokens>, FormularyError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut pages: Vec<PageTokens> = Vec::new();
    let mut pending_box: Option<(f32, f32, f32, f32)> = None;
    let mut pending_text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"page" => {
                    pages.push(PageTokens {
                        page_number: pages.len() + 1,
                        width: attr_f32(&e, "width").unwrap_or(0.0),
                        height: attr_f32(&e, "height").unwrap_or(0.0),
                        tokens: Vec::new(),
                    });
                }
                b"word" => {
                    pending_box = word_box(&e);
                    pending_text.clear();
                }
                _ => {}
            },
            Ok(Event::Text(t)) => {
                if pending_box.is_some() {
                    let text = t
                        .unescape()
                        .map_err(|e| FormularyError::Extraction(format!("bad XML text: {e}")))?;
                    pending_text.push_str(&text);
                }
            }
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"word" {
                    if let (Some((x_min, y_min, x_max, y_max)), Some(page)) =
                        (pending_box.take(), pages.last_mut())
                    {
                        let text = pending_text.trim().to_string();
                        if !text.is_empty() {
                            page.tokens.push(TextToken {
                                text,
                                x: x_min,
                                y: y_min,
                                width: x_max - x_min,
                                height: y_max - y_min,
                            });
                        }
                    }
                    pending_text.clear();
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(FormularyError::Extraction(format!(
                    "failed to parse bbox XML: {e}"
                )))
            }
            _ => {}
        }
    }

    Ok(pages)
}

fn word_box(e: &BytesStart<'_>) -> Option<(f32, f32, f32, f32)> {
    Some((
        attr_f32(e, "xMin")?,
        attr_f32(e, "yMin")?,
        attr_f32(e, "xMax")?,
        attr_f32(e, "yMax")?,
    ))
}

fn attr_f32(e: &BytesStart<'_>, name: &str) -> Option<f32> {
    let attr = e.try_get_attribute(name).ok()??;
    attr.unescape_value().ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_XML: &str = r#"<?xml version="1.0"?>
<html xmlns="http://www.w3.org/1999/xhtml">
<body>
<doc>
  <page width="612.0" height="792.0">
    <flow>
      <block xMin="72.0" yMin="90.0" xMax="200.0" yMax="110.0">
        <line xMin="72.0" yMin="90.0" xMax="200.0" yMax="110.0">
          <word xMin="72.0" yMin="90.0" xMax="150.0" yMax="110.0">Antibiotics</word>
          <word xMin="160.0" yMin="92.0" xMax="200.0" yMax="108.0">&amp;co</word>
        </line>
      </block>
    </flow>
  </page>
  <page width="612.0" height="792.0">
    <flow>
      <block xMin="72.0" yMin="100.0" xMax="120.0" yMax="112.0">
        <line xMin="72.0" yMin="100.0" xMax="120.0" yMax="112.0">
          <word xMin="72.0" yMin="100.0" xMax="120.0" yMax="112.0">Amoxicillin</word>
        </line>
      </block>
    </flow>
  </page>
</doc>
</body>
</html>
"#;

    #[test]
    fn test_parse_bbox_xml_pages_and_tokens() {
        let pages = parse_bbox_xml(SAMPLE_XML).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].page_number, 1);
        assert_eq!(pages[0].width, 612.0);
        assert_eq!(pages[0].tokens.len(), 2);
        assert_eq!(pages[1].tokens.len(), 1);
        assert_eq!(pages[1].tokens[0].text, "Amoxicillin");
    }

    #[test]
    fn test_word_geometry() {
        let pages = parse_bbox_xml(SAMPLE_XML).unwrap();
        let word = &pages[0].tokens[0];
        assert_eq!(word.x, 72.0);
        assert_eq!(word.y, 90.0);
        assert_eq!(word.width, 78.0);
        assert_eq!(word.height, 20.0);
    }

    #[test]
    fn test_entities_unescaped() {
        let pages = parse_bbox_xml(SAMPLE_XML).unwrap();
        assert_eq!(pages[0].tokens[1].text, "&co");
    }

    #[test]
    fn test_empty_document() {
        let pages = parse_bbox_xml("<doc></doc>").unwrap();
        assert!(pages.is_empty());
    }
}
