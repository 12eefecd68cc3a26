use crate::classify::ClassifiedLine;
use crate::model::{PageRef, TocEntry};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static ENTRY_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?P<label>.*?)[\s.·]*(?P<page>\d{1,4}|[ivxlcdm]{1,7})$").unwrap()
});

/// Collects the document's printed table of contents, in document order,
/// independent of the derived hierarchy.
///
/// No deduplication: an index may legitimately list the same label twice.
#[derive(Debug, Default)]
pub struct TocIndexer {
    entries: Vec<TocEntry>,
}

impl TocIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one TOC-role line. Lines whose trailing page reference
    /// cannot be split off are kept whole with an empty reference rather
    /// than dropped.
    pub fn record(&mut self, line: &ClassifiedLine) {
        let entry = match split_entry(&line.text) {
            Some((label, page_reference)) => TocEntry {
                label,
                page_reference,
            },
            None => TocEntry {
                label: line.text.trim().to_string(),
                page_reference: PageRef::Text(String::new()),
            },
        };
        debug!(label = %entry.label, page = %entry.page_reference, "toc entry");
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<TocEntry> {
        self.entries
    }
}

/// Split "Antibiotics ........ 12" into ("Antibiotics", Number(12)).
/// Digit references become numbers; roman numerals stay text.
fn split_entry(text: &str) -> Option<(String, PageRef)> {
    let caps = ENTRY_SHAPE.captures(text.trim())?;
    let label = caps.name("label")?.as_str().trim().to_string();
    if label.is_empty() {
        return None;
    }
    let page_str = caps.name("page")?.as_str();
    let page_reference = match page_str.parse::<u32>() {
        Ok(n) => PageRef::Number(n),
        Err(_) => PageRef::Text(page_str.to_string()),
    };
    Some((label, page_reference))
}
