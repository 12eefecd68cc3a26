use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One formulary line item: an ordered column -> cell value mapping.
///
/// Cell values stay as text; numeric-looking cells (strengths, package
/// counts, NDC codes) are not coerced, so nothing is lost to rounding or
/// leading-zero stripping.
pub type Row = IndexMap<String, String>;

/// Second-level grouping, owned by exactly one [`Category`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubCategory {
    pub name: String,
    pub rows: Vec<Row>,
}

/// Top-level grouping in the formulary hierarchy (e.g., a drug class).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(rename = "subCategories")]
    pub sub_categories: Vec<SubCategory>,
}

/// Name given to the synthetic category opened when a subcategory header
/// appears with no category context.
pub const UNCATEGORIZED: &str = "(uncategorized)";

/// A printed page reference from the document's own table of contents.
/// Most are plain page numbers; front matter may use roman numerals or
/// ranges, which are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageRef {
    Number(u32),
    Text(String),
}

impl fmt::Display for PageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageRef::Number(n) => write!(f, "{n}"),
            PageRef::Text(s) => write!(f, "{s}"),
        }
    }
}

/// One entry of the document's printed table of contents. Independent of
/// the derived category tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TocEntry {
    pub label: String,
    #[serde(rename = "pageReference")]
    pub page_reference: PageRef,
}

/// Why a line or row could not be placed in the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningReason {
    /// Data row whose fragments could not be reconciled with the
    /// subcategory's column grid.
    MalformedRow,
    /// Data-shaped line seen before any subcategory header was open.
    RowBeforeSubcategory,
    /// Subcategory header seen with no category context.
    SubcategoryWithoutCategory,
    /// Header-like typography that fit no header rule.
    UnclassifiableHeader,
}

impl fmt::Display for WarningReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WarningReason::MalformedRow => "malformed_row",
            WarningReason::RowBeforeSubcategory => "row_before_subcategory",
            WarningReason::SubcategoryWithoutCategory => "subcategory_without_category",
            WarningReason::UnclassifiableHeader => "unclassifiable_header",
        };
        f.write_str(s)
    }
}

/// A recorded anomaly: content the engine could not place with confidence.
/// Append-only; never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warning {
    #[serde(rename = "pageNumber")]
    pub page_number: u32,
    #[serde(rename = "rawText")]
    pub raw_text: String,
    pub reason: WarningReason,
    /// Nearby-line snippet to locate the anomaly in the source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// Root aggregate of one document's extraction. Owns everything by
/// composition; a pure tree with no cross-links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub categories: Vec<Category>,
    pub warnings: Vec<Warning>,
    pub table_of_contents: Vec<TocEntry>,
}

impl ExtractionResult {
    pub fn total_sub_categories(&self) -> usize {
        self.categories.iter().map(|c| c.sub_categories.len()).sum()
    }

    pub fn total_rows(&self) -> usize {
        self.categories
            .iter()
            .flat_map(|c| c.sub_categories.iter())
            .map(|s| s.rows.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_serializes_with_camel_case_children() {
        let cat = Category {
            name: "Antibiotics".into(),
            sub_categories: vec![SubCategory {
                name: "Penicillins".into(),
                rows: vec![],
            }],
        };
        let json = serde_json::to_value(&cat).unwrap();
        assert!(json.get("subCategories").is_some());
        assert!(json.get("sub_categories").is_none());
    }

    #[test]
    fn test_row_preserves_column_order() {
        let mut row = Row::new();
        row.insert("Drug".into(), "Amoxicillin".into());
        row.insert("Strength".into(), "500 mg".into());
        row.insert("Tier".into(), "1".into());
        let json = serde_json::to_string(&row).unwrap();
        let drug = json.find("Drug").unwrap();
        let strength = json.find("Strength").unwrap();
        let tier = json.find("Tier").unwrap();
        assert!(drug < strength && strength < tier);
    }

    #[test]
    fn test_page_ref_untagged() {
        let num = serde_json::to_string(&PageRef::Number(42)).unwrap();
        assert_eq!(num, "42");
        let text = serde_json::to_string(&PageRef::Text("xii".into())).unwrap();
        assert_eq!(text, "\"xii\"");
    }

    #[test]
    fn test_warning_reason_snake_case() {
        let json = serde_json::to_string(&WarningReason::RowBeforeSubcategory).unwrap();
        assert_eq!(json, "\"row_before_subcategory\"");
    }

    #[test]
    fn test_warning_context_omitted_when_absent() {
        let w = Warning {
            page_number: 3,
            raw_text: "orphan line".into(),
            reason: WarningReason::MalformedRow,
            context: None,
        };
        let json = serde_json::to_value(&w).unwrap();
        assert!(json.get("context").is_none());
        assert_eq!(json["pageNumber"], 3);
        assert_eq!(json["rawText"], "orphan line");
    }
}
