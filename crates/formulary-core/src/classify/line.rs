use crate::extraction::PageTokens;

/// Horizontal gaps wider than this many average glyph widths split a line
/// into separate fragments (column cells).
const GAP_FACTOR: f32 = 2.0;

/// Floor for the fragment-splitting gap, in points. Keeps narrow fonts
/// from splitting on ordinary word spacing.
const MIN_COLUMN_GAP: f32 = 6.0;

/// A horizontal run of words with no column-sized gap inside it.
#[derive(Debug, Clone)]
pub struct LineFragment {
    pub text: String,
    pub x: f32,
    pub width: f32,
}

impl LineFragment {
    pub fn center(&self) -> f32 {
        self.x + self.width / 2.0
    }
}

/// A logical line: fragments sharing a baseline, in left-to-right order.
#[derive(Debug, Clone)]
pub struct TextLine {
    pub page_number: u32,
    pub line_index: usize,
    pub y: f32,
    /// Tallest glyph box on the line; the classifier's font-size proxy.
    pub height: f32,
    pub fragments: Vec<LineFragment>,
}

impl TextLine {
    /// Fragments joined with a single space, for warnings and logs.
    pub fn text(&self) -> String {
        self.fragments
            .iter()
            .map(|f| f.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn indent(&self) -> f32 {
        self.fragments.first().map(|f| f.x).unwrap_or(0.0)
    }

    pub fn vertical_center(&self) -> f32 {
        self.y + self.height / 2.0
    }
}

/// Group one page's word tokens into logical lines and split each line
/// into fragments on column-sized gaps.
///
/// Token order from the backend is not trusted; everything is re-sorted
/// by position, so the output is deterministic for a given token set.
pub fn assemble_lines(page: &PageTokens) -> Vec<TextLine> {
    let mut tokens = page.tokens.clone();
    tokens.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));

    // Group tokens into lines by vertical overlap
    let mut groups: Vec<Vec<crate::extraction::TextToken>> = Vec::new();
    for token in tokens {
        let joined = match groups.last_mut() {
            Some(group) => {
                let top = group.iter().map(|t| t.y).fold(f32::INFINITY, f32::min);
                let bottom = group
                    .iter()
                    .map(|t| t.y + t.height)
                    .fold(f32::NEG_INFINITY, f32::max);
                if overlaps_vertically(token.y, token.y + token.height, top, bottom) {
                    group.push(token.clone());
                    true
                } else {
                    false
                }
            }
            None => false,
        };
        if !joined {
            groups.push(vec![token]);
        }
    }

    let mut lines = Vec::with_capacity(groups.len());
    for (line_index, mut group) in groups.into_iter().enumerate() {
        group.sort_by(|a, b| a.x.total_cmp(&b.x));

        let y = group.iter().map(|t| t.y).fold(f32::INFINITY, f32::min);
        let height = group.iter().map(|t| t.height).fold(0.0, f32::max);
        let fragments = split_fragments(&group);

        lines.push(TextLine {
            page_number: page.page_number as u32,
            line_index,
            y,
            height,
            fragments,
        });
    }

    lines
}

/// Two boxes share a line when they overlap by at least half the shorter
/// box's height.
fn overlaps_vertically(a_top: f32, a_bottom: f32, b_top: f32, b_bottom: f32) -> bool {
    let overlap = a_bottom.min(b_bottom) - a_top.max(b_top);
    let shorter = (a_bottom - a_top).min(b_bottom - b_top);
    overlap > 0.5 * shorter
}

/// Merge adjacent words into fragments; a gap wider than the line's
/// column-gap threshold starts a new fragment.
fn split_fragments(tokens: &[crate::extraction::TextToken]) -> Vec<LineFragment> {
    let total_chars: usize = tokens.iter().map(|t| t.text.chars().count()).sum();
    let total_width: f32 = tokens.iter().map(|t| t.width).sum();
    let char_width = if total_chars > 0 {
        total_width / total_chars as f32
    } else {
        0.0
    };
    let gap_threshold = (GAP_FACTOR * char_width).max(MIN_COLUMN_GAP);

    let mut fragments: Vec<LineFragment> = Vec::new();
    for token in tokens {
        match fragments.last_mut() {
            Some(frag) if token.x - (frag.x + frag.width) <= gap_threshold => {
                frag.text.push(' ');
                frag.text.push_str(&token.text);
                frag.width = (token.x + token.width) - frag.x;
            }
            _ => fragments.push(LineFragment {
                text: token.text.clone(),
                x: token.x,
                width: token.width,
            }),
        }
    }

    fragments
}
