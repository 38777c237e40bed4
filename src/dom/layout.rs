/// Naive text layout for the prototype rasterizer
///
/// The dom backend approximates an element's rendered extent from its text
/// content: fixed-width character cells wrapped into lines, with a small
/// uniform padding. This stands in for real layout; it is not one.

#[derive(Debug, Clone, PartialEq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Character cell width in pixels
pub const CHAR_WIDTH: u32 = 8;
/// Line height in pixels
pub const LINE_HEIGHT: u32 = 8;
/// Padding around the text block in pixels
pub const PADDING: u32 = 8;

/// Wrapped text lines plus the box they occupy
#[derive(Debug, Clone)]
pub struct TextLayout {
    pub lines: Vec<String>,
    pub rect: Rect,
}

/// Wrap `text` into character-cell lines for the given box width.
///
/// The resulting rect spans the full `max_width`; height grows with the
/// wrapped line count. An element with no text still occupies one empty
/// line so captures never collapse to nothing.
pub fn layout_text(text: &str, max_width: u32) -> TextLayout {
    let content_w = max_width.saturating_sub(PADDING * 2).max(CHAR_WIDTH);
    let chars_per_line = (content_w / CHAR_WIDTH).max(1) as usize;

    let mut lines = Vec::new();
    let mut cur = String::new();
    for word in text.split_whitespace() {
        if cur.len() + word.len() + 1 > chars_per_line && !cur.is_empty() {
            lines.push(cur);
            cur = word.to_string();
        } else {
            if !cur.is_empty() {
                cur.push(' ');
            }
            cur.push_str(word);
        }
    }
    if !cur.is_empty() {
        lines.push(cur);
    }

    let line_count = (lines.len() as u32).max(1);
    let height = line_count * LINE_HEIGHT + PADDING * 2;

    TextLayout {
        lines,
        rect: Rect {
            x: 0,
            y: 0,
            width: max_width,
            height,
        },
    }
}
