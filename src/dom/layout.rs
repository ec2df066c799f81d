//! Caret lookup from viewport coordinates
//!
//! `BlockLayout` is a deterministic line-box layout: every character is one
//! fixed-width glyph, block elements start a new line, lines wrap at a fixed
//! column count and leading whitespace on a line is dropped. It answers the
//! `caretPositionFromPoint` question for hit testing.

use super::document::{Document, NodeId};
use super::range::BoundaryPoint;
use super::NON_CONTENT_TAGS;

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "div", "dl", "dd", "dt", "figure", "footer",
    "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav", "ol", "p",
    "pre", "section", "table", "tr", "td", "th", "ul",
];

/// Resolves viewport coordinates to a caret position
pub trait CaretLocator {
    fn caret_at(&self, x: f64, y: f64) -> Option<BoundaryPoint>;
}

#[derive(Debug, Clone, Copy)]
pub struct LayoutMetrics {
    pub glyph_width: f64,
    pub line_height: f64,
    pub columns: usize,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            glyph_width: 8.0,
            line_height: 16.0,
            columns: 80,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Glyph {
    node: NodeId,
    offset: usize,
    units: usize,
    line: usize,
    column: usize,
}

/// Line-box layout of a document's body
#[derive(Debug, Clone)]
pub struct BlockLayout {
    metrics: LayoutMetrics,
    glyphs: Vec<Glyph>,
}

struct Cursor {
    line: usize,
    column: usize,
}

impl BlockLayout {
    pub fn compute(doc: &Document, metrics: LayoutMetrics) -> Self {
        let mut layout = Self {
            metrics,
            glyphs: Vec::new(),
        };
        let mut cursor = Cursor { line: 0, column: 0 };
        layout.place(doc, doc.body(), &mut cursor);
        layout
    }

    fn place(&mut self, doc: &Document, node: NodeId, cursor: &mut Cursor) {
        if let Some(data) = doc.text(node) {
            self.place_text(node, data, cursor);
            return;
        }

        let tag = doc.tag(node).unwrap_or_default();
        if NON_CONTENT_TAGS.contains(&tag) {
            return;
        }
        if tag == "br" {
            cursor.line += 1;
            cursor.column = 0;
            return;
        }

        let block = BLOCK_TAGS.contains(&tag);
        if block {
            Self::break_line(cursor);
        }
        for &child in doc.children(node) {
            self.place(doc, child, cursor);
        }
        if block {
            Self::break_line(cursor);
        }
    }

    fn place_text(&mut self, node: NodeId, data: &str, cursor: &mut Cursor) {
        let mut offset = 0;
        for ch in data.chars() {
            let units = ch.len_utf16();
            if cursor.column >= self.metrics.columns {
                Self::break_line(cursor);
            }
            if !(ch.is_whitespace() && cursor.column == 0) {
                self.glyphs.push(Glyph {
                    node,
                    offset,
                    units,
                    line: cursor.line,
                    column: cursor.column,
                });
                cursor.column += 1;
            }
            offset += units;
        }
    }

    fn break_line(cursor: &mut Cursor) {
        if cursor.column > 0 {
            cursor.line += 1;
            cursor.column = 0;
        }
    }

    pub fn line_count(&self) -> usize {
        self.glyphs.last().map(|g| g.line + 1).unwrap_or(0)
    }

    /// Viewport coordinates of the centre of the glyph at `(node, offset)`
    pub fn glyph_center(&self, node: NodeId, offset: usize) -> Option<(f64, f64)> {
        self.glyphs
            .iter()
            .find(|g| g.node == node && g.offset == offset)
            .map(|g| {
                (
                    (g.column as f64 + 0.5) * self.metrics.glyph_width,
                    (g.line as f64 + 0.5) * self.metrics.line_height,
                )
            })
    }
}

impl CaretLocator for BlockLayout {
    fn caret_at(&self, x: f64, y: f64) -> Option<BoundaryPoint> {
        if x < 0.0 || y < 0.0 {
            return None;
        }
        let line = (y / self.metrics.line_height) as usize;
        let column = (x / self.metrics.glyph_width) as usize;

        let mut last_on_line = None;
        for glyph in self.glyphs.iter().filter(|g| g.line == line) {
            if glyph.column == column {
                return Some(BoundaryPoint::new(glyph.node, glyph.offset));
            }
            last_on_line = Some(glyph);
        }

        // Past the end of the line: caret after the last glyph
        last_on_line
            .filter(|g| column > g.column)
            .map(|g| BoundaryPoint::new(g.node, g.offset + g.units))
    }
}
