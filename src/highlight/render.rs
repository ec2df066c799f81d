//! Highlight rendering
//!
//! Two interchangeable strategies behind `HighlightRenderer`:
//!
//! - `NativeRenderer` registers the live range under a named highlight
//!   (`{prefix}-{color}`) and never touches the tree
//! - `MarkRenderer` wraps each covered text segment in a `<mark>` and undoes
//!   that on removal, merging the split text back together
//!
//! The strategy is picked once per store from the document capabilities.

use tracing::{debug, warn};

use super::types::{HighlightColor, HighlightId};
use crate::config::{RenderConfig, RenderMode};
use crate::dom::{Capabilities, Document, LiveRangeId, NodeId};
use crate::error::{HighlightError, Result};

/// What a render left behind, needed to undo it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderHandle {
    Native { name: String, range: LiveRangeId },
    Marks { marks: Vec<NodeId> },
}

impl RenderHandle {
    pub fn marks(&self) -> &[NodeId] {
        match self {
            RenderHandle::Marks { marks } => marks,
            RenderHandle::Native { .. } => &[],
        }
    }
}

pub trait HighlightRenderer {
    fn render(
        &self,
        doc: &mut Document,
        id: HighlightId,
        color: HighlightColor,
        range: LiveRangeId,
    ) -> Result<RenderHandle>;

    fn unrender(&self, doc: &mut Document, handle: &RenderHandle) -> Result<()>;

    /// Switch an existing render to `color`
    fn recolor(
        &self,
        doc: &mut Document,
        handle: &RenderHandle,
        id: HighlightId,
        color: HighlightColor,
        range: LiveRangeId,
    ) -> Result<RenderHandle> {
        self.unrender(doc, handle)?;
        self.render(doc, id, color, range)
    }
}

/// Pick the renderer for a document
pub fn renderer_for(capabilities: Capabilities, config: &RenderConfig) -> Box<dyn HighlightRenderer> {
    let native = match config.mode {
        RenderMode::Auto => capabilities.native_highlights,
        RenderMode::Native if !capabilities.native_highlights => {
            warn!("native highlights requested but unavailable, using marks");
            false
        }
        RenderMode::Native => true,
        RenderMode::Marks => false,
    };

    if native {
        debug!("rendering with native highlights");
        Box::new(NativeRenderer::new(&config.class_prefix))
    } else {
        debug!("rendering with marks");
        Box::new(MarkRenderer::new(config))
    }
}

/// Named highlight registry renderer
#[derive(Debug, Clone)]
pub struct NativeRenderer {
    class_prefix: String,
}

impl NativeRenderer {
    pub fn new(class_prefix: &str) -> Self {
        Self {
            class_prefix: class_prefix.to_string(),
        }
    }

    pub fn highlight_name(&self, color: HighlightColor) -> String {
        format!("{}-{}", self.class_prefix, color)
    }
}

impl HighlightRenderer for NativeRenderer {
    fn render(
        &self,
        doc: &mut Document,
        _id: HighlightId,
        color: HighlightColor,
        range: LiveRangeId,
    ) -> Result<RenderHandle> {
        if doc.live_range(range).is_none() {
            return Err(HighlightError::InvalidRange);
        }
        let name = self.highlight_name(color);
        doc.highlights_mut().add(&name, range);
        Ok(RenderHandle::Native { name, range })
    }

    fn unrender(&self, doc: &mut Document, handle: &RenderHandle) -> Result<()> {
        if let RenderHandle::Native { name, range } = handle {
            doc.highlights_mut().remove(name, *range);
        }
        Ok(())
    }
}

/// `<mark>` wrapping renderer
#[derive(Debug, Clone)]
pub struct MarkRenderer {
    class_prefix: String,
    id_attribute: String,
    inline_styles: bool,
}

impl MarkRenderer {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            class_prefix: config.class_prefix.clone(),
            id_attribute: config.id_attribute.clone(),
            inline_styles: config.inline_styles,
        }
    }

    fn class(&self, color: HighlightColor) -> String {
        format!("{} {}-{}", self.class_prefix, self.class_prefix, color)
    }

    fn style_mark(&self, doc: &mut Document, mark: NodeId, color: HighlightColor) -> Result<()> {
        doc.set_attribute(mark, "class", &self.class(color))?;
        if self.inline_styles {
            doc.set_attribute(mark, "style", &format!("background-color: {};", color.css()))?;
        }
        Ok(())
    }
}

impl HighlightRenderer for MarkRenderer {
    fn render(
        &self,
        doc: &mut Document,
        id: HighlightId,
        color: HighlightColor,
        range: LiveRangeId,
    ) -> Result<RenderHandle> {
        let range = doc.live_range(range).cloned().ok_or(HighlightError::InvalidRange)?;

        let mut marks = Vec::new();
        for segment in doc.text_segments(&range) {
            let covered = doc
                .text(segment.node)
                .and_then(|t| crate::text::utf16_slice(t, segment.start, segment.end))
                .unwrap_or_default();
            // Whitespace between blocks would produce empty-looking marks
            if covered.trim().is_empty() {
                continue;
            }

            if segment.end < doc.node_length(segment.node) {
                doc.split_text(segment.node, segment.end)?;
            }
            let node = if segment.start > 0 {
                doc.split_text(segment.node, segment.start)?
            } else {
                segment.node
            };

            let mark = doc.wrap(node, "mark")?;
            doc.set_overlay(mark);
            self.style_mark(doc, mark, color)?;
            doc.set_attribute(mark, &self.id_attribute, &id.to_string())?;
            marks.push(mark);
        }

        if marks.is_empty() {
            return Err(HighlightError::EmptyText);
        }
        Ok(RenderHandle::Marks { marks })
    }

    fn unrender(&self, doc: &mut Document, handle: &RenderHandle) -> Result<()> {
        for &mark in handle.marks() {
            let Some(parent) = doc.parent(mark) else {
                // already gone with its subtree
                continue;
            };
            doc.unwrap(mark)?;
            doc.normalize(parent)?;
        }
        Ok(())
    }

    fn recolor(
        &self,
        doc: &mut Document,
        handle: &RenderHandle,
        _id: HighlightId,
        color: HighlightColor,
        _range: LiveRangeId,
    ) -> Result<RenderHandle> {
        for &mark in handle.marks() {
            self.style_mark(doc, mark, color)?;
        }
        Ok(handle.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{BoundaryPoint, Range};

    fn page() -> (Document, NodeId) {
        let doc = Document::parse_html("<body><p>alpha beta gamma</p></body>");
        let node = doc.searchable_text_nodes()[0];
        (doc, node)
    }

    fn id(n: u64) -> HighlightId {
        HighlightId::new(n).unwrap()
    }

    #[test]
    fn test_native_render_registers_name() {
        let (mut doc, node) = page();
        let live = doc.track_range(Range::new(
            BoundaryPoint::new(node, 6),
            BoundaryPoint::new(node, 10),
        ));
        let renderer = NativeRenderer::new("hl");
        let handle = renderer.render(&mut doc, id(1), HighlightColor::Green, live).unwrap();
        assert_eq!(doc.highlights().ranges("hl-green"), &[live]);

        let handle = renderer
            .recolor(&mut doc, &handle, id(1), HighlightColor::Pink, live)
            .unwrap();
        assert!(doc.highlights().ranges("hl-green").is_empty());
        assert_eq!(doc.highlights().ranges("hl-pink"), &[live]);

        renderer.unrender(&mut doc, &handle).unwrap();
        assert!(doc.highlights().is_empty());
    }

    #[test]
    fn test_mark_render_and_unrender() {
        let (mut doc, node) = page();
        let live = doc.track_range(Range::new(
            BoundaryPoint::new(node, 6),
            BoundaryPoint::new(node, 10),
        ));
        let renderer = MarkRenderer::new(&RenderConfig::default());
        let handle = renderer.render(&mut doc, id(3), HighlightColor::Blue, live).unwrap();

        let mark = handle.marks()[0];
        assert_eq!(doc.tag(mark), Some("mark"));
        assert_eq!(doc.attribute(mark, "class"), Some("hl hl-blue"));
        assert_eq!(doc.attribute(mark, "data-highlight-id"), Some("h3"));
        assert_eq!(doc.text_content(mark), "beta");

        let range = doc.live_range(live).unwrap().clone();
        assert_eq!(doc.range_text(&range), "beta");

        renderer.unrender(&mut doc, &handle).unwrap();
        let p = doc.element_children(doc.body()).next().unwrap();
        assert_eq!(doc.children(p).len(), 1);
        assert_eq!(doc.text(doc.children(p)[0]), Some("alpha beta gamma"));

        let range = doc.live_range(live).unwrap().clone();
        assert_eq!(doc.range_text(&range), "beta");
    }

    #[test]
    fn test_mark_render_across_elements() {
        let mut doc = Document::parse_html("<body><p>one <b>two</b> three</p></body>");
        let texts = doc.searchable_text_nodes();
        let live = doc.track_range(Range::new(
            BoundaryPoint::new(texts[0], 2),
            BoundaryPoint::new(texts[2], 3),
        ));
        let renderer = MarkRenderer::new(&RenderConfig::default());
        let handle = renderer.render(&mut doc, id(1), HighlightColor::Yellow, live).unwrap();
        assert_eq!(handle.marks().len(), 3);

        let range = doc.live_range(live).unwrap().clone();
        assert_eq!(doc.range_text(&range), "e two th");

        renderer.unrender(&mut doc, &handle).unwrap();
        assert_eq!(doc.text_content(doc.body()), "one two three");
        assert_eq!(doc.searchable_text_nodes().len(), 3);
    }

    #[test]
    fn test_mark_recolor_keeps_marks() {
        let (mut doc, node) = page();
        let live = doc.track_range(Range::new(
            BoundaryPoint::new(node, 0),
            BoundaryPoint::new(node, 5),
        ));
        let renderer = MarkRenderer::new(&RenderConfig::default());
        let handle = renderer.render(&mut doc, id(1), HighlightColor::Yellow, live).unwrap();
        let recolored = renderer
            .recolor(&mut doc, &handle, id(1), HighlightColor::Pink, live)
            .unwrap();
        assert_eq!(recolored, handle);
        assert_eq!(doc.attribute(handle.marks()[0], "class"), Some("hl hl-pink"));
    }

    #[test]
    fn test_renderer_selection() {
        let config = RenderConfig::default();
        let mut doc = Document::new();
        let t = doc.create_text("x");
        doc.append_child(doc.body(), t).unwrap();
        let live = doc.track_range(Range::new(BoundaryPoint::new(t, 0), BoundaryPoint::new(t, 1)));

        let native = renderer_for(Capabilities::default(), &config);
        let handle = native.render(&mut doc, id(1), HighlightColor::Yellow, live).unwrap();
        assert!(matches!(handle, RenderHandle::Native { .. }));
        native.unrender(&mut doc, &handle).unwrap();

        let forced = RenderConfig {
            mode: RenderMode::Native,
            ..RenderConfig::default()
        };
        let fallback = renderer_for(Capabilities::minimal(), &forced);
        let handle = fallback.render(&mut doc, id(2), HighlightColor::Yellow, live).unwrap();
        assert!(matches!(handle, RenderHandle::Marks { .. }));
    }
}
