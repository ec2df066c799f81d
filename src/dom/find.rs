//! Page-find emulation (`window.find`)
//!
//! Matches case-insensitively over the concatenated page text, so a hit may
//! span several text nodes. A hit replaces the document selection.

use regex::RegexBuilder;

use super::document::{Document, NodeId};
use super::range::{BoundaryPoint, Range};
use super::NON_CONTENT_TAGS;
use crate::text::byte_to_utf16;

impl Document {
    /// Text nodes under `body` in tree order, skipping script/style subtrees
    pub fn searchable_text_nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.body()];
        while let Some(node) = stack.pop() {
            if self.is_text(node) {
                out.push(node);
                continue;
            }
            if self
                .tag(node)
                .is_some_and(|tag| NON_CONTENT_TAGS.contains(&tag))
            {
                continue;
            }
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// Select the first case-insensitive occurrence of `query`.
    ///
    /// Returns `false` when page-find is unavailable or nothing matched; the
    /// selection is left untouched in that case.
    pub fn find(&mut self, query: &str) -> bool {
        if query.is_empty() || !self.capabilities().native_find {
            return false;
        }

        let mut flat = String::new();
        let mut spans: Vec<(NodeId, usize)> = Vec::new();
        for node in self.searchable_text_nodes() {
            spans.push((node, flat.len()));
            flat.push_str(self.text(node).unwrap_or_default());
        }

        let matcher = match RegexBuilder::new(&regex::escape(query))
            .case_insensitive(true)
            .build()
        {
            Ok(re) => re,
            Err(_) => return false,
        };

        let Some(hit) = matcher.find(&flat) else {
            return false;
        };
        if hit.start() == hit.end() {
            return false;
        }

        let start = self.flat_to_point(&spans, flat.len(), hit.start(), false);
        let end = self.flat_to_point(&spans, flat.len(), hit.end(), true);
        match (start, end) {
            (Some(start), Some(end)) => {
                self.set_selection(Some(Range::new(start, end)));
                true
            }
            _ => false,
        }
    }

    /// Map a byte position in the flattened text back to a node boundary.
    ///
    /// Start positions bind to the node the position opens, end positions to
    /// the node it closes.
    fn flat_to_point(
        &self,
        spans: &[(NodeId, usize)],
        total: usize,
        position: usize,
        is_end: bool,
    ) -> Option<BoundaryPoint> {
        spans.iter().enumerate().find_map(|(i, &(node, begin))| {
            let finish = spans.get(i + 1).map(|s| s.1).unwrap_or(total);
            let inside = if is_end {
                begin < position && position <= finish
            } else {
                begin <= position && position < finish
            };
            if !inside {
                return None;
            }
            let data = self.text(node)?;
            Some(BoundaryPoint::new(node, byte_to_utf16(data, position - begin)))
        })
    }
}
