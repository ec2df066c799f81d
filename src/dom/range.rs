//! Ranges and boundary-point ordering
//!
//! Boundary points are compared in tree order following the DOM rules, which
//! is what overlap tests and text extraction are built on.

use std::cmp::Ordering;

use super::document::{Document, NodeId};
use crate::text::{utf16_slice, utf16_len};

/// A (container, offset) position in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundaryPoint {
    pub node: NodeId,
    pub offset: usize,
}

impl BoundaryPoint {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// A span between two boundary points
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Range {
    pub start: BoundaryPoint,
    pub end: BoundaryPoint,
}

impl Range {
    pub fn new(start: BoundaryPoint, end: BoundaryPoint) -> Self {
        Self { start, end }
    }

    /// A zero-length range at `point`
    pub fn collapsed_at(point: BoundaryPoint) -> Self {
        Self {
            start: point,
            end: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// The part of one text node covered by a range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSegment {
    pub node: NodeId,
    pub start: usize,
    pub end: usize,
}

impl Document {
    /// A boundary is valid when its node is connected and the offset fits
    pub fn is_valid_boundary(&self, point: BoundaryPoint) -> bool {
        self.is_connected(point.node) && point.offset <= self.node_length(point.node)
    }

    /// Build a range, rejecting invalid boundaries or a start after the end
    pub fn make_range(&self, start: BoundaryPoint, end: BoundaryPoint) -> Option<Range> {
        if !self.is_valid_boundary(start) || !self.is_valid_boundary(end) {
            return None;
        }
        match self.compare_points(start, end)? {
            Ordering::Greater => None,
            _ => Some(Range::new(start, end)),
        }
    }

    /// Whether both boundaries of a range are still valid and ordered
    pub fn is_valid_range(&self, range: &Range) -> bool {
        self.make_range(range.start, range.end).is_some()
    }

    /// Tree-order comparison of two boundary points.
    ///
    /// Returns `None` when the points live in disconnected trees.
    pub fn compare_points(&self, a: BoundaryPoint, b: BoundaryPoint) -> Option<Ordering> {
        if a.node == b.node {
            return Some(a.offset.cmp(&b.offset));
        }

        let chain_a = self.root_path(a.node);
        let chain_b = self.root_path(b.node);
        if chain_a.first() != chain_b.first() {
            return None;
        }

        let common = chain_a
            .iter()
            .zip(chain_b.iter())
            .take_while(|(x, y)| x == y)
            .count();

        if common == chain_a.len() {
            // a.node is an ancestor of b.node
            let child_index = self.index_in_parent(chain_b[common])?;
            return Some(if child_index < a.offset {
                Ordering::Greater
            } else {
                Ordering::Less
            });
        }

        if common == chain_b.len() {
            // b.node is an ancestor of a.node
            let child_index = self.index_in_parent(chain_a[common])?;
            return Some(if child_index < b.offset {
                Ordering::Less
            } else {
                Ordering::Greater
            });
        }

        let index_a = self.index_in_parent(chain_a[common])?;
        let index_b = self.index_in_parent(chain_b[common])?;
        Some(index_a.cmp(&index_b))
    }

    /// Ancestors from the top-most node down to `node` (inclusive)
    fn root_path(&self, node: NodeId) -> Vec<NodeId> {
        let mut chain = vec![node];
        let mut current = node;
        while let Some(parent) = self.parent(current) {
            chain.push(parent);
            current = parent;
        }
        chain.reverse();
        chain
    }

    /// Inclusive containment of a point within a range
    pub fn range_contains_point(&self, range: &Range, point: BoundaryPoint) -> bool {
        matches!(
            self.compare_points(range.start, point),
            Some(Ordering::Less | Ordering::Equal)
        ) && matches!(
            self.compare_points(point, range.end),
            Some(Ordering::Less | Ordering::Equal)
        )
    }

    /// Half-open containment: the point sits on a character the range covers
    pub fn range_covers_point(&self, range: &Range, point: BoundaryPoint) -> bool {
        matches!(
            self.compare_points(range.start, point),
            Some(Ordering::Less | Ordering::Equal)
        ) && self.compare_points(point, range.end) == Some(Ordering::Less)
    }

    /// Two ranges overlap when either start lies within the other range.
    ///
    /// A collapsed range is a caret in front of one character, so it overlaps
    /// only ranges covering that character: a caret at another range's end
    /// does not touch it.
    pub fn ranges_overlap(&self, a: &Range, b: &Range) -> bool {
        match (a.is_collapsed(), b.is_collapsed()) {
            (true, true) => a.start == b.start,
            (false, true) => self.range_covers_point(a, b.start),
            (true, false) => self.range_covers_point(b, a.start),
            (false, false) => {
                self.range_contains_point(a, b.start) || self.range_contains_point(b, a.start)
            }
        }
    }

    /// Text nodes touched by a range, with the covered UTF-16 span of each
    pub fn text_segments(&self, range: &Range) -> Vec<TextSegment> {
        let mut segments = Vec::new();

        for node in self.descendants(self.root()) {
            if !self.is_text(node) {
                continue;
            }
            let start = if node == range.start.node {
                range.start.offset
            } else {
                0
            };
            let end = if node == range.end.node {
                range.end.offset
            } else {
                utf16_len(self.text(node).unwrap_or_default())
            };
            if start >= end {
                continue;
            }

            let after_start = self.compare_points(BoundaryPoint::new(node, end), range.start)
                == Some(Ordering::Greater);
            let before_end = self.compare_points(BoundaryPoint::new(node, start), range.end)
                == Some(Ordering::Less);
            if after_start && before_end {
                segments.push(TextSegment { node, start, end });
            }
        }

        segments
    }

    /// The text a range covers (`Range.toString()`)
    pub fn range_text(&self, range: &Range) -> String {
        self.text_segments(range)
            .into_iter()
            .filter_map(|seg| utf16_slice(self.text(seg.node)?, seg.start, seg.end))
            .collect()
    }
}
