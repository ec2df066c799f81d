//! Path encoding and resolution against a live document
//!
//! Addresses are logical: overlay elements (our own `<mark>` wrappers) are
//! looked through, and adjacent text nodes count as one text child. A path
//! written while highlights are rendered therefore stays valid once they
//! are removed, and on a fresh load of the page.

use tracing::trace;

use super::types::{NodePath, PathStep};
use crate::dom::{BoundaryPoint, Document, NodeId};

/// A child as the unmarked page would have it
enum Logical {
    Element(NodeId),
    /// Adjacent text nodes, in order; never empty
    Text(Vec<NodeId>),
}

/// Children of `parent` with overlays replaced by their own children
fn flattened(doc: &Document, parent: NodeId, out: &mut Vec<NodeId>) {
    for &child in doc.children(parent) {
        if doc.is_overlay(child) {
            flattened(doc, child, out);
        } else {
            out.push(child);
        }
    }
}

fn logical_children(doc: &Document, parent: NodeId) -> Vec<Logical> {
    let mut children = Vec::new();
    flattened(doc, parent, &mut children);

    let mut items: Vec<Logical> = Vec::new();
    for child in children {
        if !doc.is_text(child) {
            items.push(Logical::Element(child));
        } else if let Some(Logical::Text(run)) = items.last_mut() {
            run.push(child);
        } else {
            items.push(Logical::Text(vec![child]));
        }
    }
    items
}

fn element_items(doc: &Document, parent: NodeId) -> impl Iterator<Item = NodeId> {
    logical_children(doc, parent)
        .into_iter()
        .filter_map(|item| match item {
            Logical::Element(node) => Some(node),
            Logical::Text(_) => None,
        })
}

fn text_runs(doc: &Document, parent: NodeId) -> impl Iterator<Item = Vec<NodeId>> {
    logical_children(doc, parent)
        .into_iter()
        .filter_map(|item| match item {
            Logical::Text(run) => Some(run),
            Logical::Element(_) => None,
        })
}

/// Nearest ancestor that is not an overlay
fn logical_parent(doc: &Document, node: NodeId) -> Option<NodeId> {
    let mut parent = doc.parent(node)?;
    while doc.is_overlay(parent) {
        parent = doc.parent(parent)?;
    }
    Some(parent)
}

/// Address `node` relative to `body`.
///
/// Returns `None` for unaddressable nodes: anything whose ancestor chain
/// ends before reaching `body` (detached nodes, nodes under `head`) and
/// overlays themselves. A text node is addressed by the text run it
/// belongs to.
pub fn encode_path(doc: &Document, node: NodeId) -> Option<NodePath> {
    let body = doc.body();
    let mut steps = Vec::new();
    let mut current = node;

    while current != body {
        let parent = logical_parent(doc, current)?;
        let step = if doc.is_text(current) {
            let index = text_runs(doc, parent).position(|run| run.contains(&current))?;
            PathStep::Text { index }
        } else {
            let index = element_items(doc, parent).position(|c| c == current)?;
            PathStep::Element {
                tag: doc.tag(current).unwrap_or_default().to_string(),
                index,
            }
        };
        steps.push(step);
        current = parent;
    }

    steps.reverse();
    Some(NodePath::with_steps(steps))
}

/// Address a boundary point.
///
/// For a text container the offset is counted from the start of its text
/// run, so it does not depend on how rendering split the run.
pub fn encode_point(doc: &Document, point: BoundaryPoint) -> Option<(NodePath, usize)> {
    let path = encode_path(doc, point.node)?;
    if !doc.is_text(point.node) {
        return Some((path, point.offset));
    }

    let parent = logical_parent(doc, point.node)?;
    let run = text_runs(doc, parent).find(|run| run.contains(&point.node))?;
    let before: usize = run
        .iter()
        .take_while(|n| **n != point.node)
        .map(|n| doc.node_length(*n))
        .sum();
    Some((path, before + point.offset))
}

/// Walk a path down from `body`.
///
/// An element step whose recorded index no longer points at an element of
/// the recorded tag falls back to the first child with that tag, which
/// absorbs sibling insertions and deletions. Text steps are exact and land
/// on the first node of the run. `None` means the path no longer resolves
/// and callers should search by content.
pub fn resolve_path(doc: &Document, path: &NodePath) -> Option<NodeId> {
    let mut current = doc.body();

    for (depth, step) in path.steps.iter().enumerate() {
        current = match step {
            PathStep::Element { tag, index } => {
                let same_tag = |c: &NodeId| doc.tag(*c).is_some_and(|t| t.eq_ignore_ascii_case(tag));
                match element_items(doc, current).nth(*index).filter(same_tag) {
                    Some(child) => child,
                    None => {
                        let recovered = element_items(doc, current).find(same_tag);
                        trace!(depth, %step, recovered = recovered.is_some(), "element index miss");
                        recovered?
                    }
                }
            }
            PathStep::Text { index } => *text_runs(doc, current).nth(*index)?.first()?,
        };
    }

    Some(current)
}

/// Resolve an address written by `encode_point`.
///
/// A text offset is located within the run; an offset that falls exactly
/// between two nodes of a run lands at the start of the later one, the end
/// of the run stays on the last node.
pub fn resolve_point(doc: &Document, path: &NodePath, offset: usize) -> Option<BoundaryPoint> {
    let Some((PathStep::Text { index }, parents)) = path.steps.split_last() else {
        let node = resolve_path(doc, path)?;
        return (offset <= doc.node_length(node)).then_some(BoundaryPoint::new(node, offset));
    };

    let parent = resolve_path(doc, &NodePath::with_steps(parents.to_vec()))?;
    let run = text_runs(doc, parent).nth(*index)?;
    let mut remaining = offset;
    for (i, &node) in run.iter().enumerate() {
        let length = doc.node_length(node);
        if remaining < length || (remaining == length && i + 1 == run.len()) {
            return Some(BoundaryPoint::new(node, remaining));
        }
        remaining -= length;
    }
    None
}
