//! Arena document tree
//!
//! Nodes live in a flat arena and are addressed by `NodeId`. Ranges
//! registered with `track_range` (and the selection) follow the live-range
//! rules on every mutation: insertion and removal shift offsets in the
//! parent, removal collapses boundaries inside the removed subtree onto the
//! parent, splits and merges carry boundaries to the node that now holds
//! their text.

use std::collections::{BTreeMap, HashSet};

use super::range::{BoundaryPoint, Range};
use super::{Capabilities, DomError};
use crate::text::{utf16_len, utf16_to_byte};

/// Handle to a node in a `Document`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Handle to a live range registered with a `Document`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LiveRangeId(usize);

/// Handle to a mutation observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    ChildList,
    CharacterData,
    Attributes,
}

/// A single observed mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub kind: MutationKind,
    pub target: NodeId,
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
struct Observer {
    target: NodeId,
    records: Vec<MutationRecord>,
}

/// Named highlight registry (the `CSS.highlights` analogue)
#[derive(Debug, Clone, Default)]
pub struct HighlightRegistry {
    entries: BTreeMap<String, Vec<LiveRangeId>>,
}

impl HighlightRegistry {
    pub fn add(&mut self, name: &str, range: LiveRangeId) {
        let ranges = self.entries.entry(name.to_string()).or_default();
        if !ranges.contains(&range) {
            ranges.push(range);
        }
    }

    /// Remove a range from a named highlight, dropping the name when empty
    pub fn remove(&mut self, name: &str, range: LiveRangeId) -> bool {
        let Some(ranges) = self.entries.get_mut(name) else {
            return false;
        };
        let before = ranges.len();
        ranges.retain(|r| *r != range);
        let removed = ranges.len() != before;
        if ranges.is_empty() {
            self.entries.remove(name);
        }
        removed
    }

    pub fn ranges(&self, name: &str) -> &[LiveRangeId] {
        self.entries.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Total number of registered ranges across all names
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A document: `html` root with a single `body`
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
    root: NodeId,
    body: NodeId,
    live_ranges: Vec<Option<Range>>,
    observers: Vec<Option<Observer>>,
    selection: Option<Range>,
    highlights: HighlightRegistry,
    capabilities: Capabilities,
    overlays: HashSet<NodeId>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document (`<html><body></body></html>`)
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            body: NodeId(0),
            live_ranges: Vec::new(),
            observers: Vec::new(),
            selection: None,
            highlights: HighlightRegistry::default(),
            capabilities: Capabilities::default(),
            overlays: HashSet::new(),
        };
        let root = doc.create_element("html");
        let body = doc.create_element("body");
        doc.nodes[root.0].children.push(body);
        doc.nodes[body.0].parent = Some(root);
        doc.root = root;
        doc.body = body;
        doc
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub fn kind(&self, node: NodeId) -> &NodeKind {
        &self.nodes[node.0].kind
    }

    /// Lowercase tag name, `None` for text nodes
    pub fn tag(&self, node: NodeId) -> Option<&str> {
        match &self.nodes[node.0].kind {
            NodeKind::Element { tag, .. } => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    /// Text data, `None` for elements
    pub fn text(&self, node: NodeId) -> Option<&str> {
        match &self.nodes[node.0].kind {
            NodeKind::Text(data) => Some(data),
            NodeKind::Element { .. } => None,
        }
    }

    pub fn is_text(&self, node: NodeId) -> bool {
        matches!(self.nodes[node.0].kind, NodeKind::Text(_))
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        !self.is_text(node)
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        match &self.nodes[node.0].kind {
            NodeKind::Element { attributes, .. } => attributes
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            NodeKind::Text(_) => None,
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    pub fn element_children(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(node)
            .iter()
            .copied()
            .filter(move |c| self.is_element(*c))
    }

    pub fn text_children(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(node)
            .iter()
            .copied()
            .filter(move |c| self.is_text(*c))
    }

    pub fn index_in_parent(&self, node: NodeId) -> Option<usize> {
        let parent = self.parent(node)?;
        self.children(parent).iter().position(|c| *c == node)
    }

    /// Boundary length: UTF-16 units for text, child count for elements
    pub fn node_length(&self, node: NodeId) -> usize {
        match &self.nodes[node.0].kind {
            NodeKind::Text(data) => utf16_len(data),
            NodeKind::Element { .. } => self.nodes[node.0].children.len(),
        }
    }

    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    /// Whether the node is attached under the document root
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.is_inclusive_ancestor(self.root, node)
    }

    /// Inclusive descendants in tree order
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.children(n).iter().rev().copied());
        }
        out
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, node: NodeId) -> String {
        self.descendants(node)
            .into_iter()
            .filter_map(|n| self.text(n))
            .collect()
    }

    // ------------------------------------------------------------------
    // Node creation
    // ------------------------------------------------------------------

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push_node(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
        })
    }

    /// Create a detached text node
    pub fn create_text(&mut self, data: &str) -> NodeId {
        self.push_node(NodeKind::Text(data.to_string()))
    }

    fn push_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        match &mut self.nodes[node.0].kind {
            NodeKind::Element { attributes, .. } => {
                match attributes.iter_mut().find(|(k, _)| k == name) {
                    Some(entry) => entry.1 = value.to_string(),
                    None => attributes.push((name.to_string(), value.to_string())),
                }
            }
            NodeKind::Text(_) => return Err(DomError::NotAnElement(node)),
        }
        self.queue_record(MutationKind::Attributes, node);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Tree mutations
    // ------------------------------------------------------------------

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` under `parent` before `reference` (append when `None`)
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        if self.is_text(parent) {
            return Err(DomError::NotAnElement(parent));
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest { parent, node: child });
        }
        if let Some(reference) = reference {
            if self.parent(reference) != Some(parent) {
                return Err(DomError::NotAChild {
                    parent,
                    node: reference,
                });
            }
        }

        // Inserting a node before itself means before its next sibling
        let reference = match reference {
            Some(r) if r == child => {
                let idx = self.index_in_parent(child).unwrap_or(0);
                self.children(parent).get(idx + 1).copied()
            }
            other => other,
        };

        if self.parent(child).is_some() {
            self.remove(child)?;
        }

        let index = match reference {
            Some(r) => self
                .children(parent)
                .iter()
                .position(|c| *c == r)
                .ok_or(DomError::NotAChild { parent, node: r })?,
            None => self.children(parent).len(),
        };

        self.nodes[parent.0].children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
        self.update_boundaries(|p| {
            if p.node == parent && p.offset > index {
                p.offset += 1;
            }
        });
        self.queue_record(MutationKind::ChildList, parent);
        Ok(())
    }

    /// Detach a node from its parent
    pub fn remove(&mut self, node: NodeId) -> Result<(), DomError> {
        let parent = self.parent(node).ok_or(DomError::Detached(node))?;
        let index = self
            .index_in_parent(node)
            .ok_or(DomError::NotAChild { parent, node })?;

        let removed: HashSet<NodeId> = self.descendants(node).into_iter().collect();
        self.update_boundaries(|p| {
            if removed.contains(&p.node) {
                p.node = parent;
                p.offset = index;
            } else if p.node == parent && p.offset > index {
                p.offset -= 1;
            }
        });

        self.nodes[parent.0].children.remove(index);
        self.nodes[node.0].parent = None;
        self.queue_record(MutationKind::ChildList, parent);
        Ok(())
    }

    /// Split a text node at `offset`; the tail moves into a new sibling
    /// which is returned.
    pub fn split_text(&mut self, node: NodeId, offset: usize) -> Result<NodeId, DomError> {
        let data = self.text(node).ok_or(DomError::NotText(node))?;
        let byte = utf16_to_byte(data, offset).ok_or(DomError::OffsetOutOfRange { node, offset })?;
        let tail = data[byte..].to_string();
        let head = data[..byte].to_string();

        let new_node = self.create_text(&tail);
        let parent = self.parent(node);
        let index = self.index_in_parent(node);

        if let (Some(parent), Some(index)) = (parent, index) {
            self.nodes[parent.0].children.insert(index + 1, new_node);
            self.nodes[new_node.0].parent = Some(parent);
        }

        self.update_boundaries(|p| {
            if p.node == node && p.offset > offset {
                p.node = new_node;
                p.offset -= offset;
            } else if let (Some(parent), Some(index)) = (parent, index) {
                if p.node == parent && p.offset > index {
                    p.offset += 1;
                }
            }
        });

        self.nodes[node.0].kind = NodeKind::Text(head);
        self.queue_record(MutationKind::CharacterData, node);
        if let Some(parent) = parent {
            self.queue_record(MutationKind::ChildList, parent);
        }
        Ok(new_node)
    }

    /// Replace the data of a text node
    pub fn set_text(&mut self, node: NodeId, data: &str) -> Result<(), DomError> {
        if !self.is_text(node) {
            return Err(DomError::NotText(node));
        }
        self.nodes[node.0].kind = NodeKind::Text(data.to_string());
        self.update_boundaries(|p| {
            if p.node == node {
                p.offset = 0;
            }
        });
        self.queue_record(MutationKind::CharacterData, node);
        Ok(())
    }

    /// Put `node` inside a new `tag` element that takes its place.
    ///
    /// Boundaries inside `node` are untouched since the node itself never
    /// leaves the tree.
    pub fn wrap(&mut self, node: NodeId, tag: &str) -> Result<NodeId, DomError> {
        let parent = self.parent(node).ok_or(DomError::Detached(node))?;
        let index = self
            .index_in_parent(node)
            .ok_or(DomError::NotAChild { parent, node })?;

        let wrapper = self.create_element(tag);
        self.nodes[parent.0].children[index] = wrapper;
        self.nodes[wrapper.0].parent = Some(parent);
        self.nodes[wrapper.0].children.push(node);
        self.nodes[node.0].parent = Some(wrapper);

        self.queue_record(MutationKind::ChildList, parent);
        self.queue_record(MutationKind::ChildList, wrapper);
        Ok(wrapper)
    }

    /// Flag an element inserted for presentation only.
    ///
    /// Structural addresses look through overlays as if their children sat
    /// directly in the parent.
    pub fn set_overlay(&mut self, element: NodeId) {
        if self.is_element(element) {
            self.overlays.insert(element);
        }
    }

    pub fn is_overlay(&self, node: NodeId) -> bool {
        self.overlays.contains(&node)
    }

    /// Replace an element by its children
    pub fn unwrap(&mut self, element: NodeId) -> Result<(), DomError> {
        if self.is_text(element) {
            return Err(DomError::NotAnElement(element));
        }
        let parent = self.parent(element).ok_or(DomError::Detached(element))?;
        let index = self
            .index_in_parent(element)
            .ok_or(DomError::NotAChild { parent, node: element })?;

        let children = std::mem::take(&mut self.nodes[element.0].children);
        let count = children.len();
        for child in &children {
            self.nodes[child.0].parent = Some(parent);
        }
        self.nodes[parent.0]
            .children
            .splice(index..=index, children.iter().copied());
        self.nodes[element.0].parent = None;
        self.overlays.remove(&element);

        self.update_boundaries(|p| {
            if p.node == element {
                p.node = parent;
                p.offset += index;
            } else if p.node == parent && p.offset > index {
                p.offset = p.offset + count - 1;
            }
        });

        self.queue_record(MutationKind::ChildList, parent);
        Ok(())
    }

    /// Merge adjacent text nodes and drop empty ones below `node`
    pub fn normalize(&mut self, node: NodeId) -> Result<(), DomError> {
        let elements: Vec<NodeId> = self
            .descendants(node)
            .into_iter()
            .filter(|n| self.is_element(*n))
            .collect();

        for element in elements {
            let mut i = 0;
            while i < self.children(element).len() {
                let child = self.children(element)[i];
                if self.text(child).is_some_and(str::is_empty) {
                    self.remove(child)?;
                    continue;
                }
                if self.is_text(child) {
                    loop {
                        let next = match self.children(element).get(i + 1) {
                            Some(&next) if self.is_text(next) => next,
                            _ => break,
                        };
                        self.merge_into(child, next)?;
                    }
                }
                i += 1;
            }
        }
        Ok(())
    }

    /// Append `next`'s data to `node` and remove `next`
    fn merge_into(&mut self, node: NodeId, next: NodeId) -> Result<(), DomError> {
        let parent = self.parent(next).ok_or(DomError::Detached(next))?;
        let next_index = self
            .index_in_parent(next)
            .ok_or(DomError::NotAChild { parent, node: next })?;
        let length = self.node_length(node);
        let tail = self.text(next).ok_or(DomError::NotText(next))?.to_string();

        if let NodeKind::Text(data) = &mut self.nodes[node.0].kind {
            data.push_str(&tail);
        }

        self.update_boundaries(|p| {
            if p.node == next {
                p.node = node;
                p.offset += length;
            } else if p.node == parent && p.offset == next_index {
                p.node = node;
                p.offset = length;
            }
        });
        self.queue_record(MutationKind::CharacterData, node);
        self.remove(next)
    }

    // ------------------------------------------------------------------
    // Live ranges and selection
    // ------------------------------------------------------------------

    /// Register a range that follows subsequent mutations
    pub fn track_range(&mut self, range: Range) -> LiveRangeId {
        if let Some(slot) = self.live_ranges.iter().position(Option::is_none) {
            self.live_ranges[slot] = Some(range);
            return LiveRangeId(slot);
        }
        self.live_ranges.push(Some(range));
        LiveRangeId(self.live_ranges.len() - 1)
    }

    pub fn live_range(&self, id: LiveRangeId) -> Option<&Range> {
        self.live_ranges.get(id.0).and_then(Option::as_ref)
    }

    pub fn untrack_range(&mut self, id: LiveRangeId) -> Option<Range> {
        self.live_ranges.get_mut(id.0).and_then(Option::take)
    }

    pub fn selection(&self) -> Option<&Range> {
        self.selection.as_ref()
    }

    pub fn set_selection(&mut self, range: Option<Range>) {
        self.selection = range;
    }

    pub fn clear_selection(&mut self) -> Option<Range> {
        self.selection.take()
    }

    fn update_boundaries(&mut self, mut update: impl FnMut(&mut BoundaryPoint)) {
        let ranges = self
            .live_ranges
            .iter_mut()
            .flatten()
            .chain(self.selection.iter_mut());
        for range in ranges {
            update(&mut range.start);
            update(&mut range.end);
        }
    }

    // ------------------------------------------------------------------
    // Highlight registry
    // ------------------------------------------------------------------

    pub fn highlights(&self) -> &HighlightRegistry {
        &self.highlights
    }

    pub fn highlights_mut(&mut self) -> &mut HighlightRegistry {
        &mut self.highlights
    }

    // ------------------------------------------------------------------
    // Mutation observers
    // ------------------------------------------------------------------

    /// Observe child-list, character-data and attribute changes in a subtree
    pub fn observe(&mut self, target: NodeId) -> ObserverId {
        let observer = Observer {
            target,
            records: Vec::new(),
        };
        if let Some(slot) = self.observers.iter().position(Option::is_none) {
            self.observers[slot] = Some(observer);
            return ObserverId(slot);
        }
        self.observers.push(Some(observer));
        ObserverId(self.observers.len() - 1)
    }

    /// Drain the records queued for an observer
    pub fn take_records(&mut self, id: ObserverId) -> Vec<MutationRecord> {
        self.observers
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .map(|o| std::mem::take(&mut o.records))
            .unwrap_or_default()
    }

    pub fn disconnect(&mut self, id: ObserverId) {
        if let Some(slot) = self.observers.get_mut(id.0) {
            *slot = None;
        }
    }

    fn queue_record(&mut self, kind: MutationKind, target: NodeId) {
        let matching: Vec<usize> = self
            .observers
            .iter()
            .enumerate()
            .filter_map(|(i, o)| {
                o.as_ref()
                    .filter(|o| self.is_inclusive_ancestor(o.target, target))
                    .map(|_| i)
            })
            .collect();

        for i in matching {
            if let Some(observer) = self.observers[i].as_mut() {
                observer.records.push(MutationRecord { kind, target });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph(doc: &mut Document, text: &str) -> (NodeId, NodeId) {
        let p = doc.create_element("p");
        let t = doc.create_text(text);
        doc.append_child(p, t).unwrap();
        doc.append_child(doc.body(), p).unwrap();
        (p, t)
    }

    fn point(node: NodeId, offset: usize) -> BoundaryPoint {
        BoundaryPoint { node, offset }
    }

    #[test]
    fn test_new_document_shape() {
        let doc = Document::new();
        assert_eq!(doc.tag(doc.root()), Some("html"));
        assert_eq!(doc.tag(doc.body()), Some("body"));
        assert_eq!(doc.parent(doc.body()), Some(doc.root()));
    }

    #[test]
    fn test_split_text_moves_live_boundaries() {
        let mut doc = Document::new();
        let (p, t) = paragraph(&mut doc, "hello world");
        let live = doc.track_range(Range::new(point(t, 2), point(t, 9)));

        let tail = doc.split_text(t, 6).unwrap();

        assert_eq!(doc.text(t), Some("hello "));
        assert_eq!(doc.text(tail), Some("world"));
        assert_eq!(doc.children(p), &[t, tail]);
        let range = doc.live_range(live).unwrap();
        assert_eq!(range.start, point(t, 2));
        assert_eq!(range.end, point(tail, 3));
    }

    #[test]
    fn test_remove_collapses_boundaries_to_parent() {
        let mut doc = Document::new();
        let (_, first) = paragraph(&mut doc, "one");
        let (second_p, _) = paragraph(&mut doc, "two");
        let live = doc.track_range(Range::new(point(first, 1), point(doc.body(), 2)));

        let first_p = doc.parent(first).unwrap();
        doc.remove(first_p).unwrap();

        let range = doc.live_range(live).unwrap();
        assert_eq!(range.start, point(doc.body(), 0));
        assert_eq!(range.end, point(doc.body(), 1));
        assert_eq!(doc.children(doc.body()), &[second_p]);
        assert!(!doc.is_connected(first));
    }

    #[test]
    fn test_wrap_and_unwrap_keep_text_boundaries() {
        let mut doc = Document::new();
        let (p, t) = paragraph(&mut doc, "hello world");
        let live = doc.track_range(Range::new(point(t, 0), point(t, 5)));

        let mark = doc.wrap(t, "mark").unwrap();
        assert_eq!(doc.children(p), &[mark]);
        assert_eq!(doc.parent(t), Some(mark));
        assert_eq!(doc.live_range(live).unwrap().end, point(t, 5));

        doc.unwrap(mark).unwrap();
        assert_eq!(doc.children(p), &[t]);
        assert_eq!(doc.parent(t), Some(p));
        assert_eq!(doc.live_range(live).unwrap().end, point(t, 5));
    }

    #[test]
    fn test_normalize_merges_text_and_moves_boundaries() {
        let mut doc = Document::new();
        let (p, t) = paragraph(&mut doc, "hello world");
        let tail = doc.split_text(t, 6).unwrap();
        let live = doc.track_range(Range::new(point(tail, 1), point(tail, 5)));

        doc.normalize(p).unwrap();

        assert_eq!(doc.children(p), &[t]);
        assert_eq!(doc.text(t), Some("hello world"));
        let range = doc.live_range(live).unwrap();
        assert_eq!(range.start, point(t, 7));
        assert_eq!(range.end, point(t, 11));
    }

    #[test]
    fn test_insert_shifts_parent_offsets() {
        let mut doc = Document::new();
        paragraph(&mut doc, "one");
        let body = doc.body();
        let live = doc.track_range(Range::new(point(body, 0), point(body, 1)));

        let ad = doc.create_element("div");
        let first = doc.children(body)[0];
        doc.insert_before(body, ad, Some(first)).unwrap();

        let range = doc.live_range(live).unwrap();
        assert_eq!(range.start, point(body, 0));
        assert_eq!(range.end, point(body, 2));
    }

    #[test]
    fn test_insert_rejects_cycles() {
        let mut doc = Document::new();
        let (p, _) = paragraph(&mut doc, "x");
        let body = doc.body();
        assert!(matches!(
            doc.append_child(p, body),
            Err(DomError::HierarchyRequest { .. })
        ));
    }

    #[test]
    fn test_observer_sees_subtree_mutations_only() {
        let mut doc = Document::new();
        let (p, t) = paragraph(&mut doc, "text");
        let observer = doc.observe(p);

        doc.set_text(t, "changed").unwrap();
        let outside = doc.create_element("div");
        doc.append_child(doc.body(), outside).unwrap();

        let records = doc.take_records(observer);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, MutationKind::CharacterData);
        assert!(doc.take_records(observer).is_empty());

        doc.disconnect(observer);
        doc.set_text(t, "again").unwrap();
        assert!(doc.take_records(observer).is_empty());
    }

    #[test]
    fn test_highlight_registry() {
        let mut doc = Document::new();
        let (_, t) = paragraph(&mut doc, "text");
        let live = doc.track_range(Range::new(point(t, 0), point(t, 4)));

        doc.highlights_mut().add("hl-yellow", live);
        doc.highlights_mut().add("hl-yellow", live);
        assert_eq!(doc.highlights().len(), 1);
        assert!(doc.highlights_mut().remove("hl-yellow", live));
        assert!(doc.highlights().is_empty());
    }
}
