//! Document model
//!
//! An arena-backed document tree providing the platform pieces the
//! highlighter consumes:
//!
//! - element and text nodes with a distinguished `body`
//! - live ranges kept valid across mutations
//! - subtree mutation observers
//! - a document selection and page-find
//! - a named highlight registry for native highlight rendering
//! - caret lookup from viewport coordinates (`layout`)
//!
//! All text offsets are UTF-16 code units.

mod document;
mod find;
mod layout;
mod parse;
mod range;

use thiserror::Error;

pub use document::{
    Document, HighlightRegistry, LiveRangeId, MutationKind, MutationRecord, NodeId, NodeKind,
    ObserverId,
};
pub use layout::{BlockLayout, CaretLocator, LayoutMetrics};
pub use range::{BoundaryPoint, Range, TextSegment};

/// Tags whose text never counts as page content
pub(crate) const NON_CONTENT_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Optional platform features a document offers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Page-find (`window.find`) is available
    pub native_find: bool,
    /// Named highlight registry (CSS custom highlights) is available
    pub native_highlights: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            native_find: true,
            native_highlights: true,
        }
    }
}

impl Capabilities {
    /// A platform with neither page-find nor native highlights
    pub fn minimal() -> Self {
        Self {
            native_find: false,
            native_highlights: false,
        }
    }
}

/// Errors raised by tree mutations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    #[error("Node {0:?} is not an element")]
    NotAnElement(NodeId),

    #[error("Node {0:?} is not a text node")]
    NotText(NodeId),

    #[error("Node {0:?} has no parent")]
    Detached(NodeId),

    #[error("Node {node:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, node: NodeId },

    #[error("Offset {offset} out of range for node {node:?}")]
    OffsetOutOfRange { node: NodeId, offset: usize },

    #[error("Inserting {node:?} under {parent:?} would create a cycle")]
    HierarchyRequest { parent: NodeId, node: NodeId },
}
