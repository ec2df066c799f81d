//! Range serialization
//!
//! A range is persisted as two structural addresses plus offsets. Restoring
//! runs an ordered list of resolvers: the structural one is O(depth) and
//! exact while the page is unchanged; text search tolerates reordering,
//! insertion and deletion of unrelated content.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dom::{BoundaryPoint, Document, Range};
use crate::highlight::HighlightRecord;
use crate::path::{encode_point, resolve_point, try_parse};
use crate::search::{SearchTier, TextSearchEngine};
use crate::text::normalize_text;

/// The structural part of a highlight record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeAnchor {
    pub start_path: String,
    pub start_offset: usize,
    pub end_path: String,
    pub end_offset: usize,
}

/// How a record was brought back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "tier")]
pub enum ResolveTier {
    Structural,
    TextSearch(SearchTier),
}

/// Encode a range's boundaries against the unmarked page structure
pub fn serialize(doc: &Document, range: &Range) -> Option<RangeAnchor> {
    let (start_path, start_offset) = encode_point(doc, range.start)?;
    let (end_path, end_offset) = encode_point(doc, range.end)?;
    Some(RangeAnchor {
        start_path: start_path.to_string(),
        start_offset,
        end_path: end_path.to_string(),
        end_offset,
    })
}

/// Pull both boundaries onto the text the range actually covers.
///
/// Element containers become text containers, so records written from any
/// range still take the structural path on restore. `None` when the range
/// covers no text.
pub fn tighten(doc: &Document, range: &Range) -> Option<Range> {
    let segments = doc.text_segments(range);
    let first = segments.first()?;
    let last = segments.last()?;
    Some(Range::new(
        BoundaryPoint::new(first.node, first.start),
        BoundaryPoint::new(last.node, last.end),
    ))
}

/// One restore strategy
pub trait AnchorResolver {
    fn resolve(&self, doc: &mut Document, record: &HighlightRecord) -> Option<(Range, ResolveTier)>;
}

/// Resolve the stored paths and check the text still matches
#[derive(Debug, Default)]
pub struct StructuralResolver;

impl StructuralResolver {
    fn boundary(doc: &Document, path: &str, offset: usize) -> Option<BoundaryPoint> {
        let Some(parsed) = try_parse(path) else {
            debug!(path, "malformed path");
            return None;
        };
        resolve_point(doc, &parsed, offset).filter(|point| doc.is_text(point.node))
    }
}

impl AnchorResolver for StructuralResolver {
    fn resolve(&self, doc: &mut Document, record: &HighlightRecord) -> Option<(Range, ResolveTier)> {
        let start = Self::boundary(doc, &record.start_path, record.start_offset)?;
        let end = Self::boundary(doc, &record.end_path, record.end_offset)?;
        let range = doc.make_range(start, end).filter(|r| !r.is_collapsed())?;

        // Paths can land on different text after unrelated edits
        if !record.text.is_empty() && normalize_text(&doc.range_text(&range)) != record.text {
            debug!(id = %record.id, "structural text mismatch");
            return None;
        }
        Some((range, ResolveTier::Structural))
    }
}

/// Search for the stored text
#[derive(Default)]
pub struct SearchResolver {
    engine: TextSearchEngine,
}

impl SearchResolver {
    pub fn new(engine: TextSearchEngine) -> Self {
        Self { engine }
    }
}

impl AnchorResolver for SearchResolver {
    fn resolve(&self, doc: &mut Document, record: &HighlightRecord) -> Option<(Range, ResolveTier)> {
        let (range, tier) = self.engine.search(doc, &record.text)?;
        Some((range, ResolveTier::TextSearch(tier)))
    }
}

/// Ordered resolver cascade
pub struct RangeSerializer {
    resolvers: Vec<Box<dyn AnchorResolver>>,
}

impl Default for RangeSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl RangeSerializer {
    /// Structural first, then text search
    pub fn new() -> Self {
        Self::with_resolvers(vec![
            Box::new(StructuralResolver),
            Box::new(SearchResolver::default()),
        ])
    }

    pub fn with_resolvers(resolvers: Vec<Box<dyn AnchorResolver>>) -> Self {
        Self { resolvers }
    }

    pub fn serialize(&self, doc: &Document, range: &Range) -> Option<RangeAnchor> {
        serialize(doc, range)
    }

    /// Rebuild a live range for `record`, or `None` when every tier misses
    pub fn deserialize(
        &self,
        doc: &mut Document,
        record: &HighlightRecord,
    ) -> Option<(Range, ResolveTier)> {
        self.resolvers
            .iter()
            .find_map(|resolver| resolver.resolve(doc, record))
    }
}
