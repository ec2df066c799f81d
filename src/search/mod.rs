//! Text search cascade
//!
//! Locates a normalized text fragment in a live document. Strategies are
//! tried in order and the first hit wins:
//!
//! 1. `NativeFind` - the platform page-find, when the document offers it
//! 2. `ExactWalk` - exact substring within a single text node
//! 3. `FuzzyWalk` - case-insensitive, any whitespace run matches any other,
//!    composed and decomposed accents match each other
//!
//! A miss in every tier is reported as `None`; callers skip the highlight.

use regex::{Regex, RegexBuilder};
use tracing::{debug, trace};
use unicode_normalization::UnicodeNormalization;

use crate::dom::{BoundaryPoint, Document, Range};
use crate::text::{byte_to_utf16, Composed};

/// Which strategy produced a hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchTier {
    NativeFind,
    ExactWalk,
    FuzzyWalk,
}

/// One tier of the cascade
pub trait SearchStrategy {
    fn tier(&self) -> SearchTier;

    /// Find `needle` in `doc`. `needle` is normalized and non-empty.
    fn locate(&self, doc: &mut Document, needle: &str) -> Option<Range>;
}

/// Platform page-find, cloned out of the selection
#[derive(Debug, Default)]
pub struct NativeFind;

impl SearchStrategy for NativeFind {
    fn tier(&self) -> SearchTier {
        SearchTier::NativeFind
    }

    fn locate(&self, doc: &mut Document, needle: &str) -> Option<Range> {
        if !doc.capabilities().native_find {
            return None;
        }

        let previous = doc.selection().cloned();
        let hit = if doc.find(needle) {
            doc.selection().cloned().filter(|r| !r.is_collapsed())
        } else {
            None
        };

        // find() moves the selection; never leave it on the hit
        doc.set_selection(None);
        if hit.is_none() {
            doc.set_selection(previous);
        }
        hit
    }
}

/// Exact substring in document order
#[derive(Debug, Default)]
pub struct ExactWalk;

impl SearchStrategy for ExactWalk {
    fn tier(&self) -> SearchTier {
        SearchTier::ExactWalk
    }

    fn locate(&self, doc: &mut Document, needle: &str) -> Option<Range> {
        doc.searchable_text_nodes().into_iter().find_map(|node| {
            let data = doc.text(node)?;
            let start = data.find(needle)?;
            Some(node_range(node, data, start, start + needle.len()))
        })
    }
}

/// Case-insensitive match with flexible whitespace
#[derive(Debug, Default)]
pub struct FuzzyWalk;

impl FuzzyWalk {
    /// `foo  bar` becomes `(?i)foo\s+bar`
    pub fn pattern(needle: &str) -> Option<Regex> {
        let words: Vec<String> = needle.split_whitespace().map(regex::escape).collect();
        if words.is_empty() {
            return None;
        }
        RegexBuilder::new(&words.join(r"\s+"))
            .case_insensitive(true)
            .build()
            .ok()
    }
}

impl SearchStrategy for FuzzyWalk {
    fn tier(&self) -> SearchTier {
        SearchTier::FuzzyWalk
    }

    fn locate(&self, doc: &mut Document, needle: &str) -> Option<Range> {
        let needle: String = needle.nfc().collect();
        let pattern = Self::pattern(&needle)?;
        doc.searchable_text_nodes().into_iter().find_map(|node| {
            let data = doc.text(node)?;
            let composed = Composed::new(data);
            let hit = pattern.find(&composed.text)?;
            let start = composed.original_start(hit.start());
            let end = composed.original_end(hit.end());
            Some(node_range(node, data, start, end))
        })
    }
}

fn node_range(node: crate::dom::NodeId, data: &str, start: usize, end: usize) -> Range {
    Range::new(
        BoundaryPoint::new(node, byte_to_utf16(data, start)),
        BoundaryPoint::new(node, byte_to_utf16(data, end)),
    )
}

/// Ordered list of search strategies
pub struct TextSearchEngine {
    strategies: Vec<Box<dyn SearchStrategy>>,
}

impl Default for TextSearchEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextSearchEngine {
    /// The standard cascade: native find, exact walk, fuzzy walk
    pub fn new() -> Self {
        Self::with_strategies(vec![
            Box::new(NativeFind),
            Box::new(ExactWalk),
            Box::new(FuzzyWalk),
        ])
    }

    pub fn with_strategies(strategies: Vec<Box<dyn SearchStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn tiers(&self) -> Vec<SearchTier> {
        self.strategies.iter().map(|s| s.tier()).collect()
    }

    /// Locate `needle`, returning the range and the tier that found it
    pub fn search(&self, doc: &mut Document, needle: &str) -> Option<(Range, SearchTier)> {
        if needle.trim().is_empty() {
            return None;
        }

        for strategy in &self.strategies {
            match strategy.locate(doc, needle) {
                Some(range) => {
                    debug!(tier = ?strategy.tier(), "text search hit");
                    return Some((range, strategy.tier()));
                }
                None => trace!(tier = ?strategy.tier(), "text search miss"),
            }
        }
        None
    }
}
