//! In-memory highlight store for one page
//!
//! The store is the only owner of live highlights. Every change to the
//! record set and to the rendered marks goes through `create`, `remove`,
//! `set_color` and the restore operations, so the two never drift apart.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::render::{renderer_for, HighlightRenderer, RenderHandle};
use super::types::{HighlightColor, HighlightId, HighlightRecord, IdAllocator};
use crate::anchor::{tighten, RangeSerializer, ResolveTier};
use crate::config::RenderConfig;
use crate::dom::{BoundaryPoint, Capabilities, CaretLocator, Document, LiveRangeId, Range};
use crate::error::{HighlightError, Result};
use crate::text::normalize_text;

/// A record paired with its live range and render
#[derive(Debug)]
pub struct LiveHighlight {
    pub id: HighlightId,
    pub record: HighlightRecord,
    pub range: LiveRangeId,
    pub handle: RenderHandle,
}

/// Why a stored record was not restored
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
    InvalidId,
    DuplicateId,
    Unresolved,
    RenderFailed,
}

/// Outcome of restoring one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    Restored { id: HighlightId, tier: ResolveTier },
    Skipped(SkipReason),
}

/// Aggregate outcome of a bulk restore
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreReport {
    pub restored: usize,
    pub unrestored: usize,
    /// Restores that needed text search
    pub via_search: usize,
}

impl RestoreReport {
    pub fn record(&mut self, outcome: &RestoreOutcome) {
        match outcome {
            RestoreOutcome::Restored { tier, .. } => {
                self.restored += 1;
                if matches!(tier, ResolveTier::TextSearch(_)) {
                    self.via_search += 1;
                }
            }
            RestoreOutcome::Skipped(_) => self.unrestored += 1,
        }
    }
}

pub struct HighlightStore {
    highlights: HashMap<HighlightId, LiveHighlight>,
    order: Vec<HighlightId>,
    ids: IdAllocator,
    serializer: RangeSerializer,
    renderer: Box<dyn HighlightRenderer>,
}

impl HighlightStore {
    /// Build a store, choosing the renderer once from `capabilities`
    pub fn new(capabilities: Capabilities, render: &RenderConfig) -> Self {
        Self::with_parts(RangeSerializer::new(), renderer_for(capabilities, render))
    }

    pub fn with_parts(serializer: RangeSerializer, renderer: Box<dyn HighlightRenderer>) -> Self {
        Self {
            highlights: HashMap::new(),
            order: Vec::new(),
            ids: IdAllocator::new(),
            serializer,
            renderer,
        }
    }

    /// Highlight `range`, returning `None` on invalid input
    pub fn create(
        &mut self,
        doc: &mut Document,
        range: &Range,
        color: HighlightColor,
    ) -> Option<HighlightId> {
        match self.try_create(doc, range, color) {
            Ok(id) => Some(id),
            Err(e) => {
                debug!(error = %e, "highlight rejected");
                None
            }
        }
    }

    /// Highlight `range`, reporting why it was rejected
    pub fn try_create(
        &mut self,
        doc: &mut Document,
        range: &Range,
        color: HighlightColor,
    ) -> Result<HighlightId> {
        let range = doc
            .make_range(range.start, range.end)
            .ok_or(HighlightError::InvalidRange)?;
        if range.is_collapsed() {
            return Err(HighlightError::CollapsedRange);
        }

        let range = tighten(doc, &range).ok_or(HighlightError::EmptyText)?;
        let text = normalize_text(&doc.range_text(&range));
        if text.is_empty() {
            return Err(HighlightError::EmptyText);
        }
        let anchor = self
            .serializer
            .serialize(doc, &range)
            .ok_or(HighlightError::Unaddressable)?;

        let id = self.ids.next_id();
        let record = HighlightRecord::new(id, text, color, anchor);
        self.attach(doc, id, record, range)?;
        info!(id = %id, %color, "highlight created");
        Ok(id)
    }

    /// Track, render and insert. Nothing is kept if rendering fails.
    fn attach(
        &mut self,
        doc: &mut Document,
        id: HighlightId,
        record: HighlightRecord,
        range: Range,
    ) -> Result<()> {
        let live = doc.track_range(range);
        let handle = match self.renderer.render(doc, id, record.color, live) {
            Ok(handle) => handle,
            Err(e) => {
                doc.untrack_range(live);
                return Err(e);
            }
        };

        self.highlights.insert(
            id,
            LiveHighlight {
                id,
                record,
                range: live,
                handle,
            },
        );
        self.order.push(id);
        Ok(())
    }

    /// Remove a highlight. Unknown ids are a no-op.
    pub fn remove(&mut self, doc: &mut Document, id: HighlightId) -> bool {
        let Some(live) = self.highlights.remove(&id) else {
            return false;
        };
        self.order.retain(|x| *x != id);

        if let Err(e) = self.renderer.unrender(doc, &live.handle) {
            warn!(id = %id, error = %e, "failed to remove highlight render");
        }
        doc.untrack_range(live.range);
        info!(id = %id, "highlight removed");
        true
    }

    /// Change a highlight's color. Returns `false` for unknown ids.
    pub fn set_color(&mut self, doc: &mut Document, id: HighlightId, color: HighlightColor) -> bool {
        let Some(live) = self.highlights.get_mut(&id) else {
            return false;
        };
        if live.record.color == color {
            return true;
        }

        match self
            .renderer
            .recolor(doc, &live.handle, id, color, live.range)
        {
            Ok(handle) => {
                live.handle = handle;
                live.record.color = color;
                debug!(id = %id, %color, "highlight recolored");
                true
            }
            Err(e) => {
                warn!(id = %id, error = %e, "recolor failed");
                false
            }
        }
    }

    /// Restore a single stored record
    pub fn restore_one(&mut self, doc: &mut Document, record: HighlightRecord) -> RestoreOutcome {
        let Some(id) = record.highlight_id() else {
            warn!(id = %record.id, "skipping record with invalid id");
            return RestoreOutcome::Skipped(SkipReason::InvalidId);
        };
        if self.highlights.contains_key(&id) {
            warn!(id = %id, "skipping duplicate record");
            return RestoreOutcome::Skipped(SkipReason::DuplicateId);
        }
        // Never hand this id out again, restored or not
        self.ids.observe(id);

        let Some((range, tier)) = self.serializer.deserialize(doc, &record) else {
            warn!(id = %id, "highlight could not be restored");
            return RestoreOutcome::Skipped(SkipReason::Unresolved);
        };

        match self.attach(doc, id, record, range) {
            Ok(()) => {
                debug!(id = %id, ?tier, "highlight restored");
                RestoreOutcome::Restored { id, tier }
            }
            Err(e) => {
                warn!(id = %id, error = %e, "restored highlight failed to render");
                RestoreOutcome::Skipped(SkipReason::RenderFailed)
            }
        }
    }

    /// Restore records in their stored order
    pub fn restore_all(
        &mut self,
        doc: &mut Document,
        records: impl IntoIterator<Item = HighlightRecord>,
    ) -> RestoreReport {
        let mut report = RestoreReport::default();
        for record in records {
            let outcome = self.restore_one(doc, record);
            report.record(&outcome);
        }
        info!(
            restored = report.restored,
            unrestored = report.unrestored,
            "restore finished"
        );
        report
    }

    /// The highlight under viewport point `(x, y)`, if any
    pub fn find_at_point(
        &self,
        doc: &Document,
        locator: &dyn CaretLocator,
        x: f64,
        y: f64,
    ) -> Option<HighlightId> {
        let caret = locator.caret_at(x, y)?;
        self.find_at(doc, caret)
    }

    /// The first highlight (in store order) overlapping a caret
    pub fn find_at(&self, doc: &Document, point: BoundaryPoint) -> Option<HighlightId> {
        let caret = Range::collapsed_at(point);
        self.order.iter().copied().find(|id| {
            self.highlights
                .get(id)
                .and_then(|live| doc.live_range(live.range))
                .is_some_and(|range| doc.ranges_overlap(range, &caret))
        })
    }

    /// Remove every highlight
    pub fn clear(&mut self, doc: &mut Document) {
        for id in self.order.clone() {
            self.remove(doc, id);
        }
    }

    pub fn get(&self, id: HighlightId) -> Option<&LiveHighlight> {
        self.highlights.get(&id)
    }

    pub fn contains(&self, id: HighlightId) -> bool {
        self.highlights.contains_key(&id)
    }

    /// Current live range of a highlight
    pub fn range(&self, doc: &Document, id: HighlightId) -> Option<Range> {
        self.highlights
            .get(&id)
            .and_then(|live| doc.live_range(live.range))
            .cloned()
    }

    pub fn ids(&self) -> &[HighlightId] {
        &self.order
    }

    /// Records in creation/restore order
    pub fn records(&self) -> Vec<&HighlightRecord> {
        self.order
            .iter()
            .filter_map(|id| self.highlights.get(id))
            .map(|live| &live.record)
            .collect()
    }

    /// Owned copy of the records, ready for storage
    pub fn snapshot(&self) -> Vec<HighlightRecord> {
        self.records().into_iter().cloned().collect()
    }

    /// `(id, text)` pairs for quoting
    pub fn quotes(&self) -> Vec<(HighlightId, &str)> {
        self.order
            .iter()
            .filter_map(|id| self.highlights.get(id))
            .map(|live| (live.id, live.record.text.as_str()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.highlights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.highlights.is_empty()
    }
}
