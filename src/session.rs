//! Page session
//!
//! Ties one page's document, highlight store and storage entry together for
//! the lifetime of the page. Every change that alters the record set is
//! followed by a save; a failed save is returned to the caller while the
//! in-memory state keeps the change.

use serde::Serialize;
use tracing::{info, warn};

use crate::config::HighlighterConfig;
use crate::dom::{CaretLocator, Document, ObserverId, Range};
use crate::error::{HighlightError, Result};
use crate::highlight::{
    HighlightColor, HighlightId, HighlightRecord, HighlightStore, RestoreReport,
};
use crate::interaction::{EventOutcome, InputEvent, InteractionController};
use crate::stability::{DocumentMutations, MutationSource, Stability, StabilityGate};
use crate::storage::HighlightStorage;
use crate::timer::Timer;
use crate::url::{normalize_url, storage_key};

/// Outcome of restoring a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreSummary {
    pub restored: usize,
    pub unrestored: usize,
    pub via_search: usize,
    pub stability: Stability,
}

pub struct PageSession<S: HighlightStorage> {
    document: Document,
    store: HighlightStore,
    storage: S,
    controller: InteractionController,
    gate: StabilityGate,
    observer: ObserverId,
    url: String,
    key: String,
    config: HighlighterConfig,
}

impl<S: HighlightStorage> PageSession<S> {
    /// Start a session for `document` loaded from `url`
    pub fn new(url: &str, mut document: Document, storage: S, config: HighlighterConfig) -> Result<Self> {
        let url = normalize_url(url, &config.url.tracking_params)?;
        let key = storage_key(&url);
        let observer = document.observe(document.body());
        let store = HighlightStore::new(document.capabilities(), &config.render);

        Ok(Self {
            document,
            store,
            storage,
            controller: InteractionController::new(config.interaction.modifier),
            gate: StabilityGate::new(&config.stability),
            observer,
            url,
            key,
            config,
        })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Page-side changes (scripts, lazy content) go through here
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn store(&self) -> &HighlightStore {
        &self.store
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn records(&self) -> Vec<HighlightRecord> {
        self.store.snapshot()
    }

    /// Wait for the page to settle, then restore its stored highlights
    pub async fn restore(&mut self, timer: &dyn Timer) -> Result<RestoreSummary> {
        let mut source = DocumentMutations::new(&mut self.document, self.observer);
        let stability = self.gate.wait(timer, &mut source).await;
        self.restore_after(timer, stability).await
    }

    /// Like `restore`, with mutation activity reported by `source`
    pub async fn restore_with(
        &mut self,
        timer: &dyn Timer,
        source: &mut dyn MutationSource,
    ) -> Result<RestoreSummary> {
        let stability = self.gate.wait(timer, source).await;
        self.restore_after(timer, stability).await
    }

    async fn restore_after(&mut self, timer: &dyn Timer, stability: Stability) -> Result<RestoreSummary> {
        let records = self.storage.load(&self.key).await?;
        let total = records.len();
        let mut report = RestoreReport::default();

        // One record per tick keeps a large restore from blocking the page
        for (i, record) in records.into_iter().enumerate() {
            let outcome = self.store.restore_one(&mut self.document, record);
            report.record(&outcome);
            if i + 1 < total {
                timer.sleep(self.config.restore.stagger()).await;
            }
        }

        // Our own marks are not page activity
        self.document.take_records(self.observer);

        info!(
            key = %self.key,
            restored = report.restored,
            unrestored = report.unrestored,
            stable = stability.is_stable(),
            "page restored"
        );
        Ok(RestoreSummary {
            restored: report.restored,
            unrestored: report.unrestored,
            via_search: report.via_search,
            stability,
        })
    }

    /// Highlight the current selection and clear it
    pub async fn highlight_selection(&mut self, color: HighlightColor) -> Result<HighlightId> {
        let selection = self
            .document
            .selection()
            .cloned()
            .ok_or(HighlightError::CollapsedRange)?;
        let id = self.highlight_range(&selection, color).await;
        self.document.clear_selection();
        id
    }

    /// Highlight `range` and persist
    pub async fn highlight_range(&mut self, range: &Range, color: HighlightColor) -> Result<HighlightId> {
        let id = self.store.try_create(&mut self.document, range, color)?;
        self.persist().await?;
        Ok(id)
    }

    /// Remove a highlight; unknown ids are a no-op and skip the save
    pub async fn remove(&mut self, id: HighlightId) -> Result<bool> {
        if !self.store.remove(&mut self.document, id) {
            return Ok(false);
        }
        self.persist().await?;
        Ok(true)
    }

    pub async fn recolor(&mut self, id: HighlightId, color: HighlightColor) -> Result<bool> {
        if !self.store.set_color(&mut self.document, id, color) {
            return Ok(false);
        }
        self.persist().await?;
        Ok(true)
    }

    /// Route an input event; removals are persisted
    pub async fn handle_event(
        &mut self,
        event: InputEvent,
        locator: &dyn CaretLocator,
    ) -> Result<EventOutcome> {
        let outcome = self
            .controller
            .handle(event, &mut self.store, &mut self.document, locator);
        if matches!(outcome, EventOutcome::Suppressed { .. }) {
            self.persist().await?;
        }
        Ok(outcome)
    }

    /// Drop every highlight and the page's storage entry
    pub async fn clear(&mut self) -> Result<()> {
        self.store.clear(&mut self.document);
        self.storage.clear(&self.key).await
    }

    async fn persist(&self) -> Result<()> {
        let records = self.store.snapshot();
        if let Err(e) = self.storage.save(&self.key, &records).await {
            warn!(key = %self.key, error = %e, "failed to save highlights");
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{BlockLayout, BoundaryPoint, LayoutMetrics};
    use crate::interaction::Key;
    use crate::storage::MemoryStorage;
    use crate::timer::ManualClock;

    const URL: &str = "https://example.com/article/?utm_source=feed#intro";

    fn session(html: &str) -> PageSession<MemoryStorage> {
        PageSession::new(
            URL,
            Document::parse_html(html),
            MemoryStorage::new(),
            HighlighterConfig::default(),
        )
        .unwrap()
    }

    fn select(session: &mut PageSession<MemoryStorage>, needle: &str) {
        assert!(session.document_mut().find(needle));
    }

    #[tokio::test]
    async fn test_key_from_normalized_url() {
        let s = session("<body></body>");
        assert_eq!(s.url(), "https://example.com/article");
        assert_eq!(s.key(), "highlights:https://example.com/article");
    }

    #[tokio::test]
    async fn test_highlight_selection_saves() {
        let mut s = session("<body><p>keep this sentence</p></body>");
        select(&mut s, "this");
        let id = s.highlight_selection(HighlightColor::Green).await.unwrap();
        assert!(s.document().selection().is_none());

        let stored = s.storage().load(s.key()).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, id.to_string());
        assert_eq!(stored[0].text, "this");
    }

    #[tokio::test]
    async fn test_no_selection_is_rejected() {
        let mut s = session("<body><p>text</p></body>");
        assert!(matches!(
            s.highlight_selection(HighlightColor::Yellow).await,
            Err(HighlightError::CollapsedRange)
        ));
    }

    #[tokio::test]
    async fn test_save_failure_keeps_highlight() {
        let mut s = session("<body><p>keep this sentence</p></body>");
        s.storage().set_fail_writes(true);
        select(&mut s, "sentence");
        let result = s.highlight_selection(HighlightColor::Yellow).await;
        assert!(matches!(result, Err(HighlightError::Storage(_))));
        assert_eq!(s.store().len(), 1);
    }

    #[tokio::test]
    async fn test_restore_in_new_session() {
        let html = "<body><p>first part</p><p>second part</p></body>";
        let mut s = session(html);
        select(&mut s, "second");
        s.highlight_selection(HighlightColor::Blue).await.unwrap();
        select(&mut s, "first");
        s.highlight_selection(HighlightColor::Pink).await.unwrap();
        let saved = s.storage().load(s.key()).await.unwrap();

        let storage = MemoryStorage::new();
        storage.save(s.key(), &saved).await.unwrap();
        let mut reloaded = PageSession::new(
            URL,
            Document::parse_html(html),
            storage,
            HighlighterConfig::default(),
        )
        .unwrap();

        let clock = ManualClock::new();
        let summary = reloaded.restore(&clock).await.unwrap();
        assert_eq!(summary.restored, 2);
        assert_eq!(summary.unrestored, 0);
        assert!(summary.stability.is_stable());
        assert_eq!(
            reloaded.store().quotes().iter().map(|q| q.1).collect::<Vec<_>>(),
            vec!["second", "first"]
        );
        // 150ms quiet period plus one 10ms stagger
        assert_eq!(clock.now().as_millis(), 160);
    }

    struct BusyUntil<'a> {
        clock: &'a ManualClock,
        until_ms: u128,
    }

    impl MutationSource for BusyUntil<'_> {
        fn drain(&mut self) -> usize {
            usize::from(self.clock.now().as_millis() < self.until_ms)
        }
    }

    #[tokio::test]
    async fn test_restore_with_external_activity() {
        let mut s = session("<body><p>static</p></body>");
        let clock = ManualClock::new();
        let mut source = BusyUntil {
            clock: &clock,
            until_ms: 300,
        };
        let summary = s.restore_with(&clock, &mut source).await.unwrap();
        assert_eq!(summary.stability, Stability::Stable { waited_ms: 400 });
    }

    #[tokio::test]
    async fn test_restore_drains_prior_activity() {
        let mut s = session("<body><p>static</p></body>");
        let late = s.document_mut().create_text("late");
        let body = s.document().body();
        s.document_mut().append_child(body, late).unwrap();

        let clock = ManualClock::new();
        let summary = s.restore(&clock).await.unwrap();
        assert_eq!(summary.restored, 0);
        assert_eq!(summary.stability, Stability::Stable { waited_ms: 150 });
    }

    #[tokio::test]
    async fn test_modifier_click_removes_and_saves() {
        let mut s = session("<body><p>tap the word here</p></body>");
        select(&mut s, "word");
        let id = s.highlight_selection(HighlightColor::Yellow).await.unwrap();

        let layout = BlockLayout::compute(s.document(), LayoutMetrics::default());
        let node = s.document().searchable_text_nodes()[0];
        let (x, y) = layout.glyph_center(node, 9).unwrap();

        s.handle_event(InputEvent::KeyDown(Key::Alt), &layout).await.unwrap();
        let outcome = s.handle_event(InputEvent::Click { x, y }, &layout).await.unwrap();
        assert_eq!(outcome, EventOutcome::Suppressed { removed: id });
        assert!(s.storage().load(s.key()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_recolor_remove_clear() {
        let mut s = session("<body><p>alpha beta</p></body>");
        let node = s.document().searchable_text_nodes()[0];
        let range = Range::new(BoundaryPoint::new(node, 0), BoundaryPoint::new(node, 5));
        let id = s.highlight_range(&range, HighlightColor::Yellow).await.unwrap();

        assert!(s.recolor(id, HighlightColor::Green).await.unwrap());
        let stored = s.storage().load(s.key()).await.unwrap();
        assert_eq!(stored[0].color, HighlightColor::Green);

        assert!(s.remove(id).await.unwrap());
        assert!(!s.remove(id).await.unwrap());

        s.highlight_range(&range, HighlightColor::Blue).await.unwrap();
        s.clear().await.unwrap();
        assert!(s.store().is_empty());
        assert!(!s.storage().contains(s.key()));
    }
}
