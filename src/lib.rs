//! Page Anchor
//!
//! Durable text highlights for web pages:
//! - structural node addresses with tolerant resolution
//! - a text search cascade for when structure has changed
//! - a per-page highlight store with hit testing and two render strategies
//! - modifier-click removal and a stability wait before restoring
//!
//! The same core builds natively (tests, the `page-anchor` CLI) and for
//! `wasm32-unknown-unknown`, where `PageHighlighter` is the JS entry point.

use wasm_bindgen::prelude::*;

pub mod anchor;
pub mod config;
pub mod dom;
pub mod error;
pub mod highlight;
pub mod interaction;
pub mod path;
pub mod search;
pub mod session;
pub mod stability;
pub mod storage;
pub mod text;
pub mod timer;
pub mod url;

// Re-export common types
pub use crate::anchor::{RangeAnchor, RangeSerializer, ResolveTier};
pub use crate::config::HighlighterConfig;
pub use crate::dom::{BoundaryPoint, Capabilities, Document, Range};
pub use crate::error::{HighlightError, StorageError};
pub use crate::highlight::{HighlightColor, HighlightId, HighlightRecord, HighlightStore};
pub use crate::search::{SearchTier, TextSearchEngine};
pub use crate::session::{PageSession, RestoreSummary};
pub use crate::url::{normalize_url, storage_key};

use crate::storage::{HighlightStorage, MemoryStorage};
use crate::timer::BrowserTimer;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    // Set up better panic messages in debug mode
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Highlighter for one page - main interface for the content script
///
/// Records live in an in-memory mirror of the extension's storage entry:
/// `restore` seeds it, `records` reads it back for persisting.
#[wasm_bindgen]
pub struct PageHighlighter {
    session: PageSession<MemoryStorage>,
}

#[wasm_bindgen]
impl PageHighlighter {
    /// Create a highlighter for a page snapshot
    #[wasm_bindgen(constructor)]
    pub fn new(url: &str, html: &str, config_json: Option<String>) -> Result<PageHighlighter, JsValue> {
        let config = match config_json {
            Some(json) => HighlighterConfig::from_json(&json).map_err(js_err)?,
            None => HighlighterConfig::default(),
        };
        let document = Document::parse_html(html);
        let session =
            PageSession::new(url, document, MemoryStorage::new(), config).map_err(js_err)?;
        Ok(Self { session })
    }

    /// Storage key for this page
    #[wasm_bindgen(getter, js_name = "storageKey")]
    pub fn storage_key(&self) -> String {
        self.session.key().to_string()
    }

    /// Restore stored records once the page is stable
    /// Returns a Promise that resolves to a restore summary
    #[wasm_bindgen(js_name = "restore")]
    pub async fn restore(&mut self, records: JsValue) -> Result<JsValue, JsValue> {
        let records: Vec<HighlightRecord> =
            serde_wasm_bindgen::from_value(records).map_err(js_err)?;
        let key = self.session.key().to_string();
        self.session
            .storage()
            .save(&key, &records)
            .await
            .map_err(js_err)?;

        let summary = self.session.restore(&BrowserTimer).await.map_err(js_err)?;
        serde_wasm_bindgen::to_value(&summary).map_err(js_err)
    }

    /// Highlight the span between two structural addresses
    /// Returns the new id, or undefined when the input is rejected
    #[wasm_bindgen(js_name = "highlightRange")]
    pub async fn highlight_range(
        &mut self,
        start_path: String,
        start_offset: usize,
        end_path: String,
        end_offset: usize,
        color: String,
    ) -> Result<Option<String>, JsValue> {
        let Ok(color) = color.parse::<HighlightColor>() else {
            return Ok(None);
        };
        let doc = self.session.document();
        let bounds = (
            locate(doc, &start_path, start_offset),
            locate(doc, &end_path, end_offset),
        );
        let (Some(start), Some(end)) = bounds else {
            return Ok(None);
        };

        match self.session.highlight_range(&Range::new(start, end), color).await {
            Ok(id) => Ok(Some(id.to_string())),
            Err(HighlightError::Storage(e)) => Err(js_err(e)),
            Err(_) => Ok(None),
        }
    }

    /// Remove a highlight by id
    #[wasm_bindgen(js_name = "remove")]
    pub async fn remove(&mut self, id: String) -> Result<bool, JsValue> {
        let Ok(id) = id.parse::<HighlightId>() else {
            return Ok(false);
        };
        self.session.remove(id).await.map_err(js_err)
    }

    /// Change a highlight's color; unknown ids and colors are a no-op
    #[wasm_bindgen(js_name = "recolor")]
    pub async fn recolor(&mut self, id: String, color: String) -> Result<bool, JsValue> {
        let (Ok(id), Ok(color)) = (id.parse::<HighlightId>(), color.parse::<HighlightColor>()) else {
            return Ok(false);
        };
        self.session.recolor(id, color).await.map_err(js_err)
    }

    /// Id of the highlight under a caret.
    ///
    /// The host maps viewport coordinates to a caret (`caretPositionFromPoint`)
    /// and passes it in the same path + offset form `highlightRange` takes.
    #[wasm_bindgen(js_name = "findAtCaret")]
    pub fn find_at_caret(&self, path: String, offset: usize) -> Option<String> {
        let doc = self.session.document();
        let caret = locate(doc, &path, offset)?;
        self.session.store().find_at(doc, caret).map(|id| id.to_string())
    }

    /// Current records, in order, ready to persist
    #[wasm_bindgen(js_name = "records")]
    pub fn records(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.session.records()).map_err(js_err)
    }

    /// Normalize a page URL with the default tracking parameter list
    #[wasm_bindgen(js_name = "normalizeUrl")]
    pub fn normalize_url(url: &str) -> Result<String, JsValue> {
        let config = HighlighterConfig::default();
        normalize_url(url, &config.url.tracking_params).map_err(js_err)
    }
}

/// A boundary point from a path string and offset
fn locate(doc: &Document, raw: &str, offset: usize) -> Option<BoundaryPoint> {
    let parsed = crate::path::try_parse(raw)?;
    let point = crate::path::resolve_point(doc, &parsed, offset)?;
    doc.is_valid_boundary(point).then_some(point)
}
