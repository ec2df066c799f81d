//! Highlights: persisted records, rendering strategies and the page store

mod render;
mod store;
mod types;

pub use render::{renderer_for, HighlightRenderer, MarkRenderer, NativeRenderer, RenderHandle};
pub use store::{HighlightStore, LiveHighlight, RestoreOutcome, RestoreReport, SkipReason};
pub use types::{HighlightColor, HighlightId, HighlightRecord, IdAllocator};
