//! Modifier-click removal
//!
//! ```text
//!            modifier down
//!   Idle  ----------------->  Armed
//!         <-----------------
//!          modifier up / blur
//! ```
//!
//! An armed click over a highlight removes it and suppresses the click.
//! Any other click passes through untouched, so links keep working.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dom::{CaretLocator, Document};
use crate::highlight::{HighlightId, HighlightStore};

/// Keys the controller distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    Alt,
    Control,
    Shift,
    Meta,
    #[serde(other)]
    Other,
}

impl Key {
    /// Map a `KeyboardEvent.key` value
    pub fn from_name(name: &str) -> Self {
        match name {
            "Alt" => Key::Alt,
            "Control" => Key::Control,
            "Shift" => Key::Shift,
            "Meta" => Key::Meta,
            _ => Key::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyDown(Key),
    KeyUp(Key),
    Click { x: f64, y: f64 },
    /// Window lost focus; the modifier release may never arrive
    Blur,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Armed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    PassThrough,
    /// Default action suppressed; the highlight was removed
    Suppressed { removed: HighlightId },
}

#[derive(Debug, Clone)]
pub struct InteractionController {
    modifier: Key,
    state: ControllerState,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new(Key::Alt)
    }
}

impl InteractionController {
    pub fn new(modifier: Key) -> Self {
        Self {
            modifier,
            state: ControllerState::Idle,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn handle(
        &mut self,
        event: InputEvent,
        store: &mut HighlightStore,
        doc: &mut Document,
        locator: &dyn CaretLocator,
    ) -> EventOutcome {
        match event {
            InputEvent::KeyDown(key) if key == self.modifier => {
                self.state = ControllerState::Armed;
            }
            InputEvent::KeyUp(key) if key == self.modifier => {
                self.state = ControllerState::Idle;
            }
            InputEvent::Blur => {
                self.state = ControllerState::Idle;
            }
            InputEvent::Click { x, y } if self.state == ControllerState::Armed => {
                if let Some(id) = store.find_at_point(doc, locator, x, y) {
                    store.remove(doc, id);
                    debug!(id = %id, "removed by modifier click");
                    return EventOutcome::Suppressed { removed: id };
                }
            }
            _ => {}
        }
        EventOutcome::PassThrough
    }
}
