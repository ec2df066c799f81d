//! Waiting for the page to settle
//!
//! Restoration is deferred until no mutation has been seen for a quiet
//! period. Every poll that finds new mutations pushes the stability point
//! back. A hard ceiling turns an endless trickle of mutations into a soft
//! "timed out" verdict; callers restore either way.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::StabilityConfig;
use crate::dom::{Document, ObserverId};
use crate::timer::Timer;

/// Anything that can report how many mutations happened since last asked
pub trait MutationSource {
    fn drain(&mut self) -> usize;
}

/// Mutation records from a document observer
pub struct DocumentMutations<'a> {
    doc: &'a mut Document,
    observer: ObserverId,
}

impl<'a> DocumentMutations<'a> {
    pub fn new(doc: &'a mut Document, observer: ObserverId) -> Self {
        Self { doc, observer }
    }
}

impl MutationSource for DocumentMutations<'_> {
    fn drain(&mut self) -> usize {
        self.doc.take_records(self.observer).len()
    }
}

/// Verdict of a stability wait
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum Stability {
    Stable {
        #[serde(rename = "waitedMs")]
        waited_ms: u64,
    },
    TimedOut {
        #[serde(rename = "waitedMs")]
        waited_ms: u64,
    },
}

impl Stability {
    pub fn is_stable(&self) -> bool {
        matches!(self, Stability::Stable { .. })
    }
}

#[derive(Debug, Clone)]
pub struct StabilityGate {
    quiet_period: Duration,
    ceiling: Duration,
    poll_interval: Duration,
}

impl Default for StabilityGate {
    fn default() -> Self {
        Self::new(&StabilityConfig::default())
    }
}

impl StabilityGate {
    pub fn new(config: &StabilityConfig) -> Self {
        Self {
            quiet_period: config.quiet_period(),
            ceiling: config.ceiling(),
            poll_interval: config.poll_interval(),
        }
    }

    /// Poll `source` until it has been quiet for the quiet period or the
    /// ceiling is reached
    pub async fn wait(&self, timer: &dyn Timer, source: &mut dyn MutationSource) -> Stability {
        let started = timer.now();
        let mut last_activity = started;

        loop {
            let now = timer.now();
            let seen = source.drain();
            if seen > 0 {
                debug!(mutations = seen, "page still changing");
                last_activity = now;
            }

            let waited = now.saturating_sub(started);
            if now.saturating_sub(last_activity) >= self.quiet_period {
                debug!(waited_ms = waited.as_millis() as u64, "page stable");
                return Stability::Stable {
                    waited_ms: waited.as_millis() as u64,
                };
            }
            if waited >= self.ceiling {
                info!(waited_ms = waited.as_millis() as u64, "stability wait timed out");
                return Stability::TimedOut {
                    waited_ms: waited.as_millis() as u64,
                };
            }

            let until_ceiling = self.ceiling - waited;
            timer.sleep(self.poll_interval.min(until_ceiling)).await;
        }
    }
}
