//! Clocks for the stability wait and staggered restores

use std::cell::Cell;
use std::time::Duration;

use async_trait::async_trait;

/// Monotonic clock with an async sleep
#[async_trait(?Send)]
pub trait Timer {
    /// Time elapsed since the timer's origin
    fn now(&self) -> Duration;

    async fn sleep(&self, duration: Duration);
}

/// Virtual clock: `sleep` advances time instantly
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

#[async_trait(?Send)]
impl Timer for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }

    async fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

/// Tokio-backed timer for native builds
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug)]
pub struct TokioTimer {
    origin: tokio::time::Instant,
}

#[cfg(not(target_arch = "wasm32"))]
impl TokioTimer {
    pub fn new() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Default for TokioTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[async_trait(?Send)]
impl Timer for TokioTimer {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// `setTimeout`-backed timer for the browser
#[derive(Debug, Default)]
pub struct BrowserTimer;

#[async_trait(?Send)]
impl Timer for BrowserTimer {
    fn now(&self) -> Duration {
        let millis = web_sys::window()
            .and_then(|w| w.performance())
            .map(|p| p.now())
            .unwrap_or_else(js_sys::Date::now);
        Duration::from_secs_f64(millis.max(0.0) / 1000.0)
    }

    /// Without a window to schedule on, the sleep ends immediately
    async fn sleep(&self, duration: Duration) {
        let millis = timeout_millis(duration);
        let promise = js_sys::Promise::new(&mut |resolve, _reject| {
            let scheduled = web_sys::window().is_some_and(|window| {
                window
                    .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis)
                    .is_ok()
            });
            if !scheduled {
                let _ = resolve.call0(&wasm_bindgen::JsValue::NULL);
            }
        });
        let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
    }
}

/// `setTimeout` delay, clamped to what the browser accepts
fn timeout_millis(duration: Duration) -> i32 {
    duration.as_millis().min(i32::MAX as u128) as i32
}
