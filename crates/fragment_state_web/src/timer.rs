//! `setTimeout`-backed timer.

use std::time::Duration;

use fragment_state::Timer;
use tracing::warn;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::{closure::Closure, JsCast};

#[derive(Debug, Clone, Copy, Default)]
/// Timer backed by `window.setTimeout`.
pub struct WebTimer;

impl Timer for WebTimer {
    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) {
        let delay_ms = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);

        #[cfg(target_arch = "wasm32")]
        {
            let Some(window) = web_sys::window() else {
                warn!("window unavailable; timeout dropped");
                return;
            };
            let callback = Closure::once_into_js(move || callback());
            if let Err(err) = window.set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.unchecked_ref(),
                delay_ms,
            ) {
                warn!(?err, "setTimeout failed");
            }
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = callback;
            warn!(delay_ms, "timers require a wasm32 browser target; timeout dropped");
        }
    }
}
