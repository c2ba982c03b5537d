//! Native `hashchange` event adapter.

use fragment_state::{HostError, Listener, NativeChangeEvents};
#[cfg(target_arch = "wasm32")]
use tracing::warn;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::{closure::Closure, JsCast};

/// DOM event fired when the fragment changes.
pub const HASH_CHANGE_EVENT: &str = "hashchange";

#[derive(Debug, Clone, Copy, Default)]
/// `hashchange` subscription and synthetic dispatch on `window`.
pub struct WebHashChangeEvents;

impl NativeChangeEvents for WebHashChangeEvents {
    fn subscribe(&self, listener: Listener) {
        #[cfg(target_arch = "wasm32")]
        {
            let Some(window) = web_sys::window() else {
                warn!("window unavailable; hashchange listener not registered");
                return;
            };
            let callback = Closure::<dyn FnMut()>::new(move || listener());
            let registered = window.add_event_listener_with_callback(
                HASH_CHANGE_EVENT,
                callback.as_ref().unchecked_ref(),
            );
            if let Err(err) = registered {
                warn!(?err, "hashchange listener registration failed");
                return;
            }
            // Listeners live for the page lifetime.
            callback.forget();
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = listener;
        }
    }

    fn dispatch_synthetic(&self) -> Result<(), HostError> {
        #[cfg(target_arch = "wasm32")]
        {
            let window = web_sys::window().ok_or(HostError::Unavailable {
                capability: "window",
            })?;
            let init = web_sys::EventInit::new();
            init.set_bubbles(true);
            init.set_cancelable(false);
            let event = web_sys::Event::new_with_event_init_dict(HASH_CHANGE_EVENT, &init)
                .map_err(|err| HostError::dom(format!("hashchange construction failed: {err:?}")))?;
            window
                .dispatch_event(&event)
                .map(|_| ())
                .map_err(|err| HostError::dom(format!("hashchange dispatch failed: {err:?}")))
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            Err(HostError::Unavailable {
                capability: "synthetic-events",
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn non_wasm_events_are_unavailable() {
        let events = WebHashChangeEvents;
        events.subscribe(Rc::new(|| {}));
        assert_eq!(
            events.dispatch_synthetic(),
            Err(HostError::Unavailable {
                capability: "synthetic-events"
            })
        );
    }
}
