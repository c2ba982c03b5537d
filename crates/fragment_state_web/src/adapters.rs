use std::rc::Rc;

#[cfg(target_arch = "wasm32")]
use fragment_state::CapabilityStatus;
use fragment_state::{
    FragmentHistory, HistoryCapabilities, HistoryConfig, HistoryHost, SystemClock,
};
use tracing::debug;

use crate::{WebConfigSource, WebHashChangeEvents, WebHiddenFrameFactory, WebLocation, WebTimer};

/// Probes the active browser for `hashchange` support and synthetic event construction.
///
/// `hashchange` counts as native only outside legacy document modes (IE7 and earlier
/// compatibility modes expose `onhashchange` without ever firing it).
pub fn probe_capabilities() -> HistoryCapabilities {
    #[cfg(target_arch = "wasm32")]
    {
        use wasm_bindgen::JsValue;

        let Some(window) = web_sys::window() else {
            return HistoryCapabilities::legacy();
        };
        let has_hash_change =
            js_sys::Reflect::has(&window, &JsValue::from_str("onhashchange")).unwrap_or(false);
        let document = window.document();
        let legacy_document_mode = document
            .as_ref()
            .and_then(|document| {
                js_sys::Reflect::get(document, &JsValue::from_str("documentMode")).ok()
            })
            .and_then(|mode| mode.as_f64())
            .is_some_and(|mode| mode <= 7.0);
        let has_create_event = document
            .as_ref()
            .and_then(|document| {
                js_sys::Reflect::has(document, &JsValue::from_str("createEvent")).ok()
            })
            .unwrap_or(false);

        HistoryCapabilities {
            native_change_events: CapabilityStatus::from_probe(
                has_hash_change && !legacy_document_mode,
            ),
            synthetic_events: CapabilityStatus::from_probe(has_create_event),
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        HistoryCapabilities::legacy()
    }
}

/// Builds the browser host bundle for the current page.
pub fn build_history_host() -> HistoryHost {
    let capabilities = probe_capabilities();
    debug!(?capabilities, "probed browser history capabilities");
    HistoryHost {
        primary: Rc::new(WebLocation),
        native_events: Rc::new(WebHashChangeEvents),
        hidden_contexts: Rc::new(WebHiddenFrameFactory),
        timer: Rc::new(WebTimer),
        clock: Rc::new(SystemClock),
        capabilities,
    }
}

/// Builds a [`FragmentHistory`] for the current page.
///
/// `config` takes precedence; without it the `localStorage` override (or the defaults) apply.
pub fn browser_history(config: Option<HistoryConfig>) -> FragmentHistory {
    let config = config.unwrap_or_else(|| WebConfigSource.load_or_default());
    FragmentHistory::new(&build_history_host(), &config)
}
