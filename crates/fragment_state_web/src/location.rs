//! `window.location`-backed page context.

use fragment_state::{normalize_fragment, NavigableContext};
use tracing::warn;

#[derive(Debug, Clone, Copy, Default)]
/// Page context backed by `window.location`.
///
/// Writes assign the full address (origin, path, query, and new fragment) so every state
/// change is a regular navigation with its own history entry.
pub struct WebLocation;

impl WebLocation {
    /// Returns the current address without its fragment.
    pub fn base_uri(self) -> Option<String> {
        #[cfg(target_arch = "wasm32")]
        {
            let location = web_sys::window()?.location();
            let origin = location.origin().ok()?;
            let path = location.pathname().ok()?;
            let search = location.search().ok()?;
            Some(format!("{origin}{path}{search}"))
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            None
        }
    }
}

impl NavigableContext for WebLocation {
    fn current_fragment(&self) -> String {
        #[cfg(target_arch = "wasm32")]
        {
            let hash = web_sys::window()
                .and_then(|window| window.location().hash().ok())
                .unwrap_or_default();
            normalize_fragment(&hash)
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            normalize_fragment("")
        }
    }

    fn set_fragment(&self, fragment: &str) {
        let fragment = normalize_fragment(fragment);

        #[cfg(target_arch = "wasm32")]
        {
            let Some(base) = self.base_uri() else {
                warn!("window.location unavailable; fragment write dropped");
                return;
            };
            let Some(window) = web_sys::window() else {
                return;
            };
            if let Err(err) = window.location().set_href(&format!("{base}{fragment}")) {
                warn!(?err, "location.href assignment failed");
            }
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            warn!(%fragment, "fragment writes require a wasm32 browser target");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn non_wasm_location_is_empty_and_inert() {
        let location = WebLocation;
        assert_eq!(location.current_fragment(), "#");
        location.set_fragment("#a=1");
        assert_eq!(location.current_fragment(), "#");
        assert_eq!(location.base_uri(), None);
    }
}
