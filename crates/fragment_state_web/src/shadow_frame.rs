//! Hidden `<iframe>` shadow context for hosts without `hashchange`.
//!
//! Each forward navigation reopens the frame's document before moving its fragment, which
//! leaves a history entry behind. Back/forward traversal then changes the frame's fragment,
//! and the polling notifier carries that change over to the page.

use std::rc::Rc;

#[cfg(target_arch = "wasm32")]
use std::cell::RefCell;

use fragment_state::{HiddenContextFactory, HostError, ShadowContext};
#[cfg(target_arch = "wasm32")]
use fragment_state::{normalize_fragment, NavigableContext};
#[cfg(target_arch = "wasm32")]
use tracing::{debug, warn};
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::{closure::Closure, JsCast};

#[derive(Debug, Clone, Copy, Default)]
/// Creates hidden iframes and attaches them to `document.body`.
pub struct WebHiddenFrameFactory;

impl HiddenContextFactory for WebHiddenFrameFactory {
    fn create_hidden_context(&self) -> Result<Rc<dyn ShadowContext>, HostError> {
        #[cfg(target_arch = "wasm32")]
        {
            let frame = HiddenFrame::attach()?;
            Ok(Rc::new(frame))
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            Err(HostError::Unavailable {
                capability: "hidden-context",
            })
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[derive(Default)]
struct FrameLoadState {
    loaded: bool,
    pending: Vec<Box<dyn FnOnce()>>,
}

#[cfg(target_arch = "wasm32")]
struct HiddenFrame {
    iframe: web_sys::HtmlIFrameElement,
    load: Rc<RefCell<FrameLoadState>>,
}

#[cfg(target_arch = "wasm32")]
impl HiddenFrame {
    fn attach() -> Result<Self, HostError> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or(HostError::Unavailable {
                capability: "document",
            })?;
        let iframe = document
            .create_element("iframe")
            .map_err(|err| HostError::dom(format!("iframe creation failed: {err:?}")))?
            .dyn_into::<web_sys::HtmlIFrameElement>()
            .map_err(|_| HostError::dom("created element is not an iframe"))?;

        iframe
            .set_attribute("tabindex", "-1")
            .and_then(|()| iframe.set_attribute("title", "empty"))
            .and_then(|()| iframe.style().set_property("display", "none"))
            .map_err(|err| HostError::dom(format!("iframe setup failed: {err:?}")))?;
        iframe.set_src("javascript:0");

        let load = Rc::new(RefCell::new(FrameLoadState::default()));
        let load_for_event = load.clone();
        let on_load = Closure::<dyn FnMut()>::new(move || {
            let pending = {
                let mut state = load_for_event.borrow_mut();
                if state.loaded {
                    return;
                }
                state.loaded = true;
                std::mem::take(&mut state.pending)
            };
            debug!("shadow frame loaded");
            for callback in pending {
                callback();
            }
        });
        iframe.set_onload(Some(on_load.as_ref().unchecked_ref()));
        // Later loads (document reopen) are ignored by the `loaded` flag.
        on_load.forget();

        let body = document.body().ok_or(HostError::Unavailable {
            capability: "document.body",
        })?;
        body.append_child(&iframe)
            .map_err(|err| HostError::dom(format!("iframe attach failed: {err:?}")))?;

        Ok(Self { iframe, load })
    }

    fn content_location(&self) -> Option<web_sys::Location> {
        self.iframe.content_window().map(|window| window.location())
    }
}

#[cfg(target_arch = "wasm32")]
impl NavigableContext for HiddenFrame {
    fn current_fragment(&self) -> String {
        let href = self
            .content_location()
            .and_then(|location| location.href().ok())
            .unwrap_or_default();
        normalize_fragment(&href)
    }

    fn set_fragment(&self, fragment: &str) {
        let Some(location) = self.content_location() else {
            warn!("shadow frame has no content window");
            return;
        };
        if let Err(err) = location.set_hash(fragment) {
            warn!(?err, "shadow frame hash assignment failed");
        }
    }
}

#[cfg(target_arch = "wasm32")]
impl ShadowContext for HiddenFrame {
    fn push_entry(&self, fragment: &str) {
        let document = self
            .iframe
            .content_document()
            .and_then(|document| document.dyn_into::<web_sys::HtmlDocument>().ok());
        if let Some(document) = document {
            // Reopening the document is what records the history entry.
            if let Err(err) = document.open().and_then(|_| document.close()) {
                warn!(?err, "shadow frame document reopen failed");
            }
        }
        self.set_fragment(fragment);
    }

    fn when_ready(&self, callback: Box<dyn FnOnce()>) {
        let loaded = self.load.borrow().loaded;
        if loaded {
            callback();
        } else {
            self.load.borrow_mut().pending.push(callback);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn non_wasm_factory_reports_unavailable() {
        assert!(matches!(
            WebHiddenFrameFactory.create_hidden_context(),
            Err(HostError::Unavailable {
                capability: "hidden-context"
            })
        ));
    }
}
