//! Navigation change notification.
//!
//! Two strategies sit behind one [`ChangeNotifier`] trait and are chosen once at construction:
//! - [`NativeChangeNotifier`] subscribes listeners to the host's own fragment-change event.
//! - [`PollingChangeNotifier`] polls the page fragment against a hidden shadow context that
//!   records history entries, so back/forward traversal is detected on hosts without the event.

mod native;
pub mod poll;
mod polling;

use std::{cell::RefCell, rc::Rc};

use tracing::debug;

use crate::{
    config::{HistoryConfig, ModePreference},
    host::{HistoryHost, Listener},
};

pub use native::NativeChangeNotifier;
pub use polling::PollingChangeNotifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Strategy used by a [`ChangeNotifier`].
pub enum NotifierMode {
    /// Host-native fragment-change events.
    Native,
    /// Timer-driven polling against a shadow context.
    Polling,
}

impl NotifierMode {
    /// Returns a stable string token for diagnostics.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Polling => "polling",
        }
    }
}

/// Single notification channel over fragment changes.
pub trait ChangeNotifier {
    /// Strategy this notifier uses.
    fn mode(&self) -> NotifierMode;

    /// Registers a listener. Registration is append-only.
    fn add_listener(&self, listener: Listener);

    /// Makes sure change detection is running before the first state write.
    fn prepare(&self);

    /// Delivers the initial change notification for the page session.
    fn dispatch_first(&self);
}

/// Builds the notifier for `host`, honoring the configured mode preference.
pub fn select_notifier(host: &HistoryHost, config: &HistoryConfig) -> Rc<dyn ChangeNotifier> {
    let native = match config.mode {
        ModePreference::Native => true,
        ModePreference::Polling => false,
        ModePreference::Auto => host.capabilities.native_change_events.is_available(),
    };

    let notifier: Rc<dyn ChangeNotifier> = if native {
        Rc::new(NativeChangeNotifier::new(
            host.primary.clone(),
            host.native_events.clone(),
            host.clock.clone(),
            host.capabilities.synthetic_events,
        ))
    } else {
        Rc::new(PollingChangeNotifier::new(
            host.primary.clone(),
            host.hidden_contexts.clone(),
            host.timer.clone(),
            config.poll_interval(),
        ))
    };
    debug!(
        mode = notifier.mode().as_str(),
        "selected navigation change notifier"
    );
    notifier
}

/// Invokes a snapshot of `listeners` in registration order.
///
/// Listeners registered during dispatch take effect from the next dispatch.
pub(crate) fn dispatch_listeners(listeners: &RefCell<Vec<Listener>>) {
    let snapshot = listeners.borrow().clone();
    for listener in &snapshot {
        listener();
    }
}
