//! Once-per-page session bootstrap.

use std::cell::Cell;

use tracing::debug;

use crate::{
    history::{is_rejected_key, FragmentHistory},
    value::StateValue,
};

#[derive(Debug, Default)]
/// Guard that lets the session start exactly once. Never reset.
pub struct SessionCoordinator {
    started: Cell<bool>,
}

impl SessionCoordinator {
    /// Returns whether the session has started.
    pub fn is_started(&self) -> bool {
        self.started.get()
    }

    /// Marks the session started. Returns `true` only for the first call.
    pub fn begin(&self) -> bool {
        !self.started.replace(true)
    }
}

impl FragmentHistory {
    /// Starts change notification for this page session.
    ///
    /// Call once after registering listeners. When `default_state` is given and its key is not
    /// present yet, the default is written and that write produces the first notification;
    /// otherwise (including a default under the reserved or empty key, which cannot be written)
    /// the notifier delivers an initial notification on its own. Later calls do nothing.
    pub fn start(&self, default_state: Option<(&str, StateValue)>) {
        if !self.session.begin() {
            debug!("fragment history already started");
            return;
        }

        match default_state {
            Some((key, value)) if !is_rejected_key(key) && self.get_string(key).is_none() => {
                self.notifier().prepare();
                self.push_state(key, value, true);
            }
            _ => self.notifier().dispatch_first(),
        }
    }

    /// Returns whether [`FragmentHistory::start`] has run.
    pub fn is_started(&self) -> bool {
        self.session.is_started()
    }
}
