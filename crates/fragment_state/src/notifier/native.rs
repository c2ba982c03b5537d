//! Native strategy: host fragment-change events plus a forced first dispatch.

use std::rc::Rc;

use tracing::{debug, warn};

use super::{ChangeNotifier, NotifierMode};
use crate::{
    codec::with_timestamp,
    host::{CapabilityStatus, Clock, Listener, NativeChangeEvents, NavigableContext},
};

/// Notifier backed by the host's native fragment-change event.
pub struct NativeChangeNotifier {
    primary: Rc<dyn NavigableContext>,
    events: Rc<dyn NativeChangeEvents>,
    clock: Rc<dyn Clock>,
    synthetic_events: CapabilityStatus,
}

impl NativeChangeNotifier {
    /// Creates a notifier over `events`.
    ///
    /// When `synthetic_events` is unavailable, the first dispatch is forced by rewriting the
    /// `__t` marker in `primary` instead.
    pub fn new(
        primary: Rc<dyn NavigableContext>,
        events: Rc<dyn NativeChangeEvents>,
        clock: Rc<dyn Clock>,
        synthetic_events: CapabilityStatus,
    ) -> Self {
        Self {
            primary,
            events,
            clock,
            synthetic_events,
        }
    }

    fn touch_timestamp_marker(&self) {
        let fragment = with_timestamp(&self.primary.current_fragment(), self.clock.now_ms());
        debug!(%fragment, "forcing change event with timestamp marker");
        self.primary.set_fragment(&fragment);
    }
}

impl ChangeNotifier for NativeChangeNotifier {
    fn mode(&self) -> NotifierMode {
        NotifierMode::Native
    }

    fn add_listener(&self, listener: Listener) {
        self.events.subscribe(listener);
    }

    fn prepare(&self) {}

    fn dispatch_first(&self) {
        if self.synthetic_events.is_available() {
            match self.events.dispatch_synthetic() {
                Ok(()) => return,
                Err(err) => warn!(%err, "synthetic change event failed; using timestamp marker"),
            }
        }
        self.touch_timestamp_marker();
    }
}
