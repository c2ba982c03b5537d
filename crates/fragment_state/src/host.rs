//! Host primitive contracts and the injected host bundle.
//!
//! Every browser-specific capability the history engine needs is expressed as a small trait so
//! the engine can run against `web-sys` adapters in the browser and against the doubles in
//! [`crate::memory`] in tests.

use std::{rc::Rc, time::Duration};

use crate::error::HostError;

/// Zero-argument change callback. Listeners run in registration order.
pub type Listener = Rc<dyn Fn()>;

/// A navigable context whose address fragment can be read and navigated.
pub trait NavigableContext {
    /// Returns the current fragment, `#`-prefixed (`#` when empty).
    fn current_fragment(&self) -> String;

    /// Navigates to `fragment`, creating a history entry when it differs from the current one.
    fn set_fragment(&self, fragment: &str);
}

/// Hidden secondary context that accumulates history entries for polling-based detection.
pub trait ShadowContext: NavigableContext {
    /// Opens a fresh history entry in the shadow context and points it at `fragment`.
    fn push_entry(&self, fragment: &str);

    /// Runs `callback` once the context has finished loading (immediately if it already has).
    fn when_ready(&self, callback: Box<dyn FnOnce()>);
}

/// Factory for the hidden shadow context.
pub trait HiddenContextFactory {
    /// Creates and attaches a new hidden context.
    ///
    /// # Errors
    ///
    /// Returns an error when the host cannot provide a hidden context.
    fn create_hidden_context(&self) -> Result<Rc<dyn ShadowContext>, HostError>;
}

/// Host-native fragment-change event source.
pub trait NativeChangeEvents {
    /// Registers `listener` for every native fragment-change event.
    fn subscribe(&self, listener: Listener);

    /// Fires one synthetic fragment-change event.
    ///
    /// # Errors
    ///
    /// Returns an error when the host cannot construct or dispatch synthetic events.
    fn dispatch_synthetic(&self) -> Result<(), HostError>;
}

/// One-shot timer used to drive the polling loop.
pub trait Timer {
    /// Schedules `callback` to run once after `delay`.
    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>);
}

/// Millisecond timestamp source for the `__t` marker.
pub trait Clock {
    /// Returns the current time in unix milliseconds.
    fn now_ms(&self) -> u64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Host availability state for one capability.
pub enum CapabilityStatus {
    /// The capability can be used.
    Available,
    /// The capability is missing on the active host.
    Unavailable,
}

impl CapabilityStatus {
    /// Returns whether the capability can be used.
    pub const fn is_available(self) -> bool {
        matches!(self, Self::Available)
    }

    /// Maps a probe result to a status.
    pub const fn from_probe(available: bool) -> Self {
        if available {
            Self::Available
        } else {
            Self::Unavailable
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Capability snapshot used to pick a change-notification strategy.
pub struct HistoryCapabilities {
    /// The host fires a native event when the fragment changes.
    pub native_change_events: CapabilityStatus,
    /// The host can construct and dispatch a synthetic fragment-change event.
    pub synthetic_events: CapabilityStatus,
}

impl HistoryCapabilities {
    /// Host with native change events and synthetic event construction.
    pub const fn modern() -> Self {
        Self {
            native_change_events: CapabilityStatus::Available,
            synthetic_events: CapabilityStatus::Available,
        }
    }

    /// Host with native change events but no synthetic event construction.
    pub const fn native_without_synthetic() -> Self {
        Self {
            native_change_events: CapabilityStatus::Available,
            synthetic_events: CapabilityStatus::Unavailable,
        }
    }

    /// Host without native change events; change detection must poll.
    pub const fn legacy() -> Self {
        Self {
            native_change_events: CapabilityStatus::Unavailable,
            synthetic_events: CapabilityStatus::Unavailable,
        }
    }
}

/// Host primitive bundle injected into [`crate::FragmentHistory`].
#[derive(Clone)]
pub struct HistoryHost {
    /// The page's own navigable context.
    pub primary: Rc<dyn NavigableContext>,
    /// Native fragment-change events (ignored in polling mode).
    pub native_events: Rc<dyn NativeChangeEvents>,
    /// Hidden shadow-context factory (used only in polling mode).
    pub hidden_contexts: Rc<dyn HiddenContextFactory>,
    /// Timer driving the polling loop.
    pub timer: Rc<dyn Timer>,
    /// Timestamp source for the `__t` marker.
    pub clock: Rc<dyn Clock>,
    /// Capability probe results for the active host.
    pub capabilities: HistoryCapabilities,
}

#[derive(Debug, Clone, Copy, Default)]
/// Event source for hosts without native fragment-change events.
pub struct NoopNativeChangeEvents;

impl NativeChangeEvents for NoopNativeChangeEvents {
    fn subscribe(&self, _listener: Listener) {}

    fn dispatch_synthetic(&self) -> Result<(), HostError> {
        Err(HostError::Unavailable {
            capability: "synthetic-events",
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
/// Hidden-context factory for hosts that cannot create one.
pub struct UnavailableHiddenContextFactory;

impl HiddenContextFactory for UnavailableHiddenContextFactory {
    fn create_hidden_context(&self) -> Result<Rc<dyn ShadowContext>, HostError> {
        Err(HostError::Unavailable {
            capability: "hidden-context",
        })
    }
}
