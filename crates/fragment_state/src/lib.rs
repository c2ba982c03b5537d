//! Fragment-backed UI state with a single navigation-change channel.
//!
//! This crate is the host-agnostic core: it encodes a small ordered key/value map into the
//! address fragment (`#tab=settings&page=2`), reads it back with typed coercion, and notifies
//! listeners whenever the fragment changes. Change detection uses the host's native
//! fragment-change event when available and otherwise falls back to polling against a hidden
//! shadow context that records history entries. Concrete browser primitives live in
//! `fragment_state_web`; everything here talks to the host through the traits in [`host`].

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod accessor;
pub mod codec;
pub mod config;
pub mod error;
pub mod history;
pub mod host;
pub mod memory;
pub mod notifier;
pub mod session;
pub mod time;
pub mod value;

pub use accessor::{cast_value, StateReader};
pub use codec::{normalize_fragment, with_timestamp, StateMap, RESERVED_KEY};
pub use config::{HistoryConfig, ModePreference, DEFAULT_POLL_INTERVAL_MS};
pub use error::{ConfigError, DecodeError, HostError};
pub use history::FragmentHistory;
pub use host::{
    CapabilityStatus, Clock, HiddenContextFactory, HistoryCapabilities, HistoryHost, Listener,
    NativeChangeEvents, NavigableContext, NoopNativeChangeEvents, ShadowContext, Timer,
    UnavailableHiddenContextFactory,
};
pub use memory::{
    FixedClock, ManualTimer, MemoryHiddenContextFactory, MemoryHost, MemoryNavigableContext,
    MemoryShadowContext,
};
pub use notifier::{
    poll::{poll_tick, PollAction, PollSnapshot, PollState},
    select_notifier, ChangeNotifier, NativeChangeNotifier, NotifierMode, PollingChangeNotifier,
};
pub use session::SessionCoordinator;
pub use time::{next_monotonic_timestamp_ms, unix_time_ms_now, SystemClock};
pub use value::{CastTo, StateValue};
