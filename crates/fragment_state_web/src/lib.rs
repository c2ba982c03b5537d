//! Browser (`wasm32`) implementations of the [`fragment_state`] host primitives.
//!
//! This crate wires the history engine to the real page: the window location, the native
//! `hashchange` event, `setTimeout`, and a hidden `<iframe>` used as the shadow context on
//! hosts that lack `hashchange`. On non-wasm targets every adapter is inert so the workspace
//! still builds and tests natively.
//!
//! Adapters are split by primitive:
//! - `location` (page fragment)
//! - `events` (native `hashchange`)
//! - `shadow_frame` (hidden iframe shadow context)
//! - `timer` (`setTimeout`)
//! - `config` (optional `localStorage` config override)

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

/// Capability probing and host bundle construction for runtime wiring.
pub mod adapters;
pub mod config;
pub mod events;
pub mod location;
pub mod shadow_frame;
pub mod timer;

pub use adapters::{browser_history, build_history_host, probe_capabilities};
pub use config::{WebConfigSource, CONFIG_STORAGE_KEY};
pub use events::WebHashChangeEvents;
pub use location::WebLocation;
pub use shadow_frame::WebHiddenFrameFactory;
pub use timer::WebTimer;
