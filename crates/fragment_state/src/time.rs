//! Wall-clock helpers for the `__t` timestamp marker.

use std::cell::Cell;
#[cfg(not(target_arch = "wasm32"))]
use std::time::{SystemTime, UNIX_EPOCH};

use crate::host::Clock;

thread_local! {
    static LAST_MARKER_TIMESTAMP_MS: Cell<u64> = const { Cell::new(0) };
}

/// Returns the current unix timestamp in milliseconds.
pub fn unix_time_ms_now() -> u64 {
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Date::now().max(0.0) as u64
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Returns a unix millisecond timestamp that strictly increases within the current thread.
///
/// Two markers written within the same millisecond still differ, so each rewrite is a real
/// fragment change.
pub fn next_monotonic_timestamp_ms() -> u64 {
    let now = unix_time_ms_now();
    LAST_MARKER_TIMESTAMP_MS.with(|last| {
        let next = now.max(last.get().saturating_add(1));
        last.set(next);
        next
    })
}

#[derive(Debug, Clone, Copy, Default)]
/// [`Clock`] backed by the system (or `Date.now()` on wasm) clock.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        next_monotonic_timestamp_ms()
    }
}
