//! Public fragment-history facade: writes, reads, and listener registration.

use std::rc::Rc;

use tracing::debug;

use crate::{
    accessor::StateReader,
    codec::{StateMap, RESERVED_KEY},
    config::HistoryConfig,
    host::{HistoryHost, NavigableContext},
    notifier::{select_notifier, ChangeNotifier, NotifierMode},
    session::SessionCoordinator,
    value::{CastTo, StateValue},
};

/// Fragment-backed state for one page session.
///
/// Owns the notifier chosen for the host and the once-per-session start guard. Writes go
/// straight to the page fragment, and the notifier observes them like any other navigation.
pub struct FragmentHistory {
    primary: Rc<dyn NavigableContext>,
    notifier: Rc<dyn ChangeNotifier>,
    pub(crate) session: SessionCoordinator,
}

impl FragmentHistory {
    /// Builds a history over `host`, selecting the notifier from its capabilities and `config`.
    pub fn new(host: &HistoryHost, config: &HistoryConfig) -> Self {
        Self::with_notifier(host.primary.clone(), select_notifier(host, config))
    }

    /// Builds a history over an explicit notifier.
    pub fn with_notifier(
        primary: Rc<dyn NavigableContext>,
        notifier: Rc<dyn ChangeNotifier>,
    ) -> Self {
        Self {
            primary,
            notifier,
            session: SessionCoordinator::default(),
        }
    }

    /// Strategy of the underlying notifier.
    pub fn mode(&self) -> NotifierMode {
        self.notifier.mode()
    }

    pub(crate) fn notifier(&self) -> &dyn ChangeNotifier {
        self.notifier.as_ref()
    }

    /// Read view over the current fragment.
    pub fn reader(&self) -> StateReader<'_> {
        StateReader::new(self.primary.as_ref())
    }

    /// Parsed copy of the current fragment state (including any `__t` marker).
    pub fn state_map(&self) -> StateMap {
        self.reader().state_map()
    }

    /// Registers a change listener. Listeners run in registration order on every change.
    pub fn add_event_listener(&self, listener: impl Fn() + 'static) {
        self.notifier.add_listener(Rc::new(listener));
    }

    /// Writes one state value.
    ///
    /// With `merge`, other keys are kept and an existing `key` keeps its position; without it
    /// the fragment is replaced by this single pair. The reserved `__t` key and the empty key
    /// are ignored.
    pub fn push_state(&self, key: &str, value: impl Into<StateValue>, merge: bool) {
        if is_rejected_key(key) {
            debug!(key, "ignoring state write to reserved or empty key");
            return;
        }

        let mut map = if merge {
            self.state_map()
        } else {
            StateMap::new()
        };
        map.merge_set(key, &value.into().to_wire_string());
        self.write(&map);
    }

    /// Writes several state values in iteration order.
    ///
    /// Merging onto an empty fragment behaves like a replacing write. Reserved and empty keys
    /// are skipped.
    pub fn push_states<I, K, V>(&self, updates: I, merge: bool)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<StateValue>,
    {
        let current = self.state_map();
        let mut map = if merge && !current.is_empty() {
            current
        } else {
            StateMap::new()
        };

        for (key, value) in updates {
            let key = key.as_ref();
            if is_rejected_key(key) {
                debug!(key, "skipping state write to reserved or empty key");
                continue;
            }
            map.merge_set(key, &value.into().to_wire_string());
        }
        self.write(&map);
    }

    /// Removes one key, or all state when `key` is `None`.
    ///
    /// Removing a key that is absent does nothing. Removing the last public key clears the
    /// fragment to `#`.
    pub fn remove_state(&self, key: Option<&str>) {
        let Some(key) = key else {
            self.write(&StateMap::new());
            return;
        };

        if self.reader().get_raw(key).is_none() {
            return;
        }

        let mut map = self.state_map();
        map.remove(Some(key));
        map.remove(Some(RESERVED_KEY));
        self.write(&map);
    }

    /// Reads `key` with a cast and optional default. See [`StateReader::get`].
    pub fn get_state(
        &self,
        key: &str,
        cast: impl Into<CastTo>,
        default: Option<StateValue>,
    ) -> Option<StateValue> {
        self.reader().get(key, cast.into(), default)
    }

    /// Returns whether any state other than the `__t` marker is present.
    pub fn has_any_state(&self) -> bool {
        self.reader().has_any_state()
    }

    /// Reads `key` as a string.
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.reader().get_raw(key)
    }

    /// Reads `key` as an integer (`0` when missing or unparseable).
    pub fn get_integer(&self, key: &str) -> i64 {
        self.get_state(key, CastTo::Integer, None)
            .and_then(|value| value.as_i64())
            .unwrap_or(0)
    }

    /// Reads `key` as a float (NaN when missing or unparseable).
    pub fn get_float(&self, key: &str) -> f64 {
        self.get_state(key, CastTo::Float, None)
            .and_then(|value| value.as_f64())
            .unwrap_or(f64::NAN)
    }

    /// Reads `key` as a boolean (`false` when missing).
    pub fn get_bool(&self, key: &str) -> bool {
        self.get_state(key, CastTo::Boolean, None)
            .and_then(|value| value.as_bool())
            .unwrap_or(false)
    }

    fn write(&self, map: &StateMap) {
        self.primary.set_fragment(&map.serialize());
    }
}

pub(crate) fn is_rejected_key(key: &str) -> bool {
    key.is_empty() || key == RESERVED_KEY
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{host::HistoryCapabilities, memory::MemoryHost};

    fn history(fragment: &str) -> (MemoryHost, FragmentHistory) {
        let memory = MemoryHost::new(fragment);
        let history = FragmentHistory::new(
            &memory.services(HistoryCapabilities::modern()),
            &HistoryConfig::default(),
        );
        (memory, history)
    }

    #[test]
    fn push_state_merges_in_place() {
        let (memory, history) = history("#");
        history.push_state("tab", "settings", true);
        assert_eq!(memory.primary.current_fragment(), "#tab=settings");
        history.push_state("page", 2_i64, true);
        history.push_state("tab", "profile", true);
        assert_eq!(memory.primary.current_fragment(), "#tab=profile&page=2");
        assert_eq!(history.get_string("tab").as_deref(), Some("profile"));
    }

    #[test]
    fn push_state_without_merge_replaces_everything() {
        let (memory, history) = history("#a=1&__t=9");
        history.push_state("b", true, false);
        assert_eq!(memory.primary.current_fragment(), "#b=true");
    }

    #[test]
    fn merging_write_keeps_timestamp_marker() {
        let (memory, history) = history("#__t=9");
        history.push_state("a", "x y", true);
        assert_eq!(memory.primary.current_fragment(), "#__t=9&a=x%20y");
    }

    #[test]
    fn reserved_and_empty_keys_are_never_written() {
        let (memory, history) = history("#a=1");
        history.push_state(RESERVED_KEY, 5_i64, true);
        history.push_state("", 5_i64, true);
        history.push_states(
            [
                (RESERVED_KEY, StateValue::Integer(5)),
                ("b", StateValue::Integer(2)),
            ],
            true,
        );
        assert_eq!(memory.primary.current_fragment(), "#a=1&b=2");
        assert_eq!(history.get_state(RESERVED_KEY, "string", None), None);
    }

    #[test]
    fn merging_writes_keep_undecodable_segments() {
        let (memory, merged) = history("#bad=%ZZ&a=1");
        assert_eq!(merged.get_string("bad"), None);
        merged.push_state("b", 2_i64, true);
        assert_eq!(memory.primary.current_fragment(), "#a=1&b=2&bad=%ZZ");

        let (memory, only_undecoded) = history("#bad=%ZZ");
        only_undecoded.push_states([("a", 1_i64)], true);
        assert_eq!(memory.primary.current_fragment(), "#a=1&bad=%ZZ");

        only_undecoded.remove_state(None);
        assert_eq!(memory.primary.current_fragment(), "#");
    }

    #[test]
    fn push_states_merge_on_empty_fragment_replaces() {
        let (memory, history) = history("#");
        history.push_states([("a", 1_i64), ("b", 2_i64)], true);
        assert_eq!(memory.primary.current_fragment(), "#a=1&b=2");
    }

    #[test]
    fn remove_state_ignores_absent_and_reserved_keys() {
        let (memory, history) = history("#a=1&__t=4");
        let before = memory.primary.entries().len();
        history.remove_state(Some("missing"));
        history.remove_state(Some(RESERVED_KEY));
        assert_eq!(memory.primary.entries().len(), before);

        history.remove_state(Some("a"));
        assert_eq!(memory.primary.current_fragment(), "#");
    }

    #[test]
    fn typed_helpers_apply_fallbacks() {
        let (_memory, history) = history("#n=7&f=1.5&b=on&junk=zz");
        assert_eq!(history.get_integer("n"), 7);
        assert_eq!(history.get_integer("junk"), 0);
        assert_eq!(history.get_float("f"), 1.5);
        assert!(history.get_float("junk").is_nan());
        assert!(history.get_bool("b"));
        assert!(!history.get_bool("missing"));
    }
}
