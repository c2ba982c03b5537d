use std::{cell::RefCell, rc::Rc};

use fragment_state::{
    FragmentHistory, HistoryCapabilities, HistoryConfig, MemoryHost, NavigableContext,
    NotifierMode, StateValue, RESERVED_KEY,
};
use pretty_assertions::assert_eq;

fn history_over(memory: &MemoryHost, capabilities: HistoryCapabilities) -> FragmentHistory {
    FragmentHistory::new(&memory.services(capabilities), &HistoryConfig::default())
}

/// Records the `tab` value seen by each listener invocation.
fn record_tab(history: &Rc<FragmentHistory>) -> Rc<RefCell<Vec<Option<String>>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let reader = Rc::downgrade(history);
    history.add_event_listener(move || {
        if let Some(history) = reader.upgrade() {
            sink.borrow_mut().push(history.get_string("tab"));
        }
    });
    seen
}

#[test]
fn write_scenarios_produce_expected_fragments() {
    let memory = MemoryHost::new("");
    let history = history_over(&memory, HistoryCapabilities::modern());

    history.push_state("tab", "settings", true);
    assert_eq!(memory.primary.current_fragment(), "#tab=settings");
    assert_eq!(
        history.get_state("tab", "string", None),
        Some(StateValue::from("settings"))
    );

    history.push_state("tab", "profile", true);
    assert_eq!(memory.primary.current_fragment(), "#tab=profile");

    memory.primary.set_fragment("#x=y");
    history.push_states(
        [("a", StateValue::from(1)), ("b", StateValue::from(true))],
        false,
    );
    assert_eq!(memory.primary.current_fragment(), "#a=1&b=true");

    history.remove_state(Some("a"));
    assert_eq!(memory.primary.current_fragment(), "#b=true");

    history.remove_state(Some("b"));
    assert_eq!(memory.primary.current_fragment(), "#");

    memory.primary.set_fragment("#__t=1234567");
    assert!(!history.has_any_state());
}

#[test]
fn remove_all_clears_state() {
    let memory = MemoryHost::new("#a=1&b=2&__t=3");
    let history = history_over(&memory, HistoryCapabilities::modern());
    history.remove_state(None);
    assert_eq!(memory.primary.current_fragment(), "#");
    assert!(!history.has_any_state());
}

#[test]
fn no_public_write_exposes_reserved_key() {
    let memory = MemoryHost::new("#");
    let history = history_over(&memory, HistoryCapabilities::modern());

    history.push_state(RESERVED_KEY, "1", true);
    history.push_state(RESERVED_KEY, "1", false);
    history.push_states([(RESERVED_KEY, "2")], true);
    history.push_states([(RESERVED_KEY, "2")], false);
    history.start(None);

    assert_eq!(history.get_state(RESERVED_KEY, "string", None), None);
    assert_eq!(history.get_state(RESERVED_KEY, "int", None), None);
}

#[test]
fn cast_fallbacks_for_missing_and_non_numeric_values() {
    let memory = MemoryHost::new("#x=abc");
    let history = history_over(&memory, HistoryCapabilities::modern());

    for key in ["x", "absent"] {
        assert_eq!(
            history.get_state(key, "integer", None),
            Some(StateValue::Integer(0))
        );
        let float = history
            .get_state(key, "float", None)
            .and_then(|value| value.as_f64());
        assert!(float.is_some_and(f64::is_nan));
    }
}

#[test]
fn native_mode_notifies_on_writes_and_traversal() {
    let memory = MemoryHost::new("#");
    let history = Rc::new(history_over(&memory, HistoryCapabilities::modern()));
    assert_eq!(history.mode(), NotifierMode::Native);
    let seen = record_tab(&history);

    history.start(Some(("tab", StateValue::from("home"))));
    history.push_state("tab", "settings", true);
    assert!(memory.primary.back());

    assert_eq!(
        *seen.borrow(),
        vec![
            Some("home".to_string()),
            Some("settings".to_string()),
            Some("home".to_string()),
        ]
    );
}

#[test]
fn polling_mode_restores_state_across_back_and_forward() {
    let memory = MemoryHost::new("#tab=home");
    let history = Rc::new(history_over(&memory, HistoryCapabilities::legacy()));
    assert_eq!(history.mode(), NotifierMode::Polling);
    let seen = record_tab(&history);

    history.start(None);
    assert!(seen.borrow().is_empty());
    memory.shadow().mark_ready();
    assert_eq!(*seen.borrow(), vec![Some("home".to_string())]);

    history.push_state("tab", "settings", true);
    memory.timer.run_ready();
    assert_eq!(
        memory.shadow().entries(),
        vec!["#tab=home".to_string(), "#tab=settings".to_string()]
    );
    assert_eq!(seen.borrow().len(), 2);

    // Back in the shadow history: one tick corrects the page, the next one notifies.
    assert!(memory.shadow().back());
    memory.timer.run_ready();
    assert_eq!(memory.primary.current_fragment(), "#tab=home");
    assert_eq!(seen.borrow().len(), 2);
    memory.timer.run_ready();
    assert_eq!(seen.borrow().last().cloned().flatten().as_deref(), Some("home"));

    assert!(memory.shadow().forward());
    memory.timer.run_ready();
    memory.timer.run_ready();
    assert_eq!(memory.primary.current_fragment(), "#tab=settings");
    assert_eq!(
        *seen.borrow(),
        vec![
            Some("home".to_string()),
            Some("settings".to_string()),
            Some("home".to_string()),
            Some("settings".to_string()),
        ]
    );

    memory.timer.run_ready();
    assert_eq!(seen.borrow().len(), 4);
}

#[test]
fn polling_honors_configured_interval() {
    let memory = MemoryHost::new("#");
    let config = HistoryConfig::from_json_str(r#"{"poll_interval_ms":120}"#).expect("config");
    let history = FragmentHistory::new(&memory.services(HistoryCapabilities::legacy()), &config);

    history.start(None);
    memory.shadow().mark_ready();
    assert_eq!(
        memory.timer.last_delay(),
        Some(std::time::Duration::from_millis(120))
    );
}
