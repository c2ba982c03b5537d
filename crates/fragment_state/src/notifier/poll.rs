//! Pure polling step for hosts without native change events.

#[derive(Debug, Clone, PartialEq, Eq)]
/// State carried between polling ticks.
pub struct PollState {
    last_observed: String,
}

impl PollState {
    /// Starts from the fragment observed when polling was armed.
    pub fn new(last_observed: impl Into<String>) -> Self {
        Self {
            last_observed: last_observed.into(),
        }
    }

    /// Fragment seen (and dispatched) most recently.
    pub fn last_observed(&self) -> &str {
        &self.last_observed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Fragments read from both contexts at the start of a tick.
pub struct PollSnapshot {
    /// Current fragment of the page's own context.
    pub primary: String,
    /// Fragment recorded by the shadow context's current history entry.
    pub shadow: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// What the host must do after a tick.
pub enum PollAction {
    /// The page fragment moved forward: optionally record it in the shadow history, then notify.
    Forward {
        /// The newly observed fragment.
        fragment: String,
        /// Whether the shadow context needs a new entry for this fragment.
        record_in_shadow: bool,
    },
    /// The shadow history was traversed: navigate the page to match, notify on the next tick.
    Traverse {
        /// Fragment the page must be moved to.
        fragment: String,
    },
    /// Nothing changed.
    Idle,
}

/// Compares the snapshot against `state` and decides the next action.
///
/// A page-side change always wins over a shadow-side change within the same tick.
pub fn poll_tick(state: &mut PollState, snapshot: &PollSnapshot) -> PollAction {
    if snapshot.primary != state.last_observed {
        state.last_observed = snapshot.primary.clone();
        return PollAction::Forward {
            fragment: snapshot.primary.clone(),
            record_in_shadow: snapshot.primary != snapshot.shadow,
        };
    }

    if snapshot.shadow != state.last_observed {
        return PollAction::Traverse {
            fragment: snapshot.shadow.clone(),
        };
    }

    PollAction::Idle
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn snapshot(primary: &str, shadow: &str) -> PollSnapshot {
        PollSnapshot {
            primary: primary.to_string(),
            shadow: shadow.to_string(),
        }
    }

    #[test]
    fn unchanged_contexts_are_idle() {
        let mut state = PollState::new("#a=1");
        assert_eq!(poll_tick(&mut state, &snapshot("#a=1", "#a=1")), PollAction::Idle);
        assert_eq!(state.last_observed(), "#a=1");
    }

    #[test]
    fn page_change_is_forward_and_recorded() {
        let mut state = PollState::new("#a=1");
        assert_eq!(
            poll_tick(&mut state, &snapshot("#a=2", "#a=1")),
            PollAction::Forward {
                fragment: "#a=2".to_string(),
                record_in_shadow: true,
            }
        );
        assert_eq!(state.last_observed(), "#a=2");
        assert_eq!(poll_tick(&mut state, &snapshot("#a=2", "#a=2")), PollAction::Idle);
    }

    #[test]
    fn shadow_change_is_traversal_without_state_update() {
        let mut state = PollState::new("#a=2");
        assert_eq!(
            poll_tick(&mut state, &snapshot("#a=2", "#a=1")),
            PollAction::Traverse {
                fragment: "#a=1".to_string(),
            }
        );
        assert_eq!(state.last_observed(), "#a=2");
    }

    #[test]
    fn completed_traversal_dispatches_without_new_shadow_entry() {
        let mut state = PollState::new("#a=2");
        assert_eq!(
            poll_tick(&mut state, &snapshot("#a=1", "#a=1")),
            PollAction::Forward {
                fragment: "#a=1".to_string(),
                record_in_shadow: false,
            }
        );
    }

    #[test]
    fn page_change_wins_over_shadow_change() {
        let mut state = PollState::new("#a=1");
        assert_eq!(
            poll_tick(&mut state, &snapshot("#b=1", "#c=1")),
            PollAction::Forward {
                fragment: "#b=1".to_string(),
                record_in_shadow: true,
            }
        );
    }
}
