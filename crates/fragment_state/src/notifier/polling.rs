//! Polling strategy: compares the page fragment against a hidden shadow context on a timer.

use std::{cell::RefCell, mem, rc::Rc, time::Duration};

use tracing::{debug, trace, warn};

use super::{
    dispatch_listeners,
    poll::{poll_tick, PollAction, PollSnapshot, PollState},
    ChangeNotifier, NotifierMode,
};
use crate::{
    codec::normalize_fragment,
    host::{HiddenContextFactory, Listener, NavigableContext, ShadowContext, Timer},
};

enum PollingPhase {
    /// Nothing armed yet.
    Idle,
    /// Shadow context created; waiting for it to load.
    AwaitingShadow { last_observed: String },
    /// Timer chain running.
    Running {
        shadow: Rc<dyn ShadowContext>,
        state: PollState,
    },
    /// The host could not provide a shadow context.
    Unavailable,
}

struct PollingInner {
    primary: Rc<dyn NavigableContext>,
    hidden_contexts: Rc<dyn HiddenContextFactory>,
    timer: Rc<dyn Timer>,
    interval: Duration,
    listeners: RefCell<Vec<Listener>>,
    phase: RefCell<PollingPhase>,
}

/// Notifier that polls the page fragment against a hidden shadow context.
///
/// Forward navigations are pushed into the shadow context's history so that a later
/// back/forward traversal changes the shadow fragment; the next tick then navigates the page to
/// match and the tick after that notifies listeners.
#[derive(Clone)]
pub struct PollingChangeNotifier {
    inner: Rc<PollingInner>,
}

impl PollingChangeNotifier {
    /// Creates an unarmed polling notifier.
    pub fn new(
        primary: Rc<dyn NavigableContext>,
        hidden_contexts: Rc<dyn HiddenContextFactory>,
        timer: Rc<dyn Timer>,
        interval: Duration,
    ) -> Self {
        Self {
            inner: Rc::new(PollingInner {
                primary,
                hidden_contexts,
                timer,
                interval,
                listeners: RefCell::new(Vec::new()),
                phase: RefCell::new(PollingPhase::Idle),
            }),
        }
    }

    /// Returns whether the shadow context is ready and the timer chain is running.
    pub fn is_running(&self) -> bool {
        matches!(*self.inner.phase.borrow(), PollingPhase::Running { .. })
    }

    /// Runs one polling step outside the timer chain and returns what it did.
    pub fn tick(&self) -> PollAction {
        self.inner.tick()
    }
}

impl PollingInner {
    fn primary_fragment(&self) -> String {
        normalize_fragment(&self.primary.current_fragment())
    }

    fn arm(self: &Rc<Self>) {
        if !matches!(*self.phase.borrow(), PollingPhase::Idle) {
            return;
        }

        let shadow = match self.hidden_contexts.create_hidden_context() {
            Ok(shadow) => shadow,
            Err(err) => {
                warn!(%err, "hidden context unavailable; fragment changes will not be detected");
                *self.phase.borrow_mut() = PollingPhase::Unavailable;
                return;
            }
        };

        *self.phase.borrow_mut() = PollingPhase::AwaitingShadow {
            last_observed: self.primary_fragment(),
        };
        debug!("polling armed; waiting for shadow context");

        let inner = Rc::clone(self);
        let ready_shadow = Rc::clone(&shadow);
        shadow.when_ready(Box::new(move || inner.on_shadow_ready(ready_shadow)));
    }

    fn on_shadow_ready(self: &Rc<Self>, shadow: Rc<dyn ShadowContext>) {
        let last_observed = {
            let mut phase = self.phase.borrow_mut();
            match mem::replace(&mut *phase, PollingPhase::Idle) {
                PollingPhase::AwaitingShadow { last_observed } => last_observed,
                other => {
                    *phase = other;
                    return;
                }
            }
        };

        shadow.push_entry(&self.primary_fragment());
        *self.phase.borrow_mut() = PollingPhase::Running {
            shadow,
            state: PollState::new(last_observed),
        };
        debug!(interval_ms = self.interval.as_millis() as u64, "shadow context ready; polling");

        self.run_tick();
        dispatch_listeners(&self.listeners);
    }

    fn run_tick(self: &Rc<Self>) {
        self.tick();
        let inner = Rc::clone(self);
        self.timer
            .set_timeout(self.interval, Box::new(move || inner.run_tick()));
    }

    fn tick(&self) -> PollAction {
        let (action, shadow) = {
            let mut phase = self.phase.borrow_mut();
            let PollingPhase::Running { shadow, state } = &mut *phase else {
                return PollAction::Idle;
            };
            let snapshot = PollSnapshot {
                primary: self.primary_fragment(),
                shadow: normalize_fragment(&shadow.current_fragment()),
            };
            (poll_tick(state, &snapshot), Rc::clone(shadow))
        };

        match &action {
            PollAction::Forward {
                fragment,
                record_in_shadow,
            } => {
                trace!(%fragment, "fragment changed");
                if *record_in_shadow {
                    shadow.push_entry(fragment);
                }
                dispatch_listeners(&self.listeners);
            }
            PollAction::Traverse { fragment } => {
                trace!(%fragment, "history traversal detected");
                self.primary.set_fragment(fragment);
            }
            PollAction::Idle => {}
        }
        action
    }
}

impl ChangeNotifier for PollingChangeNotifier {
    fn mode(&self) -> NotifierMode {
        NotifierMode::Polling
    }

    fn add_listener(&self, listener: Listener) {
        self.inner.listeners.borrow_mut().push(listener);
    }

    fn prepare(&self) {
        self.inner.arm();
    }

    fn dispatch_first(&self) {
        let running = match *self.inner.phase.borrow() {
            PollingPhase::Idle => false,
            PollingPhase::Running { .. } => true,
            PollingPhase::AwaitingShadow { .. } | PollingPhase::Unavailable => return,
        };

        if running {
            dispatch_listeners(&self.inner.listeners);
        } else {
            self.inner.arm();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::memory::{ManualTimer, MemoryHiddenContextFactory, MemoryNavigableContext};

    struct Fixture {
        primary: MemoryNavigableContext,
        factory: Rc<MemoryHiddenContextFactory>,
        timer: ManualTimer,
        notifier: PollingChangeNotifier,
        calls: Rc<Cell<usize>>,
    }

    fn fixture(initial: &str) -> Fixture {
        let primary = MemoryNavigableContext::new(initial);
        let factory = Rc::new(MemoryHiddenContextFactory::default());
        let timer = ManualTimer::default();
        let notifier = PollingChangeNotifier::new(
            Rc::new(primary.clone()),
            factory.clone(),
            Rc::new(timer.clone()),
            Duration::from_millis(50),
        );
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        notifier.add_listener(Rc::new(move || counter.set(counter.get() + 1)));
        Fixture {
            primary,
            factory,
            timer,
            notifier,
            calls,
        }
    }

    #[test]
    fn first_dispatch_waits_for_shadow_readiness() {
        let fx = fixture("#a=1");
        fx.notifier.dispatch_first();
        assert_eq!(fx.factory.created(), 1);
        assert_eq!(fx.calls.get(), 0);
        assert!(!fx.notifier.is_running());

        fx.factory.shadow().mark_ready();
        assert!(fx.notifier.is_running());
        assert_eq!(fx.calls.get(), 1);
        assert_eq!(fx.factory.shadow().current_fragment(), "#a=1");
        assert_eq!(fx.timer.pending(), 1);
        assert_eq!(fx.timer.last_delay(), Some(Duration::from_millis(50)));
    }

    #[test]
    fn arming_is_idempotent() {
        let fx = fixture("#");
        fx.notifier.prepare();
        fx.notifier.prepare();
        fx.notifier.dispatch_first();
        assert_eq!(fx.factory.created(), 1);
    }

    #[test]
    fn forward_change_records_shadow_entry_and_notifies_once() {
        let fx = fixture("#a=1");
        fx.notifier.dispatch_first();
        fx.factory.shadow().mark_ready();
        assert_eq!(fx.calls.get(), 1);

        fx.primary.set_fragment("#a=2");
        fx.timer.run_ready();
        assert_eq!(fx.calls.get(), 2);
        assert_eq!(
            fx.factory.shadow().entries(),
            vec!["#a=1".to_string(), "#a=2".to_string()]
        );

        fx.timer.run_ready();
        assert_eq!(fx.calls.get(), 2);
        assert_eq!(fx.timer.pending(), 1);
    }

    #[test]
    fn shadow_traversal_moves_page_then_notifies_next_tick() {
        let fx = fixture("#a=1");
        fx.notifier.dispatch_first();
        fx.factory.shadow().mark_ready();
        fx.primary.set_fragment("#a=2");
        fx.timer.run_ready();
        assert_eq!(fx.calls.get(), 2);

        assert!(fx.factory.shadow().back());
        assert_eq!(
            fx.notifier.tick(),
            PollAction::Traverse {
                fragment: "#a=1".to_string(),
            }
        );
        assert_eq!(fx.primary.current_fragment(), "#a=1");
        assert_eq!(fx.calls.get(), 2);

        assert_eq!(
            fx.notifier.tick(),
            PollAction::Forward {
                fragment: "#a=1".to_string(),
                record_in_shadow: false,
            }
        );
        assert_eq!(fx.calls.get(), 3);
        assert_eq!(fx.factory.shadow().entries().len(), 2);
    }

    #[test]
    fn missing_hidden_context_leaves_notifier_inert() {
        let primary = MemoryNavigableContext::new("#");
        let factory = Rc::new(MemoryHiddenContextFactory::failing());
        let timer = ManualTimer::default();
        let notifier = PollingChangeNotifier::new(
            Rc::new(primary.clone()),
            factory.clone(),
            Rc::new(timer.clone()),
            Duration::from_millis(50),
        );

        notifier.dispatch_first();
        notifier.prepare();
        assert_eq!(factory.created(), 0);
        assert_eq!(timer.pending(), 0);
        assert_eq!(notifier.tick(), PollAction::Idle);
    }
}
