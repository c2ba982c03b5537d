//! In-memory host primitives for native targets and tests.

use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    rc::Rc,
    time::Duration,
};

use crate::{
    codec::normalize_fragment,
    error::HostError,
    host::{
        Clock, HiddenContextFactory, HistoryCapabilities, HistoryHost, Listener,
        NativeChangeEvents, NavigableContext, ShadowContext, Timer,
    },
};

#[derive(Default)]
struct HistoryStack {
    entries: Vec<String>,
    index: usize,
}

impl HistoryStack {
    fn with_initial(fragment: &str) -> Self {
        Self {
            entries: vec![normalize_fragment(fragment)],
            index: 0,
        }
    }

    fn current(&self) -> String {
        self.entries
            .get(self.index)
            .cloned()
            .unwrap_or_else(|| "#".to_string())
    }

    fn push(&mut self, fragment: String) {
        if self.entries.is_empty() {
            self.entries.push(fragment);
            self.index = 0;
            return;
        }
        self.entries.truncate(self.index + 1);
        self.entries.push(fragment);
        self.index = self.entries.len() - 1;
    }

    fn back(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }

    fn forward(&mut self) -> bool {
        if self.index + 1 >= self.entries.len() {
            return false;
        }
        self.index += 1;
        true
    }
}

struct MemoryNavigableInner {
    history: RefCell<HistoryStack>,
    listeners: RefCell<Vec<Listener>>,
    synthetic_events: Cell<bool>,
}

/// Page context with a history stack that fires native change events on every fragment change.
///
/// Implements both [`NavigableContext`] and [`NativeChangeEvents`], so one value can stand in
/// for the page in either notification mode. Clones share state.
#[derive(Clone)]
pub struct MemoryNavigableContext {
    inner: Rc<MemoryNavigableInner>,
}

impl Default for MemoryNavigableContext {
    fn default() -> Self {
        Self::new("#")
    }
}

impl MemoryNavigableContext {
    /// Creates a context whose only history entry is `fragment`.
    pub fn new(fragment: &str) -> Self {
        Self {
            inner: Rc::new(MemoryNavigableInner {
                history: RefCell::new(HistoryStack::with_initial(fragment)),
                listeners: RefCell::new(Vec::new()),
                synthetic_events: Cell::new(true),
            }),
        }
    }

    /// Enables or disables synthetic event support.
    pub fn set_synthetic_events(&self, enabled: bool) {
        self.inner.synthetic_events.set(enabled);
    }

    /// Simulates the browser back button. Returns `false` at the start of history.
    pub fn back(&self) -> bool {
        let moved = self.inner.history.borrow_mut().back();
        if moved {
            self.fire();
        }
        moved
    }

    /// Simulates the browser forward button. Returns `false` at the end of history.
    pub fn forward(&self) -> bool {
        let moved = self.inner.history.borrow_mut().forward();
        if moved {
            self.fire();
        }
        moved
    }

    /// All history entries, oldest first.
    pub fn entries(&self) -> Vec<String> {
        self.inner.history.borrow().entries.clone()
    }

    fn fire(&self) {
        let snapshot = self.inner.listeners.borrow().clone();
        for listener in &snapshot {
            listener();
        }
    }
}

impl NavigableContext for MemoryNavigableContext {
    fn current_fragment(&self) -> String {
        self.inner.history.borrow().current()
    }

    fn set_fragment(&self, fragment: &str) {
        let fragment = normalize_fragment(fragment);
        {
            let mut history = self.inner.history.borrow_mut();
            if history.current() == fragment {
                return;
            }
            history.push(fragment);
        }
        self.fire();
    }
}

impl NativeChangeEvents for MemoryNavigableContext {
    fn subscribe(&self, listener: Listener) {
        self.inner.listeners.borrow_mut().push(listener);
    }

    fn dispatch_synthetic(&self) -> Result<(), HostError> {
        if !self.inner.synthetic_events.get() {
            return Err(HostError::Unavailable {
                capability: "synthetic-events",
            });
        }
        self.fire();
        Ok(())
    }
}

#[derive(Default)]
struct MemoryShadowInner {
    history: RefCell<HistoryStack>,
    ready: Cell<bool>,
    pending: RefCell<Vec<Box<dyn FnOnce()>>>,
}

/// Shadow context whose readiness is signalled manually with [`MemoryShadowContext::mark_ready`].
///
/// Clones share state.
#[derive(Clone, Default)]
pub struct MemoryShadowContext {
    inner: Rc<MemoryShadowInner>,
}

impl MemoryShadowContext {
    /// Marks the context loaded and runs queued readiness callbacks.
    pub fn mark_ready(&self) {
        self.inner.ready.set(true);
        let pending = std::mem::take(&mut *self.inner.pending.borrow_mut());
        for callback in pending {
            callback();
        }
    }

    /// Returns whether [`MemoryShadowContext::mark_ready`] has been called.
    pub fn is_ready(&self) -> bool {
        self.inner.ready.get()
    }

    /// Moves the shadow history back one entry, as a browser back navigation would.
    pub fn back(&self) -> bool {
        self.inner.history.borrow_mut().back()
    }

    /// Moves the shadow history forward one entry.
    pub fn forward(&self) -> bool {
        self.inner.history.borrow_mut().forward()
    }

    /// All recorded entries, oldest first.
    pub fn entries(&self) -> Vec<String> {
        self.inner.history.borrow().entries.clone()
    }
}

impl NavigableContext for MemoryShadowContext {
    fn current_fragment(&self) -> String {
        self.inner.history.borrow().current()
    }

    fn set_fragment(&self, fragment: &str) {
        self.push_entry(fragment);
    }
}

impl ShadowContext for MemoryShadowContext {
    fn push_entry(&self, fragment: &str) {
        self.inner
            .history
            .borrow_mut()
            .push(normalize_fragment(fragment));
    }

    fn when_ready(&self, callback: Box<dyn FnOnce()>) {
        if self.inner.ready.get() {
            callback();
        } else {
            self.inner.pending.borrow_mut().push(callback);
        }
    }
}

#[derive(Default)]
/// Factory handing out one shared [`MemoryShadowContext`].
pub struct MemoryHiddenContextFactory {
    shadow: MemoryShadowContext,
    created: Cell<usize>,
    failing: bool,
}

impl MemoryHiddenContextFactory {
    /// Factory whose creation always fails, like a host without hidden contexts.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// The shadow context handed out by this factory.
    pub fn shadow(&self) -> MemoryShadowContext {
        self.shadow.clone()
    }

    /// Number of successful creations.
    pub fn created(&self) -> usize {
        self.created.get()
    }
}

impl HiddenContextFactory for MemoryHiddenContextFactory {
    fn create_hidden_context(&self) -> Result<Rc<dyn ShadowContext>, HostError> {
        if self.failing {
            return Err(HostError::Unavailable {
                capability: "hidden-context",
            });
        }
        self.created.set(self.created.get() + 1);
        Ok(Rc::new(self.shadow.clone()))
    }
}

type TimerQueue = VecDeque<(Duration, Box<dyn FnOnce()>)>;

/// Timer whose callbacks run only when the test asks. Clones share the queue.
#[derive(Clone, Default)]
pub struct ManualTimer {
    queue: Rc<RefCell<TimerQueue>>,
    last_delay: Rc<Cell<Option<Duration>>>,
}

impl ManualTimer {
    /// Number of queued callbacks.
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Delay requested by the most recent `set_timeout` call.
    pub fn last_delay(&self) -> Option<Duration> {
        self.last_delay.get()
    }

    /// Runs the oldest queued callback. Returns `false` when the queue is empty.
    pub fn run_next(&self) -> bool {
        let next = self.queue.borrow_mut().pop_front();
        match next {
            Some((_, callback)) => {
                callback();
                true
            }
            None => false,
        }
    }

    /// Runs every callback queued at call time; callbacks they schedule stay queued.
    ///
    /// Returns the number of callbacks run.
    pub fn run_ready(&self) -> usize {
        let due = self.pending();
        for _ in 0..due {
            self.run_next();
        }
        due
    }
}

impl Timer for ManualTimer {
    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) {
        self.last_delay.set(Some(delay));
        self.queue.borrow_mut().push_back((delay, callback));
    }
}

#[derive(Debug, Clone, Default)]
/// Settable clock. Clones share the current time.
pub struct FixedClock {
    now_ms: Rc<Cell<u64>>,
}

impl FixedClock {
    /// Creates a clock reading `now_ms`.
    pub fn new(now_ms: u64) -> Self {
        Self {
            now_ms: Rc::new(Cell::new(now_ms)),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by_ms: u64) {
        self.now_ms.set(self.now_ms.get().saturating_add(by_ms));
    }
}

impl Clock for FixedClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.get()
    }
}

/// All in-memory primitives wired together, ready to become a [`HistoryHost`].
#[derive(Clone)]
pub struct MemoryHost {
    /// Page context and native event source.
    pub primary: MemoryNavigableContext,
    /// Hidden-context factory (shares [`MemoryHost::shadow`]).
    pub hidden_contexts: Rc<MemoryHiddenContextFactory>,
    /// Timer driving polling.
    pub timer: ManualTimer,
    /// Clock for the `__t` marker.
    pub clock: FixedClock,
}

impl MemoryHost {
    /// Creates a host whose page starts at `fragment`.
    pub fn new(fragment: &str) -> Self {
        Self {
            primary: MemoryNavigableContext::new(fragment),
            hidden_contexts: Rc::new(MemoryHiddenContextFactory::default()),
            timer: ManualTimer::default(),
            clock: FixedClock::new(1),
        }
    }

    /// The shadow context the factory hands out.
    pub fn shadow(&self) -> MemoryShadowContext {
        self.hidden_contexts.shadow()
    }

    /// Builds the injectable host bundle with the given capability posture.
    pub fn services(&self, capabilities: HistoryCapabilities) -> HistoryHost {
        self.primary
            .set_synthetic_events(capabilities.synthetic_events.is_available());
        HistoryHost {
            primary: Rc::new(self.primary.clone()),
            native_events: Rc::new(self.primary.clone()),
            hidden_contexts: self.hidden_contexts.clone(),
            timer: Rc::new(self.timer.clone()),
            clock: Rc::new(self.clock.clone()),
            capabilities,
        }
    }
}
