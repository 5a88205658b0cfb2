// ============================================================================
// spark-gestures - Runtime Context
// Thread-local clock and timer queue shared by time-based operators
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use web_time::Instant;

// =============================================================================
// CLOCK
// =============================================================================

/// Where the runtime reads time from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClockMode {
    /// Monotonic wall clock, milliseconds since the context was created
    System,
    /// Manually advanced clock (tests, replays)
    Virtual,
}

// =============================================================================
// TIMERS
// =============================================================================

/// Handle returned by `set_timeout` / `set_interval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub(crate) u64);

pub(crate) struct TimerEntry {
    pub id: TimerId,
    pub due: f64,
    /// `Some(period)` re-arms after each run
    pub period: Option<f64>,
    pub callback: Rc<dyn Fn()>,
}

// =============================================================================
// RUNTIME CONTEXT
// =============================================================================

/// Thread-local state for the cooperative runtime.
///
/// Everything in the crate is single-threaded; this is the only place that
/// holds process-wide mutable state besides the per-target source caches.
pub struct RuntimeContext {
    // =========================================================================
    // CLOCK
    // =========================================================================
    /// Current clock mode
    pub clock_mode: Cell<ClockMode>,

    /// Origin for the system clock
    pub origin: Instant,

    /// Current virtual time (ms)
    pub virtual_now: Cell<f64>,

    // =========================================================================
    // TIMERS
    // =========================================================================
    /// Pending timers, unordered; the scheduler picks the earliest due
    pub(crate) timers: RefCell<Vec<TimerEntry>>,

    /// Next timer id (ids double as FIFO order for equal due times)
    pub next_timer_id: Cell<u64>,

    /// Set while a firing pass runs; nested `run_due_timers` calls return early
    pub is_firing: Cell<bool>,
}

impl RuntimeContext {
    pub fn new() -> Self {
        Self {
            clock_mode: Cell::new(ClockMode::System),
            origin: Instant::now(),
            virtual_now: Cell::new(0.0),
            timers: RefCell::new(Vec::new()),
            next_timer_id: Cell::new(1),
            is_firing: Cell::new(false),
        }
    }

    // =========================================================================
    // CLOCK
    // =========================================================================

    /// Current time in milliseconds on the active clock
    pub fn now(&self) -> f64 {
        match self.clock_mode.get() {
            ClockMode::System => self.origin.elapsed().as_secs_f64() * 1000.0,
            ClockMode::Virtual => self.virtual_now.get(),
        }
    }

    pub fn set_clock_mode(&self, mode: ClockMode) -> ClockMode {
        self.clock_mode.replace(mode)
    }

    // =========================================================================
    // TIMERS
    // =========================================================================

    /// Allocate a fresh timer id
    pub fn next_timer_id(&self) -> TimerId {
        let id = self.next_timer_id.get();
        self.next_timer_id.set(id + 1);
        TimerId(id)
    }

    pub(crate) fn push_timer(&self, entry: TimerEntry) {
        self.timers.borrow_mut().push(entry);
    }

    /// Remove a timer, returning true if it was pending
    pub fn remove_timer(&self, id: TimerId) -> bool {
        let mut timers = self.timers.borrow_mut();
        let before = timers.len();
        timers.retain(|t| t.id != id);
        timers.len() != before
    }

    /// Remove and return the earliest timer due at or before `limit`
    pub(crate) fn take_due_timer(&self, limit: f64) -> Option<TimerEntry> {
        let mut timers = self.timers.borrow_mut();
        let index = timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= limit)
            .min_by(|(_, a), (_, b)| a.due.total_cmp(&b.due).then(a.id.cmp(&b.id)))
            .map(|(i, _)| i)?;
        Some(timers.swap_remove(index))
    }

    pub fn timer_count(&self) -> usize {
        self.timers.borrow().len()
    }

    pub fn clear_timers(&self) {
        self.timers.borrow_mut().clear();
    }
}

impl Default for RuntimeContext {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// THREAD-LOCAL ACCESS
// =============================================================================

thread_local! {
    static CONTEXT: RuntimeContext = RuntimeContext::new();
}

/// Access the thread-local runtime context
pub fn with_context<R>(f: impl FnOnce(&RuntimeContext) -> R) -> R {
    CONTEXT.with(f)
}

/// Active clock mode
pub fn clock_mode() -> ClockMode {
    with_context(|ctx| ctx.clock_mode.get())
}

// =============================================================================
// TESTS
// =============================================================================
