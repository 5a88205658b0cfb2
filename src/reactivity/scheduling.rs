// ============================================================================
// spark-gestures - Timer Scheduling
// Cooperative timers for time-based operators
// ============================================================================
//
// There is no event loop in the crate. Timers are queued in the thread-local
// context and fired by whoever owns the loop:
//
// - run_due_timers: fire everything due on the active clock (host loop tick)
// - advance_time:   move the virtual clock forward, firing timers in order
//
// Firing is always a synchronous re-entry into the pipeline, never a
// concurrent one.
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;

use tracing::warn;

use crate::core::constants::MIN_TIMER_PERIOD_MS;
use crate::core::context::{with_context, ClockMode, TimerEntry, TimerId};

// =============================================================================
// CLOCK
// =============================================================================

/// Current runtime time in milliseconds.
pub fn now() -> f64 {
    with_context(|ctx| ctx.now())
}

/// Switch to a virtual clock starting at `start` ms. Pending timers are dropped.
///
/// # Example
///
/// ```
/// use spark_gestures::reactivity::scheduling::{advance_time, now, use_virtual_time};
///
/// use_virtual_time(0.0);
/// advance_time(250.0);
/// assert_eq!(now(), 250.0);
/// ```
pub fn use_virtual_time(start: f64) {
    with_context(|ctx| {
        ctx.clear_timers();
        ctx.virtual_now.set(start);
        ctx.set_clock_mode(ClockMode::Virtual);
    });
}

/// Switch back to the monotonic system clock. Pending timers are dropped.
pub fn use_system_time() {
    with_context(|ctx| {
        ctx.clear_timers();
        ctx.set_clock_mode(ClockMode::System);
    });
}

// =============================================================================
// SCHEDULE
// =============================================================================

/// Run `callback` once after `delay` ms.
pub fn set_timeout(delay: f64, callback: impl FnOnce() + 'static) -> TimerId {
    let slot = RefCell::new(Some(callback));
    let callback: Rc<dyn Fn()> = Rc::new(move || {
        let f = slot.borrow_mut().take();
        if let Some(f) = f {
            f();
        }
    });
    schedule(delay, None, callback)
}

/// Run `callback` every `period` ms until cleared.
///
/// Periods below [`MIN_TIMER_PERIOD_MS`] (including zero and NaN) are raised
/// to it.
pub fn set_interval(period: f64, callback: impl Fn() + 'static) -> TimerId {
    let period = period.max(MIN_TIMER_PERIOD_MS);
    schedule(period, Some(period), Rc::new(callback))
}

/// Cancel a pending timer. Returns false if it already ran or was cleared.
pub fn clear_timer(id: TimerId) -> bool {
    with_context(|ctx| ctx.remove_timer(id))
}

/// Number of timers waiting to fire.
pub fn pending_timer_count() -> usize {
    with_context(|ctx| ctx.timer_count())
}

fn schedule(delay: f64, period: Option<f64>, callback: Rc<dyn Fn()>) -> TimerId {
    let delay = if delay.is_finite() {
        delay.max(0.0)
    } else {
        0.0
    };
    with_context(|ctx| {
        let id = ctx.next_timer_id();
        ctx.push_timer(TimerEntry {
            id,
            due: ctx.now() + delay,
            period,
            callback,
        });
        id
    })
}

// =============================================================================
// FIRE
// =============================================================================

/// Fire one due timer, if any. The callback runs outside the context borrow.
fn fire_next(limit: f64, advance_clock: bool) -> bool {
    let Some(entry) = with_context(|ctx| ctx.take_due_timer(limit)) else {
        return false;
    };

    with_context(|ctx| {
        if advance_clock && entry.due > ctx.virtual_now.get() {
            ctx.virtual_now.set(entry.due);
        }
        if let Some(period) = entry.period {
            let due = entry.due + period;
            if due > entry.due {
                ctx.push_timer(TimerEntry {
                    id: entry.id,
                    due,
                    period: entry.period,
                    callback: entry.callback.clone(),
                });
            } else {
                warn!(id = ?entry.id, due, "interval can no longer advance; dropped");
            }
        }
    });

    (entry.callback)();
    true
}

/// Marks a firing pass; restores the previous flag on drop, including unwinds
/// out of a panicking callback.
struct FiringPass {
    was_firing: bool,
}

impl FiringPass {
    fn enter() -> Self {
        Self {
            was_firing: with_context(|ctx| ctx.is_firing.replace(true)),
        }
    }
}

impl Drop for FiringPass {
    fn drop(&mut self) {
        with_context(|ctx| ctx.is_firing.set(self.was_firing));
    }
}

/// Fire every timer due on the active clock. Returns how many ran.
///
/// Called from inside a timer callback this is a no-op returning 0: the
/// running pass already picks up anything newly due.
pub fn run_due_timers() -> usize {
    let pass = FiringPass::enter();
    if pass.was_firing {
        return 0;
    }
    let limit = now();
    let mut fired = 0;
    while fire_next(limit, false) {
        fired += 1;
    }
    fired
}

/// Advance the virtual clock by `ms`, firing timers in due order.
///
/// Has no effect on the clock in system mode (timers due now still fire).
pub fn advance_time(ms: f64) -> usize {
    let virtual_mode = with_context(|ctx| ctx.clock_mode.get() == ClockMode::Virtual);
    if !virtual_mode {
        return run_due_timers();
    }

    let target = with_context(|ctx| ctx.virtual_now.get() + ms.max(0.0));
    let _pass = FiringPass::enter();
    let mut fired = 0;
    while fire_next(target, true) {
        fired += 1;
    }
    with_context(|ctx| {
        if ctx.virtual_now.get() < target {
            ctx.virtual_now.set(target);
        }
    });
    fired
}

// =============================================================================
// TESTS
// =============================================================================
