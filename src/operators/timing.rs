// ============================================================================
// spark-gestures - Timing Operators
// debounce, throttle, sample_time
// ============================================================================
//
// Time-based operators schedule cooperative timers through
// reactivity::scheduling. Every timer an operator owns is cleared on
// teardown, so an unsubscribed pipeline leaves nothing in the queue.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::core::context::TimerId;
use crate::operators::forward;
use crate::primitives::observer::Subscriber;
use crate::primitives::stream::{Stream, Teardown};
use crate::reactivity::scheduling::{clear_timer, set_interval, set_timeout};

/// The single timer an operator subscription may own.
#[derive(Default)]
struct TimerSlot(Cell<Option<TimerId>>);

impl TimerSlot {
    fn replace(&self, id: TimerId) {
        if let Some(old) = self.0.replace(Some(id)) {
            clear_timer(old);
        }
    }

    fn cancel(&self) {
        if let Some(id) = self.0.take() {
            clear_timer(id);
        }
    }

    fn forget(&self) {
        self.0.set(None);
    }
}

impl<T: Clone + 'static> Stream<T> {
    /// Emit a value once `ms` pass without a newer one.
    ///
    /// A pending value is flushed when the source completes.
    pub fn debounce(&self, ms: f64) -> Stream<T> {
        let source = self.clone();
        Stream::new(move |subscriber: Subscriber<T>| {
            let pending: Rc<RefCell<Option<T>>> = Rc::new(RefCell::new(None));
            let timer = Rc::new(TimerSlot::default());

            let (value_slot, value_timer, downstream) =
                (pending.clone(), timer.clone(), subscriber.clone());
            let (flush_slot, flush_timer, flush_to) =
                (pending.clone(), timer.clone(), subscriber.clone());
            let error_timer = timer.clone();
            let error_to = subscriber.clone();

            let upstream = source.subscribe_for(
                &subscriber,
                forward(&subscriber, move |value: &T| {
                    *value_slot.borrow_mut() = Some(value.clone());
                    let (slot, fired, to) =
                        (value_slot.clone(), value_timer.clone(), downstream.clone());
                    value_timer.replace(set_timeout(ms, move || {
                        fired.forget();
                        let value = slot.borrow_mut().take();
                        if let Some(value) = value {
                            to.next(&value);
                        }
                    }));
                })
                .on_complete(move || {
                    flush_timer.cancel();
                    let value = flush_slot.borrow_mut().take();
                    if let Some(value) = value {
                        flush_to.next(&value);
                    }
                    flush_to.complete();
                })
                .on_error(move |e| {
                    error_timer.cancel();
                    error_to.error(e);
                }),
            );

            Teardown::new(move || {
                upstream.unsubscribe();
                timer.cancel();
            })
        })
    }

    /// Emit a value, then ignore the source for `ms`.
    pub fn throttle(&self, ms: f64) -> Stream<T> {
        let source = self.clone();
        Stream::new(move |subscriber: Subscriber<T>| {
            let timer = Rc::new(TimerSlot::default());
            let closed_window = Rc::new(Cell::new(false));

            let (window, window_timer, downstream) =
                (closed_window.clone(), timer.clone(), subscriber.clone());
            let observer = forward(&subscriber, move |value: &T| {
                if window.get() {
                    return;
                }
                window.set(true);
                let (reopen, fired) = (window.clone(), window_timer.clone());
                window_timer.replace(set_timeout(ms, move || {
                    fired.forget();
                    reopen.set(false);
                }));
                downstream.next(value);
            });
            let upstream = source.subscribe_for(&subscriber, observer);

            Teardown::new(move || {
                upstream.unsubscribe();
                timer.cancel();
            })
        })
    }

    /// Emit the latest value every `ms`, if one arrived since the last tick.
    pub fn sample_time(&self, ms: f64) -> Stream<T> {
        let source = self.clone();
        Stream::new(move |subscriber: Subscriber<T>| {
            let latest: Rc<RefCell<Option<T>>> = Rc::new(RefCell::new(None));
            let timer = Rc::new(TimerSlot::default());

            let (tick_slot, tick_to) = (latest.clone(), subscriber.clone());
            timer.replace(set_interval(ms, move || {
                let value = tick_slot.borrow_mut().take();
                if let Some(value) = value {
                    tick_to.next(&value);
                }
            }));

            let store = latest.clone();
            let (end_timer, end_to) = (timer.clone(), subscriber.clone());
            let upstream = source.subscribe_for(
                &subscriber,
                forward(&subscriber, move |value: &T| {
                    *store.borrow_mut() = Some(value.clone());
                })
                .on_complete(move || {
                    end_timer.cancel();
                    end_to.complete();
                }),
            );

            Teardown::new(move || {
                upstream.unsubscribe();
                timer.cancel();
            })
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::observer::observer;
    use crate::primitives::subject::Subject;
    use crate::reactivity::scheduling::{advance_time, pending_timer_count, use_virtual_time};

    type Log = Rc<RefCell<Vec<String>>>;

    fn record<T: std::fmt::Debug + 'static>(
        stream: &Stream<T>,
    ) -> (Log, crate::primitives::stream::Subscription) {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let (n, c) = (log.clone(), log.clone());
        let sub = stream.subscribe(
            observer(move |v: &T| n.borrow_mut().push(format!("{v:?}")))
                .on_complete(move || c.borrow_mut().push("complete".into())),
        );
        (log, sub)
    }

    #[test]
    fn debounce_emits_after_quiet_period() {
        use_virtual_time(0.0);
        let subject = Subject::new();
        let (log, _s) = record(&subject.stream().debounce(50.0));

        subject.next(&1);
        advance_time(30.0);
        subject.next(&2);
        advance_time(30.0);
        assert!(log.borrow().is_empty());
        advance_time(20.0);
        assert_eq!(*log.borrow(), vec!["2"]);
        assert_eq!(pending_timer_count(), 0);
    }

    #[test]
    fn debounce_flushes_on_complete() {
        use_virtual_time(0.0);
        let subject = Subject::new();
        let (log, _s) = record(&subject.stream().debounce(50.0));
        subject.next(&7);
        subject.complete();
        assert_eq!(*log.borrow(), vec!["7", "complete"]);
        assert_eq!(pending_timer_count(), 0);
    }

    #[test]
    fn throttle_keeps_leading_edge() {
        use_virtual_time(0.0);
        let subject = Subject::new();
        let (log, _s) = record(&subject.stream().throttle(100.0));

        subject.next(&1);
        subject.next(&2);
        advance_time(50.0);
        subject.next(&3);
        advance_time(50.0);
        subject.next(&4);

        assert_eq!(*log.borrow(), vec!["1", "4"]);
    }

    #[test]
    fn sample_time_emits_latest_per_tick() {
        use_virtual_time(0.0);
        let subject = Subject::new();
        let (log, _s) = record(&subject.stream().sample_time(10.0));

        subject.next(&1);
        subject.next(&2);
        advance_time(10.0);
        advance_time(10.0);
        subject.next(&3);
        advance_time(10.0);

        assert_eq!(*log.borrow(), vec!["2", "3"]);
    }

    #[test]
    fn unsubscribe_clears_timers() {
        use_virtual_time(0.0);
        let subject = Subject::new();
        let (_a, debounced) = record(&subject.stream().debounce(50.0));
        let (_b, throttled) = record(&subject.stream().throttle(50.0));
        let (_c, sampled) = record(&subject.stream().sample_time(50.0));
        subject.next(&1);
        assert_eq!(pending_timer_count(), 3);

        debounced.unsubscribe();
        throttled.unsubscribe();
        sampled.unsubscribe();
        assert_eq!(pending_timer_count(), 0);
        assert_eq!(subject.observer_count(), 0);
    }

    #[test]
    fn zero_period_sampling_ticks_every_millisecond() {
        use_virtual_time(0.0);
        let subject = Subject::new();
        let (log, _s) = record(&subject.stream().sample_time(0.0));

        subject.next(&1);
        assert_eq!(advance_time(3.0), 3);
        subject.next(&2);
        advance_time(1.0);

        assert_eq!(*log.borrow(), vec!["1", "2"]);
        assert_eq!(pending_timer_count(), 1);
    }
}
