// ============================================================================
// spark-gestures - Subjects
// Multicast streams that can be pushed to imperatively
// ============================================================================
//
// A Subject is both ends at once: application code calls next/error/complete
// and every current subscriber hears it. After a terminal notification the
// subject is closed for good; further pushes are no-ops and late subscribers
// get the stored terminal immediately.
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::core::error::StreamError;
use crate::primitives::observer::{Observer, Subscriber};
use crate::primitives::stream::{Stream, Subscription, Teardown};

// =============================================================================
// TERMINAL NOTIFICATION
// =============================================================================

/// Stored `error` / `complete`, replayed to late subscribers.
#[derive(Debug, Clone)]
pub(crate) enum Terminal {
    Error(StreamError),
    Complete,
}

impl Terminal {
    pub(crate) fn deliver<T>(&self, subscriber: &Subscriber<T>) {
        match self {
            Terminal::Error(error) => subscriber.error(error),
            Terminal::Complete => subscriber.complete(),
        }
    }
}

// =============================================================================
// SUBJECT<T>
// =============================================================================

struct SubjectState<T> {
    observers: Vec<(u64, Subscriber<T>)>,
    next_id: u64,
    terminal: Option<Terminal>,
}

/// A hot, multicast stream fed by hand.
///
/// Cloning shares the subject.
///
/// # Example
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use spark_gestures::Subject;
///
/// let subject = Subject::new();
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let s = seen.clone();
/// subject.stream().for_each(move |v: &i32| s.borrow_mut().push(*v));
///
/// subject.next(&1);
/// subject.complete();
/// subject.next(&2); // closed: ignored
///
/// assert_eq!(*seen.borrow(), vec![1]);
/// ```
pub struct Subject<T> {
    state: Rc<RefCell<SubjectState<T>>>,
    stream: Stream<T>,
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            stream: self.stream.clone(),
        }
    }
}

impl<T: 'static> Subject<T> {
    pub fn new() -> Self {
        let state = Rc::new(RefCell::new(SubjectState {
            observers: Vec::new(),
            next_id: 0,
            terminal: None,
        }));

        let producer_state = state.clone();
        let stream = Stream::new(move |subscriber: Subscriber<T>| {
            let terminal = producer_state.borrow().terminal.clone();
            if let Some(terminal) = terminal {
                terminal.deliver(&subscriber);
                return Teardown::empty();
            }

            let id = {
                let mut state = producer_state.borrow_mut();
                let id = state.next_id;
                state.next_id += 1;
                state.observers.push((id, subscriber));
                id
            };

            let weak = Rc::downgrade(&producer_state);
            Teardown::new(move || {
                if let Some(state) = weak.upgrade() {
                    state.borrow_mut().observers.retain(|(oid, _)| *oid != id);
                }
            })
        });

        Self { state, stream }
    }

    /// The subscribable side.
    pub fn stream(&self) -> Stream<T> {
        self.stream.clone()
    }

    pub fn subscribe(&self, observer: impl Observer<T> + 'static) -> Subscription {
        self.stream.subscribe(observer)
    }

    pub fn next(&self, value: &T) {
        let observers = self.snapshot();
        for subscriber in observers {
            subscriber.next(value);
        }
    }

    pub fn error(&self, error: &StreamError) {
        self.terminate(Terminal::Error(error.clone()));
    }

    pub fn complete(&self) {
        self.terminate(Terminal::Complete);
    }

    /// True after `error` or `complete`.
    pub fn is_closed(&self) -> bool {
        self.state.borrow().terminal.is_some()
    }

    /// Current number of subscribers.
    pub fn observer_count(&self) -> usize {
        self.state.borrow().observers.len()
    }

    /// Drop `next` pushes for every subscriber until [`unblock`](Subject::unblock).
    pub fn block(&self) {
        self.stream.block();
    }

    pub fn unblock(&self) {
        self.stream.unblock();
    }

    pub fn is_blocked(&self) -> bool {
        self.stream.is_blocked()
    }

    // Closed subjects have no observers, so the snapshot is empty after a terminal
    fn snapshot(&self) -> Vec<Subscriber<T>> {
        self.state
            .borrow()
            .observers
            .iter()
            .map(|(_, s)| s.clone())
            .collect()
    }

    fn terminate(&self, terminal: Terminal) {
        let observers = {
            let mut state = self.state.borrow_mut();
            if state.terminal.is_some() {
                return;
            }
            state.terminal = Some(terminal.clone());
            std::mem::take(&mut state.observers)
        };
        debug!(observers = observers.len(), "subject closed");
        for (_, subscriber) in observers {
            terminal.deliver(&subscriber);
        }
    }
}

impl<T: 'static> Default for Subject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Observer<T> for Subject<T> {
    fn next(&self, value: &T) {
        Subject::next(self, value)
    }

    fn error(&self, error: &StreamError) {
        Subject::error(self, error)
    }

    fn complete(&self) {
        Subject::complete(self)
    }
}

// =============================================================================
// BEHAVIOR SUBJECT<T>
// =============================================================================

/// A subject with a current value, replayed to each new subscriber.
///
/// # Example
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use spark_gestures::BehaviorSubject;
///
/// let zoom = BehaviorSubject::new(1.0);
/// zoom.next(&1.5);
///
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let s = seen.clone();
/// zoom.stream().for_each(move |v: &f64| s.borrow_mut().push(*v));
/// zoom.next(&2.0);
///
/// assert_eq!(*seen.borrow(), vec![1.5, 2.0]);
/// assert_eq!(zoom.value(), 2.0);
/// ```
pub struct BehaviorSubject<T> {
    subject: Subject<T>,
    current: Rc<RefCell<T>>,
    stream: Stream<T>,
}

impl<T> Clone for BehaviorSubject<T> {
    fn clone(&self) -> Self {
        Self {
            subject: self.subject.clone(),
            current: self.current.clone(),
            stream: self.stream.clone(),
        }
    }
}

impl<T: Clone + 'static> BehaviorSubject<T> {
    pub fn new(initial: T) -> Self {
        let subject = Subject::new();
        let current = Rc::new(RefCell::new(initial));

        let (inner, value) = (subject.clone(), current.clone());
        let stream = Stream::new(move |subscriber: Subscriber<T>| {
            if !inner.is_closed() {
                let snapshot = value.borrow().clone();
                subscriber.next(&snapshot);
            }
            Teardown::from(inner.subscribe(subscriber))
        });

        Self {
            subject,
            current,
            stream,
        }
    }

    /// Latest value (the initial one until the first `next`).
    pub fn value(&self) -> T {
        self.current.borrow().clone()
    }

    pub fn stream(&self) -> Stream<T> {
        self.stream.clone()
    }

    pub fn subscribe(&self, observer: impl Observer<T> + 'static) -> Subscription {
        self.stream.subscribe(observer)
    }

    pub fn next(&self, value: &T) {
        if self.subject.is_closed() {
            return;
        }
        *self.current.borrow_mut() = value.clone();
        self.subject.next(value);
    }

    pub fn error(&self, error: &StreamError) {
        self.subject.error(error);
    }

    pub fn complete(&self) {
        self.subject.complete();
    }

    pub fn is_closed(&self) -> bool {
        self.subject.is_closed()
    }

    pub fn observer_count(&self) -> usize {
        self.subject.observer_count()
    }
}

impl<T: Clone + 'static> Observer<T> for BehaviorSubject<T> {
    fn next(&self, value: &T) {
        BehaviorSubject::next(self, value)
    }

    fn error(&self, error: &StreamError) {
        BehaviorSubject::error(self, error)
    }

    fn complete(&self) {
        BehaviorSubject::complete(self)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::observer::observer;
    use std::cell::Cell;

    fn record(stream: &Stream<i32>) -> (Rc<RefCell<Vec<String>>>, Subscription) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let (n, e, c) = (log.clone(), log.clone(), log.clone());
        let sub = stream.subscribe(
            observer(move |v: &i32| n.borrow_mut().push(format!("{v}")))
                .on_error(move |err| e.borrow_mut().push(format!("error {err}")))
                .on_complete(move || c.borrow_mut().push("complete".into())),
        );
        (log, sub)
    }

    #[test]
    fn multicasts_to_every_subscriber() {
        let subject = Subject::new();
        let (a, _sa) = record(&subject.stream());
        let (b, _sb) = record(&subject.stream());

        subject.next(&1);
        subject.next(&2);

        assert_eq!(*a.borrow(), vec!["1", "2"]);
        assert_eq!(*b.borrow(), vec!["1", "2"]);
        assert_eq!(subject.observer_count(), 2);
    }

    #[test]
    fn closed_subject_ignores_next() {
        let subject = Subject::new();
        let (log, _s) = record(&subject.stream());

        subject.next(&1);
        subject.error(&StreamError::failed("boom"));
        subject.next(&2);
        subject.complete();

        assert_eq!(*log.borrow(), vec!["1", "error boom"]);
        assert!(subject.is_closed());
        assert_eq!(subject.observer_count(), 0);
    }

    #[test]
    fn late_subscriber_gets_terminal_immediately() {
        let subject: Subject<i32> = Subject::new();
        subject.complete();
        let (log, sub) = record(&subject.stream());
        assert_eq!(*log.borrow(), vec!["complete"]);
        assert!(sub.is_closed());
    }

    #[test]
    fn unsubscribe_removes_observer() {
        let subject = Subject::new();
        let (log, sub) = record(&subject.stream());
        subject.next(&1);
        sub.unsubscribe();
        sub.unsubscribe();
        subject.next(&2);
        assert_eq!(*log.borrow(), vec!["1"]);
        assert_eq!(subject.observer_count(), 0);
    }

    #[test]
    fn unsubscribing_sibling_during_next_is_safe() {
        let subject = Subject::new();
        let second: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let hits = Rc::new(Cell::new(0));

        let s = second.clone();
        subject.stream().for_each(move |_: &i32| {
            if let Some(sub) = s.borrow().as_ref() {
                sub.unsubscribe();
            }
        });
        let h = hits.clone();
        *second.borrow_mut() = Some(subject.stream().for_each(move |_: &i32| h.set(h.get() + 1)));

        subject.next(&1);
        subject.next(&2);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn blocked_subject_drops_values_but_completes() {
        let subject = Subject::new();
        let (log, _s) = record(&subject.stream());
        subject.block();
        subject.next(&1);
        subject.complete();
        subject.unblock();
        assert_eq!(*log.borrow(), vec!["complete"]);
    }

    #[test]
    fn behavior_replays_current_value() {
        let subject = BehaviorSubject::new(0);
        subject.next(&5);
        let (log, _s) = record(&subject.stream());
        subject.next(&6);
        assert_eq!(*log.borrow(), vec!["5", "6"]);
        assert_eq!(subject.value(), 6);
    }

    #[test]
    fn behavior_after_complete_only_completes() {
        let subject = BehaviorSubject::new(3);
        subject.complete();
        subject.next(&4);
        let (log, _s) = record(&subject.stream());
        assert_eq!(*log.borrow(), vec!["complete"]);
        assert_eq!(subject.value(), 3);
    }

    #[test]
    fn subject_as_observer() {
        let subject = Subject::new();
        let (log, _s) = record(&subject.stream());
        crate::primitives::stream::Stream::of([7, 8]).subscribe(subject.clone());
        assert_eq!(*log.borrow(), vec!["7", "8", "complete"]);
    }
}
