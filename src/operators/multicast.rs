// ============================================================================
// spark-gestures - Multicast Operators
// share and share_replay: one upstream subscription for many consumers
// ============================================================================
//
// Both operators reference-count their consumers:
//
//   first subscriber  -> connect   (source.subscribe into an internal Subject)
//   last unsubscribe  -> disconnect (source teardown runs once)
//   next subscriber   -> connect again, fresh
//
// share_replay additionally keeps the last `n` values. Once the source has
// terminated, late subscribers get that backlog plus the stored terminal
// notification and the source is not subscribed again.
// ============================================================================

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use tracing::debug;

use crate::core::error::StreamError;
use crate::primitives::observer::{FnObserver, Subscriber};
use crate::primitives::stream::{Stream, Subscription, Teardown};
use crate::primitives::subject::{Subject, Terminal};

// =============================================================================
// SHARE
// =============================================================================

struct ShareState<T> {
    subject: Option<Subject<T>>,
    connection: Option<Subscription>,
    refcount: usize,
    /// Bumped on every disconnect so stale teardowns cannot touch a new session
    epoch: u64,
}

impl<T: 'static> ShareState<T> {
    fn disconnect(&mut self) -> Option<Subscription> {
        self.subject = None;
        self.refcount = 0;
        self.epoch += 1;
        self.connection.take()
    }
}

impl<T: 'static> Stream<T> {
    /// Multicast with reference counting.
    ///
    /// # Example
    ///
    /// ```
    /// use std::cell::Cell;
    /// use std::rc::Rc;
    /// use spark_gestures::{Stream, Teardown};
    ///
    /// let runs = Rc::new(Cell::new(0));
    /// let r = runs.clone();
    /// let source: Stream<i32> = Stream::new(move |_| {
    ///     r.set(r.get() + 1);
    ///     Teardown::empty()
    /// });
    ///
    /// let shared = source.share();
    /// let a = shared.for_each(|_| {});
    /// let b = shared.for_each(|_| {});
    /// assert_eq!(runs.get(), 1);
    /// a.unsubscribe();
    /// b.unsubscribe();
    /// ```
    pub fn share(&self) -> Stream<T> {
        let source = self.clone();
        let state = Rc::new(RefCell::new(ShareState {
            subject: None,
            connection: None,
            refcount: 0,
            epoch: 0,
        }));

        Stream::new(move |subscriber: Subscriber<T>| {
            let (subject, epoch, connect) = {
                let mut st = state.borrow_mut();
                if st.subject.as_ref().is_some_and(Subject::is_closed) {
                    st.disconnect();
                }
                let connect = st.subject.is_none();
                let subject = st.subject.get_or_insert_with(Subject::new).clone();
                st.refcount += 1;
                (subject, st.epoch, connect)
            };

            let inner = subject.subscribe(subscriber);
            if connect {
                debug!("share: connecting to source");
                let connection = source.subscribe(subject);
                let mut st = state.borrow_mut();
                if st.epoch == epoch {
                    st.connection = Some(connection);
                }
            }

            let state = Rc::downgrade(&state);
            Teardown::new(move || {
                inner.unsubscribe();
                release_share(&state, epoch);
            })
        })
    }

    /// Multicast that replays the last `buffer_size` values to late subscribers.
    pub fn share_replay(&self, buffer_size: usize) -> Stream<T>
    where
        T: Clone,
    {
        let source = self.clone();
        let state = Rc::new(RefCell::new(ReplayState {
            buffer: VecDeque::with_capacity(buffer_size),
            capacity: buffer_size,
            subject: None,
            connection: None,
            refcount: 0,
            terminal: None,
            epoch: 0,
        }));

        Stream::new(move |subscriber: Subscriber<T>| {
            let (backlog, terminal) = {
                let st = state.borrow();
                (st.buffer.iter().cloned().collect::<Vec<_>>(), st.terminal.clone())
            };

            for value in &backlog {
                if subscriber.is_closed() {
                    return Teardown::empty();
                }
                subscriber.next(value);
            }

            if let Some(terminal) = terminal {
                terminal.deliver(&subscriber);
                return Teardown::empty();
            }

            let (subject, epoch, connect) = {
                let mut st = state.borrow_mut();
                let connect = st.subject.is_none();
                let subject = st.subject.get_or_insert_with(Subject::new).clone();
                st.refcount += 1;
                (subject, st.epoch, connect)
            };

            let inner = subject.subscribe(subscriber);
            if connect {
                debug!(buffer_size = state.borrow().capacity, "share_replay: connecting to source");
                let connection = source.subscribe(recorder(Rc::downgrade(&state), subject));
                let mut st = state.borrow_mut();
                if st.epoch == epoch && st.terminal.is_none() {
                    st.connection = Some(connection);
                }
            }

            let state = Rc::downgrade(&state);
            Teardown::new(move || {
                inner.unsubscribe();
                release_replay(&state, epoch);
            })
        })
    }
}

fn release_share<T: 'static>(state: &Weak<RefCell<ShareState<T>>>, epoch: u64) {
    let Some(state) = state.upgrade() else {
        return;
    };
    let connection = {
        let mut st = state.borrow_mut();
        if st.epoch != epoch {
            return;
        }
        st.refcount = st.refcount.saturating_sub(1);
        if st.refcount > 0 {
            return;
        }
        st.disconnect()
    };
    debug!("share: last subscriber left, disconnecting");
    if let Some(connection) = connection {
        connection.unsubscribe();
    }
}

// =============================================================================
// SHARE REPLAY
// =============================================================================

struct ReplayState<T> {
    buffer: VecDeque<T>,
    capacity: usize,
    subject: Option<Subject<T>>,
    connection: Option<Subscription>,
    refcount: usize,
    terminal: Option<Terminal>,
    epoch: u64,
}

/// Observer for the upstream connection: buffer, then multicast.
fn recorder<T: Clone + 'static>(
    state: Weak<RefCell<ReplayState<T>>>,
    subject: Subject<T>,
) -> FnObserver<T> {
    let (on_error, on_complete) = (state.clone(), state.clone());
    let (error_to, complete_to) = (subject.clone(), subject.clone());
    FnObserver::new(move |value: &T| {
        if let Some(state) = state.upgrade() {
            let mut st = state.borrow_mut();
            if st.capacity > 0 {
                if st.buffer.len() == st.capacity {
                    st.buffer.pop_front();
                }
                st.buffer.push_back(value.clone());
            }
        }
        subject.next(value);
    })
    .on_error(move |error: &StreamError| {
        if let Some(state) = on_error.upgrade() {
            state.borrow_mut().terminal = Some(Terminal::Error(error.clone()));
        }
        error_to.error(error);
    })
    .on_complete(move || {
        if let Some(state) = on_complete.upgrade() {
            state.borrow_mut().terminal = Some(Terminal::Complete);
        }
        complete_to.complete();
    })
}

fn release_replay<T: 'static>(state: &Weak<RefCell<ReplayState<T>>>, epoch: u64) {
    let Some(state) = state.upgrade() else {
        return;
    };
    let connection = {
        let mut st = state.borrow_mut();
        if st.epoch != epoch {
            return;
        }
        st.refcount = st.refcount.saturating_sub(1);
        if st.refcount > 0 || st.terminal.is_some() {
            return;
        }
        st.buffer.clear();
        st.subject = None;
        st.epoch += 1;
        st.connection.take()
    };
    debug!("share_replay: last subscriber left, disconnecting");
    if let Some(connection) = connection {
        connection.unsubscribe();
    }
}

// =============================================================================
// TESTS
// =============================================================================
