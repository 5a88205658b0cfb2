// ============================================================================
// spark-gestures - Observers
// The consumer side of the producer/observer contract
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::core::error::StreamError;
use crate::primitives::stream::Subscription;

// =============================================================================
// OBSERVER TRAIT
// =============================================================================

/// Receives notifications from a stream.
///
/// Values are lent, not moved: `next` gets `&T` and an observer that wants
/// to keep a value past the call must clone it. Recognizers rely on this to
/// reuse pooled records between emissions.
///
/// Any `Fn(&T)` closure is an observer that ignores `error` and `complete`.
pub trait Observer<T> {
    fn next(&self, value: &T);

    fn error(&self, error: &StreamError) {
        let _ = error;
    }

    fn complete(&self) {}
}

impl<T, F> Observer<T> for F
where
    F: Fn(&T),
{
    fn next(&self, value: &T) {
        self(value)
    }
}

// =============================================================================
// FN OBSERVER - closures for each notification
// =============================================================================

/// Observer assembled from closures.
///
/// # Example
///
/// ```
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use spark_gestures::{observer, Stream};
///
/// let done = Rc::new(Cell::new(false));
/// let d = done.clone();
///
/// Stream::of([1, 2, 3]).subscribe(
///     observer(|_: &i32| {}).on_complete(move || d.set(true)),
/// );
/// assert!(done.get());
/// ```
pub struct FnObserver<T> {
    next: Box<dyn Fn(&T)>,
    error: Option<Box<dyn Fn(&StreamError)>>,
    complete: Option<Box<dyn Fn()>>,
}

impl<T> FnObserver<T> {
    pub fn new(next: impl Fn(&T) + 'static) -> Self {
        Self {
            next: Box::new(next),
            error: None,
            complete: None,
        }
    }

    pub fn on_error(mut self, f: impl Fn(&StreamError) + 'static) -> Self {
        self.error = Some(Box::new(f));
        self
    }

    pub fn on_complete(mut self, f: impl Fn() + 'static) -> Self {
        self.complete = Some(Box::new(f));
        self
    }
}

impl<T> Observer<T> for FnObserver<T> {
    fn next(&self, value: &T) {
        (self.next)(value)
    }

    fn error(&self, error: &StreamError) {
        if let Some(f) = &self.error {
            f(error);
        }
    }

    fn complete(&self) {
        if let Some(f) = &self.complete {
            f();
        }
    }
}

/// Shorthand for [`FnObserver::new`].
pub fn observer<T>(next: impl Fn(&T) + 'static) -> FnObserver<T> {
    FnObserver::new(next)
}

// =============================================================================
// SUBSCRIBER - the wrapped observer handed to producers
// =============================================================================

struct SubscriberInner<T> {
    /// Downstream observer; `None` once closed
    destination: RefCell<Option<Rc<dyn Observer<T>>>>,

    /// The owning stream's flow-control flag, read on every `next`
    blocked: Rc<Cell<bool>>,

    /// Finalized on error/complete
    subscription: Subscription,
}

/// The observer a producer talks to.
///
/// - `next` is dropped while the owning stream is blocked (flag read per call)
/// - `error` / `complete` are never blocked, close the subscriber, then run
///   the subscription's teardown
/// - after close (terminal or unsubscribe) every call is a no-op
pub struct Subscriber<T> {
    inner: Rc<SubscriberInner<T>>,
}

impl<T> Clone for Subscriber<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Subscriber<T> {
    pub(crate) fn new(
        destination: Rc<dyn Observer<T>>,
        blocked: Rc<Cell<bool>>,
        subscription: Subscription,
    ) -> Self {
        Self {
            inner: Rc::new(SubscriberInner {
                destination: RefCell::new(Some(destination)),
                blocked,
                subscription,
            }),
        }
    }

    pub fn next(&self, value: &T) {
        if self.inner.blocked.get() {
            return;
        }
        // Clone out so the observer can re-enter (e.g. unsubscribe) freely
        let destination = self.inner.destination.borrow().clone();
        if let Some(destination) = destination {
            destination.next(value);
        }
    }

    pub fn error(&self, error: &StreamError) {
        let destination = self.inner.destination.borrow_mut().take();
        if let Some(destination) = destination {
            destination.error(error);
            self.inner.subscription.unsubscribe();
        }
    }

    pub fn complete(&self) {
        let destination = self.inner.destination.borrow_mut().take();
        if let Some(destination) = destination {
            destination.complete();
            self.inner.subscription.unsubscribe();
        }
    }

    /// True once a terminal notification was delivered or the consumer left.
    pub fn is_closed(&self) -> bool {
        self.inner.destination.borrow().is_none()
    }

    /// The consumer's subscription; producers may attach extra teardown.
    pub fn subscription(&self) -> &Subscription {
        &self.inner.subscription
    }

    /// Detach the downstream observer without notifying it.
    pub(crate) fn close(&self) {
        self.inner.destination.borrow_mut().take();
    }

    pub(crate) fn downgrade(&self) -> WeakSubscriber<T> {
        WeakSubscriber {
            inner: Rc::downgrade(&self.inner),
        }
    }
}

impl<T> Observer<T> for Subscriber<T> {
    fn next(&self, value: &T) {
        Subscriber::next(self, value)
    }

    fn error(&self, error: &StreamError) {
        Subscriber::error(self, error)
    }

    fn complete(&self) {
        Subscriber::complete(self)
    }
}

pub(crate) struct WeakSubscriber<T> {
    inner: Weak<SubscriberInner<T>>,
}

impl<T> WeakSubscriber<T> {
    pub(crate) fn upgrade(&self) -> Option<Subscriber<T>> {
        self.inner.upgrade().map(|inner| Subscriber { inner })
    }
}

// =============================================================================
// TESTS
// =============================================================================
