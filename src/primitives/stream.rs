// ============================================================================
// spark-gestures - Stream Primitive
// Push-based, blockable, lazily-subscribed event producer
// ============================================================================
//
// A Stream is a production recipe: every subscribe() runs the producer with a
// fresh Subscriber and gets back a Subscription. Nothing is queued; a blocked
// stream drops `next` and lets `error`/`complete` through.
//
// Teardown ordering on unsubscribe:
// 1. the downstream observer is detached (no notification can reach it)
// 2. the teardown returned by the producer runs
// Both happen at most once.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::core::error::StreamError;
use crate::primitives::observer::{Observer, Subscriber};
use crate::reactivity::scheduling::{clear_timer, set_interval, set_timeout};

// =============================================================================
// TEARDOWN
// =============================================================================

/// Cleanup returned by a producer.
#[derive(Default)]
pub struct Teardown(Option<Box<dyn FnOnce()>>);

impl Teardown {
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Some(Box::new(f)))
    }

    /// Nothing to clean up
    pub fn empty() -> Self {
        Self(None)
    }

    pub fn run(self) {
        if let Some(f) = self.0 {
            f();
        }
    }
}

impl From<Subscription> for Teardown {
    fn from(subscription: Subscription) -> Self {
        Teardown::new(move || subscription.unsubscribe())
    }
}

// =============================================================================
// SUBSCRIPTION
// =============================================================================

struct SubscriptionInner {
    closed: Cell<bool>,
    finalizers: RefCell<Vec<Box<dyn FnOnce()>>>,
}

/// Handle returned by [`Stream::subscribe`].
///
/// Cloning shares the handle. `unsubscribe` is idempotent: finalizers run
/// exactly once, in the order they were added. Dropping a `Subscription` does
/// not unsubscribe; use [`Subscription::guard`] for scope-bound lifetimes.
#[derive(Clone)]
pub struct Subscription {
    inner: Rc<SubscriptionInner>,
}

impl Subscription {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(SubscriptionInner {
                closed: Cell::new(false),
                finalizers: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Attach cleanup. Runs immediately if already unsubscribed.
    pub fn add(&self, finalizer: impl FnOnce() + 'static) {
        if self.inner.closed.get() {
            finalizer();
            return;
        }
        self.inner.finalizers.borrow_mut().push(Box::new(finalizer));
    }

    pub fn add_teardown(&self, teardown: Teardown) {
        if let Some(f) = teardown.0 {
            self.add(f);
        }
    }

    pub fn unsubscribe(&self) {
        if self.inner.closed.replace(true) {
            return;
        }
        let finalizers = std::mem::take(&mut *self.inner.finalizers.borrow_mut());
        for finalizer in finalizers {
            finalizer();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.get()
    }

    /// Unsubscribe when the returned guard is dropped.
    pub fn guard(self) -> SubscriptionGuard {
        SubscriptionGuard(self)
    }
}

impl Default for Subscription {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// RAII wrapper that unsubscribes on drop.
#[must_use = "dropping the guard unsubscribes immediately"]
pub struct SubscriptionGuard(Subscription);

impl SubscriptionGuard {
    pub fn subscription(&self) -> &Subscription {
        &self.0
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.0.unsubscribe();
    }
}

// =============================================================================
// STREAM<T>
// =============================================================================

type Producer<T> = dyn Fn(Subscriber<T>) -> Teardown;

struct StreamInner<T> {
    producer: Box<Producer<T>>,
    blocked: Rc<Cell<bool>>,
}

/// A push producer of `T` values.
///
/// Cloning a `Stream` shares the producer and the `blocked` flag. Each call
/// to [`subscribe`](Stream::subscribe) runs the producer again unless the
/// stream was made multicast with `share` / `share_replay`.
///
/// # Example
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use spark_gestures::Stream;
///
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let s = seen.clone();
///
/// Stream::of([1, 2, 3, 4])
///     .filter(|n| n % 2 == 0)
///     .map(|n| n * 10)
///     .for_each(move |n| s.borrow_mut().push(*n));
///
/// assert_eq!(*seen.borrow(), vec![20, 40]);
/// ```
pub struct Stream<T> {
    inner: Rc<StreamInner<T>>,
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: 'static> Stream<T> {
    /// Create a stream from a producer function.
    ///
    /// The producer runs once per subscription and returns its teardown.
    pub fn new(producer: impl Fn(Subscriber<T>) -> Teardown + 'static) -> Self {
        Self {
            inner: Rc::new(StreamInner {
                producer: Box::new(producer),
                blocked: Rc::new(Cell::new(false)),
            }),
        }
    }

    /// Run the producer for `observer`.
    pub fn subscribe(&self, observer: impl Observer<T> + 'static) -> Subscription {
        self.subscribe_with(observer, Subscription::new())
    }

    /// Run the producer for `observer` under a subscription created up front.
    ///
    /// Unsubscribing `subscription` while the producer is still emitting
    /// closes the subscriber it was handed, so a synchronous source sees
    /// `is_closed()` and stops.
    pub fn subscribe_with(
        &self,
        observer: impl Observer<T> + 'static,
        subscription: Subscription,
    ) -> Subscription {
        let subscriber = Subscriber::new(
            Rc::new(observer),
            self.inner.blocked.clone(),
            subscription.clone(),
        );

        let weak = subscriber.downgrade();
        subscription.add(move || {
            if let Some(subscriber) = weak.upgrade() {
                subscriber.close();
            }
        });

        let teardown = (self.inner.producer)(subscriber);
        subscription.add_teardown(teardown);
        subscription
    }

    /// Subscribe on behalf of an operator's `parent` subscriber.
    ///
    /// The upstream subscription is released with the parent's, including
    /// when the parent closes before this call returns.
    pub(crate) fn subscribe_for<R>(
        &self,
        parent: &Subscriber<R>,
        observer: impl Observer<T> + 'static,
    ) -> Subscription {
        let subscription = Subscription::new();
        parent.subscription().add_teardown(subscription.clone().into());
        self.subscribe_with(observer, subscription)
    }

    /// Subscribe with a `next` closure only.
    pub fn for_each(&self, f: impl Fn(&T) + 'static) -> Subscription {
        self.subscribe(f)
    }

    /// Apply a custom operator.
    pub fn pipe<R>(&self, operator: impl FnOnce(Stream<T>) -> R) -> R {
        operator(self.clone())
    }

    // =========================================================================
    // FLOW CONTROL
    // =========================================================================

    /// Drop every `next` until [`unblock`](Stream::unblock). Nothing is queued.
    pub fn block(&self) {
        self.inner.blocked.set(true);
    }

    pub fn unblock(&self) {
        self.inner.blocked.set(false);
    }

    pub fn is_blocked(&self) -> bool {
        self.inner.blocked.get()
    }

    // =========================================================================
    // CREATION
    // =========================================================================

    /// Emit each value, then complete.
    pub fn of(values: impl IntoIterator<Item = T>) -> Self {
        let values: Rc<[T]> = values.into_iter().collect();
        Stream::new(move |subscriber| {
            for value in values.iter() {
                if subscriber.is_closed() {
                    break;
                }
                subscriber.next(value);
            }
            subscriber.complete();
            Teardown::empty()
        })
    }

    /// Complete immediately.
    pub fn empty() -> Self {
        Stream::new(|subscriber| {
            subscriber.complete();
            Teardown::empty()
        })
    }

    /// Never emit, never terminate.
    pub fn never() -> Self {
        Stream::new(|_| Teardown::empty())
    }

    /// Error immediately.
    pub fn fail(error: StreamError) -> Self {
        Stream::new(move |subscriber| {
            subscriber.error(&error);
            Teardown::empty()
        })
    }
}

impl<T: 'static> FromIterator<T> for Stream<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Stream::of(iter)
    }
}

impl Stream<u64> {
    /// Emit `0` after `delay` ms, then complete.
    pub fn timer(delay: f64) -> Self {
        Stream::new(move |subscriber| {
            let id = set_timeout(delay, move || {
                subscriber.next(&0);
                subscriber.complete();
            });
            Teardown::new(move || {
                clear_timer(id);
            })
        })
    }

    /// Emit `0, 1, 2, ...` every `period` ms.
    pub fn interval(period: f64) -> Self {
        Stream::new(move |subscriber| {
            let count = Cell::new(0u64);
            let id = set_interval(period, move || {
                let n = count.get();
                count.set(n + 1);
                subscriber.next(&n);
            });
            Teardown::new(move || {
                clear_timer(id);
            })
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
