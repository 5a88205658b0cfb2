// ============================================================================
// spark-gestures - Filtering Operators
// filter, distinct, take / skip families
// ============================================================================

use std::cell::{Cell, RefCell};
use std::hash::Hash;
use std::rc::Rc;

use ahash::AHashSet;

use crate::core::error::StreamError;
use crate::operators::{forward, guard};
use crate::primitives::observer::Subscriber;
use crate::primitives::stream::{Stream, Teardown};

impl<T: 'static> Stream<T> {
    /// Keep values matching `predicate`.
    pub fn filter(&self, predicate: impl Fn(&T) -> bool + 'static) -> Stream<T> {
        let source = self.clone();
        let predicate = Rc::new(predicate);
        Stream::new(move |subscriber: Subscriber<T>| {
            let (predicate, downstream) = (predicate.clone(), subscriber.clone());
            let observer = forward(&subscriber, move |value: &T| {
                match guard(|| predicate(value)) {
                    Ok(true) => downstream.next(value),
                    Ok(false) => {}
                    Err(e) => downstream.error(&e),
                }
            });
            source.subscribe_for(&subscriber, observer);
            Teardown::empty()
        })
    }

    /// Filter with a fallible predicate; `Err` terminates with that error.
    pub fn try_filter(
        &self,
        predicate: impl Fn(&T) -> Result<bool, StreamError> + 'static,
    ) -> Stream<T> {
        let source = self.clone();
        let predicate = Rc::new(predicate);
        Stream::new(move |subscriber: Subscriber<T>| {
            let (predicate, downstream) = (predicate.clone(), subscriber.clone());
            let observer = forward(&subscriber, move |value: &T| {
                match guard(|| predicate(value)).and_then(|r| r) {
                    Ok(true) => downstream.next(value),
                    Ok(false) => {}
                    Err(e) => downstream.error(&e),
                }
            });
            source.subscribe_for(&subscriber, observer);
            Teardown::empty()
        })
    }

    /// Drop every value seen before in this subscription.
    pub fn distinct(&self) -> Stream<T>
    where
        T: Eq + Hash + Clone,
    {
        let source = self.clone();
        Stream::new(move |subscriber: Subscriber<T>| {
            let seen: RefCell<AHashSet<T>> = RefCell::new(AHashSet::new());
            let downstream = subscriber.clone();
            let observer = forward(&subscriber, move |value: &T| {
                let fresh = seen.borrow_mut().insert(value.clone());
                if fresh {
                    downstream.next(value);
                }
            });
            source.subscribe_for(&subscriber, observer);
            Teardown::empty()
        })
    }

    /// Drop consecutive duplicates.
    pub fn distinct_until_changed(&self) -> Stream<T>
    where
        T: PartialEq + Clone,
    {
        self.distinct_until_changed_by(|a: &T, b: &T| a == b)
    }

    /// Drop a value if `equals(previous, value)`.
    ///
    /// See [`crate::reactivity::equality`] for ready-made comparators.
    pub fn distinct_until_changed_by(
        &self,
        equals: impl Fn(&T, &T) -> bool + 'static,
    ) -> Stream<T>
    where
        T: Clone,
    {
        let source = self.clone();
        let equals = Rc::new(equals);
        Stream::new(move |subscriber: Subscriber<T>| {
            let previous: RefCell<Option<T>> = RefCell::new(None);
            let (equals, downstream) = (equals.clone(), subscriber.clone());
            let observer = forward(&subscriber, move |value: &T| {
                let same = {
                    let previous = previous.borrow();
                    match previous.as_ref() {
                        Some(prev) => guard(|| equals(prev, value)),
                        None => Ok(false),
                    }
                };
                match same {
                    Ok(true) => {}
                    Ok(false) => {
                        *previous.borrow_mut() = Some(value.clone());
                        downstream.next(value);
                    }
                    Err(e) => downstream.error(&e),
                }
            });
            source.subscribe_for(&subscriber, observer);
            Teardown::empty()
        })
    }

    /// Emit the first `count` values, then complete and release the source.
    pub fn take(&self, count: usize) -> Stream<T> {
        let source = self.clone();
        Stream::new(move |subscriber: Subscriber<T>| {
            if count == 0 {
                subscriber.complete();
                return Teardown::empty();
            }
            let remaining = Cell::new(count);
            let downstream = subscriber.clone();
            let observer = forward(&subscriber, move |value: &T| {
                let left = remaining.get();
                if left == 0 {
                    return;
                }
                remaining.set(left - 1);
                downstream.next(value);
                if left == 1 {
                    // Also closes the linked upstream, even mid-emission
                    downstream.complete();
                }
            });
            source.subscribe_for(&subscriber, observer);
            Teardown::empty()
        })
    }

    /// Drop the first `count` values.
    pub fn skip(&self, count: usize) -> Stream<T> {
        let source = self.clone();
        Stream::new(move |subscriber: Subscriber<T>| {
            let skipped = Cell::new(0usize);
            let downstream = subscriber.clone();
            let observer = forward(&subscriber, move |value: &T| {
                if skipped.get() < count {
                    skipped.set(skipped.get() + 1);
                } else {
                    downstream.next(value);
                }
            });
            source.subscribe_for(&subscriber, observer);
            Teardown::empty()
        })
    }

    /// Emit while `predicate` holds; complete on the first miss.
    pub fn take_while(&self, predicate: impl Fn(&T) -> bool + 'static) -> Stream<T> {
        let source = self.clone();
        let predicate = Rc::new(predicate);
        Stream::new(move |subscriber: Subscriber<T>| {
            let (predicate, downstream) = (predicate.clone(), subscriber.clone());
            let observer = forward(&subscriber, move |value: &T| {
                match guard(|| predicate(value)) {
                    Ok(true) => downstream.next(value),
                    Ok(false) => downstream.complete(),
                    Err(e) => downstream.error(&e),
                }
            });
            source.subscribe_for(&subscriber, observer);
            Teardown::empty()
        })
    }

    /// Mirror the source until `notifier` emits, then complete.
    pub fn take_until<U: 'static>(&self, notifier: &Stream<U>) -> Stream<T> {
        let source = self.clone();
        let notifier = notifier.clone();
        Stream::new(move |subscriber: Subscriber<T>| {
            let stop = subscriber.clone();
            let notifier_sub = notifier.for_each(move |_: &U| stop.complete());
            subscriber.subscription().add_teardown(notifier_sub.into());
            if subscriber.is_closed() {
                return Teardown::empty();
            }

            let downstream = subscriber.clone();
            let observer = forward(&subscriber, move |value: &T| {
                downstream.next(value);
            });
            source.subscribe_for(&subscriber, observer);
            Teardown::empty()
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
