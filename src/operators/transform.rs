// ============================================================================
// spark-gestures - Transform Operators
// map, try_map, tap, scan, fold, reduce, pairwise, start_with
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;

use crate::core::error::StreamError;
use crate::operators::{forward, guard};
use crate::primitives::observer::Subscriber;
use crate::primitives::stream::{Stream, Teardown};

impl<T: 'static> Stream<T> {
    /// Project every value.
    pub fn map<R: 'static>(&self, project: impl Fn(&T) -> R + 'static) -> Stream<R> {
        let source = self.clone();
        let project = Rc::new(project);
        Stream::new(move |subscriber: Subscriber<R>| {
            let (project, downstream) = (project.clone(), subscriber.clone());
            let observer = forward(&subscriber, move |value: &T| {
                match guard(|| project(value)) {
                    Ok(mapped) => downstream.next(&mapped),
                    Err(e) => downstream.error(&e),
                }
            });
            source.subscribe_for(&subscriber, observer);
            Teardown::empty()
        })
    }

    /// Project with a fallible closure; `Err` terminates with that error.
    pub fn try_map<R: 'static>(
        &self,
        project: impl Fn(&T) -> Result<R, StreamError> + 'static,
    ) -> Stream<R> {
        let source = self.clone();
        let project = Rc::new(project);
        Stream::new(move |subscriber: Subscriber<R>| {
            let (project, downstream) = (project.clone(), subscriber.clone());
            let observer = forward(&subscriber, move |value: &T| {
                match guard(|| project(value)).and_then(|r| r) {
                    Ok(mapped) => downstream.next(&mapped),
                    Err(e) => downstream.error(&e),
                }
            });
            source.subscribe_for(&subscriber, observer);
            Teardown::empty()
        })
    }

    /// Run a side effect, pass the value on unchanged.
    pub fn inspect(&self, effect: impl Fn(&T) + 'static) -> Stream<T> {
        let source = self.clone();
        let effect = Rc::new(effect);
        Stream::new(move |subscriber: Subscriber<T>| {
            let (effect, downstream) = (effect.clone(), subscriber.clone());
            let observer = forward(&subscriber, move |value: &T| {
                match guard(|| effect(value)) {
                    Ok(()) => downstream.next(value),
                    Err(e) => downstream.error(&e),
                }
            });
            source.subscribe_for(&subscriber, observer);
            Teardown::empty()
        })
    }

    /// Emit every intermediate accumulator.
    pub fn scan<A: Clone + 'static>(
        &self,
        seed: A,
        accumulate: impl Fn(&A, &T) -> A + 'static,
    ) -> Stream<A> {
        let source = self.clone();
        let accumulate = Rc::new(accumulate);
        Stream::new(move |subscriber: Subscriber<A>| {
            let state = RefCell::new(seed.clone());
            let (accumulate, downstream) = (accumulate.clone(), subscriber.clone());
            let observer = forward(&subscriber, move |value: &T| {
                let result = {
                    let acc = state.borrow();
                    guard(|| accumulate(&acc, value))
                };
                match result {
                    Ok(next) => {
                        *state.borrow_mut() = next.clone();
                        downstream.next(&next);
                    }
                    Err(e) => downstream.error(&e),
                }
            });
            source.subscribe_for(&subscriber, observer);
            Teardown::empty()
        })
    }

    /// Accumulate silently; emit the final value on complete.
    pub fn fold<A: Clone + 'static>(
        &self,
        seed: A,
        accumulate: impl Fn(&A, &T) -> A + 'static,
    ) -> Stream<A> {
        let source = self.clone();
        let accumulate = Rc::new(accumulate);
        Stream::new(move |subscriber: Subscriber<A>| {
            let state = Rc::new(RefCell::new(seed.clone()));
            let (acc_state, accumulate, downstream) =
                (state.clone(), accumulate.clone(), subscriber.clone());
            let on_complete = subscriber.clone();
            source.subscribe_for(
                &subscriber,
                forward(&subscriber, move |value: &T| {
                    let result = {
                        let acc = acc_state.borrow();
                        guard(|| accumulate(&acc, value))
                    };
                    match result {
                        Ok(next) => *acc_state.borrow_mut() = next,
                        Err(e) => downstream.error(&e),
                    }
                })
                .on_complete(move || {
                    let total = state.borrow().clone();
                    on_complete.next(&total);
                    on_complete.complete();
                }),
            );
            Teardown::empty()
        })
    }

    /// Like [`fold`](Stream::fold) seeded with the first value.
    ///
    /// Completing without any value errors with [`StreamError::NoElements`].
    pub fn reduce(&self, combine: impl Fn(&T, &T) -> T + 'static) -> Stream<T>
    where
        T: Clone,
    {
        let source = self.clone();
        let combine = Rc::new(combine);
        Stream::new(move |subscriber: Subscriber<T>| {
            let state: Rc<RefCell<Option<T>>> = Rc::new(RefCell::new(None));
            let (acc_state, combine, downstream) =
                (state.clone(), combine.clone(), subscriber.clone());
            let on_complete = subscriber.clone();
            source.subscribe_for(
                &subscriber,
                forward(&subscriber, move |value: &T| {
                    let current = acc_state.borrow_mut().take();
                    let next = match current {
                        None => Ok(value.clone()),
                        Some(acc) => guard(|| combine(&acc, value)),
                    };
                    match next {
                        Ok(next) => *acc_state.borrow_mut() = Some(next),
                        Err(e) => downstream.error(&e),
                    }
                })
                .on_complete(move || {
                    let total = state.borrow_mut().take();
                    match total {
                        Some(total) => {
                            on_complete.next(&total);
                            on_complete.complete();
                        }
                        None => on_complete.error(&StreamError::NoElements),
                    }
                }),
            );
            Teardown::empty()
        })
    }

    /// Emit `(previous, current)` from the second value on.
    pub fn pairwise(&self) -> Stream<(T, T)>
    where
        T: Clone,
    {
        let source = self.clone();
        Stream::new(move |subscriber: Subscriber<(T, T)>| {
            let previous: RefCell<Option<T>> = RefCell::new(None);
            let downstream = subscriber.clone();
            let observer = forward(&subscriber, move |value: &T| {
                let last = previous.borrow_mut().replace(value.clone());
                if let Some(last) = last {
                    downstream.next(&(last, value.clone()));
                }
            });
            source.subscribe_for(&subscriber, observer);
            Teardown::empty()
        })
    }

    /// Emit `values` synchronously on subscribe, then the source.
    pub fn start_with(&self, values: impl IntoIterator<Item = T>) -> Stream<T> {
        let source = self.clone();
        let values: Rc<[T]> = values.into_iter().collect();
        Stream::new(move |subscriber: Subscriber<T>| {
            for value in values.iter() {
                if subscriber.is_closed() {
                    return Teardown::empty();
                }
                subscriber.next(value);
            }
            source.subscribe_for(&subscriber, subscriber.clone());
            Teardown::empty()
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

    type Log = Rc<RefCell<Vec<String>>>;

    fn record<T: std::fmt::Debug + 'static>(stream: &Stream<T>) -> Log {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let (n, e, c) = (log.clone(), log.clone(), log.clone());
        stream.subscribe(
            observer(move |v: &T| n.borrow_mut().push(format!("{v:?}")))
                .on_error(move |err| e.borrow_mut().push(format!("error: {err}")))
                .on_complete(move || c.borrow_mut().push("complete".into())),
        );
        log
    }

    #[test]
    fn map_projects_and_completes() {
        let log = record(&Stream::of([1, 2, 3]).map(|n| n * 2));
        assert_eq!(*log.borrow(), vec!["2", "4", "6", "complete"]);
    }

    #[test]
    fn map_panic_becomes_error() {
        let log = record(&Stream::of([1, 0, 2]).map(|n| {
            if *n == 0 {
                panic!("division by zero");
            }
            10 / n
        }));
        assert_eq!(
            *log.borrow(),
            vec!["10", "error: callback panicked: division by zero"]
        );
    }

    #[test]
    fn panic_in_one_subscriber_leaves_sibling_alone() {
        let subject = Subject::new();
        let bad = record(&subject.stream().map(|n: &i32| {
            if *n > 1 {
                panic!("too big");
            }
            *n
        }));
        let good = record(&subject.stream().map(|n: &i32| *n));
        subject.next(&1);
        subject.next(&2);
        subject.next(&3);
        assert_eq!(bad.borrow().len(), 2);
        assert_eq!(*good.borrow(), vec!["1", "2", "3"]);
    }

    #[test]
    fn try_map_routes_err() {
        let log = record(&Stream::of(["1", "x", "3"]).try_map(|s| {
            s.parse::<i32>()
                .map_err(|_| StreamError::failed(format!("not a number: {s}")))
        }));
        assert_eq!(*log.borrow(), vec!["1", "error: not a number: x"]);
    }

    #[test]
    fn inspect_sees_every_value() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let log = record(&Stream::of([1, 2]).inspect(move |v| s.borrow_mut().push(*v)));
        assert_eq!(*seen.borrow(), vec![1, 2]);
        assert_eq!(*log.borrow(), vec!["1", "2", "complete"]);
    }

    #[test]
    fn scan_state_is_per_subscription() {
        let sums = Stream::of([1, 2, 3]).scan(0, |acc, v| acc + v);
        assert_eq!(*record(&sums).borrow(), vec!["1", "3", "6", "complete"]);
        assert_eq!(*record(&sums).borrow(), vec!["1", "3", "6", "complete"]);
    }

    #[test]
    fn fold_emits_once_on_complete() {
        let log = record(&Stream::of([1, 2, 3, 4]).fold(0, |acc, v| acc + v));
        assert_eq!(*log.borrow(), vec!["10", "complete"]);
    }

    #[test]
    fn reduce_without_values_errors() {
        let log = record(&Stream::<i32>::empty().reduce(|a, b| a + b));
        assert_eq!(*log.borrow(), vec!["error: sequence contains no elements"]);

        let log = record(&Stream::of([3, 9, 4]).reduce(|a, b| *a.max(b)));
        assert_eq!(*log.borrow(), vec!["9", "complete"]);
    }

    #[test]
    fn pairwise_skips_first() {
        let log = record(&Stream::of([1, 2, 3]).pairwise());
        assert_eq!(*log.borrow(), vec!["(1, 2)", "(2, 3)", "complete"]);
    }

    #[test]
    fn start_with_prepends() {
        let log = record(&Stream::of([3]).start_with([1, 2]));
        assert_eq!(*log.borrow(), vec!["1", "2", "3", "complete"]);
    }
}
