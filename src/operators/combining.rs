// ============================================================================
// spark-gestures - Combining Operators
// merge, switch_map, catch_error
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::core::error::StreamError;
use crate::operators::{forward, guard};
use crate::primitives::observer::Subscriber;
use crate::primitives::stream::{Stream, Subscription, Teardown};

// =============================================================================
// MERGE
// =============================================================================

/// Interleave several streams; complete when all of them have.
///
/// # Example
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use spark_gestures::{merge, Stream};
///
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let s = seen.clone();
/// merge([Stream::of([1, 2]), Stream::of([3])]).for_each(move |v| s.borrow_mut().push(*v));
/// assert_eq!(*seen.borrow(), vec![1, 2, 3]);
/// ```
pub fn merge<T: 'static>(sources: impl IntoIterator<Item = Stream<T>>) -> Stream<T> {
    let sources: Rc<[Stream<T>]> = sources.into_iter().collect();
    Stream::new(move |subscriber: Subscriber<T>| {
        if sources.is_empty() {
            subscriber.complete();
            return Teardown::empty();
        }

        let active = Rc::new(Cell::new(sources.len()));
        for source in sources.iter() {
            if subscriber.is_closed() {
                break;
            }
            let (downstream, done, active) =
                (subscriber.clone(), subscriber.clone(), active.clone());
            let observer = forward(&subscriber, move |value: &T| downstream.next(value))
                .on_complete(move || {
                    active.set(active.get() - 1);
                    if active.get() == 0 {
                        done.complete();
                    }
                });
            source.subscribe_for(&subscriber, observer);
        }
        Teardown::empty()
    })
}

impl<T: 'static> Stream<T> {
    /// Interleave with `other`.
    pub fn merge_with(&self, other: &Stream<T>) -> Stream<T> {
        merge([self.clone(), other.clone()])
    }

    /// Map each value to an inner stream, following only the latest one.
    ///
    /// Completes once the source and the current inner stream have completed.
    pub fn switch_map<R: 'static>(
        &self,
        project: impl Fn(&T) -> Stream<R> + 'static,
    ) -> Stream<R> {
        let source = self.clone();
        let project = Rc::new(project);
        Stream::new(move |subscriber: Subscriber<R>| {
            let current: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
            let generation = Rc::new(Cell::new(0u64));
            let inner_active = Rc::new(Cell::new(false));
            let outer_done = Rc::new(Cell::new(false));

            let release = current.clone();
            subscriber.subscription().add(move || {
                let inner = release.borrow_mut().take();
                if let Some(inner) = inner {
                    inner.unsubscribe();
                }
            });

            let (slot, project, downstream) =
                (current.clone(), project.clone(), subscriber.clone());
            let (latest, active, done) =
                (generation.clone(), inner_active.clone(), outer_done.clone());
            let on_complete = subscriber.clone();
            let (active_at_end, done_at_end) = (inner_active.clone(), outer_done.clone());

            source.subscribe_for(
                &subscriber,
                forward(&subscriber, move |value: &T| {
                    let previous = slot.borrow_mut().take();
                    if let Some(previous) = previous {
                        previous.unsubscribe();
                    }

                    let inner = match guard(|| project(value)) {
                        Ok(inner) => inner,
                        Err(e) => {
                            downstream.error(&e);
                            return;
                        }
                    };

                    let id = latest.get() + 1;
                    latest.set(id);
                    active.set(true);

                    let (next_to, complete_to) = (downstream.clone(), downstream.clone());
                    let (latest, active, done) = (latest.clone(), active.clone(), done.clone());
                    // Stored before subscribing so teardown reaches a source
                    // that is still emitting
                    let subscription = Subscription::new();
                    *slot.borrow_mut() = Some(subscription.clone());
                    if downstream.is_closed() {
                        subscription.unsubscribe();
                    }
                    inner.subscribe_with(
                        forward(&downstream, move |v: &R| next_to.next(v)).on_complete(
                            move || {
                                if latest.get() != id {
                                    return;
                                }
                                active.set(false);
                                if done.get() {
                                    complete_to.complete();
                                }
                            },
                        ),
                        subscription,
                    );
                })
                .on_complete(move || {
                    done_at_end.set(true);
                    if !active_at_end.get() {
                        on_complete.complete();
                    }
                }),
            );

            Teardown::empty()
        })
    }

    /// Replace an errored source with the stream `handler` returns.
    pub fn catch_error(&self, handler: impl Fn(&StreamError) -> Stream<T> + 'static) -> Stream<T> {
        let source = self.clone();
        let handler = Rc::new(handler);
        Stream::new(move |subscriber: Subscriber<T>| {
            let fallback: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
            let release = fallback.clone();
            subscriber.subscription().add(move || {
                let replacement = release.borrow_mut().take();
                if let Some(replacement) = replacement {
                    replacement.unsubscribe();
                }
            });

            let downstream = subscriber.clone();
            let (handler, recover, slot) = (handler.clone(), subscriber.clone(), fallback.clone());
            source.subscribe_for(
                &subscriber,
                forward(&subscriber, move |value: &T| downstream.next(value)).on_error(
                    move |error| match guard(|| handler(error)) {
                        Ok(replacement) => {
                            let subscription = Subscription::new();
                            *slot.borrow_mut() = Some(subscription.clone());
                            replacement.subscribe_with(recover.clone(), subscription);
                        }
                        Err(e) => recover.error(&e),
                    },
                ),
            );
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

    fn record<T: std::fmt::Debug + 'static>(stream: &Stream<T>) -> (Log, Subscription) {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let (n, e, c) = (log.clone(), log.clone(), log.clone());
        let sub = stream.subscribe(
            observer(move |v: &T| n.borrow_mut().push(format!("{v:?}")))
                .on_error(move |err| e.borrow_mut().push(format!("error: {err}")))
                .on_complete(move || c.borrow_mut().push("complete".into())),
        );
        (log, sub)
    }

    #[test]
    fn merge_interleaves_and_waits_for_all() {
        let (a, b) = (Subject::new(), Subject::new());
        let (log, _s) = record(&a.stream().merge_with(&b.stream()));

        a.next(&1);
        b.next(&2);
        a.complete();
        b.next(&3);
        assert_eq!(*log.borrow(), vec!["1", "2", "3"]);
        b.complete();
        assert_eq!(log.borrow().last().map(String::as_str), Some("complete"));
    }

    #[test]
    fn merge_unsubscribes_every_source() {
        let (a, b) = (Subject::<i32>::new(), Subject::<i32>::new());
        let (_log, sub) = record(&merge([a.stream(), b.stream()]));
        assert_eq!(a.observer_count() + b.observer_count(), 2);
        sub.unsubscribe();
        assert_eq!(a.observer_count() + b.observer_count(), 0);
    }

    #[test]
    fn merge_of_nothing_completes() {
        let (log, _s) = record(&merge(Vec::<Stream<i32>>::new()));
        assert_eq!(*log.borrow(), vec!["complete"]);
    }

    #[test]
    fn switch_map_follows_latest_inner() {
        let outer = Subject::new();
        let inners: Vec<Subject<String>> = vec![Subject::new(), Subject::new()];
        let pick = inners.clone();
        let (log, _s) =
            record(&outer.stream().switch_map(move |i: &usize| pick[*i].stream()));

        outer.next(&0);
        inners[0].next(&"a".to_string());
        outer.next(&1);
        inners[0].next(&"stale".to_string());
        inners[1].next(&"b".to_string());
        outer.complete();
        assert_eq!(*log.borrow(), vec!["\"a\"", "\"b\""]);
        assert_eq!(inners[0].observer_count(), 0);

        inners[1].complete();
        assert_eq!(log.borrow().last().map(String::as_str), Some("complete"));
    }

    #[test]
    fn catch_error_switches_to_fallback() {
        let source = Stream::of([1, 2]).try_map(|n| {
            if *n == 2 {
                Err(StreamError::failed("lost"))
            } else {
                Ok(*n)
            }
        });
        let (log, _s) = record(&source.catch_error(|_| Stream::of([99])));
        assert_eq!(*log.borrow(), vec!["1", "99", "complete"]);
    }

    /// Counts up until its subscriber closes, capped at 10k.
    fn counting(emitted: Rc<Cell<u32>>) -> Stream<u32> {
        Stream::new(move |subscriber: Subscriber<u32>| {
            let mut n = 0;
            while !subscriber.is_closed() && n < 10_000 {
                subscriber.next(&n);
                n += 1;
                emitted.set(emitted.get() + 1);
            }
            Teardown::empty()
        })
    }

    #[test]
    fn take_stops_synchronous_inner_sources() {
        let emitted = Rc::new(Cell::new(0));

        let (log, _s) = record(&merge([counting(emitted.clone()), Stream::never()]).take(2));
        assert_eq!(*log.borrow(), vec!["0", "1", "complete"]);
        assert_eq!(emitted.get(), 2);

        emitted.set(0);
        let inner = emitted.clone();
        let switched = Stream::of([()]).switch_map(move |_: &()| counting(inner.clone()));
        let (log, _s) = record(&switched.take(3));
        assert_eq!(*log.borrow(), vec!["0", "1", "2", "complete"]);
        assert_eq!(emitted.get(), 3);

        emitted.set(0);
        let fallback = emitted.clone();
        let recovered = Stream::<u32>::fail(StreamError::failed("lost"))
            .catch_error(move |_| counting(fallback.clone()));
        let (log, _s) = record(&recovered.take(1));
        assert_eq!(*log.borrow(), vec!["0", "complete"]);
        assert_eq!(emitted.get(), 1);
    }
}
