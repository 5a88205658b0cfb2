// ============================================================================
// spark-gestures - Lifecycle Tests
// Unsubscribe, teardown ordering, timers and weak caches
// ============================================================================

use spark_gestures::{
    advance_time, cached_source_count, cloned, observer, pending_timer_count, pointer_events,
    touch_events, use_virtual_time, EventTarget, PanOptions, Signal, SinglePointerOptions, Stream,
    StreamError, Subject, Subscriber, Teardown, UiEvent, UiEventKind,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[test]
fn test_unsubscribe_detaches_event_listeners() {
    let target = EventTarget::new();
    let pans = pointer_events(&target)
        .and_then(|e| e.single_pointer(SinglePointerOptions::default()))
        .and_then(|p| p.pan(PanOptions::default()))
        .unwrap();

    let first = pans.for_each(|_| {});
    let second = pans.for_each(|_| {});
    assert_eq!(target.listener_count(), 4, "shared source attaches once");

    first.unsubscribe();
    assert_eq!(target.listener_count(), 4);
    second.unsubscribe();
    assert_eq!(target.listener_count(), 0);

    // Double cancellation is a no-op
    second.unsubscribe();
    assert!(second.is_closed());
}

#[test]
fn test_guard_unsubscribes_on_drop() {
    let input = Subject::new();
    let seen = Rc::new(Cell::new(0));
    {
        let _guard = input
            .stream()
            .for_each(cloned!(seen => move |v: &i32| seen.set(seen.get() + v)))
            .guard();
        input.next(&2);
        assert_eq!(input.observer_count(), 1);
    }
    input.next(&5);
    assert_eq!(seen.get(), 2);
    assert_eq!(input.observer_count(), 0);
}

#[test]
fn test_no_notification_after_unsubscribe() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let source: Stream<i32> = Stream::new(cloned!(log => move |subscriber: Subscriber<i32>| {
        log.borrow_mut().push("subscribed");
        let late = subscriber.clone();
        let log = log.clone();
        Teardown::new(move || {
            log.borrow_mut().push("teardown");
            // Detached before the teardown runs
            late.next(&99);
        })
    }));

    let sub = source.subscribe(
        observer(cloned!(log => move |_: &i32| log.borrow_mut().push("next")))
            .on_complete(cloned!(log => move || log.borrow_mut().push("complete"))),
    );
    sub.unsubscribe();
    sub.unsubscribe();
    assert_eq!(*log.borrow(), vec!["subscribed", "teardown"]);
}

#[test]
fn test_terminal_runs_teardown_once() {
    let teardowns = Rc::new(Cell::new(0));
    let source: Stream<i32> = Stream::new(cloned!(teardowns => move |subscriber: Subscriber<i32>| {
        subscriber.next(&1);
        subscriber.complete();
        subscriber.complete();
        let teardowns = teardowns.clone();
        Teardown::new(move || teardowns.set(teardowns.get() + 1))
    }));

    let sub = source.for_each(|_| {});
    assert!(sub.is_closed());
    sub.unsubscribe();
    assert_eq!(teardowns.get(), 1);
}

#[test]
fn test_timers_cleared_on_unsubscribe() {
    use_virtual_time(0.0);
    let input = Subject::new();
    let emitted = Rc::new(RefCell::new(Vec::new()));

    let debounced = input
        .stream()
        .debounce(100.0)
        .for_each(cloned!(emitted => move |v: &i32| emitted.borrow_mut().push(*v)));
    let throttled = input.stream().throttle(100.0).for_each(|_| {});
    let sampled = input.stream().sample_time(50.0).for_each(|_| {});

    input.next(&1);
    assert_eq!(pending_timer_count(), 3);

    debounced.unsubscribe();
    throttled.unsubscribe();
    sampled.unsubscribe();
    assert_eq!(pending_timer_count(), 0);

    advance_time(500.0);
    assert!(emitted.borrow().is_empty());
}

#[test]
fn test_debounce_emits_after_quiet_period() {
    use_virtual_time(0.0);
    let input = Subject::new();
    let emitted = Rc::new(RefCell::new(Vec::new()));
    let _sub = input
        .stream()
        .debounce(100.0)
        .for_each(cloned!(emitted => move |v: &i32| emitted.borrow_mut().push(*v)));

    input.next(&1);
    advance_time(50.0);
    input.next(&2);
    advance_time(99.0);
    assert!(emitted.borrow().is_empty());
    advance_time(1.0);
    assert_eq!(*emitted.borrow(), vec![2]);
}

#[test]
fn test_subject_error_reaches_every_subscriber_then_closes() {
    let input: Subject<i32> = Subject::new();
    let errors = Rc::new(Cell::new(0));
    let make = || {
        observer(|_: &i32| {}).on_error(cloned!(errors => move |_: &StreamError| {
            errors.set(errors.get() + 1)
        }))
    };
    input.subscribe(make());
    input.stream().share().subscribe(make());

    input.error(&StreamError::failed("device lost"));
    assert_eq!(errors.get(), 2);
    assert!(input.is_closed());

    // Late subscribers get the stored terminal
    input.subscribe(make());
    assert_eq!(errors.get(), 3);
}

#[test]
fn test_share_reconnects_after_last_unsubscribe() {
    let connections = Rc::new(Cell::new(0));
    let source: Stream<i32> = Stream::new(cloned!(connections => move |_: Subscriber<i32>| {
        connections.set(connections.get() + 1);
        Teardown::empty()
    }));
    let shared = source.share();

    let a = shared.for_each(|_| {});
    let b = shared.for_each(|_| {});
    a.unsubscribe();
    b.unsubscribe();
    let _c = shared.for_each(|_| {});
    assert_eq!(connections.get(), 2);
}

#[test]
fn test_source_cache_does_not_keep_target_alive() {
    let before = cached_source_count();
    let target = EventTarget::new();
    let weak = target.downgrade();

    let pointers = pointer_events(&target).unwrap();
    let _touches = touch_events(&target).unwrap();
    assert_eq!(cached_source_count(), before + 2);

    let sub = pointers.for_each(|_| {});
    drop(target);
    assert!(!weak.is_alive());
    assert_eq!(cached_source_count(), before);

    // Subscriptions outliving the target tear down quietly
    sub.unsubscribe();
}

#[test]
fn test_subscribing_after_target_dropped_completes() {
    let target = EventTarget::new();
    let events = pointer_events(&target).unwrap();
    drop(target);

    let completed = Rc::new(Cell::new(false));
    let sub = events.subscribe(
        observer(|_: &Signal<UiEvent>| {})
            .on_complete(cloned!(completed => move || completed.set(true))),
    );
    assert!(completed.get());
    assert!(sub.is_closed());

    let kind: UiEventKind = "pointerdown".parse().unwrap();
    assert_eq!(kind, UiEventKind::PointerDown);
}

#[test]
fn test_take_cancels_synchronous_source() {
    let emitted = Rc::new(Cell::new(0u32));
    let source: Stream<u32> = Stream::new(cloned!(emitted => move |subscriber: Subscriber<u32>| {
        while !subscriber.is_closed() && emitted.get() < 100_000 {
            subscriber.next(&emitted.get());
            emitted.set(emitted.get() + 1);
        }
        Teardown::empty()
    }));

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sub = source
        .map(|n| n * 2)
        .take(3)
        .for_each(cloned!(seen => move |v: &u32| seen.borrow_mut().push(*v)));

    assert_eq!(*seen.borrow(), vec![0, 2, 4]);
    assert_eq!(emitted.get(), 3);
    assert!(sub.is_closed());
}
