// ============================================================================
// spark-gestures - Reactive Streams and Pointer Gestures for Rust
// ============================================================================
//
// Push-based Stream/Subject runtime with gesture recognizers layered on top:
//
//   EventTarget -> EventSource -> single_pointer -> pan | tap | velocity
//                              -> multi_pointer  -> pinch -> zoom
//   pan -> axis_lock | translate
//
// Single-threaded: everything is `Rc`/`RefCell` and callback driven. Time
// comes from a thread-local clock that tests can switch to virtual time.
// ============================================================================

#[macro_use]
mod macros;

pub mod core;
pub mod events;
pub mod gestures;
pub mod operators;
pub mod primitives;
pub mod reactivity;

// Re-export core items at crate root
pub use core::constants;
pub use core::context::{clock_mode, with_context, ClockMode, RuntimeContext, TimerId};
pub use core::error::{ConfigError, Result, StreamError};
pub use core::types::{
    direction_of, ButtonKind, Cursor, Direction, DirectionMode, Phase, PointerLike, PointerType,
    Signal,
};

// Stream runtime
pub use operators::merge;
pub use primitives::observer::{observer, FnObserver, Observer, Subscriber};
pub use primitives::pool::{ObjectPool, PoolStats, Poolable, SignalRecycler};
pub use primitives::stream::{Stream, Subscription, SubscriptionGuard, Teardown};
pub use primitives::subject::{BehaviorSubject, Subject};

// Events
pub use events::{
    cached_source_count, keyboard_events, mouse_events, pointer_events, touch_events,
    wheel_events, EventFamily, EventHandle, EventSource, EventTarget, ListenerId, Modifiers,
    Touch, UiEvent, UiEventKind, WeakEventTarget,
};

// Gestures
pub use gestures::{
    recognize, Axis, GestureConfig, MultiPointer, MultiPointerOptions, MultiPointerRecognizer,
    Pan, PanOptions, PanRecognizer, Pinch, PinchOptions, PinchRecognizer, PointerInfo,
    Recognizer, SessionPhase, SinglePointer, SinglePointerOptions, SinglePointerRecognizer, Tap,
    TapOptions, TapRecognizer, Translate, Velocity, Zoom,
};

// Clock, timers and equality helpers
pub use reactivity::equality::{
    by_field, cursor_equals, equals, never_equals, safe_equals_f64, same_pointer_sample, within,
    EqualsFn,
};
pub use reactivity::scheduling::{
    advance_time, clear_timer, now, pending_timer_count, run_due_timers, set_interval,
    set_timeout, use_system_time, use_virtual_time,
};

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn collect<T: Clone + 'static>(stream: &Stream<T>) -> (Rc<RefCell<Vec<T>>>, Subscription) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sub = stream.for_each(cloned!(seen => move |v: &T| seen.borrow_mut().push(v.clone())));
        (seen, sub)
    }

    fn pointer(kind: UiEventKind, x: f64, y: f64, t: f64) -> UiEvent {
        UiEvent::new(kind).at(x, y).timestamp(t)
    }

    // =========================================================================
    // Target -> pan pipeline
    // =========================================================================

    #[test]
    fn dispatched_events_become_a_pan() {
        let target = EventTarget::new();
        let pans = pointer_events(&target)
            .and_then(|events| events.single_pointer(SinglePointerOptions::default()))
            .and_then(|pointers| pointers.pan(PanOptions::default()))
            .unwrap();
        let (seen, sub) = collect(&pans);

        target.dispatch(&pointer(UiEventKind::PointerDown, 100.0, 100.0, 0.0));
        target.dispatch(&pointer(UiEventKind::PointerMove, 105.0, 100.0, 10.0));
        target.dispatch(&pointer(UiEventKind::PointerMove, 115.0, 100.0, 20.0));
        target.dispatch(&pointer(UiEventKind::PointerUp, 115.0, 100.0, 30.0));

        let phases: Vec<_> = seen.borrow().iter().map(|p| p.value.phase).collect();
        assert_eq!(phases, vec![Phase::Start, Phase::End]);
        let start = seen.borrow()[0].clone();
        assert_eq!((start.value.delta_x, start.value.delta_y), (15.0, 0.0));
        assert_eq!(start.value.direction, Direction::Right);
        assert_eq!(start.device_id(), "mouse");

        sub.unsubscribe();
        assert_eq!(target.listener_count(), 0);
    }

    #[test]
    fn two_fingers_become_a_zoom() {
        let target = EventTarget::new();
        let zooms = touch_events(&target)
            .and_then(|events| events.multi_pointer(MultiPointerOptions::default()))
            .and_then(|contacts| contacts.pinch(PinchOptions::default()))
            .and_then(|pinches| pinches.zoom(0.25, 4.0))
            .unwrap();
        let (seen, _sub) = collect(&zooms);

        let touch = |kind, fingers: &[(i64, f64)], t| {
            fingers.iter().fold(UiEvent::new(kind).timestamp(t), |event, &(id, x)| {
                event.touch(Touch::new(id, x, 0.0))
            })
        };
        target.dispatch(&touch(UiEventKind::TouchStart, &[(1, 0.0), (2, 100.0)], 0.0));
        target.dispatch(&touch(UiEventKind::TouchMove, &[(2, 150.0)], 10.0));
        target.dispatch(&touch(UiEventKind::TouchEnd, &[(2, 150.0)], 20.0));

        let seen = seen.borrow();
        let scales: Vec<_> = seen.iter().map(|z| (z.value.phase, z.value.scale)).collect();
        assert_eq!(scales, vec![(Phase::Start, 1.5), (Phase::End, 1.5)]);
    }

    #[test]
    fn cached_sources_share_one_listener_set() {
        let target = EventTarget::new();
        let a = pointer_events(&target).unwrap();
        let b = pointer_events(&target).unwrap();

        let (seen_a, _sa) = collect(&a.map(|s: &Signal<UiEvent>| s.value.kind));
        let (seen_b, _sb) = collect(&b.map(|s: &Signal<UiEvent>| s.value.kind));
        assert_eq!(target.listener_count(), EventFamily::Pointer.kinds().len());

        target.dispatch(&UiEvent::new(UiEventKind::PointerDown));
        assert_eq!(*seen_a.borrow(), vec![UiEventKind::PointerDown]);
        assert_eq!(*seen_b.borrow(), vec![UiEventKind::PointerDown]);
    }

    // =========================================================================
    // Runtime
    // =========================================================================

    #[test]
    fn blocked_subject_drops_values() {
        let input = Subject::new();
        let (seen, _sub) = collect(&input.stream());
        input.next(&1);
        input.block();
        input.next(&2);
        input.unblock();
        input.next(&3);
        assert_eq!(*seen.borrow(), vec![1, 3]);
    }

    #[test]
    fn crate_root_exposes_operator_chain() {
        let (seen, _sub) = collect(
            &Stream::of([1, 2, 3, 4, 5, 6])
                .filter(|v| v % 2 == 0)
                .map(|v| v * 10)
                .scan(0, |acc, v| acc + v),
        );
        assert_eq!(*seen.borrow(), vec![20, 60, 120]);
    }

    #[test]
    fn direction_tie_goes_horizontal() {
        assert_eq!(direction_of(7.0, 7.0), Direction::Right);
        assert_eq!(direction_of(-7.0, -7.0), Direction::Left);
        assert_eq!(Axis::dominant(-7.0, 7.0), Axis::Horizontal);
    }
}
