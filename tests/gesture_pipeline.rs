// ============================================================================
// spark-gestures - Gesture Pipeline Tests
// Raw events in, gesture signals out, through the public API only
// ============================================================================

use spark_gestures::{
    cloned, mouse_events, pointer_events, same_pointer_sample, touch_events, Direction,
    DirectionMode, EventTarget, GestureConfig, MultiPointerOptions, PanOptions, Phase,
    PinchOptions, PointerType, SessionPhase, Signal, SinglePointerOptions, Stream, Subscription,
    TapOptions, Touch, UiEvent, UiEventKind,
};
use std::cell::RefCell;
use std::rc::Rc;

fn record<T: 'static, R: 'static>(
    stream: &Stream<T>,
    pick: impl Fn(&T) -> R + 'static,
) -> (Rc<RefCell<Vec<R>>>, Subscription) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sub = stream.for_each(cloned!(seen => move |v: &T| seen.borrow_mut().push(pick(v))));
    (seen, sub)
}

fn at(kind: UiEventKind, x: f64, y: f64, t: f64) -> UiEvent {
    UiEvent::new(kind).at(x, y).timestamp(t)
}

fn fingers(kind: UiEventKind, touches: &[(i64, f64, f64)], t: f64) -> UiEvent {
    touches
        .iter()
        .fold(UiEvent::new(kind).timestamp(t), |event, &(id, x, y)| {
            event.touch(Touch::new(id, x, y))
        })
}

// =============================================================================
// Pan
// =============================================================================

#[test]
fn test_pan_threshold_and_direction() {
    let target = EventTarget::new();
    let pans = pointer_events(&target)
        .and_then(|e| e.single_pointer(SinglePointerOptions::default()))
        .and_then(|p| p.pan(PanOptions::default()))
        .unwrap();
    let (seen, _sub) = record(&pans, |s: &Signal<_>| s.value.clone());

    target.dispatch(&at(UiEventKind::PointerDown, 100.0, 100.0, 0.0));
    target.dispatch(&at(UiEventKind::PointerMove, 105.0, 100.0, 16.0));
    assert!(seen.borrow().is_empty(), "below threshold emits nothing");

    target.dispatch(&at(UiEventKind::PointerMove, 115.0, 100.0, 32.0));
    {
        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].phase, Phase::Start);
        assert_eq!((seen[0].delta_x, seen[0].delta_y), (15.0, 0.0));
        assert_eq!(seen[0].direction, Direction::Right);
    }

    target.dispatch(&at(UiEventKind::PointerMove, 115.0, 60.0, 48.0));
    target.dispatch(&at(UiEventKind::PointerCancel, 115.0, 60.0, 64.0));
    let phases: Vec<_> = seen.borrow().iter().map(|p| p.phase).collect();
    assert_eq!(phases, vec![Phase::Start, Phase::CHANGE, Phase::Cancel]);
    assert_eq!(seen.borrow()[2].direction, Direction::Up);
}

#[test]
fn test_vertical_pan_ignores_horizontal_drag() {
    let target = EventTarget::new();
    let pans = mouse_events(&target)
        .and_then(|e| e.single_pointer(SinglePointerOptions::default()))
        .and_then(|p| {
            p.pan(PanOptions {
                direction: DirectionMode::Vertical,
                ..Default::default()
            })
        })
        .unwrap();
    let (seen, _sub) = record(&pans, |s: &Signal<_>| s.value.phase);

    target.dispatch(&at(UiEventKind::MouseDown, 0.0, 0.0, 0.0));
    target.dispatch(&at(UiEventKind::MouseMove, 80.0, 0.0, 10.0));
    target.dispatch(&at(UiEventKind::MouseUp, 80.0, 0.0, 20.0));
    assert!(seen.borrow().is_empty());
}

#[test]
fn test_axis_lock_translate_chain() {
    let target = EventTarget::new();
    let pans = pointer_events(&target)
        .and_then(|e| e.single_pointer(SinglePointerOptions::default()))
        .and_then(|p| p.pan(PanOptions::default()))
        .unwrap();
    let (seen, _sub) = record(&pans.axis_lock().translate(), |s: &Signal<_>| {
        (s.value.phase, s.value.x, s.value.y)
    });

    // First drag: mostly horizontal, vertical drift suppressed
    target.dispatch(&at(UiEventKind::PointerDown, 0.0, 0.0, 0.0));
    target.dispatch(&at(UiEventKind::PointerMove, 20.0, 5.0, 10.0));
    target.dispatch(&at(UiEventKind::PointerUp, 40.0, 30.0, 20.0));

    // Second drag: vertical, cancelled
    target.dispatch(&at(UiEventKind::PointerDown, 0.0, 0.0, 30.0));
    target.dispatch(&at(UiEventKind::PointerMove, 0.0, 25.0, 40.0));
    target.dispatch(&at(UiEventKind::PointerCancel, 0.0, 30.0, 50.0));

    assert_eq!(
        *seen.borrow(),
        vec![
            (Phase::Start, 20.0, 0.0),
            (Phase::End, 40.0, 0.0),
            (Phase::Start, 40.0, 25.0),
            (Phase::Cancel, 40.0, 0.0),
        ]
    );
}

#[test]
fn test_velocity_of_single_pointer() {
    let target = EventTarget::new();
    let velocity = pointer_events(&target)
        .and_then(|e| e.single_pointer(SinglePointerOptions::default()))
        .unwrap()
        .velocity();
    let (seen, _sub) = record(&velocity, |s: &Signal<_>| (s.value.velocity_x, s.value.speed));

    target.dispatch(&at(UiEventKind::PointerDown, 0.0, 0.0, 0.0));
    target.dispatch(&at(UiEventKind::PointerMove, 30.0, 40.0, 10.0));
    target.dispatch(&at(UiEventKind::PointerUp, 30.0, 40.0, 20.0));

    assert_eq!(*seen.borrow(), vec![(0.0, 0.0), (3.0, 5.0), (0.0, 0.0)]);
}

#[test]
fn test_redundant_samples_filtered_before_pan() {
    let target = EventTarget::new();
    let pointers = pointer_events(&target)
        .and_then(|e| e.single_pointer(SinglePointerOptions::default()))
        .unwrap()
        .distinct_until_changed_by(same_pointer_sample);
    let (moves, _sub) = record(&pointers, |s: &Signal<_>| s.value.phase);

    target.dispatch(&at(UiEventKind::PointerDown, 0.0, 0.0, 0.0));
    // Pressure-only updates repeat the last position
    target.dispatch(&at(UiEventKind::PointerMove, 4.0, 0.0, 8.0).pressure(0.2));
    target.dispatch(&at(UiEventKind::PointerMove, 4.0, 0.0, 16.0).pressure(0.6));
    target.dispatch(&at(UiEventKind::PointerMove, 9.0, 0.0, 24.0));
    target.dispatch(&at(UiEventKind::PointerUp, 9.0, 0.0, 32.0));

    assert_eq!(
        *moves.borrow(),
        vec![Phase::Start, Phase::Move, Phase::Move, Phase::End]
    );
}

// =============================================================================
// Tap
// =============================================================================

#[test]
fn test_double_tap_then_reset() {
    let target = EventTarget::new();
    let taps = pointer_events(&target)
        .and_then(|e| e.single_pointer(SinglePointerOptions::default()))
        .and_then(|p| p.tap(TapOptions::default()))
        .unwrap();
    let (seen, _sub) = record(&taps, |s: &Signal<_>| (s.value.phase, s.value.tap_count));

    let tap = |x: f64, t: f64| {
        target.dispatch(&at(UiEventKind::PointerDown, x, 0.0, t));
        target.dispatch(&at(UiEventKind::PointerUp, x, 0.0, t + 50.0));
    };
    tap(10.0, 0.0);
    tap(12.0, 150.0);
    tap(12.0, 1000.0);

    assert_eq!(
        *seen.borrow(),
        vec![
            (Phase::Start, 1),
            (Phase::End, 1),
            (Phase::Start, 2),
            (Phase::End, 2),
            (Phase::Start, 1),
            (Phase::End, 1),
        ]
    );
}

// =============================================================================
// Multi-pointer and pinch
// =============================================================================

#[test]
fn test_multi_pointer_session_phases() {
    let target = EventTarget::new();
    let sessions = touch_events(&target)
        .and_then(|e| e.multi_pointer(MultiPointerOptions::default()))
        .unwrap();
    let (seen, _sub) = record(&sessions, |s: &Signal<_>| (s.value.phase, s.value.count));

    target.dispatch(&fingers(UiEventKind::TouchStart, &[(1, 0.0, 0.0)], 0.0));
    target.dispatch(&fingers(UiEventKind::TouchStart, &[(2, 50.0, 0.0)], 5.0));
    target.dispatch(&fingers(UiEventKind::TouchEnd, &[(1, 0.0, 0.0)], 10.0));
    target.dispatch(&fingers(UiEventKind::TouchEnd, &[(2, 50.0, 0.0)], 15.0));
    target.dispatch(&fingers(UiEventKind::TouchStart, &[(3, 5.0, 5.0)], 20.0));

    assert_eq!(
        *seen.borrow(),
        vec![
            (SessionPhase::Active, 1),
            (SessionPhase::Active, 2),
            (SessionPhase::Active, 2),
            (SessionPhase::Ended, 1),
            (SessionPhase::Active, 1),
        ]
    );
}

#[test]
fn test_pinch_ratio_follows_distance() {
    let target = EventTarget::new();
    let pinches = touch_events(&target)
        .and_then(|e| e.multi_pointer(MultiPointerOptions::default()))
        .and_then(|m| m.pinch(PinchOptions::default()))
        .unwrap();
    let (seen, _sub) = record(&pinches, |s: &Signal<_>| (s.value.phase, s.value.ratio));

    target.dispatch(&fingers(
        UiEventKind::TouchStart,
        &[(1, 0.0, 0.0), (2, 100.0, 0.0)],
        0.0,
    ));
    target.dispatch(&fingers(UiEventKind::TouchMove, &[(2, 80.0, 0.0)], 10.0));
    target.dispatch(&fingers(UiEventKind::TouchMove, &[(2, 250.0, 0.0)], 20.0));
    target.dispatch(&fingers(UiEventKind::TouchCancel, &[(1, 0.0, 0.0)], 30.0));

    assert_eq!(
        *seen.borrow(),
        vec![
            (Phase::Start, 0.8),
            (Phase::CHANGE, 2.5),
            (Phase::Cancel, 2.5),
        ]
    );
}

// =============================================================================
// Configuration and pooling
// =============================================================================

#[test]
fn test_config_drives_a_pooled_pipeline() {
    let config = GestureConfig::default().with_pooling(true);
    config.validate().unwrap();

    let target = EventTarget::new();
    let pans = pointer_events(&target)
        .and_then(|e| e.single_pointer(config.single_pointer.clone()))
        .and_then(|p| p.pan(config.pan.clone()))
        .unwrap();
    let (seen, _sub) = record(&pans, |s: &Signal<_>| (s.value.delta_x, s.device_id().to_string()));

    target.dispatch(&at(UiEventKind::PointerDown, 0.0, 0.0, 0.0));
    for step in 1..=5 {
        let x = f64::from(step) * 10.0;
        target.dispatch(&at(UiEventKind::PointerMove, x, 0.0, f64::from(step)));
    }
    target.dispatch(
        &UiEvent::new(UiEventKind::PointerUp)
            .pointer(1, PointerType::Pen)
            .at(50.0, 0.0)
            .timestamp(10.0),
    );

    let deltas: Vec<_> = seen.borrow().iter().map(|(dx, _)| *dx).collect();
    assert_eq!(deltas, vec![10.0, 20.0, 30.0, 40.0, 50.0, 50.0]);
    // Reused records carry the stamp of the signal they were filled from
    assert_eq!(seen.borrow()[0].1, "mouse");
    assert_eq!(seen.borrow()[5].1, "pen");
}

#[test]
fn test_invalid_options_fail_fast() {
    let target = EventTarget::new();
    let events = pointer_events(&target).unwrap();
    assert!(
        events
            .single_pointer(SinglePointerOptions::default())
            .unwrap()
            .pan(PanOptions {
                threshold: f64::INFINITY,
                ..Default::default()
            })
            .is_err()
    );
    assert!(
        events
            .multi_pointer(MultiPointerOptions {
                max_pointers: 0,
                ..Default::default()
            })
            .is_err()
    );
    // Nothing subscribed, nothing attached
    assert_eq!(target.listener_count(), 0);
}
