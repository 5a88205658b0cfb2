// ============================================================================
// spark-gestures - Operators Module
// Stream -> Stream transformations
// ============================================================================
//
// Every operator is an inherent method on Stream<T> returning a new Stream.
// The contract they all keep:
//
// - error / complete are forwarded verbatim
// - a panicking user callback becomes StreamError::CallbackPanicked on the
//   downstream `error` channel; siblings are unaffected
// - per-subscription state lives inside the producer closure, so two
//   subscribers never share an accumulator
// - inner subscriptions and timers are released on teardown
// ============================================================================

pub mod combining;
pub mod filtering;
pub mod multicast;
pub mod timing;
pub mod transform;

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::warn;

use crate::core::error::StreamError;
use crate::primitives::observer::{FnObserver, Subscriber};

pub use combining::merge;

// =============================================================================
// CALLBACK GUARD
// =============================================================================

/// Run a user callback, converting a panic into a stream error.
pub(crate) fn guard<R>(f: impl FnOnce() -> R) -> Result<R, StreamError> {
    catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        let message = panic_message(payload.as_ref());
        warn!(%message, "operator callback panicked");
        StreamError::CallbackPanicked { message }
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

// =============================================================================
// FORWARDING OBSERVER
// =============================================================================

/// Observer that runs `next` and forwards terminals to `downstream`.
///
/// Override the complete hook with `.on_complete(..)` when an operator has to
/// flush state first.
pub(crate) fn forward<T, R: 'static>(
    downstream: &Subscriber<R>,
    next: impl Fn(&T) + 'static,
) -> FnObserver<T> {
    let (on_error, on_complete) = (downstream.clone(), downstream.clone());
    FnObserver::new(next)
        .on_error(move |e| on_error.error(e))
        .on_complete(move || on_complete.complete())
}

// =============================================================================
// TESTS
// =============================================================================
