// ============================================================================
// spark-gestures - Gestures Module
// Recognizer state machines layered on streams
// ============================================================================
//
// A recognizer is a small mutable record plus a `process` step. It is not a
// stream itself: `recognize` wraps a factory so that every subscription gets
// its own instance, and the instance is disposed on teardown.
//
//   raw events -> single_pointer -> pan | tap | velocity
//   raw events -> multi_pointer  -> pinch -> zoom
//   pan        -> axis_lock | translate
// ============================================================================

pub mod config;
pub mod extensions;
pub mod multi_pointer;
pub mod pan;
pub mod pinch;
pub mod single_pointer;
pub mod tap;

use std::cell::RefCell;
use std::rc::Rc;

use crate::core::error::{ConfigError, Result};
use crate::operators::forward;
use crate::primitives::observer::Subscriber;
use crate::primitives::stream::{Stream, Teardown};

pub use config::GestureConfig;
pub use extensions::{Axis, Translate, Velocity, Zoom};
pub use multi_pointer::{
    MultiPointer, MultiPointerOptions, MultiPointerRecognizer, PointerInfo, SessionPhase,
};
pub use pan::{Pan, PanOptions, PanRecognizer};
pub use pinch::{Pinch, PinchOptions, PinchRecognizer};
pub use single_pointer::{SinglePointer, SinglePointerOptions, SinglePointerRecognizer};
pub use tap::{Tap, TapOptions, TapRecognizer};

// =============================================================================
// RECOGNIZER TRAIT
// =============================================================================

/// A stateful processor from one input signal to at most one output.
pub trait Recognizer {
    type Input;
    type Output;

    /// Feed one input. Returns the record to emit, if any.
    fn process(&mut self, input: &Self::Input) -> Option<Self::Output>;

    /// Take back a record after every observer has seen it.
    fn recycle(&mut self, output: Self::Output) {
        let _ = output;
    }

    /// Drop the current session.
    fn reset(&mut self);

    /// Release everything; called on teardown.
    fn dispose(&mut self) {
        self.reset();
    }
}

/// Run a recognizer over `source`, one instance per subscription.
///
/// The recognizer is not borrowed while its output is delivered, so an
/// observer may feed the same pipeline re-entrantly.
pub fn recognize<R, F>(source: &Stream<R::Input>, factory: F) -> Stream<R::Output>
where
    R: Recognizer + 'static,
    R::Input: 'static,
    R::Output: 'static,
    F: Fn() -> R + 'static,
{
    let source = source.clone();
    Stream::new(move |subscriber: Subscriber<R::Output>| {
        let recognizer = Rc::new(RefCell::new(factory()));
        let (instance, downstream) = (recognizer.clone(), subscriber.clone());
        let observer = forward(&subscriber, move |input: &R::Input| {
            let output = instance.borrow_mut().process(input);
            if let Some(output) = output {
                downstream.next(&output);
                instance.borrow_mut().recycle(output);
            }
        });
        let upstream = source.subscribe_for(&subscriber, observer);
        Teardown::new(move || {
            upstream.unsubscribe();
            recognizer.borrow_mut().dispose();
        })
    })
}

/// Pool settings shared by every recognizer's options.
pub(crate) fn check_pool(pooling: bool, capacity: usize) -> Result<()> {
    if pooling && capacity == 0 {
        return Err(ConfigError::ZeroPoolCapacity);
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::subject::Subject;
    use std::cell::Cell;

    /// Emits the running count of even inputs.
    struct EvenCounter {
        count: u32,
        disposed: Rc<Cell<bool>>,
    }

    impl Recognizer for EvenCounter {
        type Input = u32;
        type Output = u32;

        fn process(&mut self, input: &u32) -> Option<u32> {
            if input % 2 == 0 {
                self.count += 1;
                Some(self.count)
            } else {
                None
            }
        }

        fn reset(&mut self) {
            self.count = 0;
        }

        fn dispose(&mut self) {
            self.reset();
            self.disposed.set(true);
        }
    }

    #[test]
    fn each_subscription_gets_its_own_instance() {
        let subject = Subject::new();
        let disposed = Rc::new(Cell::new(false));
        let d = disposed.clone();
        let counted = recognize(&subject.stream(), move || EvenCounter {
            count: 0,
            disposed: d.clone(),
        });

        let a = Rc::new(RefCell::new(Vec::new()));
        let sa = a.clone();
        let sub = counted.for_each(move |n| sa.borrow_mut().push(*n));
        subject.next(&2);
        subject.next(&3);

        let b = Rc::new(RefCell::new(Vec::new()));
        let sb = b.clone();
        counted.for_each(move |n| sb.borrow_mut().push(*n));
        subject.next(&4);

        assert_eq!(*a.borrow(), vec![1, 2]);
        assert_eq!(*b.borrow(), vec![1]);

        sub.unsubscribe();
        assert!(disposed.get());
    }

    #[test]
    fn observer_may_reenter_the_pipeline() {
        let subject = Subject::new();
        let counted = recognize(&subject.stream(), || EvenCounter {
            count: 0,
            disposed: Rc::new(Cell::new(false)),
        });
        let seen = Rc::new(RefCell::new(Vec::new()));
        let (s, feed) = (seen.clone(), subject.clone());
        counted.for_each(move |n| {
            s.borrow_mut().push(*n);
            if *n == 1 {
                feed.next(&10);
            }
        });
        subject.next(&2);
        assert_eq!(*seen.borrow(), vec![1, 2]);
    }

    #[test]
    fn pool_check() {
        assert!(check_pool(false, 0).is_ok());
        assert_eq!(check_pool(true, 0), Err(ConfigError::ZeroPoolCapacity));
    }
}
