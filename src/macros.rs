// ============================================================================
// spark-gestures - Macros
// ============================================================================

/// Clone handles into a `move` closure.
///
/// Streams, subjects and the `Rc` cells observers write into are all cheap
/// handles; this saves the `let x = x.clone();` lines before each closure.
///
/// # Usage
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use spark_gestures::{cloned, Subject};
///
/// let input = Subject::new();
/// let seen = Rc::new(RefCell::new(Vec::new()));
///
/// input.stream().for_each(cloned!(seen => move |v: &i32| seen.borrow_mut().push(*v)));
/// input.next(&7);
///
/// assert_eq!(*seen.borrow(), vec![7]);
/// ```
#[macro_export]
macro_rules! cloned {
    ($($n:ident),+ => $e:expr) => {
        {
            $( let $n = $n.clone(); )+
            $e
        }
    };
}
