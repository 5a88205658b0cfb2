// ============================================================================
// spark-gestures - Equality Functions
// Comparators for distinct_until_changed_by and friends
// ============================================================================

use crate::core::types::{Cursor, PointerLike};

/// Equality function pointer used by distinct operators.
pub type EqualsFn<T> = fn(&T, &T) -> bool;

// =============================================================================
// STRICT EQUALITY (Default)
// =============================================================================

/// Default strict equality using PartialEq.
///
/// # Example
/// ```
/// use spark_gestures::reactivity::equality::equals;
///
/// assert!(equals(&42, &42));
/// assert!(!equals(&42, &43));
/// ```
pub fn equals<T: PartialEq>(a: &T, b: &T) -> bool {
    a == b
}

// =============================================================================
// SAFE EQUALITY (Handles NaN)
// =============================================================================

/// Safe equality for f64 values: NaN == NaN returns true.
///
/// # Example
/// ```
/// use spark_gestures::reactivity::equality::safe_equals_f64;
///
/// assert!(safe_equals_f64(&1.0, &1.0));
/// assert!(!safe_equals_f64(&1.0, &2.0));
/// assert!(safe_equals_f64(&f64::NAN, &f64::NAN));
/// ```
pub fn safe_equals_f64(a: &f64, b: &f64) -> bool {
    if a.is_nan() {
        return b.is_nan();
    }
    a == b
}

/// Cursor equality with NaN-safe components.
pub fn cursor_equals(a: &Cursor, b: &Cursor) -> bool {
    safe_equals_f64(&a.x, &b.x) && safe_equals_f64(&a.y, &b.y)
}

/// Two pointer samples are the same if phase and both positions match.
///
/// Useful to drop redundant `move` samples that some platforms emit when
/// only pressure or tilt changed.
pub fn same_pointer_sample<P: PointerLike>(a: &P, b: &P) -> bool {
    a.phase() == b.phase()
        && cursor_equals(&a.cursor(), &b.cursor())
        && cursor_equals(&a.page_cursor(), &b.page_cursor())
}

// =============================================================================
// FACTORY FUNCTIONS
// =============================================================================

/// Never equal - every value counts as a change.
///
/// # Example
/// ```
/// use spark_gestures::reactivity::equality::never_equals;
///
/// assert!(!never_equals(&42, &42));
/// ```
pub fn never_equals<T>(_a: &T, _b: &T) -> bool {
    false
}

/// Compare by a projected field.
///
/// # Example
/// ```
/// use spark_gestures::reactivity::equality::by_field;
///
/// struct Contact { id: i64, x: f64 }
///
/// let same_contact = by_field(|c: &Contact| c.id);
/// assert!(same_contact(&Contact { id: 1, x: 0.0 }, &Contact { id: 1, x: 9.0 }));
/// ```
pub fn by_field<T, F, R>(field_fn: F) -> impl Fn(&T, &T) -> bool
where
    F: Fn(&T) -> R,
    R: PartialEq,
{
    move |a, b| field_fn(a) == field_fn(b)
}

/// Equality within an absolute tolerance.
pub fn within(epsilon: f64) -> impl Fn(&f64, &f64) -> bool {
    move |a, b| safe_equals_f64(a, b) || (a - b).abs() <= epsilon
}

// =============================================================================
// TESTS
// =============================================================================
