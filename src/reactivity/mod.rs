// ============================================================================
// spark-gestures - Reactivity Module
// Timer scheduling and equality helpers used by the stream operators
// ============================================================================

pub mod equality;
pub mod scheduling;

// Re-export scheduling functions
pub use scheduling::{
    advance_time, clear_timer, now, pending_timer_count, run_due_timers, set_interval,
    set_timeout, use_system_time, use_virtual_time,
};

// Re-export equality functions
pub use equality::{
    by_field, cursor_equals, equals, never_equals, safe_equals_f64, same_pointer_sample, within,
    EqualsFn,
};
