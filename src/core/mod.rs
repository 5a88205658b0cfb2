// ============================================================================
// spark-gestures - Core Module
// Envelope types, constants, errors and the thread-local runtime context
// ============================================================================

pub mod constants;
pub mod context;
pub mod error;
pub mod types;

// Re-export commonly used items
pub use constants::*;
pub use context::{clock_mode, with_context, ClockMode, RuntimeContext, TimerId};
pub use error::{ConfigError, Result, StreamError};
pub use types::{
    direction_of, ButtonKind, Cursor, Direction, DirectionMode, Phase, PointerLike, PointerType,
    Signal,
};
