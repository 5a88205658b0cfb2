// ============================================================================
// spark-gestures - Errors
// Stream notifications and construction-time misuse
// ============================================================================

use std::rc::Rc;

use thiserror::Error;

pub type Result<T, E = ConfigError> = std::result::Result<T, E>;

// =============================================================================
// STREAM ERROR
// =============================================================================

/// Error carried by a stream's `error` notification.
///
/// Cloneable so that multicast wrappers can hand the same error to every
/// subscriber.
#[derive(Debug, Clone, Error)]
pub enum StreamError {
    /// A user callback (predicate, projection, reducer) panicked.
    #[error("callback panicked: {message}")]
    CallbackPanicked { message: String },

    /// A producer reported failure.
    #[error("{message}")]
    Failed { message: String },

    /// A reducing operator completed without seed and without values.
    #[error("sequence contains no elements")]
    NoElements,

    /// Wrapped foreign error.
    #[error("{0}")]
    Source(Rc<dyn std::error::Error>),
}

impl StreamError {
    /// Producer failure with a message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    /// Wrap any error type.
    pub fn from_error<E: std::error::Error + 'static>(error: E) -> Self {
        Self::Source(Rc::new(error))
    }

    /// True if this error came from a panicking callback.
    pub fn is_callback_panic(&self) -> bool {
        matches!(self, Self::CallbackPanicked { .. })
    }
}

// =============================================================================
// CONFIG ERROR
// =============================================================================

/// Misuse detected while constructing a source, operator or recognizer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{name} must be a finite, non-negative number (got {value})")]
    InvalidThreshold { name: &'static str, value: f64 },

    #[error("max_pointers must be at least 1")]
    ZeroMaxPointers,

    #[error("pool capacity must be at least 1")]
    ZeroPoolCapacity,

    #[error("zoom bounds must satisfy 0 < min <= max (got {min}..{max})")]
    InvalidZoomBounds { min: f64, max: f64 },

    #[error("event source has no target")]
    MissingTarget,

    #[error("event target was dropped before the source was built")]
    TargetDropped,

    #[error("event source needs at least one event type")]
    NoEventKinds,

    #[error("unknown event type: {0}")]
    UnknownEventType(String),
}

/// Validate a threshold-like option.
pub(crate) fn check_threshold(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidThreshold { name, value })
    }
}

// =============================================================================
// TESTS
// =============================================================================
