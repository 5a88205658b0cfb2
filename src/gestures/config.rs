// ============================================================================
// spark-gestures - Gesture Configuration
// One document holding every recognizer's options
// ============================================================================

use crate::core::error::Result;
use crate::gestures::multi_pointer::MultiPointerOptions;
use crate::gestures::pan::PanOptions;
use crate::gestures::pinch::PinchOptions;
use crate::gestures::single_pointer::SinglePointerOptions;
use crate::gestures::tap::TapOptions;

/// Options for a whole gesture pipeline.
///
/// Every section falls back to its defaults, so a partial document is valid.
///
/// ```
/// use spark_gestures::GestureConfig;
///
/// let mut config = GestureConfig::default();
/// config.pan.threshold = 4.0;
/// assert!(config.validate().is_ok());
///
/// config.multi_pointer.max_pointers = 0;
/// assert!(config.validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default, rename_all = "camelCase")
)]
pub struct GestureConfig {
    pub single_pointer: SinglePointerOptions,
    pub multi_pointer: MultiPointerOptions,
    pub pan: PanOptions,
    pub pinch: PinchOptions,
    pub tap: TapOptions,
}

impl GestureConfig {
    /// Validate every section; the first failure wins.
    pub fn validate(&self) -> Result<()> {
        self.single_pointer.validate()?;
        self.multi_pointer.validate()?;
        self.pan.validate()?;
        self.pinch.validate()?;
        self.tap.validate()
    }

    /// With pooling switched on (or off) for every recognizer.
    pub fn with_pooling(mut self, pooling: bool) -> Self {
        self.single_pointer.pooling = pooling;
        self.multi_pointer.pooling = pooling;
        self.pan.pooling = pooling;
        self.pinch.pooling = pooling;
        self.tap.pooling = pooling;
        self
    }
}

// =============================================================================
// TESTS
// =============================================================================
