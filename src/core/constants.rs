// ============================================================================
// spark-gestures - Constants
// Signal kind tags, default thresholds and raw button codes
// ============================================================================

// =============================================================================
// SIGNAL KIND TAGS
// =============================================================================

/// Raw pointer events (`pointerdown`, `pointermove`, ...)
pub const KIND_POINTER_EVENT: &str = "pointer";

/// Raw mouse events (`mousedown`, `mousemove`, ...)
pub const KIND_MOUSE_EVENT: &str = "mouse";

/// Raw touch events (`touchstart`, `touchmove`, ...)
pub const KIND_TOUCH_EVENT: &str = "touch";

/// Raw wheel events
pub const KIND_WHEEL_EVENT: &str = "wheel";

/// Raw keyboard events
pub const KIND_KEYBOARD_EVENT: &str = "keyboard";

/// Normalized single-contact signal
pub const KIND_SINGLE_POINTER: &str = "single-pointer";

/// Snapshot of every tracked contact
pub const KIND_MULTI_POINTER: &str = "multi-pointer";

/// Pan gesture
pub const KIND_PAN: &str = "pan";

/// Pinch gesture
pub const KIND_PINCH: &str = "pinch";

/// Tap gesture
pub const KIND_TAP: &str = "tap";

/// Velocity extension output
pub const KIND_VELOCITY: &str = "velocity";

/// Translate extension output
pub const KIND_TRANSLATE: &str = "translate";

/// Zoom extension output
pub const KIND_ZOOM: &str = "zoom";

// =============================================================================
// DEFAULT THRESHOLDS
// =============================================================================

/// Pan movement (px) before the gesture starts
pub const DEFAULT_PAN_THRESHOLD: f64 = 10.0;

/// Pinch distance change (px) before the gesture starts
pub const DEFAULT_PINCH_THRESHOLD: f64 = 10.0;

/// Maximum simultaneously tracked contacts
pub const DEFAULT_MAX_POINTERS: usize = 10;

/// Tap: maximum movement (px) from the start position
pub const DEFAULT_TAP_MOVEMENT_THRESHOLD: f64 = 10.0;

/// Tap: maximum press duration (ms)
pub const DEFAULT_TAP_DURATION_THRESHOLD: f64 = 250.0;

/// Tap chain: maximum distance (px) between consecutive taps
pub const DEFAULT_TAP_CHAIN_MOVEMENT_THRESHOLD: f64 = 20.0;

/// Tap chain: maximum gap (ms) between one tap's end and the next start
pub const DEFAULT_TAP_CHAIN_INTERVAL_THRESHOLD: f64 = 300.0;

/// Records kept by a recognizer's object pool
pub const DEFAULT_POOL_CAPACITY: usize = 16;

/// Lower bound for a pinch's initial distance
pub const MIN_PINCH_DISTANCE: f64 = 1.0;

/// Shortest interval period (ms); shorter periods are raised to this
pub const MIN_TIMER_PERIOD_MS: f64 = 1.0;

// =============================================================================
// RAW BUTTON CODES
// =============================================================================

/// Main button (usually left)
pub const BUTTON_MAIN: i16 = 0;

/// Auxiliary button (usually wheel / middle)
pub const BUTTON_AUXILIARY: i16 = 1;

/// Secondary button (usually right)
pub const BUTTON_SECONDARY: i16 = 2;

/// Fourth button (browser back)
pub const BUTTON_FOURTH: i16 = 3;

/// Fifth button (browser forward)
pub const BUTTON_FIFTH: i16 = 4;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_tags_are_distinct() {
        let kinds = [
            KIND_POINTER_EVENT,
            KIND_MOUSE_EVENT,
            KIND_TOUCH_EVENT,
            KIND_WHEEL_EVENT,
            KIND_KEYBOARD_EVENT,
            KIND_SINGLE_POINTER,
            KIND_MULTI_POINTER,
            KIND_PAN,
            KIND_PINCH,
            KIND_TAP,
            KIND_VELOCITY,
            KIND_TRANSLATE,
            KIND_ZOOM,
        ];

        for (i, a) in kinds.iter().enumerate() {
            for (j, b) in kinds.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b, "Kinds at index {} and {} collide", i, j);
                }
            }
        }
    }

    #[test]
    fn chain_thresholds_are_looser_than_tap_thresholds() {
        assert!(DEFAULT_TAP_CHAIN_MOVEMENT_THRESHOLD >= DEFAULT_TAP_MOVEMENT_THRESHOLD);
        assert!(DEFAULT_TAP_CHAIN_INTERVAL_THRESHOLD >= DEFAULT_TAP_DURATION_THRESHOLD);
    }

    #[test]
    fn button_codes_are_sequential() {
        assert_eq!(
            [BUTTON_MAIN, BUTTON_AUXILIARY, BUTTON_SECONDARY, BUTTON_FOURTH, BUTTON_FIFTH],
            [0, 1, 2, 3, 4]
        );
    }
}
