// ============================================================================
// spark-gestures - Core Types
// The Signal envelope and the small value types shared by every recognizer
// ============================================================================

use std::fmt;

use crate::reactivity::scheduling::now;

// =============================================================================
// SIGNAL<V> - The event envelope
// =============================================================================

/// Tagged, timestamped envelope carried by every stream in the crate.
///
/// `kind` is fixed when the signal is created. `created_at` is a millisecond
/// timestamp on the runtime clock (see [`now`]).
///
/// # Example
///
/// ```
/// use spark_gestures::Signal;
///
/// let s = Signal::with_timestamp("pan", 42, "mouse", 16.0);
/// assert_eq!(s.kind(), "pan");
/// assert_eq!(s.value, 42);
/// assert_eq!(s.device_id(), "mouse");
/// assert_eq!(s.created_at(), 16.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Signal<V> {
    kind: &'static str,
    /// Mutable payload
    pub value: V,
    device_id: String,
    created_at: f64,
}

impl<V> Signal<V> {
    /// Create a signal stamped with the current runtime time.
    pub fn new(kind: &'static str, value: V, device_id: impl Into<String>) -> Self {
        Self::with_timestamp(kind, value, device_id, now())
    }

    /// Create a signal with an explicit timestamp (ms).
    pub fn with_timestamp(
        kind: &'static str,
        value: V,
        device_id: impl Into<String>,
        created_at: f64,
    ) -> Self {
        Self {
            kind,
            value,
            device_id: device_id.into(),
            created_at,
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn created_at(&self) -> f64 {
        self.created_at
    }

    /// New signal of another kind carrying this signal's device and timestamp.
    pub fn derive<U>(&self, kind: &'static str, value: U) -> Signal<U> {
        Signal::with_timestamp(kind, value, self.device_id.clone(), self.created_at)
    }

    /// Overwrite device and timestamp in place (reuses the id allocation).
    pub(crate) fn restamp(&mut self, device_id: &str, created_at: f64) {
        self.device_id.clear();
        self.device_id.push_str(device_id);
        self.created_at = created_at;
    }

    pub(crate) fn clear_stamp(&mut self) {
        self.device_id.clear();
        self.created_at = 0.0;
    }
}

// =============================================================================
// CURSOR
// =============================================================================

/// A 2D position in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Cursor {
    pub x: f64,
    pub y: f64,
}

impl Cursor {
    pub const ORIGIN: Cursor = Cursor { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance_to(&self, other: Cursor) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    pub fn midpoint(&self, other: Cursor) -> Cursor {
        Cursor::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

// =============================================================================
// PHASE
// =============================================================================

/// Lifecycle phase of a pointer contact or a gesture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    #[default]
    Start,
    Move,
    End,
    Cancel,
}

impl Phase {
    /// Gesture-level alias for [`Phase::Move`]
    pub const CHANGE: Phase = Phase::Move;

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Start => "start",
            Phase::Move => "move",
            Phase::End => "end",
            Phase::Cancel => "cancel",
        }
    }

    /// `start` or `move`: the contact is still down.
    pub fn is_working(&self) -> bool {
        matches!(self, Phase::Start | Phase::Move)
    }

    /// `end` or `cancel`
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::End | Phase::Cancel)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// POINTER TYPE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PointerType {
    Mouse,
    Pen,
    Touch,
    #[default]
    Unknown,
}

impl PointerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PointerType::Mouse => "mouse",
            PointerType::Pen => "pen",
            PointerType::Touch => "touch",
            PointerType::Unknown => "unknown",
        }
    }

    /// Parse a platform `pointerType` string; anything unrecognized is `Unknown`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "mouse" => PointerType::Mouse,
            "pen" => PointerType::Pen,
            "touch" => PointerType::Touch,
            _ => PointerType::Unknown,
        }
    }
}

impl fmt::Display for PointerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// BUTTON KIND
// =============================================================================

/// Classified mouse/pointer button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ButtonKind {
    #[default]
    None,
    Main,
    Auxiliary,
    Secondary,
    Fourth,
    Fifth,
}

impl ButtonKind {
    /// Classify a raw `button` code.
    ///
    /// ```
    /// use spark_gestures::ButtonKind;
    ///
    /// assert_eq!(ButtonKind::from_code(0), ButtonKind::Main);
    /// assert_eq!(ButtonKind::from_code(2), ButtonKind::Secondary);
    /// assert_eq!(ButtonKind::from_code(-1), ButtonKind::None);
    /// ```
    pub fn from_code(code: i16) -> Self {
        use crate::core::constants::*;
        match code {
            BUTTON_MAIN => ButtonKind::Main,
            BUTTON_AUXILIARY => ButtonKind::Auxiliary,
            BUTTON_SECONDARY => ButtonKind::Secondary,
            BUTTON_FOURTH => ButtonKind::Fourth,
            BUTTON_FIFTH => ButtonKind::Fifth,
            _ => ButtonKind::None,
        }
    }
}

// =============================================================================
// DIRECTION
// =============================================================================

/// Dominant direction of a displacement. Screen coordinates: `y` grows down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    None,
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::None => "none",
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }

    pub fn is_horizontal(&self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }

    pub fn is_vertical(&self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }
}

/// Direction of a total displacement.
///
/// The axis with the larger absolute displacement wins; `|dx| == |dy|` goes
/// to the horizontal axis.
///
/// ```
/// use spark_gestures::{direction_of, Direction};
///
/// assert_eq!(direction_of(0.0, 0.0), Direction::None);
/// assert_eq!(direction_of(15.0, 3.0), Direction::Right);
/// assert_eq!(direction_of(-2.0, -9.0), Direction::Up);
/// assert_eq!(direction_of(-5.0, 5.0), Direction::Left);
/// ```
pub fn direction_of(dx: f64, dy: f64) -> Direction {
    if dx == 0.0 && dy == 0.0 {
        return Direction::None;
    }
    if dx.abs() >= dy.abs() {
        if dx > 0.0 {
            Direction::Right
        } else {
            Direction::Left
        }
    } else if dy > 0.0 {
        Direction::Down
    } else {
        Direction::Up
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which axes count toward a pan threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum DirectionMode {
    Horizontal,
    Vertical,
    #[default]
    All,
}

impl DirectionMode {
    /// True once the displacement satisfies `threshold` on an accepted axis.
    pub fn reached(&self, dx: f64, dy: f64, threshold: f64) -> bool {
        match self {
            DirectionMode::Horizontal => dx.abs() >= threshold,
            DirectionMode::Vertical => dy.abs() >= threshold,
            DirectionMode::All => dx.abs() >= threshold || dy.abs() >= threshold,
        }
    }
}

// =============================================================================
// POINTER-LIKE CAPABILITY
// =============================================================================

/// Anything with a phase and a position can drive Pan, Tap and velocity.
pub trait PointerLike {
    fn phase(&self) -> Phase;

    /// Client (viewport) position
    fn cursor(&self) -> Cursor;

    /// Page (document) position
    fn page_cursor(&self) -> Cursor;
}

impl<V: PointerLike> PointerLike for Signal<V> {
    fn phase(&self) -> Phase {
        self.value.phase()
    }

    fn cursor(&self) -> Cursor {
        self.value.cursor()
    }

    fn page_cursor(&self) -> Cursor {
        self.value.page_cursor()
    }
}

// =============================================================================
// TESTS
// =============================================================================
