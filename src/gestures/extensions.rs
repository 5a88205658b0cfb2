// ============================================================================
// spark-gestures - Gesture Extensions
// Post-processing stages for recognizer output
// ============================================================================
//
//   pan   -> axis_lock()    one axis for the rest of the session
//   any   -> velocity()     px/ms between consecutive samples
//   pan   -> translate()    cumulative offset across sessions
//   pinch -> zoom(min, max) cumulative, clamped scale across sessions
//
// `translate` and `zoom` commit on End and revert to the last committed
// value on Cancel.
// ============================================================================

use std::marker::PhantomData;

use tracing::trace;

use crate::core::constants::{KIND_TRANSLATE, KIND_VELOCITY, KIND_ZOOM};
use crate::core::error::{ConfigError, Result};
use crate::core::types::{direction_of, Cursor, Phase, PointerLike, Signal};
use crate::gestures::pan::Pan;
use crate::gestures::pinch::Pinch;
use crate::gestures::{recognize, Recognizer};
use crate::primitives::stream::Stream;

// =============================================================================
// AXIS LOCK
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    /// Dominant axis of a displacement; ties go horizontal.
    pub fn dominant(dx: f64, dy: f64) -> Axis {
        if dx.abs() >= dy.abs() {
            Axis::Horizontal
        } else {
            Axis::Vertical
        }
    }
}

struct AxisLock {
    axis: Option<Axis>,
}

impl Recognizer for AxisLock {
    type Input = Signal<Pan>;
    type Output = Signal<Pan>;

    fn process(&mut self, input: &Signal<Pan>) -> Option<Signal<Pan>> {
        let pan = &input.value;
        if pan.phase == Phase::Start || self.axis.is_none() {
            let axis = Axis::dominant(pan.delta_x, pan.delta_y);
            trace!(?axis, "axis locked");
            self.axis = Some(axis);
        }

        let mut locked = pan.clone();
        match self.axis {
            Some(Axis::Horizontal) => {
                locked.y = pan.start_y;
                locked.page_y = pan.page_y - pan.delta_y;
                locked.delta_y = 0.0;
                locked.velocity_y = 0.0;
            }
            Some(Axis::Vertical) => {
                locked.x = pan.start_x;
                locked.page_x = pan.page_x - pan.delta_x;
                locked.delta_x = 0.0;
                locked.velocity_x = 0.0;
            }
            None => {}
        }
        locked.direction = direction_of(locked.delta_x, locked.delta_y);

        if pan.phase.is_terminal() {
            self.axis = None;
        }
        Some(input.derive(input.kind(), locked))
    }

    fn reset(&mut self) {
        self.axis = None;
    }
}

// =============================================================================
// VELOCITY
// =============================================================================

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Velocity {
    pub phase: Phase,
    /// px/ms
    pub velocity_x: f64,
    pub velocity_y: f64,
    /// Magnitude of the velocity vector
    pub speed: f64,
}

struct VelocityTracker<V> {
    previous: Option<(Cursor, f64)>,
    velocity_x: f64,
    velocity_y: f64,
    _input: PhantomData<fn(&V)>,
}

impl<V: PointerLike> Recognizer for VelocityTracker<V> {
    type Input = Signal<V>;
    type Output = Signal<Velocity>;

    fn process(&mut self, input: &Signal<V>) -> Option<Signal<Velocity>> {
        let phase = input.value.phase();
        let at = input.value.cursor();
        let time = input.created_at();

        match self.previous {
            Some((previous, previous_time)) if phase != Phase::Start => {
                let dt = time - previous_time;
                if dt > 0.0 {
                    self.velocity_x = (at.x - previous.x) / dt;
                    self.velocity_y = (at.y - previous.y) / dt;
                }
            }
            _ => {
                self.velocity_x = 0.0;
                self.velocity_y = 0.0;
            }
        }
        self.previous = if phase.is_terminal() {
            None
        } else {
            Some((at, time))
        };

        let velocity = Velocity {
            phase,
            velocity_x: self.velocity_x,
            velocity_y: self.velocity_y,
            speed: self.velocity_x.hypot(self.velocity_y),
        };
        Some(input.derive(KIND_VELOCITY, velocity))
    }

    fn reset(&mut self) {
        self.previous = None;
        self.velocity_x = 0.0;
        self.velocity_y = 0.0;
    }
}

// =============================================================================
// TRANSLATE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Translate {
    pub phase: Phase,
    /// Total offset: committed sessions plus the live one
    pub x: f64,
    pub y: f64,
    /// Offset of the live session
    pub delta_x: f64,
    pub delta_y: f64,
}

struct Translation {
    committed: Cursor,
}

impl Recognizer for Translation {
    type Input = Signal<Pan>;
    type Output = Signal<Translate>;

    fn process(&mut self, input: &Signal<Pan>) -> Option<Signal<Translate>> {
        let pan = &input.value;
        let (delta_x, delta_y) = match pan.phase {
            Phase::Cancel => (0.0, 0.0),
            _ => (pan.delta_x, pan.delta_y),
        };
        let total = Cursor::new(self.committed.x + delta_x, self.committed.y + delta_y);
        if pan.phase == Phase::End {
            self.committed = total;
            trace!(x = total.x, y = total.y, "translation committed");
        }
        let translate = Translate {
            phase: pan.phase,
            x: total.x,
            y: total.y,
            delta_x,
            delta_y,
        };
        Some(input.derive(KIND_TRANSLATE, translate))
    }

    fn reset(&mut self) {
        self.committed = Cursor::ORIGIN;
    }
}

// =============================================================================
// ZOOM
// =============================================================================

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Zoom {
    pub phase: Phase,
    /// Clamped total scale
    pub scale: f64,
    /// Ratio of the live pinch
    pub ratio: f64,
}

struct Zooming {
    min: f64,
    max: f64,
    committed: f64,
}

impl Zooming {
    fn new(min: f64, max: f64) -> Result<Self> {
        if !(min.is_finite() && max.is_finite() && min > 0.0 && min <= max) {
            return Err(ConfigError::InvalidZoomBounds { min, max });
        }
        Ok(Self {
            min,
            max,
            committed: 1.0_f64.clamp(min, max),
        })
    }

    fn fork(&self) -> Self {
        Self {
            min: self.min,
            max: self.max,
            committed: 1.0_f64.clamp(self.min, self.max),
        }
    }
}

impl Recognizer for Zooming {
    type Input = Signal<Pinch>;
    type Output = Signal<Zoom>;

    fn process(&mut self, input: &Signal<Pinch>) -> Option<Signal<Zoom>> {
        let pinch = &input.value;
        let scale = match pinch.phase {
            Phase::Cancel => self.committed,
            _ => (self.committed * pinch.ratio).clamp(self.min, self.max),
        };
        if pinch.phase == Phase::End {
            self.committed = scale;
            trace!(scale, "zoom committed");
        }
        let zoom = Zoom {
            phase: pinch.phase,
            scale,
            ratio: pinch.ratio,
        };
        Some(input.derive(KIND_ZOOM, zoom))
    }

    fn reset(&mut self) {
        self.committed = 1.0_f64.clamp(self.min, self.max);
    }
}

// =============================================================================
// STREAM METHODS
// =============================================================================

impl Stream<Signal<Pan>> {
    /// Lock each pan session to the axis dominant at its Start.
    pub fn axis_lock(&self) -> Stream<Signal<Pan>> {
        recognize(self, || AxisLock { axis: None })
    }

    /// Accumulate pan offsets into a running translation.
    pub fn translate(&self) -> Stream<Signal<Translate>> {
        recognize(self, || Translation {
            committed: Cursor::ORIGIN,
        })
    }
}

impl<V: PointerLike + 'static> Stream<Signal<V>> {
    /// Velocity between consecutive samples.
    pub fn velocity(&self) -> Stream<Signal<Velocity>> {
        recognize(self, || VelocityTracker::<V> {
            previous: None,
            velocity_x: 0.0,
            velocity_y: 0.0,
            _input: PhantomData,
        })
    }
}

impl Stream<Signal<Pinch>> {
    /// Accumulate pinch ratios into a scale clamped to `min..=max`.
    ///
    /// ```
    /// use spark_gestures::ConfigError;
    /// use spark_gestures::{Pinch, Signal, Subject};
    ///
    /// let pinches: Subject<Signal<Pinch>> = Subject::new();
    /// assert!(pinches.stream().zoom(0.5, 4.0).is_ok());
    /// assert!(matches!(
    ///     pinches.stream().zoom(2.0, 1.0),
    ///     Err(ConfigError::InvalidZoomBounds { .. })
    /// ));
    /// ```
    pub fn zoom(&self, min: f64, max: f64) -> Result<Stream<Signal<Zoom>>> {
        let template = Zooming::new(min, max)?;
        Ok(recognize(self, move || template.fork()))
    }
}

// =============================================================================
// TESTS
// =============================================================================
