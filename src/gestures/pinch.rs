// ============================================================================
// spark-gestures - Pinch Recognizer
// Two-contact distance tracking over multi-pointer snapshots
// ============================================================================
//
// idle --exactly two working contacts--> latched (no emission)
// latched --|distance - initial| >= threshold--> Start, then Change per snapshot
// either tracked contact ends or cancels --> End / Cancel (only if started)
// a tracked contact disappears from the snapshot --> silent reset
// ============================================================================

use tracing::trace;

use crate::core::constants::{
    DEFAULT_PINCH_THRESHOLD, DEFAULT_POOL_CAPACITY, KIND_PINCH, MIN_PINCH_DISTANCE,
};
use crate::core::error::{check_threshold, Result};
use crate::core::types::{Cursor, Phase, Signal};
use crate::gestures::multi_pointer::{MultiPointer, PointerInfo};
use crate::gestures::{check_pool, recognize, Recognizer};
use crate::primitives::pool::{Poolable, SignalRecycler};
use crate::primitives::stream::Stream;

// =============================================================================
// OUTPUT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pinch {
    pub phase: Phase,
    /// Current distance between the two contacts
    pub distance: f64,
    /// Distance when the pair was latched (at least 1px)
    pub initial_distance: f64,
    /// `distance / initial_distance`
    pub ratio: f64,
    /// `distance - initial_distance`
    pub delta_distance: f64,
    /// px/ms change of distance between snapshots
    pub velocity: f64,
    pub center: Cursor,
    pub page_center: Cursor,
}

impl Poolable for Pinch {
    fn reset(&mut self) {
        *self = Pinch::default();
    }
}

// =============================================================================
// OPTIONS
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default, rename_all = "camelCase")
)]
pub struct PinchOptions {
    /// Distance change (px) before the gesture starts
    pub threshold: f64,
    pub pooling: bool,
    pub pool_capacity: usize,
}

impl Default for PinchOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_PINCH_THRESHOLD,
            pooling: false,
            pool_capacity: DEFAULT_POOL_CAPACITY,
        }
    }
}

impl PinchOptions {
    pub fn validate(&self) -> Result<()> {
        check_threshold("threshold", self.threshold)?;
        check_pool(self.pooling, self.pool_capacity)
    }
}

// =============================================================================
// RECOGNIZER
// =============================================================================

/// The latched pair.
struct Latch {
    first: String,
    second: String,
    initial_distance: f64,
    previous_distance: f64,
    previous_time: f64,
    started: bool,
}

pub struct PinchRecognizer {
    options: PinchOptions,
    recycler: SignalRecycler<Pinch>,
    latch: Option<Latch>,
}

impl PinchRecognizer {
    pub fn new(options: PinchOptions) -> Result<Self> {
        options.validate()?;
        let recycler = SignalRecycler::new(KIND_PINCH, options.pooling, options.pool_capacity)?;
        Ok(Self {
            options,
            recycler,
            latch: None,
        })
    }

    pub fn fork(&self) -> Self {
        Self {
            options: self.options.clone(),
            recycler: self.recycler.fork(),
            latch: None,
        }
    }

    /// True once a pair of contacts is latched.
    pub fn is_tracking(&self) -> bool {
        self.latch.is_some()
    }

    /// Latch onto the snapshot's pair, if it has exactly two working contacts.
    fn try_latch(&mut self, snapshot: &MultiPointer, time: f64) {
        let mut working = snapshot.working();
        let (Some(a), Some(b), None) = (working.next(), working.next(), working.next()) else {
            return;
        };
        let distance = a.cursor().distance_to(b.cursor());
        trace!(first = %a.key, second = %b.key, distance, "pinch pair latched");
        self.latch = Some(Latch {
            first: a.key.clone(),
            second: b.key.clone(),
            initial_distance: distance.max(MIN_PINCH_DISTANCE),
            previous_distance: distance,
            previous_time: time,
            started: false,
        });
    }

    fn emit(
        &mut self,
        input: &Signal<MultiPointer>,
        pair: (&PointerInfo, &PointerInfo),
        phase: Phase,
        initial_distance: f64,
        velocity: f64,
    ) -> Signal<Pinch> {
        let (a, b) = pair;
        let distance = a.cursor().distance_to(b.cursor());

        let mut signal = self.recycler.acquire(input.device_id(), input.created_at());
        let out = &mut signal.value;
        out.phase = phase;
        out.distance = distance;
        out.initial_distance = initial_distance;
        out.ratio = distance / initial_distance;
        out.delta_distance = distance - initial_distance;
        out.velocity = velocity;
        out.center = a.cursor().midpoint(b.cursor());
        out.page_center = a.page_cursor().midpoint(b.page_cursor());
        signal
    }
}

impl Recognizer for PinchRecognizer {
    type Input = Signal<MultiPointer>;
    type Output = Signal<Pinch>;

    fn process(&mut self, input: &Signal<MultiPointer>) -> Option<Signal<Pinch>> {
        let snapshot = &input.value;
        let time = input.created_at();

        let Some(latch) = self.latch.as_mut() else {
            self.try_latch(snapshot, time);
            return None;
        };

        let (Some(a), Some(b)) = (snapshot.get(&latch.first), snapshot.get(&latch.second)) else {
            trace!("pinch contact lost");
            self.latch = None;
            return None;
        };

        let distance = a.cursor().distance_to(b.cursor());
        let dt = time - latch.previous_time;
        let velocity = if dt > 0.0 {
            (distance - latch.previous_distance) / dt
        } else {
            0.0
        };
        latch.previous_distance = distance;
        latch.previous_time = time;
        let initial = latch.initial_distance;

        if a.phase.is_terminal() || b.phase.is_terminal() {
            let started = latch.started;
            self.latch = None;
            if !started {
                return None;
            }
            let phase = if a.phase == Phase::Cancel || b.phase == Phase::Cancel {
                Phase::Cancel
            } else {
                Phase::End
            };
            trace!(%phase, distance, "pinch finished");
            return Some(self.emit(input, (a, b), phase, initial, velocity));
        }

        let phase = if latch.started {
            Phase::CHANGE
        } else if (distance - initial).abs() >= self.options.threshold {
            latch.started = true;
            trace!(distance, initial, "pinch started");
            Phase::Start
        } else {
            return None;
        };
        let velocity = if phase == Phase::Start { 0.0 } else { velocity };
        Some(self.emit(input, (a, b), phase, initial, velocity))
    }

    fn recycle(&mut self, output: Signal<Pinch>) {
        self.recycler.recycle(output);
    }

    fn reset(&mut self) {
        self.latch = None;
    }

    fn dispose(&mut self) {
        self.reset();
        self.recycler.dispose();
    }
}

impl Stream<Signal<MultiPointer>> {
    /// Recognize two-finger pinch gestures.
    pub fn pinch(&self, options: PinchOptions) -> Result<Stream<Signal<Pinch>>> {
        let template = PinchRecognizer::new(options)?;
        Ok(recognize(self, move || template.fork()))
    }
}

// =============================================================================
// TESTS
// =============================================================================
