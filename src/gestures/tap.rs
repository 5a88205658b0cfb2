// ============================================================================
// spark-gestures - Tap Recognizer
// Short, still contacts, counted into chains (double / triple tap)
// ============================================================================
//
// Two layers of state:
//
//   attempt - the contact currently down: start position/time, cancelled flag
//   chain   - the last completed tap: end time, position, running count
//
// start: continues the chain when the last tap ended within
//        `chain_interval_threshold` ms and `chain_movement_threshold` px,
//        otherwise the count restarts at 1. Emits Start with the count.
// move:  too far or too long -> Cancel once, chain cleared.
// end:   in time -> End with the count, chain remembers it.
//        overdue  -> Cancel, chain cleared.
// cancel (pointer) during a live attempt -> Cancel, chain cleared.
// ============================================================================

use std::marker::PhantomData;

use tracing::trace;

use crate::core::constants::{
    DEFAULT_POOL_CAPACITY, DEFAULT_TAP_CHAIN_INTERVAL_THRESHOLD,
    DEFAULT_TAP_CHAIN_MOVEMENT_THRESHOLD, DEFAULT_TAP_DURATION_THRESHOLD,
    DEFAULT_TAP_MOVEMENT_THRESHOLD, KIND_TAP,
};
use crate::core::error::{check_threshold, Result};
use crate::core::types::{Cursor, Phase, PointerLike, Signal};
use crate::gestures::{check_pool, recognize, Recognizer};
use crate::primitives::pool::{Poolable, SignalRecycler};
use crate::primitives::stream::Stream;

// =============================================================================
// OUTPUT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Tap {
    pub phase: Phase,
    pub x: f64,
    pub y: f64,
    pub page_x: f64,
    pub page_y: f64,
    /// 1 for a single tap, 2 for a double tap, ...
    pub tap_count: u32,
    /// ms since this attempt's contact went down
    pub duration: f64,
}

impl Poolable for Tap {
    fn reset(&mut self) {
        *self = Tap::default();
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
pub struct TapOptions {
    /// Max travel (px) from the start position
    pub movement_threshold: f64,
    /// Max contact time (ms)
    pub duration_threshold: f64,
    /// Max distance (px) between chained taps
    pub chain_movement_threshold: f64,
    /// Max gap (ms) between one tap's end and the next start
    pub chain_interval_threshold: f64,
    pub pooling: bool,
    pub pool_capacity: usize,
}

impl Default for TapOptions {
    fn default() -> Self {
        Self {
            movement_threshold: DEFAULT_TAP_MOVEMENT_THRESHOLD,
            duration_threshold: DEFAULT_TAP_DURATION_THRESHOLD,
            chain_movement_threshold: DEFAULT_TAP_CHAIN_MOVEMENT_THRESHOLD,
            chain_interval_threshold: DEFAULT_TAP_CHAIN_INTERVAL_THRESHOLD,
            pooling: false,
            pool_capacity: DEFAULT_POOL_CAPACITY,
        }
    }
}

impl TapOptions {
    pub fn validate(&self) -> Result<()> {
        check_threshold("movement_threshold", self.movement_threshold)?;
        check_threshold("duration_threshold", self.duration_threshold)?;
        check_threshold("chain_movement_threshold", self.chain_movement_threshold)?;
        check_threshold("chain_interval_threshold", self.chain_interval_threshold)?;
        check_pool(self.pooling, self.pool_capacity)
    }
}

// =============================================================================
// RECOGNIZER
// =============================================================================

#[derive(Debug, Clone, Copy)]
struct Attempt {
    start: Cursor,
    start_time: f64,
    count: u32,
    cancelled: bool,
}

#[derive(Debug, Clone, Copy)]
struct LastTap {
    at: Cursor,
    ended_at: f64,
    count: u32,
}

pub struct TapRecognizer<V> {
    options: TapOptions,
    recycler: SignalRecycler<Tap>,
    attempt: Option<Attempt>,
    chain: Option<LastTap>,
    _input: PhantomData<fn(&V)>,
}

impl<V: PointerLike> TapRecognizer<V> {
    pub fn new(options: TapOptions) -> Result<Self> {
        options.validate()?;
        let recycler = SignalRecycler::new(KIND_TAP, options.pooling, options.pool_capacity)?;
        Ok(Self {
            options,
            recycler,
            attempt: None,
            chain: None,
            _input: PhantomData,
        })
    }

    pub fn fork(&self) -> Self {
        Self {
            options: self.options.clone(),
            recycler: self.recycler.fork(),
            attempt: None,
            chain: None,
            _input: PhantomData,
        }
    }

    /// Count of the chain the next tap would extend, 0 if none.
    pub fn chain_count(&self) -> u32 {
        self.chain.map_or(0, |c| c.count)
    }

    fn continued_count(&self, at: Cursor, time: f64) -> u32 {
        match self.chain {
            Some(last)
                if time - last.ended_at <= self.options.chain_interval_threshold
                    && last.at.distance_to(at) <= self.options.chain_movement_threshold =>
            {
                last.count + 1
            }
            _ => 1,
        }
    }

    fn emit(&mut self, input: &Signal<V>, attempt: &Attempt, phase: Phase) -> Signal<Tap> {
        let at = input.value.cursor();
        let page = input.value.page_cursor();

        let mut signal = self.recycler.acquire(input.device_id(), input.created_at());
        let out = &mut signal.value;
        out.phase = phase;
        out.x = at.x;
        out.y = at.y;
        out.page_x = page.x;
        out.page_y = page.y;
        out.tap_count = attempt.count;
        out.duration = input.created_at() - attempt.start_time;
        signal
    }

    fn cancel(&mut self, input: &Signal<V>, attempt: &mut Attempt, reason: &str) -> Signal<Tap> {
        attempt.cancelled = true;
        self.chain = None;
        trace!(count = attempt.count, reason, "tap cancelled");
        self.emit(input, attempt, Phase::Cancel)
    }
}

impl<V: PointerLike> Recognizer for TapRecognizer<V> {
    type Input = Signal<V>;
    type Output = Signal<Tap>;

    fn process(&mut self, input: &Signal<V>) -> Option<Signal<Tap>> {
        let at = input.value.cursor();
        let time = input.created_at();

        match input.value.phase() {
            Phase::Start => {
                let attempt = Attempt {
                    start: at,
                    start_time: time,
                    count: self.continued_count(at, time),
                    cancelled: false,
                };
                self.attempt = Some(attempt);
                trace!(count = attempt.count, "tap attempt started");
                Some(self.emit(input, &attempt, Phase::Start))
            }
            Phase::Move => {
                let mut attempt = self.attempt?;
                if attempt.cancelled {
                    return None;
                }
                let reason = if attempt.start.distance_to(at) > self.options.movement_threshold {
                    "moved"
                } else if time - attempt.start_time > self.options.duration_threshold {
                    "held"
                } else {
                    return None;
                };
                let signal = self.cancel(input, &mut attempt, reason);
                self.attempt = Some(attempt);
                Some(signal)
            }
            Phase::End => {
                let mut attempt = self.attempt.take()?;
                if attempt.cancelled {
                    return None;
                }
                if time - attempt.start_time > self.options.duration_threshold {
                    return Some(self.cancel(input, &mut attempt, "held"));
                }
                self.chain = Some(LastTap {
                    at,
                    ended_at: time,
                    count: attempt.count,
                });
                trace!(count = attempt.count, "tap");
                Some(self.emit(input, &attempt, Phase::End))
            }
            Phase::Cancel => {
                let mut attempt = self.attempt.take()?;
                if attempt.cancelled {
                    return None;
                }
                Some(self.cancel(input, &mut attempt, "pointer cancelled"))
            }
        }
    }

    fn recycle(&mut self, output: Signal<Tap>) {
        self.recycler.recycle(output);
    }

    fn reset(&mut self) {
        self.attempt = None;
        self.chain = None;
    }

    fn dispose(&mut self) {
        self.reset();
        self.recycler.dispose();
    }
}

impl<V: PointerLike + 'static> Stream<Signal<V>> {
    /// Recognize taps and tap chains.
    pub fn tap(&self, options: TapOptions) -> Result<Stream<Signal<Tap>>> {
        let template = TapRecognizer::<V>::new(options)?;
        Ok(recognize(self, move || template.fork()))
    }
}

// =============================================================================
// TESTS
// =============================================================================
