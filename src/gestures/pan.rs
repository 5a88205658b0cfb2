// ============================================================================
// spark-gestures - Pan Recognizer
// Threshold-gated drag over any pointer-like signal
// ============================================================================
//
// pointer start -> arm (no emission)
// pointer move  -> below threshold: nothing
//                  first time over:  gesture Start (velocity reset to 0/0)
//                  afterwards:       Move
// pointer end / cancel -> End / Cancel if the threshold was ever met
//
// `distance` is the path length travelled, not the displacement.
// ============================================================================

use std::marker::PhantomData;

use tracing::trace;

use crate::core::constants::{DEFAULT_PAN_THRESHOLD, DEFAULT_POOL_CAPACITY, KIND_PAN};
use crate::core::error::{check_threshold, Result};
use crate::core::types::{direction_of, Cursor, Direction, DirectionMode, Phase, PointerLike, Signal};
use crate::gestures::{check_pool, recognize, Recognizer};
use crate::primitives::pool::{Poolable, SignalRecycler};
use crate::primitives::stream::Stream;

// =============================================================================
// OUTPUT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pan {
    /// Gesture phase (`Move` doubles as "change")
    pub phase: Phase,
    pub x: f64,
    pub y: f64,
    pub page_x: f64,
    pub page_y: f64,
    pub start_x: f64,
    pub start_y: f64,
    pub delta_x: f64,
    pub delta_y: f64,
    /// Path length since the pointer went down
    pub distance: f64,
    pub direction: Direction,
    /// px/ms between the last two samples
    pub velocity_x: f64,
    pub velocity_y: f64,
    /// ms since the pointer went down
    pub duration: f64,
}

impl Poolable for Pan {
    fn reset(&mut self) {
        *self = Pan::default();
    }
}

impl PointerLike for Pan {
    fn phase(&self) -> Phase {
        self.phase
    }

    fn cursor(&self) -> Cursor {
        Cursor::new(self.x, self.y)
    }

    fn page_cursor(&self) -> Cursor {
        Cursor::new(self.page_x, self.page_y)
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
pub struct PanOptions {
    /// Movement (px) before the gesture starts
    pub threshold: f64,
    /// Axes that count toward the threshold
    pub direction: DirectionMode,
    pub pooling: bool,
    pub pool_capacity: usize,
}

impl Default for PanOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_PAN_THRESHOLD,
            direction: DirectionMode::All,
            pooling: false,
            pool_capacity: DEFAULT_POOL_CAPACITY,
        }
    }
}

impl PanOptions {
    pub fn validate(&self) -> Result<()> {
        check_threshold("threshold", self.threshold)?;
        check_pool(self.pooling, self.pool_capacity)
    }
}

// =============================================================================
// RECOGNIZER
// =============================================================================

#[derive(Debug, Clone, Copy, Default)]
struct Session {
    start: Cursor,
    start_time: f64,
    previous: Cursor,
    previous_time: f64,
    distance: f64,
    velocity_x: f64,
    velocity_y: f64,
    threshold_met: bool,
}

pub struct PanRecognizer<V> {
    options: PanOptions,
    recycler: SignalRecycler<Pan>,
    session: Option<Session>,
    _input: PhantomData<fn(&V)>,
}

impl<V: PointerLike> PanRecognizer<V> {
    pub fn new(options: PanOptions) -> Result<Self> {
        options.validate()?;
        let recycler = SignalRecycler::new(KIND_PAN, options.pooling, options.pool_capacity)?;
        Ok(Self {
            options,
            recycler,
            session: None,
            _input: PhantomData,
        })
    }

    pub fn fork(&self) -> Self {
        Self {
            options: self.options.clone(),
            recycler: self.recycler.fork(),
            session: None,
            _input: PhantomData,
        }
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Advance the session to `at` / `time`.
    fn step(session: &mut Session, at: Cursor, time: f64) {
        session.distance += session.previous.distance_to(at);
        let dt = time - session.previous_time;
        if dt > 0.0 {
            session.velocity_x = (at.x - session.previous.x) / dt;
            session.velocity_y = (at.y - session.previous.y) / dt;
        }
        session.previous = at;
        session.previous_time = time;
    }

    fn emit(&mut self, input: &Signal<V>, session: &Session, phase: Phase) -> Signal<Pan> {
        let at = input.value.cursor();
        let page = input.value.page_cursor();
        let (dx, dy) = (at.x - session.start.x, at.y - session.start.y);

        let mut signal = self.recycler.acquire(input.device_id(), input.created_at());
        let out = &mut signal.value;
        out.phase = phase;
        out.x = at.x;
        out.y = at.y;
        out.page_x = page.x;
        out.page_y = page.y;
        out.start_x = session.start.x;
        out.start_y = session.start.y;
        out.delta_x = dx;
        out.delta_y = dy;
        out.distance = session.distance;
        out.direction = direction_of(dx, dy);
        out.velocity_x = session.velocity_x;
        out.velocity_y = session.velocity_y;
        out.duration = input.created_at() - session.start_time;
        signal
    }
}

impl<V: PointerLike> Recognizer for PanRecognizer<V> {
    type Input = Signal<V>;
    type Output = Signal<Pan>;

    fn process(&mut self, input: &Signal<V>) -> Option<Signal<Pan>> {
        let at = input.value.cursor();
        let time = input.created_at();

        match input.value.phase() {
            Phase::Start => {
                self.session = Some(Session {
                    start: at,
                    start_time: time,
                    previous: at,
                    previous_time: time,
                    ..Session::default()
                });
                None
            }
            Phase::Move => {
                let mut session = self.session?;
                Self::step(&mut session, at, time);

                let phase = if session.threshold_met {
                    Phase::CHANGE
                } else {
                    let (dx, dy) = (at.x - session.start.x, at.y - session.start.y);
                    if !self.options.direction.reached(dx, dy, self.options.threshold) {
                        self.session = Some(session);
                        return None;
                    }
                    session.threshold_met = true;
                    session.velocity_x = 0.0;
                    session.velocity_y = 0.0;
                    trace!(dx, dy, threshold = self.options.threshold, "pan started");
                    Phase::Start
                };

                self.session = Some(session);
                Some(self.emit(input, &session, phase))
            }
            phase @ (Phase::End | Phase::Cancel) => {
                let mut session = self.session.take()?;
                if !session.threshold_met {
                    return None;
                }
                Self::step(&mut session, at, time);
                trace!(%phase, distance = session.distance, "pan finished");
                Some(self.emit(input, &session, phase))
            }
        }
    }

    fn recycle(&mut self, output: Signal<Pan>) {
        self.recycler.recycle(output);
    }

    fn reset(&mut self) {
        self.session = None;
    }

    fn dispose(&mut self) {
        self.reset();
        self.recycler.dispose();
    }
}

impl<V: PointerLike + 'static> Stream<Signal<V>> {
    /// Recognize pan gestures.
    ///
    /// ```
    /// use std::cell::RefCell;
    /// use std::rc::Rc;
    /// use spark_gestures::{PanOptions, Phase, Signal, SinglePointer, Subject};
    ///
    /// let input: Subject<Signal<SinglePointer>> = Subject::new();
    /// let pans = input.stream().pan(PanOptions::default()).unwrap();
    ///
    /// let seen = Rc::new(RefCell::new(Vec::new()));
    /// let s = seen.clone();
    /// pans.for_each(move |p| s.borrow_mut().push(p.value.clone()));
    ///
    /// let at = |phase, x: f64, t| {
    ///     let value = SinglePointer { phase, x, y: 0.0, ..Default::default() };
    ///     Signal::with_timestamp("single-pointer", value, "mouse", t)
    /// };
    /// input.next(&at(Phase::Start, 0.0, 0.0));
    /// input.next(&at(Phase::Move, 4.0, 10.0));
    /// input.next(&at(Phase::Move, 12.0, 20.0));
    /// input.next(&at(Phase::End, 12.0, 30.0));
    ///
    /// let seen = seen.borrow();
    /// assert_eq!(seen.len(), 2);
    /// assert_eq!(seen[0].phase, Phase::Start);
    /// assert_eq!(seen[1].phase, Phase::End);
    /// ```
    pub fn pan(&self, options: PanOptions) -> Result<Stream<Signal<Pan>>> {
        let template = PanRecognizer::<V>::new(options)?;
        Ok(recognize(self, move || template.fork()))
    }
}

// =============================================================================
// TESTS
// =============================================================================
