// ============================================================================
// spark-gestures - Single-Pointer Recognizer
// Normalizes pointer, mouse and touch events into one contact's lifecycle
// ============================================================================
//
// Phases: start -> move* -> (end | cancel)
//
// - pointer events: only the primary contact is followed
// - touch events: the first changed touch of the opening touchstart is
//   followed by identifier; other fingers are ignored
// - mouse events: mouseleave cancels the session
// - a move with no session is dropped
// - the button is classified on start/end only
// ============================================================================

use tracing::trace;

use crate::core::constants::{DEFAULT_POOL_CAPACITY, KIND_SINGLE_POINTER};
use crate::core::error::Result;
use crate::core::types::{ButtonKind, Cursor, Phase, PointerLike, PointerType, Signal};
use crate::events::event::{EventFamily, UiEvent};
use crate::gestures::{check_pool, recognize, Recognizer};
use crate::primitives::pool::{Poolable, SignalRecycler};
use crate::primitives::stream::Stream;

// =============================================================================
// OUTPUT
// =============================================================================

/// One contact, normalized.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SinglePointer {
    pub phase: Phase,
    pub x: f64,
    pub y: f64,
    pub page_x: f64,
    pub page_y: f64,
    pub pointer_type: PointerType,
    pub button: ButtonKind,
    pub pressure: f64,
    /// Pointer id, or touch identifier
    pub id: i64,
}

impl Poolable for SinglePointer {
    fn reset(&mut self) {
        *self = SinglePointer::default();
    }
}

impl PointerLike for SinglePointer {
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
pub struct SinglePointerOptions {
    /// Call `prevent_default` on every consumed event
    pub prevent_default: bool,
    pub pooling: bool,
    pub pool_capacity: usize,
}

impl Default for SinglePointerOptions {
    fn default() -> Self {
        Self {
            prevent_default: false,
            pooling: false,
            pool_capacity: DEFAULT_POOL_CAPACITY,
        }
    }
}

impl SinglePointerOptions {
    pub fn validate(&self) -> Result<()> {
        check_pool(self.pooling, self.pool_capacity)
    }
}

// =============================================================================
// RECOGNIZER
// =============================================================================

/// The contact fields pulled out of one raw event.
struct Contact {
    id: i64,
    pointer_type: PointerType,
    at: Cursor,
    page: Cursor,
    pressure: f64,
}

pub struct SinglePointerRecognizer {
    options: SinglePointerOptions,
    recycler: SignalRecycler<SinglePointer>,
    active: bool,
    /// Touch identifier followed in this session
    tracked_touch: Option<i64>,
}

impl SinglePointerRecognizer {
    pub fn new(options: SinglePointerOptions) -> Result<Self> {
        options.validate()?;
        let recycler =
            SignalRecycler::new(KIND_SINGLE_POINTER, options.pooling, options.pool_capacity)?;
        Ok(Self {
            options,
            recycler,
            active: false,
            tracked_touch: None,
        })
    }

    /// Fresh instance with the same options.
    pub fn fork(&self) -> Self {
        Self {
            options: self.options.clone(),
            recycler: self.recycler.fork(),
            active: false,
            tracked_touch: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    fn contact(&mut self, event: &UiEvent, phase: Phase) -> Option<Contact> {
        match event.kind.family() {
            EventFamily::Pointer => event.is_primary.then(|| Contact {
                id: event.pointer_id,
                pointer_type: event.pointer_type,
                at: Cursor::new(event.client_x, event.client_y),
                page: Cursor::new(event.page_x, event.page_y),
                pressure: event.pressure,
            }),
            EventFamily::Mouse => Some(Contact {
                id: event.pointer_id,
                pointer_type: PointerType::Mouse,
                at: Cursor::new(event.client_x, event.client_y),
                page: Cursor::new(event.page_x, event.page_y),
                pressure: event.pressure,
            }),
            EventFamily::Touch => {
                let touch = match (phase, self.tracked_touch) {
                    (Phase::Start, None) => event.changed_touches.first(),
                    (_, Some(id)) => event.changed_touches.iter().find(|t| t.identifier == id),
                    (_, None) => None,
                }?;
                if phase == Phase::Start && self.active {
                    // A second finger is not a new session
                    return None;
                }
                Some(Contact {
                    id: touch.identifier,
                    pointer_type: PointerType::Touch,
                    at: Cursor::new(touch.client_x, touch.client_y),
                    page: Cursor::new(touch.page_x, touch.page_y),
                    pressure: touch.force,
                })
            }
            EventFamily::Wheel | EventFamily::Keyboard => None,
        }
    }
}

impl Recognizer for SinglePointerRecognizer {
    type Input = Signal<UiEvent>;
    type Output = Signal<SinglePointer>;

    fn process(&mut self, input: &Signal<UiEvent>) -> Option<Signal<SinglePointer>> {
        let event = &input.value;
        let phase = event.kind.phase()?;
        if phase != Phase::Start && !self.active {
            return None;
        }
        let contact = self.contact(event, phase)?;

        match phase {
            Phase::Start => {
                self.active = true;
                if contact.pointer_type == PointerType::Touch {
                    self.tracked_touch = Some(contact.id);
                }
                trace!(id = contact.id, pointer = %contact.pointer_type, "single-pointer session started");
            }
            Phase::End | Phase::Cancel => {
                self.reset();
                trace!(id = contact.id, %phase, "single-pointer session finished");
            }
            Phase::Move => {}
        }

        if self.options.prevent_default {
            event.prevent_default();
        }

        let mut signal = self.recycler.acquire(input.device_id(), input.created_at());
        let out = &mut signal.value;
        out.phase = phase;
        out.x = contact.at.x;
        out.y = contact.at.y;
        out.page_x = contact.page.x;
        out.page_y = contact.page.y;
        out.pointer_type = contact.pointer_type;
        out.button = match phase {
            Phase::Start | Phase::End => ButtonKind::from_code(event.button),
            Phase::Move | Phase::Cancel => ButtonKind::None,
        };
        out.pressure = contact.pressure;
        out.id = contact.id;
        Some(signal)
    }

    fn recycle(&mut self, output: Signal<SinglePointer>) {
        self.recycler.recycle(output);
    }

    fn reset(&mut self) {
        self.active = false;
        self.tracked_touch = None;
    }

    fn dispose(&mut self) {
        self.reset();
        self.recycler.dispose();
    }
}

impl Stream<Signal<UiEvent>> {
    /// Normalize raw pointer/mouse/touch events into one contact.
    pub fn single_pointer(
        &self,
        options: SinglePointerOptions,
    ) -> Result<Stream<Signal<SinglePointer>>> {
        let template = SinglePointerRecognizer::new(options)?;
        Ok(recognize(self, move || template.fork()))
    }
}

// =============================================================================
// TESTS
// =============================================================================
