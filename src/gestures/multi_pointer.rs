// ============================================================================
// spark-gestures - Multi-Pointer Recognizer
// Snapshot of every tracked contact, one signal per change
// ============================================================================
//
// Session phases:
//
//   idle --first tracked start--> active --working count hits 0--> ended
//     ^                                                              |
//     +----------------------- next observation ---------------------+
//
// Contacts are keyed "{pointer_type}-{id}" and kept in insertion order.
// A contact that ends or cancels is reported once with that phase, then
// removed. Contacts beyond `max_pointers` are ignored, and an event that
// changes nothing produces no snapshot.
// ============================================================================

use std::fmt;

use tracing::trace;

use crate::core::constants::{DEFAULT_MAX_POINTERS, DEFAULT_POOL_CAPACITY, KIND_MULTI_POINTER};
use crate::core::error::{ConfigError, Result};
use crate::core::types::{Cursor, Phase, PointerType, Signal};
use crate::events::event::{EventFamily, UiEvent};
use crate::gestures::{check_pool, recognize, Recognizer};
use crate::primitives::pool::{Poolable, SignalRecycler};
use crate::primitives::stream::Stream;

// =============================================================================
// OUTPUT
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    Active,
    Ended,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Active => "active",
            SessionPhase::Ended => "ended",
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tracked contact.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointerInfo {
    /// `"{pointer_type}-{id}"`
    pub key: String,
    pub id: i64,
    pub pointer_type: PointerType,
    pub phase: Phase,
    pub x: f64,
    pub y: f64,
    pub page_x: f64,
    pub page_y: f64,
    pub pressure: f64,
}

impl PointerInfo {
    pub fn cursor(&self) -> Cursor {
        Cursor::new(self.x, self.y)
    }

    pub fn page_cursor(&self) -> Cursor {
        Cursor::new(self.page_x, self.page_y)
    }
}

/// Snapshot of the tracked contacts after one event.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MultiPointer {
    pub phase: SessionPhase,
    pub pointers: Vec<PointerInfo>,
    /// Always `pointers.len()`
    pub count: usize,
}

impl MultiPointer {
    pub fn get(&self, key: &str) -> Option<&PointerInfo> {
        self.pointers.iter().find(|p| p.key == key)
    }

    /// Contacts still down (`start` / `move`).
    pub fn working(&self) -> impl Iterator<Item = &PointerInfo> {
        self.pointers.iter().filter(|p| p.phase.is_working())
    }
}

impl Poolable for MultiPointer {
    fn reset(&mut self) {
        self.phase = SessionPhase::Idle;
        // Keeps the allocation for the next snapshot
        self.pointers.clear();
        self.count = 0;
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
pub struct MultiPointerOptions {
    pub max_pointers: usize,
    pub pooling: bool,
    pub pool_capacity: usize,
}

impl Default for MultiPointerOptions {
    fn default() -> Self {
        Self {
            max_pointers: DEFAULT_MAX_POINTERS,
            pooling: false,
            pool_capacity: DEFAULT_POOL_CAPACITY,
        }
    }
}

impl MultiPointerOptions {
    pub fn validate(&self) -> Result<()> {
        if self.max_pointers == 0 {
            return Err(ConfigError::ZeroMaxPointers);
        }
        check_pool(self.pooling, self.pool_capacity)
    }
}

// =============================================================================
// RECOGNIZER
// =============================================================================

pub struct MultiPointerRecognizer {
    options: MultiPointerOptions,
    recycler: SignalRecycler<MultiPointer>,
    contacts: Vec<PointerInfo>,
    session: SessionPhase,
}

impl MultiPointerRecognizer {
    pub fn new(options: MultiPointerOptions) -> Result<Self> {
        options.validate()?;
        let recycler =
            SignalRecycler::new(KIND_MULTI_POINTER, options.pooling, options.pool_capacity)?;
        Ok(Self {
            options,
            recycler,
            contacts: Vec::new(),
            session: SessionPhase::Idle,
        })
    }

    pub fn fork(&self) -> Self {
        Self {
            options: self.options.clone(),
            recycler: self.recycler.fork(),
            contacts: Vec::new(),
            session: SessionPhase::Idle,
        }
    }

    pub fn session(&self) -> SessionPhase {
        self.session
    }

    /// Apply one contact update. Returns true if the map changed.
    fn apply(&mut self, update: PointerInfo) -> bool {
        if let Some(index) = self.contacts.iter().position(|c| c.key == update.key) {
            self.contacts[index] = update;
            return true;
        }
        if update.phase != Phase::Start {
            return false;
        }
        if self.contacts.len() >= self.options.max_pointers {
            trace!(key = %update.key, max = self.options.max_pointers, "contact over limit ignored");
            return false;
        }
        self.contacts.push(update);
        true
    }
}

fn contact_key(pointer_type: PointerType, id: i64) -> String {
    format!("{pointer_type}-{id}")
}

/// Contact updates carried by one raw event.
fn updates(event: &UiEvent, phase: Phase) -> Vec<PointerInfo> {
    match event.kind.family() {
        EventFamily::Pointer | EventFamily::Mouse => {
            let pointer_type = if event.kind.family() == EventFamily::Mouse {
                PointerType::Mouse
            } else {
                event.pointer_type
            };
            vec![PointerInfo {
                key: contact_key(pointer_type, event.pointer_id),
                id: event.pointer_id,
                pointer_type,
                phase,
                x: event.client_x,
                y: event.client_y,
                page_x: event.page_x,
                page_y: event.page_y,
                pressure: event.pressure,
            }]
        }
        EventFamily::Touch => event
            .changed_touches
            .iter()
            .map(|touch| PointerInfo {
                key: contact_key(PointerType::Touch, touch.identifier),
                id: touch.identifier,
                pointer_type: PointerType::Touch,
                phase,
                x: touch.client_x,
                y: touch.client_y,
                page_x: touch.page_x,
                page_y: touch.page_y,
                pressure: touch.force,
            })
            .collect(),
        EventFamily::Wheel | EventFamily::Keyboard => Vec::new(),
    }
}

impl Recognizer for MultiPointerRecognizer {
    type Input = Signal<UiEvent>;
    type Output = Signal<MultiPointer>;

    fn process(&mut self, input: &Signal<UiEvent>) -> Option<Signal<MultiPointer>> {
        let event = &input.value;
        let phase = event.kind.phase()?;

        let mut applied = false;
        for update in updates(event, phase) {
            applied |= self.apply(update);
        }
        if !applied {
            return None;
        }

        let working = self.contacts.iter().filter(|c| c.phase.is_working()).count();
        let previous = self.session;
        self.session = if working > 0 {
            SessionPhase::Active
        } else if previous == SessionPhase::Active {
            SessionPhase::Ended
        } else {
            SessionPhase::Idle
        };
        if previous != self.session {
            trace!(from = %previous, to = %self.session, working, "multi-pointer session");
        }

        let mut signal = self.recycler.acquire(input.device_id(), input.created_at());
        let out = &mut signal.value;
        out.phase = self.session;
        out.pointers.clear();
        out.pointers.extend(self.contacts.iter().cloned());
        out.count = out.pointers.len();

        // Terminal contacts were reported once; the ended phase is transient
        self.contacts.retain(|c| c.phase.is_working());
        if self.session == SessionPhase::Ended {
            self.session = SessionPhase::Idle;
        }
        Some(signal)
    }

    fn recycle(&mut self, output: Signal<MultiPointer>) {
        self.recycler.recycle(output);
    }

    fn reset(&mut self) {
        self.contacts.clear();
        self.session = SessionPhase::Idle;
    }

    fn dispose(&mut self) {
        self.reset();
        self.recycler.dispose();
    }
}

impl Stream<Signal<UiEvent>> {
    /// Track every contact; emit a snapshot per change.
    pub fn multi_pointer(
        &self,
        options: MultiPointerOptions,
    ) -> Result<Stream<Signal<MultiPointer>>> {
        let template = MultiPointerRecognizer::new(options)?;
        Ok(recognize(self, move || template.fork()))
    }
}

// =============================================================================
// TESTS
// =============================================================================
