// ============================================================================
// spark-gestures - UI Events
// Low-level input events as delivered by the host platform
// ============================================================================

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use crate::core::constants::{
    KIND_KEYBOARD_EVENT, KIND_MOUSE_EVENT, KIND_POINTER_EVENT, KIND_TOUCH_EVENT,
    KIND_WHEEL_EVENT,
};
use crate::core::error::ConfigError;
use crate::core::types::{Phase, PointerType};
use crate::reactivity::scheduling::now;

// =============================================================================
// EVENT KIND
// =============================================================================

/// Platform event type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UiEventKind {
    PointerDown,
    PointerMove,
    PointerUp,
    PointerCancel,
    MouseDown,
    MouseMove,
    MouseUp,
    MouseLeave,
    TouchStart,
    TouchMove,
    TouchEnd,
    TouchCancel,
    Wheel,
    KeyDown,
    KeyUp,
}

impl UiEventKind {
    pub const ALL: [UiEventKind; 15] = [
        UiEventKind::PointerDown,
        UiEventKind::PointerMove,
        UiEventKind::PointerUp,
        UiEventKind::PointerCancel,
        UiEventKind::MouseDown,
        UiEventKind::MouseMove,
        UiEventKind::MouseUp,
        UiEventKind::MouseLeave,
        UiEventKind::TouchStart,
        UiEventKind::TouchMove,
        UiEventKind::TouchEnd,
        UiEventKind::TouchCancel,
        UiEventKind::Wheel,
        UiEventKind::KeyDown,
        UiEventKind::KeyUp,
    ];

    /// Platform name (`"pointerdown"`, `"touchmove"`, ...).
    pub fn name(&self) -> &'static str {
        match self {
            UiEventKind::PointerDown => "pointerdown",
            UiEventKind::PointerMove => "pointermove",
            UiEventKind::PointerUp => "pointerup",
            UiEventKind::PointerCancel => "pointercancel",
            UiEventKind::MouseDown => "mousedown",
            UiEventKind::MouseMove => "mousemove",
            UiEventKind::MouseUp => "mouseup",
            UiEventKind::MouseLeave => "mouseleave",
            UiEventKind::TouchStart => "touchstart",
            UiEventKind::TouchMove => "touchmove",
            UiEventKind::TouchEnd => "touchend",
            UiEventKind::TouchCancel => "touchcancel",
            UiEventKind::Wheel => "wheel",
            UiEventKind::KeyDown => "keydown",
            UiEventKind::KeyUp => "keyup",
        }
    }

    pub fn family(&self) -> EventFamily {
        match self {
            UiEventKind::PointerDown
            | UiEventKind::PointerMove
            | UiEventKind::PointerUp
            | UiEventKind::PointerCancel => EventFamily::Pointer,
            UiEventKind::MouseDown
            | UiEventKind::MouseMove
            | UiEventKind::MouseUp
            | UiEventKind::MouseLeave => EventFamily::Mouse,
            UiEventKind::TouchStart
            | UiEventKind::TouchMove
            | UiEventKind::TouchEnd
            | UiEventKind::TouchCancel => EventFamily::Touch,
            UiEventKind::Wheel => EventFamily::Wheel,
            UiEventKind::KeyDown | UiEventKind::KeyUp => EventFamily::Keyboard,
        }
    }

    /// Contact phase for pointer-ish events. Mouse leave counts as cancel.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            UiEventKind::PointerDown | UiEventKind::MouseDown | UiEventKind::TouchStart => {
                Some(Phase::Start)
            }
            UiEventKind::PointerMove | UiEventKind::MouseMove | UiEventKind::TouchMove => {
                Some(Phase::Move)
            }
            UiEventKind::PointerUp | UiEventKind::MouseUp | UiEventKind::TouchEnd => {
                Some(Phase::End)
            }
            UiEventKind::PointerCancel | UiEventKind::MouseLeave | UiEventKind::TouchCancel => {
                Some(Phase::Cancel)
            }
            UiEventKind::Wheel | UiEventKind::KeyDown | UiEventKind::KeyUp => None,
        }
    }
}

impl fmt::Display for UiEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for UiEventKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UiEventKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| ConfigError::UnknownEventType(s.to_string()))
    }
}

// =============================================================================
// EVENT FAMILY
// =============================================================================

/// Groups of event kinds that one cached source listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventFamily {
    Pointer,
    Mouse,
    Touch,
    Wheel,
    Keyboard,
}

impl EventFamily {
    pub fn kinds(&self) -> &'static [UiEventKind] {
        match self {
            EventFamily::Pointer => &[
                UiEventKind::PointerDown,
                UiEventKind::PointerMove,
                UiEventKind::PointerUp,
                UiEventKind::PointerCancel,
            ],
            EventFamily::Mouse => &[
                UiEventKind::MouseDown,
                UiEventKind::MouseMove,
                UiEventKind::MouseUp,
                UiEventKind::MouseLeave,
            ],
            EventFamily::Touch => &[
                UiEventKind::TouchStart,
                UiEventKind::TouchMove,
                UiEventKind::TouchEnd,
                UiEventKind::TouchCancel,
            ],
            EventFamily::Wheel => &[UiEventKind::Wheel],
            EventFamily::Keyboard => &[UiEventKind::KeyDown, UiEventKind::KeyUp],
        }
    }

    /// Tag for signals wrapping events of this family.
    pub fn signal_kind(&self) -> &'static str {
        match self {
            EventFamily::Pointer => KIND_POINTER_EVENT,
            EventFamily::Mouse => KIND_MOUSE_EVENT,
            EventFamily::Touch => KIND_TOUCH_EVENT,
            EventFamily::Wheel => KIND_WHEEL_EVENT,
            EventFamily::Keyboard => KIND_KEYBOARD_EVENT,
        }
    }
}

// =============================================================================
// MODIFIERS
// =============================================================================

bitflags::bitflags! {
    /// Modifier keys held while the event fired.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
        const META  = 0b1000;
    }
}

// =============================================================================
// EVENT HANDLE
// =============================================================================

/// Link back to the platform event for default-action suppression.
///
/// Clones share the flag, so a recognizer holding a copy of the event can
/// still suppress the original.
#[derive(Debug, Clone, Default)]
pub struct EventHandle(Rc<Cell<bool>>);

impl EventHandle {
    pub fn prevent_default(&self) {
        self.0.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.0.get()
    }
}

// =============================================================================
// TOUCH
// =============================================================================

/// One contact of a touch event.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Touch {
    pub identifier: i64,
    pub client_x: f64,
    pub client_y: f64,
    pub page_x: f64,
    pub page_y: f64,
    pub force: f64,
}

impl Touch {
    /// Contact at `(x, y)`, page coordinates equal to client coordinates.
    pub fn new(identifier: i64, x: f64, y: f64) -> Self {
        Self {
            identifier,
            client_x: x,
            client_y: y,
            page_x: x,
            page_y: y,
            force: 0.0,
        }
    }
}

// =============================================================================
// UI EVENT
// =============================================================================

/// A low-level input event.
///
/// Built by the host binding; tests use the chained setters.
///
/// ```
/// use spark_gestures::{UiEvent, UiEventKind, PointerType};
///
/// let down = UiEvent::new(UiEventKind::PointerDown)
///     .at(10.0, 20.0)
///     .pointer(3, PointerType::Pen)
///     .timestamp(16.0);
///
/// assert_eq!(down.pointer_id, 3);
/// assert_eq!(down.page_x, 10.0);
/// down.prevent_default();
/// assert!(down.default_prevented());
/// ```
#[derive(Debug, Clone)]
pub struct UiEvent {
    pub kind: UiEventKind,
    pub client_x: f64,
    pub client_y: f64,
    pub page_x: f64,
    pub page_y: f64,
    /// Raw button code (`0` main, `1` auxiliary, `2` secondary, ...)
    pub button: i16,
    pub pressure: f64,
    pub pointer_id: i64,
    pub pointer_type: PointerType,
    pub is_primary: bool,
    /// Contacts that changed in this touch event
    pub changed_touches: Vec<Touch>,
    pub delta_x: f64,
    pub delta_y: f64,
    pub key: Option<String>,
    pub modifiers: Modifiers,
    /// Milliseconds on the runtime clock
    pub timestamp: f64,
    handle: EventHandle,
}

impl UiEvent {
    /// Event stamped with the current runtime time.
    pub fn new(kind: UiEventKind) -> Self {
        let pointer_type = match kind.family() {
            EventFamily::Touch => PointerType::Touch,
            EventFamily::Keyboard => PointerType::Unknown,
            _ => PointerType::Mouse,
        };
        Self {
            kind,
            client_x: 0.0,
            client_y: 0.0,
            page_x: 0.0,
            page_y: 0.0,
            button: 0,
            pressure: 0.0,
            pointer_id: 1,
            pointer_type,
            is_primary: true,
            changed_touches: Vec::new(),
            delta_x: 0.0,
            delta_y: 0.0,
            key: None,
            modifiers: Modifiers::empty(),
            timestamp: now(),
            handle: EventHandle::default(),
        }
    }

    /// Client and page position.
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.client_x = x;
        self.client_y = y;
        self.page_x = x;
        self.page_y = y;
        self
    }

    /// Page position when the document is scrolled.
    pub fn page(mut self, x: f64, y: f64) -> Self {
        self.page_x = x;
        self.page_y = y;
        self
    }

    pub fn button(mut self, code: i16) -> Self {
        self.button = code;
        self
    }

    pub fn pressure(mut self, pressure: f64) -> Self {
        self.pressure = pressure;
        self
    }

    pub fn pointer(mut self, id: i64, pointer_type: PointerType) -> Self {
        self.pointer_id = id;
        self.pointer_type = pointer_type;
        self
    }

    pub fn primary(mut self, is_primary: bool) -> Self {
        self.is_primary = is_primary;
        self
    }

    /// Append a changed touch.
    pub fn touch(mut self, touch: Touch) -> Self {
        self.changed_touches.push(touch);
        self
    }

    pub fn wheel(mut self, delta_x: f64, delta_y: f64) -> Self {
        self.delta_x = delta_x;
        self.delta_y = delta_y;
        self
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn timestamp(mut self, timestamp: f64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn handle(&self) -> &EventHandle {
        &self.handle
    }

    pub fn prevent_default(&self) {
        self.handle.prevent_default();
    }

    pub fn default_prevented(&self) -> bool {
        self.handle.default_prevented()
    }

    /// Device id used when the source has none configured.
    pub fn device_name(&self) -> &'static str {
        match self.kind.family() {
            EventFamily::Keyboard => "keyboard",
            EventFamily::Wheel => PointerType::Mouse.as_str(),
            _ => self.pointer_type.as_str(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_round_trip_through_from_str() {
        for kind in UiEventKind::ALL {
            assert_eq!(kind.name().parse::<UiEventKind>(), Ok(kind));
        }
        assert_eq!(
            "pointerenter".parse::<UiEventKind>(),
            Err(ConfigError::UnknownEventType("pointerenter".into()))
        );
    }

    #[test]
    fn kind_phases() {
        assert_eq!(UiEventKind::TouchStart.phase(), Some(Phase::Start));
        assert_eq!(UiEventKind::MouseLeave.phase(), Some(Phase::Cancel));
        assert_eq!(UiEventKind::PointerUp.phase(), Some(Phase::End));
        assert_eq!(UiEventKind::Wheel.phase(), None);
    }

    #[test]
    fn families_cover_every_kind_once() {
        let families = [
            EventFamily::Pointer,
            EventFamily::Mouse,
            EventFamily::Touch,
            EventFamily::Wheel,
            EventFamily::Keyboard,
        ];
        let total: usize = families.iter().map(|f| f.kinds().len()).sum();
        assert_eq!(total, UiEventKind::ALL.len());
        for family in families {
            assert!(family.kinds().iter().all(|k| k.family() == family));
        }
    }

    #[test]
    fn clones_share_the_handle() {
        let event = UiEvent::new(UiEventKind::TouchStart).touch(Touch::new(7, 1.0, 2.0));
        let copy = event.clone();
        copy.prevent_default();
        assert!(event.default_prevented());
        assert_eq!(event.pointer_type, PointerType::Touch);
        assert_eq!(event.device_name(), "touch");
    }

    #[test]
    fn modifiers_combine() {
        let event = UiEvent::new(UiEventKind::KeyDown)
            .key("z")
            .modifiers(Modifiers::CTRL | Modifiers::SHIFT);
        assert!(event.modifiers.contains(Modifiers::CTRL));
        assert!(!event.modifiers.contains(Modifiers::ALT));
        assert_eq!(event.device_name(), "keyboard");
    }
}
