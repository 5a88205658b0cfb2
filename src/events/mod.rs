// ============================================================================
// spark-gestures - Events Module
// Raw UI events, event targets and the streams built on them
// ============================================================================

pub mod event;
pub mod source;
pub mod target;

pub use event::{EventFamily, EventHandle, Modifiers, Touch, UiEvent, UiEventKind};
pub use source::{
    cached_source_count, keyboard_events, mouse_events, pointer_events, touch_events,
    wheel_events, EventSource,
};
pub use target::{EventTarget, ListenerId, WeakEventTarget};
