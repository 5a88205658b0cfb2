// ============================================================================
// spark-gestures - Event Target
// In-process listener registry standing in for a platform element
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::events::event::{UiEvent, UiEventKind};

/// Handle returned by [`EventTarget::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Rc<dyn Fn(&UiEvent)>;

struct TargetInner {
    listeners: RefCell<Vec<(ListenerId, UiEventKind, Listener)>>,
    next_id: Cell<u64>,
}

/// Something events are dispatched on.
///
/// Cloning shares the target. Streams built on a target only hold a weak
/// reference, so dropping every clone ends the target's lifetime.
///
/// ```
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use spark_gestures::{EventTarget, UiEvent, UiEventKind};
///
/// let target = EventTarget::new();
/// let hits = Rc::new(Cell::new(0));
/// let h = hits.clone();
/// let id = target.add_listener(UiEventKind::PointerDown, move |_| h.set(h.get() + 1));
///
/// target.dispatch(&UiEvent::new(UiEventKind::PointerDown));
/// target.dispatch(&UiEvent::new(UiEventKind::PointerUp));
/// assert_eq!(hits.get(), 1);
///
/// assert!(target.remove_listener(id));
/// assert_eq!(target.listener_count(), 0);
/// ```
#[derive(Clone)]
pub struct EventTarget {
    inner: Rc<TargetInner>,
}

impl EventTarget {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(TargetInner {
                listeners: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
            }),
        }
    }

    pub fn add_listener(&self, kind: UiEventKind, listener: impl Fn(&UiEvent) + 'static) -> ListenerId {
        let id = ListenerId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);
        self.inner
            .listeners
            .borrow_mut()
            .push((id, kind, Rc::new(listener)));
        id
    }

    /// Returns false if the listener was already removed.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.inner.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(lid, _, _)| *lid != id);
        listeners.len() != before
    }

    /// Deliver `event` to the listeners registered for its kind.
    ///
    /// Listeners added or removed during dispatch take effect for the next
    /// event. Returns false if a listener called `prevent_default`.
    pub fn dispatch(&self, event: &UiEvent) -> bool {
        let matching: Vec<Listener> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .filter(|(_, kind, _)| *kind == event.kind)
            .map(|(_, _, listener)| listener.clone())
            .collect();
        for listener in matching {
            listener(event);
        }
        !event.default_prevented()
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    pub fn downgrade(&self) -> WeakEventTarget {
        WeakEventTarget {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Same underlying target.
    pub fn ptr_eq(&self, other: &EventTarget) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for EventTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventTarget")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Non-owning target reference.
#[derive(Clone)]
pub struct WeakEventTarget {
    inner: Weak<TargetInner>,
}

impl WeakEventTarget {
    pub fn upgrade(&self) -> Option<EventTarget> {
        self.inner.upgrade().map(|inner| EventTarget { inner })
    }

    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    /// Refers to `target`.
    pub fn points_to(&self, target: &EventTarget) -> bool {
        std::ptr::eq(self.inner.as_ptr(), Rc::as_ptr(&target.inner))
    }
}

impl std::fmt::Debug for WeakEventTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakEventTarget")
            .field("alive", &self.is_alive())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
