// ============================================================================
// spark-gestures - Event Sources
// Streams of raw UI events, built per target and cached weakly
// ============================================================================
//
// EventSource is the builder; it validates eagerly so that a missing or dead
// target fails at construction, not at the first event.
//
// The family helpers (pointer_events, touch_events, ...) hand out one shared
// stream per (target, family). The cache lives in a thread-local table keyed
// by weak target references: it never keeps a target alive, and entries for
// dropped targets are pruned whenever the table is touched.
// ============================================================================

use std::cell::RefCell;

use tracing::debug;

use crate::core::error::{ConfigError, Result};
use crate::core::types::Signal;
use crate::events::event::{EventFamily, UiEvent, UiEventKind};
use crate::events::target::{EventTarget, WeakEventTarget};
use crate::primitives::observer::Subscriber;
use crate::primitives::stream::{Stream, Teardown};

// =============================================================================
// EVENT SOURCE BUILDER
// =============================================================================

/// Builder for a `Stream<Signal<UiEvent>>` over an [`EventTarget`].
///
/// ```
/// use spark_gestures::{EventSource, EventTarget, UiEventKind};
///
/// let target = EventTarget::new();
/// let downs = EventSource::new()
///     .target(&target)
///     .kind(UiEventKind::PointerDown)
///     .build()
///     .unwrap();
/// # let _ = downs;
///
/// assert!(EventSource::new().kind(UiEventKind::PointerDown).build().is_err());
/// ```
#[derive(Debug, Default, Clone)]
pub struct EventSource {
    target: Option<WeakEventTarget>,
    kinds: Vec<UiEventKind>,
    device_id: Option<String>,
    signal_kind: Option<&'static str>,
}

impl EventSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target(mut self, target: &EventTarget) -> Self {
        self.target = Some(target.downgrade());
        self
    }

    pub fn kind(mut self, kind: UiEventKind) -> Self {
        if !self.kinds.contains(&kind) {
            self.kinds.push(kind);
        }
        self
    }

    pub fn kinds(self, kinds: impl IntoIterator<Item = UiEventKind>) -> Self {
        kinds.into_iter().fold(self, EventSource::kind)
    }

    /// Add kinds by platform name.
    pub fn kind_names<'a>(self, names: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        names
            .into_iter()
            .try_fold(self, |source, name| Ok(source.kind(name.parse()?)))
    }

    /// Fixed device id for every signal (default: derived from the event).
    pub fn device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    /// Override the signal tag (default: the first kind's family tag).
    pub fn signal_kind(mut self, kind: &'static str) -> Self {
        self.signal_kind = Some(kind);
        self
    }

    pub fn build(self) -> Result<Stream<Signal<UiEvent>>> {
        let target = self.target.ok_or(ConfigError::MissingTarget)?;
        if !target.is_alive() {
            return Err(ConfigError::TargetDropped);
        }
        let first = *self.kinds.first().ok_or(ConfigError::NoEventKinds)?;
        let signal_kind = self.signal_kind.unwrap_or_else(|| first.family().signal_kind());
        let kinds = self.kinds;
        let device_id = self.device_id;

        Ok(Stream::new(move |subscriber: Subscriber<Signal<UiEvent>>| {
            let Some(element) = target.upgrade() else {
                subscriber.complete();
                return Teardown::empty();
            };

            let ids: Vec<_> = kinds
                .iter()
                .map(|&kind| {
                    let (to, device_id) = (subscriber.clone(), device_id.clone());
                    element.add_listener(kind, move |event: &UiEvent| {
                        let device = device_id.as_deref().unwrap_or_else(|| event.device_name());
                        let signal =
                            Signal::with_timestamp(signal_kind, event.clone(), device, event.timestamp);
                        to.next(&signal);
                    })
                })
                .collect();
            debug!(kind = signal_kind, listeners = ids.len(), "event source attached");

            let target = target.clone();
            Teardown::new(move || {
                if let Some(element) = target.upgrade() {
                    for id in ids {
                        element.remove_listener(id);
                    }
                    debug!(kind = signal_kind, "event source detached");
                }
            })
        }))
    }
}

// =============================================================================
// PER-TARGET CACHE
// =============================================================================

struct CacheEntry {
    target: WeakEventTarget,
    family: EventFamily,
    stream: Stream<Signal<UiEvent>>,
}

thread_local! {
    static SOURCE_CACHE: RefCell<Vec<CacheEntry>> = const { RefCell::new(Vec::new()) };
}

fn cached(target: &EventTarget, family: EventFamily) -> Result<Stream<Signal<UiEvent>>> {
    let hit = SOURCE_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        cache.retain(|entry| entry.target.is_alive());
        cache
            .iter()
            .find(|entry| entry.family == family && entry.target.points_to(target))
            .map(|entry| entry.stream.clone())
    });
    if let Some(stream) = hit {
        return Ok(stream);
    }

    let stream = EventSource::new()
        .target(target)
        .kinds(family.kinds().iter().copied())
        .build()?
        .share();
    SOURCE_CACHE.with(|cache| {
        cache.borrow_mut().push(CacheEntry {
            target: target.downgrade(),
            family,
            stream: stream.clone(),
        })
    });
    Ok(stream)
}

/// Shared `pointerdown/move/up/cancel` stream for `target`.
pub fn pointer_events(target: &EventTarget) -> Result<Stream<Signal<UiEvent>>> {
    cached(target, EventFamily::Pointer)
}

/// Shared `mousedown/move/up/leave` stream for `target`.
pub fn mouse_events(target: &EventTarget) -> Result<Stream<Signal<UiEvent>>> {
    cached(target, EventFamily::Mouse)
}

/// Shared `touchstart/move/end/cancel` stream for `target`.
pub fn touch_events(target: &EventTarget) -> Result<Stream<Signal<UiEvent>>> {
    cached(target, EventFamily::Touch)
}

pub fn wheel_events(target: &EventTarget) -> Result<Stream<Signal<UiEvent>>> {
    cached(target, EventFamily::Wheel)
}

pub fn keyboard_events(target: &EventTarget) -> Result<Stream<Signal<UiEvent>>> {
    cached(target, EventFamily::Keyboard)
}

/// Live cache entries after pruning dropped targets.
pub fn cached_source_count() -> usize {
    SOURCE_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        cache.retain(|entry| entry.target.is_alive());
        cache.len()
    })
}

// =============================================================================
// TESTS
// =============================================================================
