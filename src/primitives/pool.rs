// ============================================================================
// spark-gestures - Object Pool
// Reusable records for high-frequency recognizer output
// ============================================================================
//
// Pointer input arrives at display rate. With pooling enabled a recognizer
// reuses a small stack of output records instead of allocating one per event:
//
//   acquire() -> fill -> emit (&record) -> recycle() ... next acquire()
//                                            releases the previous record
//
// An emitted record is only valid for the duration of the `next` call that
// carries it; observers that keep a value clone it.
// ============================================================================

use std::rc::Rc;

use crate::core::error::{ConfigError, Result};
use crate::core::types::Signal;

// =============================================================================
// POOLABLE
// =============================================================================

/// A record that can be returned to a pool.
pub trait Poolable {
    /// Restore the record to its pristine state.
    fn reset(&mut self);
}

impl<V: Poolable> Poolable for Signal<V> {
    fn reset(&mut self) {
        self.value.reset();
        self.clear_stamp();
    }
}

// =============================================================================
// OBJECT POOL
// =============================================================================

/// Allocation counters for a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    /// Records built by the factory
    pub created: usize,
    /// `acquire` calls served from the free list
    pub reused: usize,
    /// Records currently on the free list
    pub available: usize,
}

/// Stack of reusable records.
///
/// `acquire` pops a free record or builds one with the factory. `release`
/// resets the record and keeps it if the pool is below capacity; otherwise
/// it is dropped. The pool never touches a record between `acquire` and
/// `release`.
///
/// # Example
///
/// ```
/// use spark_gestures::{ObjectPool, Poolable};
///
/// #[derive(Default)]
/// struct Sample { x: f64 }
///
/// impl Poolable for Sample {
///     fn reset(&mut self) { self.x = 0.0; }
/// }
///
/// let mut pool = ObjectPool::new(4, Sample::default).unwrap();
/// let mut a = pool.acquire();
/// a.x = 3.0;
/// pool.release(a);
///
/// let b = pool.acquire();
/// assert_eq!(b.x, 0.0);
/// assert_eq!(pool.stats().reused, 1);
/// ```
pub struct ObjectPool<T> {
    free: Vec<T>,
    capacity: usize,
    factory: Rc<dyn Fn() -> T>,
    created: usize,
    reused: usize,
}

impl<T: Poolable> ObjectPool<T> {
    pub fn new(capacity: usize, factory: impl Fn() -> T + 'static) -> Result<Self> {
        if capacity == 0 {
            return Err(ConfigError::ZeroPoolCapacity);
        }
        Ok(Self {
            free: Vec::with_capacity(capacity),
            capacity,
            factory: Rc::new(factory),
            created: 0,
            reused: 0,
        })
    }

    /// Empty pool with the same capacity and factory.
    pub fn fork(&self) -> Self {
        Self {
            free: Vec::with_capacity(self.capacity),
            capacity: self.capacity,
            factory: self.factory.clone(),
            created: 0,
            reused: 0,
        }
    }

    pub fn acquire(&mut self) -> T {
        match self.free.pop() {
            Some(item) => {
                self.reused += 1;
                item
            }
            None => {
                self.created += 1;
                (self.factory)()
            }
        }
    }

    pub fn release(&mut self, mut item: T) {
        if self.free.len() < self.capacity {
            item.reset();
            self.free.push(item);
        }
    }

    /// Records waiting on the free list.
    pub fn len(&self) -> usize {
        self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every free record.
    pub fn clear(&mut self) {
        self.free.clear();
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            created: self.created,
            reused: self.reused,
            available: self.free.len(),
        }
    }
}

impl<T> std::fmt::Debug for ObjectPool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectPool")
            .field("available", &self.free.len())
            .field("capacity", &self.capacity)
            .field("created", &self.created)
            .field("reused", &self.reused)
            .finish()
    }
}

// =============================================================================
// SIGNAL RECYCLER - one recognizer's output records
// =============================================================================

/// Hands out output signals for one recognizer instance.
///
/// With pooling off every `acquire` builds a fresh signal. With pooling on,
/// the record emitted last is held until the next `acquire` and only then
/// released, so at most one record is in flight at a time.
pub struct SignalRecycler<V> {
    kind: &'static str,
    pool: Option<ObjectPool<Signal<V>>>,
    previous: Option<Signal<V>>,
}

impl<V: Poolable + Default + 'static> SignalRecycler<V> {
    /// `capacity` is only used when `pooling` is true.
    pub fn new(kind: &'static str, pooling: bool, capacity: usize) -> Result<Self> {
        let pool = if pooling {
            Some(ObjectPool::new(capacity, move || {
                Signal::with_timestamp(kind, V::default(), String::new(), 0.0)
            })?)
        } else {
            None
        };
        Ok(Self {
            kind,
            pool,
            previous: None,
        })
    }

    /// A record stamped with `device_id` and `created_at`, payload reset.
    pub fn acquire(&mut self, device_id: &str, created_at: f64) -> Signal<V> {
        match &mut self.pool {
            Some(pool) => {
                if let Some(previous) = self.previous.take() {
                    pool.release(previous);
                }
                let mut signal = pool.acquire();
                signal.restamp(device_id, created_at);
                signal
            }
            None => Signal::with_timestamp(self.kind, V::default(), device_id, created_at),
        }
    }

    /// Fresh recycler with the same settings, for another recognizer instance.
    pub fn fork(&self) -> Self {
        Self {
            kind: self.kind,
            pool: self.pool.as_ref().map(ObjectPool::fork),
            previous: None,
        }
    }

    /// Take back a record after it was emitted.
    pub fn recycle(&mut self, signal: Signal<V>) {
        if self.pool.is_some() {
            self.previous = Some(signal);
        }
    }

    /// Release the held record and drop the free list.
    pub fn dispose(&mut self) {
        if let Some(pool) = &mut self.pool {
            if let Some(previous) = self.previous.take() {
                pool.release(previous);
            }
            pool.clear();
        }
    }

    pub fn is_pooling(&self) -> bool {
        self.pool.is_some()
    }

    pub fn stats(&self) -> Option<PoolStats> {
        self.pool.as_ref().map(ObjectPool::stats)
    }
}

// =============================================================================
// TESTS
// =============================================================================
