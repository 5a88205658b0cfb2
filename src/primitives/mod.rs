// ============================================================================
// spark-gestures - Primitives Module
// Core stream primitives: observer, stream, subject, pool
// ============================================================================

pub mod observer;
pub mod pool;
pub mod stream;
pub mod subject;

// Re-export for convenience
pub use observer::{observer, FnObserver, Observer, Subscriber};
pub use pool::{ObjectPool, PoolStats, Poolable, SignalRecycler};
pub use stream::{Stream, Subscription, SubscriptionGuard, Teardown};
pub use subject::{BehaviorSubject, Subject};
