/* src/lib.rs */

//! Client-side guard for social "spark" reactions.
//!
//! A [`SparkGuard`] sits between UI tap handlers and the backend. Each spark
//! goes through an idempotency check, burst detection and a per-user sliding
//! window quota, is recorded optimistically, and is then either sent to the
//! backend or handed to an offline queue. Callers always get an
//! [`ActionResult`] back, never an error.
//!
//! ```rust,ignore
//! use spark_guard::*;
//!
//! let guard = SparkGuard::new(
//!     guard_config!(
//!         rate: WindowRule::new(Duration::seconds(60), 60),
//!         burst: WindowRule::new(Duration::seconds(10), 10).half_open(),
//!     ),
//!     remote,
//!     queue,
//!     connectivity,
//! );
//! let gc = guard.spawn_gc();
//!
//! match guard.spark(session.user_id(), "post-1").await.feedback() {
//!     Feedback::Done => {}
//!     Feedback::WillSync => show_sync_badge(),
//!     Feedback::SlowDown => show_slow_down(),
//!     Feedback::Error => show_sign_in(),
//! }
//!
//! // on logout
//! gc.abort();
//! guard.reset().await;
//! ```

mod cache;
mod config;
mod error;
mod gc;
mod guard;
pub mod legacy;
mod limiter;
pub mod optimistic;
mod ports;
mod queue;
mod result;
mod stats;
mod types;

pub use cache::{CacheKey, IdempotencyCache};
pub use config::*;
pub use error::{QueueError, RemoteError};
pub use gc::SweepReport;
pub use guard::SparkGuard;
pub use limiter::RateLimiter;
pub use ports::{ConnectivityOracle, OfflineQueue, RemoteMutationClient, StaticConnectivity};
pub use queue::{ActionKind, InMemoryQueue, QueuedAction};
pub use result::{ActionResult, FailureReason, Feedback, Phase};
pub use stats::{GuardStats, GuardStatsSnapshot};
pub use types::*;

/// Build a [`GuardConfig`] from a quota rule, a burst rule and optional tuning.
///
/// # Examples
///
/// ```rust,ignore
/// use spark_guard::*;
///
/// let config = guard_config!(
///     rate: WindowRule::new(Duration::seconds(60), 60),
///     burst: WindowRule::new(Duration::seconds(10), 10).half_open(),
///     retention: Duration::minutes(2),
///     max_memory: 8 * 1024 * 1024,
///     gc_interval: Duration::seconds(15),
/// );
/// ```
#[macro_export]
macro_rules! guard_config {
    (
        rate: $rate:expr,
        burst: $burst:expr
        $(, retention: $retention:expr)?
        $(, max_memory: $max_memory:expr)?
        $(, gc_interval: $gc_interval:expr)?
        $(,)?
    ) => {
        {
            #[allow(unused_mut)]
            let mut config = $crate::GuardConfig::new($rate, $burst);

            $(
                config = config.with_retention($retention);
            )?

            $(
                config = config.with_max_memory($max_memory);
            )?

            $(
                config = config.with_gc_interval($gc_interval);
            )?

            config
        }
    };
}
