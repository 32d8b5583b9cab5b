/* src/guard.rs */

//! Spark orchestrator: idempotency, burst and quota checks, then submit or queue

use crate::cache::{CacheKey, IdempotencyCache};
use crate::config::GuardConfig;
use crate::error::RemoteError;
use crate::limiter::RateLimiter;
use crate::ports::{ConnectivityOracle, OfflineQueue, RemoteMutationClient};
use crate::queue::{ActionKind, QueuedAction};
use crate::result::{ActionResult, FailureReason, Phase};
use crate::stats::GuardStats;
use crate::types::now;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tokio::task::JoinHandle;

/// Client-side guard for spark reactions.
///
/// Owned by the session: construct one per signed-in user session and call
/// [`SparkGuard::reset`] on logout so nothing leaks across accounts.
pub struct SparkGuard {
    limiter: RateLimiter,
    cache: IdempotencyCache,
    remote: Arc<dyn RemoteMutationClient>,
    queue: Arc<dyn OfflineQueue>,
    connectivity: Arc<dyn ConnectivityOracle>,
    stats: Arc<GuardStats>,
}

impl SparkGuard {
    pub fn new(
        config: GuardConfig,
        remote: Arc<dyn RemoteMutationClient>,
        queue: Arc<dyn OfflineQueue>,
        connectivity: Arc<dyn ConnectivityOracle>,
    ) -> Self {
        Self {
            limiter: RateLimiter::new(config),
            cache: IdempotencyCache::new(),
            remote,
            queue,
            connectivity,
            stats: Arc::new(GuardStats::new()),
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn cache(&self) -> &IdempotencyCache {
        &self.cache
    }

    pub fn stats(&self) -> Arc<GuardStats> {
        self.stats.clone()
    }

    pub fn spawn_gc(&self) -> JoinHandle<()> {
        self.limiter.spawn_gc()
    }

    pub async fn has_sparked(&self, user_id: &str, post_id: &str) -> bool {
        self.cache.is_cached(user_id, post_id).await
    }

    /// Sparks `post_id` on behalf of `user_id`. Never fails: backend and
    /// network errors are turned into [`ActionResult::Queued`].
    pub async fn spark(&self, user_id: Option<&str>, post_id: &str) -> ActionResult {
        self.stats.attempts.fetch_add(1, Ordering::Relaxed);
        let Some(user_id) = session_user(user_id) else {
            return self.finish("", post_id, ActionResult::Failure(FailureReason::MissingSession));
        };

        tracing::trace!(user_id, post_id, phase = ?Phase::Checking, "spark");
        if let Some(rejection) = self.admit(user_id, post_id).await {
            return self.finish(user_id, post_id, rejection);
        }

        tracing::trace!(user_id, post_id, phase = ?Phase::Submitting, "spark");
        if !self.connectivity.is_online() {
            self.hand_off(ActionKind::Spark, user_id, post_id).await;
            return self.finish(user_id, post_id, ActionResult::Queued { is_online: false });
        }

        let result = match self.submit_spark(user_id, post_id).await {
            Ok(()) => ActionResult::Success {
                remaining: self.limiter.remaining_in_window(user_id).await,
            },
            Err(error) => {
                tracing::warn!(user_id, post_id, %error, "spark submission failed, queueing");
                self.hand_off(ActionKind::Spark, user_id, post_id).await;
                ActionResult::Queued { is_online: true }
            }
        };
        self.finish(user_id, post_id, result)
    }

    /// Reverses a spark. Does not refund quota.
    pub async fn unspark(&self, user_id: Option<&str>, post_id: &str) -> ActionResult {
        self.stats.reversal_attempts.fetch_add(1, Ordering::Relaxed);
        let Some(user_id) = session_user(user_id) else {
            return self.finish("", post_id, ActionResult::Failure(FailureReason::MissingSession));
        };

        if !self.cache.clear_cached(user_id, post_id).await {
            return self.finish(user_id, post_id, ActionResult::Failure(FailureReason::NotPerformed));
        }
        self.stats.reversals.fetch_add(1, Ordering::Relaxed);

        if !self.connectivity.is_online() {
            self.hand_off(ActionKind::Unspark, user_id, post_id).await;
            return self.finish(user_id, post_id, ActionResult::Queued { is_online: false });
        }

        let result = match self.submit_unspark(user_id, post_id).await {
            Ok(()) => ActionResult::Success {
                remaining: self.limiter.remaining_in_window(user_id).await,
            },
            Err(error) => {
                tracing::warn!(user_id, post_id, %error, "unspark submission failed, queueing");
                self.hand_off(ActionKind::Unspark, user_id, post_id).await;
                ActionResult::Queued { is_online: true }
            }
        };
        self.finish(user_id, post_id, result)
    }

    /// Clears all per-session state. Call on logout.
    pub async fn reset(&self) {
        self.cache.clear_all().await;
        self.limiter.clear_all().await;
        tracing::info!("spark guard reset");
    }

    /// Runs every local check and, if they pass, records the attempt and
    /// marks the key. Both locks are held throughout and released before any
    /// collaborator is awaited.
    async fn admit(&self, user_id: &str, post_id: &str) -> Option<ActionResult> {
        let mut keys = self.cache.lock().await;
        let mut logs = self.limiter.lock().await;
        let config = self.limiter.config();
        let key = CacheKey::new(user_id, post_id);
        let now = now();

        if keys.contains(&key) {
            return Some(ActionResult::AlreadyPerformed);
        }
        // Burst checks are not recorded, so they never eat into the quota.
        if logs.is_burst(config, user_id, now) {
            return Some(ActionResult::BurstDetected);
        }
        if logs.is_limited(config, user_id, now) {
            return Some(ActionResult::rate_limited());
        }

        logs.record(config, user_id, now);
        keys.insert(key);
        None
    }

    async fn submit_spark(&self, user_id: &str, post_id: &str) -> Result<(), RemoteError> {
        self.remote.insert_spark(post_id, user_id).await?;
        self.remote.increment_sparks(post_id).await
    }

    async fn submit_unspark(&self, user_id: &str, post_id: &str) -> Result<(), RemoteError> {
        self.remote.delete_spark(post_id, user_id).await?;
        self.remote.decrement_sparks(post_id).await
    }

    async fn hand_off(&self, kind: ActionKind, user_id: &str, post_id: &str) {
        let action = QueuedAction::new(kind, user_id, post_id);
        let id = action.id;
        if let Err(error) = self.queue.enqueue(action).await {
            tracing::error!(user_id, post_id, %id, %error, "offline queue rejected action");
        }
    }

    fn finish(&self, user_id: &str, post_id: &str, result: ActionResult) -> ActionResult {
        self.stats.observe(&result);
        tracing::debug!(user_id, post_id, phase = ?result.phase(), ?result, "spark guard outcome");
        result
    }
}

fn session_user(user_id: Option<&str>) -> Option<&str> {
    user_id.filter(|id| !id.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::StaticConnectivity;
    use crate::queue::InMemoryQueue;
    use crate::result::Feedback;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicBool;
    use std::time::Duration as StdDuration;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct ScriptedRemote {
        failing: AtomicBool,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedRemote {
        async fn call(&self, call: String) -> Result<(), RemoteError> {
            self.calls.lock().await.push(call);
            if self.failing.load(Ordering::Relaxed) {
                Err(RemoteError::Network("connection reset".into()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl RemoteMutationClient for ScriptedRemote {
        async fn insert_spark(&self, post_id: &str, user_id: &str) -> Result<(), RemoteError> {
            self.call(format!("insert {post_id} {user_id}")).await
        }

        async fn increment_sparks(&self, post_id: &str) -> Result<(), RemoteError> {
            self.call(format!("increment {post_id}")).await
        }

        async fn delete_spark(&self, post_id: &str, user_id: &str) -> Result<(), RemoteError> {
            self.call(format!("delete {post_id} {user_id}")).await
        }

        async fn decrement_sparks(&self, post_id: &str) -> Result<(), RemoteError> {
            self.call(format!("decrement {post_id}")).await
        }
    }

    struct Harness {
        guard: SparkGuard,
        remote: Arc<ScriptedRemote>,
        queue: Arc<InMemoryQueue>,
        connectivity: Arc<StaticConnectivity>,
    }

    fn harness() -> Harness {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let remote = Arc::new(ScriptedRemote::default());
        let queue = Arc::new(InMemoryQueue::new());
        let connectivity = Arc::new(StaticConnectivity::new(true));
        let guard = SparkGuard::new(
            GuardConfig::default(),
            remote.clone(),
            queue.clone(),
            connectivity.clone(),
        );
        Harness {
            guard,
            remote,
            queue,
            connectivity,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn double_tap_yields_one_success_and_one_duplicate() {
        let h = harness();

        let first = h.guard.spark(Some("u1"), "p1").await;
        let second = h.guard.spark(Some("u1"), "p1").await;

        assert_eq!(first, ActionResult::Success { remaining: 59 });
        assert_eq!(second, ActionResult::AlreadyPerformed);
        assert_eq!(h.remote.calls.lock().await.len(), 2);
        assert_eq!(h.guard.limiter().remaining_in_window("u1").await, 59);
    }

    #[tokio::test(start_paused = true)]
    async fn spark_unspark_then_offline_spark() {
        let h = harness();

        assert_eq!(
            h.guard.spark(Some("u1"), "p1").await,
            ActionResult::Success { remaining: 59 }
        );
        assert_eq!(
            h.guard.spark(Some("u1"), "p1").await,
            ActionResult::AlreadyPerformed
        );

        assert!(h.guard.unspark(Some("u1"), "p1").await.is_done());
        assert!(!h.guard.has_sparked("u1", "p1").await);

        h.connectivity.set_online(false);
        assert_eq!(
            h.guard.spark(Some("u1"), "p1").await,
            ActionResult::Queued { is_online: false }
        );
        assert!(h.guard.has_sparked("u1", "p1").await);

        let queued = h.queue.snapshot().await;
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].kind, ActionKind::Spark);
        assert_eq!(queued[0].post_id(), Some("p1"));
    }

    #[tokio::test(start_paused = true)]
    async fn burst_call_does_not_consume_quota() {
        let h = harness();

        for i in 0..10 {
            let result = h.guard.spark(Some("u2"), &format!("post-{i}")).await;
            assert!(matches!(result, ActionResult::Success { .. }), "spark {i}: {result:?}");
            tokio::time::advance(StdDuration::from_millis(500)).await;
        }
        assert_eq!(h.guard.limiter().remaining_in_window("u2").await, 50);

        let burst = h.guard.spark(Some("u2"), "post-10").await;
        assert_eq!(burst, ActionResult::BurstDetected);
        assert_eq!(burst.feedback(), Feedback::SlowDown);
        assert_eq!(h.guard.limiter().remaining_in_window("u2").await, 50);
        assert!(!h.guard.has_sparked("u2", "post-10").await);
    }

    #[tokio::test(start_paused = true)]
    async fn steady_taps_hit_the_quota_on_the_next_call() {
        let h = harness();

        for i in 0..60 {
            let result = h.guard.spark(Some("u3"), &format!("post-{i}")).await;
            assert!(matches!(result, ActionResult::Success { .. }), "spark {i}: {result:?}");
            tokio::time::advance(StdDuration::from_secs(1)).await;
        }

        assert_eq!(
            h.guard.spark(Some("u3"), "post-60").await,
            ActionResult::RateLimited { remaining: 0 }
        );
        assert!(!h.guard.has_sparked("u3", "post-60").await);
        assert_eq!(h.guard.stats().snapshot().rate_limited, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn remote_failure_is_queued_and_stays_cached() {
        let h = harness();
        h.remote.failing.store(true, Ordering::Relaxed);

        let result = h.guard.spark(Some("u1"), "p9").await;

        assert_eq!(result, ActionResult::Queued { is_online: true });
        assert!(h.guard.has_sparked("u1", "p9").await);
        assert_eq!(h.queue.len().await, 1);
        assert_eq!(
            h.guard.spark(Some("u1"), "p9").await,
            ActionResult::AlreadyPerformed
        );
    }

    #[tokio::test]
    async fn rejected_hand_off_still_reports_queued() {
        let remote = Arc::new(ScriptedRemote::default());
        let queue = Arc::new(InMemoryQueue::with_capacity(0));
        let guard = SparkGuard::new(
            GuardConfig::default(),
            remote,
            queue.clone(),
            Arc::new(StaticConnectivity::new(false)),
        );

        assert_eq!(
            guard.spark(Some("u1"), "p1").await,
            ActionResult::Queued { is_online: false }
        );
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn unspark_of_unknown_action_leaves_quota_alone() {
        let h = harness();

        let result = h.guard.unspark(Some("u4"), "p1").await;

        assert_eq!(result, ActionResult::Failure(FailureReason::NotPerformed));
        assert_eq!(h.guard.limiter().stats().await, (0, 0));
        assert_eq!(h.guard.limiter().remaining_in_window("u4").await, 60);
        assert!(h.remote.calls.lock().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn unspark_does_not_refund_quota() {
        let h = harness();

        h.guard.spark(Some("u5"), "p1").await;
        let result = h.guard.unspark(Some("u5"), "p1").await;

        assert_eq!(result, ActionResult::Success { remaining: 59 });
        assert_eq!(
            *h.remote.calls.lock().await,
            vec![
                "insert p1 u5".to_string(),
                "increment p1".to_string(),
                "delete p1 u5".to_string(),
                "decrement p1".to_string(),
            ]
        );
        assert_eq!(h.guard.stats().snapshot().reversals, 1);
    }

    #[tokio::test]
    async fn offline_unspark_is_queued() {
        let h = harness();
        h.guard.spark(Some("u6"), "p1").await;
        h.connectivity.set_online(false);

        let result = h.guard.unspark(Some("u6"), "p1").await;

        assert_eq!(result, ActionResult::Queued { is_online: false });
        let queued = h.queue.snapshot().await;
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].kind, ActionKind::Unspark);
    }

    #[tokio::test]
    async fn failed_unspark_is_queued_and_uncached() {
        let h = harness();
        h.guard.spark(Some("u9"), "p1").await;
        h.remote.failing.store(true, Ordering::Relaxed);

        let result = h.guard.unspark(Some("u9"), "p1").await;

        assert_eq!(result, ActionResult::Queued { is_online: true });
        assert!(!h.guard.has_sparked("u9", "p1").await);
        let queued = h.queue.snapshot().await;
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].kind, ActionKind::Unspark);
        assert_eq!(queued[0].user_id(), Some("u9"));

        let stats = h.guard.stats().snapshot();
        assert_eq!(stats.reversal_attempts, 1);
        assert_eq!(stats.reversals, 1);
        assert_eq!(stats.queued, 1);
    }

    #[tokio::test]
    async fn missing_session_fails_without_side_effects() {
        let h = harness();

        assert_eq!(
            h.guard.spark(None, "p1").await,
            ActionResult::Failure(FailureReason::MissingSession)
        );
        assert_eq!(
            h.guard.spark(Some("  "), "p1").await,
            ActionResult::Failure(FailureReason::MissingSession)
        );
        assert_eq!(
            h.guard.unspark(None, "p1").await,
            ActionResult::Failure(FailureReason::MissingSession)
        );
        assert!(h.guard.cache().is_empty().await);
        let stats = h.guard.stats().snapshot();
        assert_eq!(stats.failures, 3);
        assert_eq!(stats.attempts, 2);
        assert_eq!(stats.reversal_attempts, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_taps_on_one_post_submit_once() {
        let h = harness();
        let remote = h.remote.clone();
        let guard = Arc::new(h.guard);

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let guard = guard.clone();
            tasks.push(tokio::spawn(async move { guard.spark(Some("u7"), "p1").await }));
        }

        let mut results = Vec::new();
        for task in tasks {
            results.push(task.await.unwrap());
        }

        let performed = results
            .iter()
            .filter(|r| matches!(r, ActionResult::Success { .. }))
            .count();
        let duplicates = results
            .iter()
            .filter(|r| **r == ActionResult::AlreadyPerformed)
            .count();
        assert_eq!(performed, 1);
        assert_eq!(duplicates, 7);
        assert_eq!(guard.limiter().remaining_in_window("u7").await, 59);
        assert_eq!(
            *remote.calls.lock().await,
            vec!["insert p1 u7".to_string(), "increment p1".to_string()]
        );
    }

    #[tokio::test]
    async fn reset_clears_session_state() {
        let h = harness();
        h.guard.spark(Some("u8"), "p1").await;

        h.guard.reset().await;

        assert!(!h.guard.has_sparked("u8", "p1").await);
        assert_eq!(h.guard.limiter().remaining_in_window("u8").await, 60);
        assert!(matches!(
            h.guard.spark(Some("u8"), "p1").await,
            ActionResult::Success { .. }
        ));
    }
}
