/* src/limiter.rs */

use crate::config::GuardConfig;
use crate::gc::GarbageCollector;
use crate::types::{ActionLog, WindowRule, now};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockWriteGuard};
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Per-user attempt logs shared between the limiter, the guard and the GC.
#[derive(Debug, Default)]
pub(crate) struct UserLogs {
    pub(crate) logs: HashMap<String, ActionLog>,
}

impl UserLogs {
    fn count(&self, user_id: &str, rule: &WindowRule, now: Instant) -> u32 {
        self.logs
            .get(user_id)
            .map(|log| log.count_within(rule, now))
            .unwrap_or(0)
    }

    pub(crate) fn is_burst(&self, config: &GuardConfig, user_id: &str, now: Instant) -> bool {
        self.count(user_id, &config.burst_rule, now) >= config.burst_rule.cap
    }

    pub(crate) fn is_limited(&self, config: &GuardConfig, user_id: &str, now: Instant) -> bool {
        self.count(user_id, &config.rate_rule, now) >= config.rate_rule.cap
    }

    pub(crate) fn remaining(&self, config: &GuardConfig, user_id: &str, now: Instant) -> u32 {
        config
            .rate_rule
            .cap
            .saturating_sub(self.count(user_id, &config.rate_rule, now))
    }

    pub(crate) fn record(&mut self, config: &GuardConfig, user_id: &str, now: Instant) {
        self.logs
            .entry(user_id.to_string())
            .or_default()
            .record(now, config.retention());
    }
}

/// Sliding-window rate limiter with a stricter burst window.
pub struct RateLimiter {
    config: GuardConfig,
    records: Arc<RwLock<UserLogs>>,
}

impl RateLimiter {
    pub fn new(config: GuardConfig) -> Self {
        Self {
            config,
            records: Arc::new(RwLock::new(UserLogs::default())),
        }
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    pub async fn is_rate_limited(&self, user_id: &str) -> bool {
        self.records
            .read()
            .await
            .is_limited(&self.config, user_id, now())
    }

    pub async fn is_burst_detected(&self, user_id: &str) -> bool {
        self.records
            .read()
            .await
            .is_burst(&self.config, user_id, now())
    }

    pub async fn remaining_in_window(&self, user_id: &str) -> u32 {
        self.records
            .read()
            .await
            .remaining(&self.config, user_id, now())
    }

    /// Records an attempt. Must run before the remote call is issued so taps
    /// landing during network latency are counted.
    pub async fn record_attempt(&self, user_id: &str) {
        self.records
            .write()
            .await
            .record(&self.config, user_id, now());
    }

    pub async fn clear_user(&self, user_id: &str) {
        self.records.write().await.logs.remove(user_id);
    }

    pub async fn clear_all(&self) {
        self.records.write().await.logs.clear();
    }

    /// Returns `(tracked users, stored timestamps)`.
    pub async fn stats(&self) -> (usize, usize) {
        let records = self.records.read().await;
        let total_users = records.logs.len();
        let total_entries = records.logs.values().map(ActionLog::len).sum();
        (total_users, total_entries)
    }

    /// Starts the periodic retention sweep. Abort the handle on logout.
    pub fn spawn_gc(&self) -> JoinHandle<()> {
        let gc = GarbageCollector::new(self.records.clone(), self.config.clone());
        tokio::spawn(async move {
            gc.start().await;
        })
    }

    pub(crate) async fn lock(&self) -> RwLockWriteGuard<'_, UserLogs> {
        self.records.write().await
    }

    #[cfg(test)]
    pub(crate) fn records(&self) -> Arc<RwLock<UserLogs>> {
        self.records.clone()
    }
}
