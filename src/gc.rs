/* src/gc.rs */

use crate::config::GuardConfig;
use crate::limiter::UserLogs;
use crate::types::now;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tokio::sync::RwLock;
use tokio::time::{Instant, interval};

/// Outcome of one garbage collection pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub pruned_timestamps: usize,
    pub removed_users: usize,
}

pub struct GarbageCollector {
    records: Arc<RwLock<UserLogs>>,
    config: GuardConfig,
}

impl GarbageCollector {
    pub(crate) fn new(records: Arc<RwLock<UserLogs>>, config: GuardConfig) -> Self {
        Self { records, config }
    }

    pub async fn start(self) {
        let period = self.config.gc_interval.as_std().max(StdDuration::from_millis(1));
        let mut interval_timer = interval(period);

        loop {
            interval_timer.tick().await;
            let report = self.collect_garbage().await;
            if report.removed_users > 0 || report.pruned_timestamps > 0 {
                tracing::debug!(
                    pruned = report.pruned_timestamps,
                    removed_users = report.removed_users,
                    "spark log sweep"
                );
            }
        }
    }

    pub(crate) async fn collect_garbage(&self) -> SweepReport {
        let mut records = self.records.write().await;
        let now = now();
        let mut report = self.routine_cleanup(&mut records, now);

        if estimate_memory_usage(&records) > self.config.max_memory {
            report.removed_users += self.remove_least_active(&mut records);
            tracing::warn!(
                max_memory = self.config.max_memory,
                removed_users = report.removed_users,
                "spark log over memory budget, evicted idle users"
            );
        }

        report
    }

    fn routine_cleanup(&self, records: &mut UserLogs, now: Instant) -> SweepReport {
        let retention = self.config.retention();
        let mut report = SweepReport::default();

        records.logs.retain(|_user, log| {
            report.pruned_timestamps += log.prune(now, retention);
            if log.is_empty() {
                report.removed_users += 1;
                false
            } else {
                true
            }
        });

        report
    }

    fn remove_least_active(&self, records: &mut UserLogs) -> usize {
        let target_memory = self.config.max_memory * 80 / 100;

        let mut users: Vec<(String, Option<Instant>)> = records
            .logs
            .iter()
            .map(|(user, log)| (user.clone(), log.last_activity()))
            .collect();
        users.sort_by_key(|(_, last)| *last);

        let mut current_memory = estimate_memory_usage(records);
        let mut removed = 0;
        for (user, _) in users {
            if current_memory <= target_memory {
                break;
            }
            if let Some(log) = records.logs.remove(&user) {
                current_memory = current_memory.saturating_sub(user.capacity() + log.memory_usage());
                removed += 1;
            }
        }

        removed
    }
}

fn estimate_memory_usage(records: &UserLogs) -> usize {
    records
        .logs
        .iter()
        .map(|(user, log)| user.capacity() + log.memory_usage())
        .sum()
}
