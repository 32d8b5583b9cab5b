/* src/stats.rs */

//! Guard counters

use crate::result::ActionResult;
use std::sync::atomic::{AtomicU64, Ordering};

/// Outcome counters. `attempts` counts `spark` calls and `reversal_attempts`
/// counts `unspark` calls; the outcome counters cover both.
#[derive(Debug, Default)]
pub struct GuardStats {
    pub attempts: AtomicU64,
    pub reversal_attempts: AtomicU64,
    pub succeeded: AtomicU64,
    pub queued: AtomicU64,
    pub duplicates: AtomicU64,
    pub bursts: AtomicU64,
    pub rate_limited: AtomicU64,
    pub reversals: AtomicU64,
    pub failures: AtomicU64,
}

impl GuardStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn observe(&self, result: &ActionResult) {
        let counter = match result {
            ActionResult::Success { .. } => &self.succeeded,
            ActionResult::Queued { .. } => &self.queued,
            ActionResult::AlreadyPerformed => &self.duplicates,
            ActionResult::BurstDetected => &self.bursts,
            ActionResult::RateLimited { .. } => &self.rate_limited,
            ActionResult::Failure(_) => &self.failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> GuardStatsSnapshot {
        GuardStatsSnapshot {
            attempts: self.attempts.load(Ordering::Relaxed),
            reversal_attempts: self.reversal_attempts.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            queued: self.queued.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            bursts: self.bursts.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Relaxed),
            reversals: self.reversals.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GuardStatsSnapshot {
    pub attempts: u64,
    pub reversal_attempts: u64,
    pub succeeded: u64,
    pub queued: u64,
    pub duplicates: u64,
    pub bursts: u64,
    pub rate_limited: u64,
    pub reversals: u64,
    pub failures: u64,
}
