/* src/config.rs */

use crate::types::{Duration, WindowRule};
use std::time::Duration as StdDuration;

/// Configuration for the spark guard
#[derive(Debug, Clone)]
pub struct GuardConfig {
    pub rate_rule: WindowRule,
    pub burst_rule: WindowRule,
    pub retention: Option<Duration>,
    pub max_memory: usize,
    pub gc_interval: Duration,
}

impl GuardConfig {
    pub fn new(rate_rule: WindowRule, burst_rule: WindowRule) -> Self {
        Self {
            rate_rule,
            burst_rule,
            retention: None,
            max_memory: 16 * 1024 * 1024, // 16MB default
            gc_interval: Duration::seconds(30),
        }
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = Some(retention);
        self
    }

    pub fn with_max_memory(mut self, max_memory: usize) -> Self {
        self.max_memory = max_memory;
        self
    }

    pub fn with_gc_interval(mut self, gc_interval: Duration) -> Self {
        self.gc_interval = gc_interval;
        self
    }

    pub fn longest_interval(&self) -> Duration {
        if self.burst_rule.interval.as_millis() > self.rate_rule.interval.as_millis() {
            self.burst_rule.interval
        } else {
            self.rate_rule.interval
        }
    }

    /// How long timestamps are kept. Defaults to twice the longest window and
    /// never drops below the longest window.
    pub fn retention(&self) -> StdDuration {
        let longest = self.longest_interval().as_std();
        match self.retention {
            Some(retention) => retention.as_std().max(longest),
            None => longest * 2,
        }
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self::new(
            WindowRule::new(Duration::seconds(60), 60),
            WindowRule::new(Duration::seconds(10), 10).half_open(),
        )
    }
}
