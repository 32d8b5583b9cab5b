/* src/types.rs */

use std::collections::VecDeque;
use std::time::Duration as StdDuration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Duration {
    Millis(u64),
    Seconds(u64),
    Minutes(u64),
    Hours(u64),
}

impl Duration {
    pub fn millis(n: u64) -> Self {
        Duration::Millis(n)
    }
    pub fn seconds(n: u64) -> Self {
        Duration::Seconds(n)
    }
    pub fn minutes(n: u64) -> Self {
        Duration::Minutes(n)
    }
    pub fn hours(n: u64) -> Self {
        Duration::Hours(n)
    }

    pub fn as_millis(&self) -> u64 {
        match self {
            Duration::Millis(n) => *n,
            Duration::Seconds(n) => n.saturating_mul(1_000),
            Duration::Minutes(n) => n.saturating_mul(60_000),
            Duration::Hours(n) => n.saturating_mul(3_600_000),
        }
    }

    pub fn as_std(&self) -> StdDuration {
        StdDuration::from_millis(self.as_millis())
    }
}

impl From<Duration> for StdDuration {
    fn from(value: Duration) -> Self {
        value.as_std()
    }
}

/// Whether a timestamp exactly one window old is still inside the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// `age <= interval`
    Closed,
    /// `age < interval`
    HalfOpen,
}

/// A cap on the number of attempts inside a sliding window.
///
/// A `cap` of 0 admits nothing: the rule is always exceeded, which makes it
/// a kill switch for the action it guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowRule {
    pub interval: Duration,
    pub cap: u32,
    pub edge: Edge,
}

impl WindowRule {
    pub fn new(interval: Duration, cap: u32) -> Self {
        Self {
            interval,
            cap,
            edge: Edge::Closed,
        }
    }

    pub fn half_open(mut self) -> Self {
        self.edge = Edge::HalfOpen;
        self
    }

    pub fn covers(&self, age: StdDuration) -> bool {
        let window = self.interval.as_std();
        match self.edge {
            Edge::Closed => age <= window,
            Edge::HalfOpen => age < window,
        }
    }
}

/// Chronological attempt timestamps for a single user.
///
/// Timestamps are only ever appended at the back and dropped from the
/// front, so the log stays sorted without any reordering.
#[derive(Debug, Clone, Default)]
pub struct ActionLog {
    timestamps: VecDeque<Instant>,
}

impl ActionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, now: Instant, retention: StdDuration) {
        self.prune(now, retention);
        self.timestamps.push_back(now);
    }

    pub fn count_within(&self, rule: &WindowRule, now: Instant) -> u32 {
        self.timestamps
            .iter()
            .rev()
            .take_while(|&&t| rule.covers(now.saturating_duration_since(t)))
            .count() as u32
    }

    /// Drops the prefix of timestamps older than `retention`, returning how many were removed.
    pub fn prune(&mut self, now: Instant, retention: StdDuration) -> usize {
        let mut removed = 0;
        while let Some(&oldest) = self.timestamps.front() {
            if now.saturating_duration_since(oldest) <= retention {
                break;
            }
            self.timestamps.pop_front();
            removed += 1;
        }
        removed
    }

    pub fn last_activity(&self) -> Option<Instant> {
        self.timestamps.back().copied()
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn memory_usage(&self) -> usize {
        std::mem::size_of::<Self>() + self.timestamps.capacity() * std::mem::size_of::<Instant>()
    }
}

pub fn now() -> Instant {
    Instant::now()
}
