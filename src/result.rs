/* src/result.rs */

//! Outcomes handed back to UI event handlers

use std::fmt;

/// Why an action could not be attempted at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// No signed-in user.
    MissingSession,
    /// Reversal of an action this session never performed.
    NotPerformed,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSession => write!(f, "no user session"),
            Self::NotPerformed => write!(f, "action was not performed"),
        }
    }
}

/// Result of a single guarded action. Exactly one case per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionResult {
    /// Remote mutation applied.
    Success { remaining: u32 },
    /// Quota for the current window is used up.
    RateLimited { remaining: u32 },
    /// Already done in this session; nothing was sent.
    AlreadyPerformed,
    /// Too many attempts in the short window; not recorded.
    BurstDetected,
    /// Handed to the offline queue for later delivery.
    Queued { is_online: bool },
    Failure(FailureReason),
}

/// How the UI should present an [`ActionResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    Done,
    WillSync,
    SlowDown,
    Error,
}

/// Lifecycle of a guarded action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Checking,
    Submitting,
    Succeeded,
    Queued,
    Rejected,
}

impl ActionResult {
    pub fn rate_limited() -> Self {
        Self::RateLimited { remaining: 0 }
    }

    pub fn feedback(&self) -> Feedback {
        match self {
            Self::Success { .. } | Self::AlreadyPerformed => Feedback::Done,
            Self::Queued { .. } => Feedback::WillSync,
            Self::RateLimited { .. } | Self::BurstDetected => Feedback::SlowDown,
            Self::Failure(_) => Feedback::Error,
        }
    }

    /// Terminal phase this result ends in.
    pub fn phase(&self) -> Phase {
        match self {
            Self::Success { .. } => Phase::Succeeded,
            Self::Queued { .. } => Phase::Queued,
            _ => Phase::Rejected,
        }
    }

    /// Whether the action is done from the user's point of view.
    pub fn is_done(&self) -> bool {
        matches!(
            self,
            Self::Success { .. } | Self::AlreadyPerformed | Self::Queued { .. }
        )
    }

    pub fn is_throttled(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::BurstDetected)
    }
}
