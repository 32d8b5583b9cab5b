/* src/error.rs */

//! Errors raised by the guard's collaborators

/// Failure reported by the remote mutation client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("network error: {0}")]
    Network(Box<str>),
    #[error("server error {status}: {message}")]
    Server { status: u16, message: Box<str> },
    #[error("not authenticated")]
    Unauthenticated,
}

/// Failure reported by the offline queue.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    #[error("offline queue is full ({capacity} pending)")]
    Full { capacity: usize },
    #[error("offline queue storage error: {0}")]
    Storage(Box<str>),
}
