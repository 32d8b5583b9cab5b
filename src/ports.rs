/* src/ports.rs */

//! Collaborators the guard talks to

use crate::error::{QueueError, RemoteError};
use crate::queue::QueuedAction;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};

/// Backend mutations behind a spark.
///
/// `insert_spark` must be an upsert on `(post, user)`; the guard treats the
/// insert plus the counter RPC as one action but does not make them atomic.
#[async_trait]
pub trait RemoteMutationClient: Send + Sync {
    async fn insert_spark(&self, post_id: &str, user_id: &str) -> Result<(), RemoteError>;

    async fn increment_sparks(&self, post_id: &str) -> Result<(), RemoteError>;

    async fn delete_spark(&self, post_id: &str, user_id: &str) -> Result<(), RemoteError>;

    async fn decrement_sparks(&self, post_id: &str) -> Result<(), RemoteError>;
}

/// Durable store that retries actions once the backend is reachable.
#[async_trait]
pub trait OfflineQueue: Send + Sync {
    async fn enqueue(&self, action: QueuedAction) -> Result<(), QueueError>;
}

pub trait ConnectivityOracle: Send + Sync {
    fn is_online(&self) -> bool;
}

/// Connectivity flag flipped by the platform's network listener.
#[derive(Debug)]
pub struct StaticConnectivity {
    online: AtomicBool,
}

impl StaticConnectivity {
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::Relaxed);
    }
}

impl Default for StaticConnectivity {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ConnectivityOracle for StaticConnectivity {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::Relaxed)
    }
}
