/* src/cache.rs */

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockWriteGuard};

/// Composite `(user, target)` key of an action that has already been performed.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    user_id: Box<str>,
    target_id: Box<str>,
}

impl CacheKey {
    pub fn new(user_id: &str, target_id: &str) -> Self {
        Self {
            user_id: user_id.into(),
            target_id: target_id.into(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.user_id, self.target_id)
    }
}

/// In-memory set of performed actions.
///
/// Affirmative only: a hit means the action was done (or optimistically
/// accepted) in this process. A miss says nothing about the backend. Entries
/// never expire on their own; they leave on reversal or `clear_all`.
#[derive(Debug, Clone, Default)]
pub struct IdempotencyCache {
    keys: Arc<RwLock<HashSet<CacheKey>>>,
}

impl IdempotencyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_cached(&self, user_id: &str, target_id: &str) -> bool {
        self.keys
            .read()
            .await
            .contains(&CacheKey::new(user_id, target_id))
    }

    /// Returns `true` if the key was not cached before.
    pub async fn mark_cached(&self, user_id: &str, target_id: &str) -> bool {
        self.keys
            .write()
            .await
            .insert(CacheKey::new(user_id, target_id))
    }

    /// Returns `true` if the key was present.
    pub async fn clear_cached(&self, user_id: &str, target_id: &str) -> bool {
        self.keys
            .write()
            .await
            .remove(&CacheKey::new(user_id, target_id))
    }

    pub async fn clear_all(&self) {
        self.keys.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.keys.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.keys.read().await.is_empty()
    }

    pub(crate) async fn lock(&self) -> RwLockWriteGuard<'_, HashSet<CacheKey>> {
        self.keys.write().await
    }
}
