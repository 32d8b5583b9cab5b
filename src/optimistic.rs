/* src/optimistic.rs */

//! Optimistic local updates with rollback
//!
//! Settings toggles (mute, pin, archive) flip local state first and only
//! then call the backend. [`apply`] captures that pattern once: snapshot,
//! set, await the remote call, restore the snapshot if it fails.

use std::future::Future;
use std::sync::{Arc, RwLock};

/// Applies `value` locally, then runs `remote`. On error the previous value
/// is restored and the error returned.
pub async fn apply<T, E, G, S, R, Fut>(get: G, set: S, value: T, remote: R) -> Result<(), E>
where
    T: Clone,
    G: FnOnce() -> T,
    S: Fn(T),
    R: FnOnce(T) -> Fut,
    Fut: Future<Output = Result<(), E>>,
{
    let previous = get();
    set(value.clone());

    match remote(value).await {
        Ok(()) => Ok(()),
        Err(error) => {
            set(previous);
            Err(error)
        }
    }
}

/// Shared local value that can be updated optimistically.
#[derive(Debug, Default)]
pub struct OptimisticCell<T> {
    value: Arc<RwLock<T>>,
}

impl<T> Clone for OptimisticCell<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
        }
    }
}

impl<T: Clone> OptimisticCell<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: Arc::new(RwLock::new(value)),
        }
    }

    pub fn get(&self) -> T {
        match self.value.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set(&self, value: T) {
        match self.value.write() {
            Ok(mut guard) => *guard = value,
            Err(poisoned) => *poisoned.into_inner() = value,
        }
    }

    /// Sets `value` and keeps it only if `remote` succeeds.
    pub async fn update<E, R, Fut>(&self, value: T, remote: R) -> Result<(), E>
    where
        R: FnOnce(T) -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        let result = apply(|| self.get(), |v| self.set(v), value, remote).await;
        if result.is_err() {
            tracing::debug!("optimistic update rolled back");
        }
        result
    }
}
