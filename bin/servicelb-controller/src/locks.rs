//! Per-Service serialization of reconciliations
//!
//! The controller queue and the deletion watcher both reconcile Services.
//! Both take the key's lock first so at most one pass per Service runs at a
//! time.

use servicelb_core::ServiceKey;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Lazily created async mutex per Service key
#[derive(Default)]
pub struct KeyLocks {
    locks: Mutex<HashMap<ServiceKey, Arc<AsyncMutex<()>>>>,
}

/// Held for the duration of one reconciliation
pub struct KeyGuard<'a> {
    owner: &'a KeyLocks,
    key: ServiceKey,
    mutex: Arc<AsyncMutex<()>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other pass for `key` is running
    pub async fn lock(&self, key: &ServiceKey) -> KeyGuard<'_> {
        let mutex = self
            .locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key.clone())
            .or_default()
            .clone();
        let guard = mutex.clone().lock_owned().await;

        KeyGuard {
            owner: self,
            key: key.clone(),
            mutex,
            guard: Some(guard),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();

        // Entries are cloned only under the map lock, so two references
        // (the map and this guard) mean nobody else holds or awaits it.
        let mut locks = self
            .owner
            .locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if Arc::strong_count(&self.mutex) == 2 {
            locks.remove(&self.key);
        }
    }
}
