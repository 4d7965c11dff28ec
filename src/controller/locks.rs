//! Per-key lock table
//!
//! Hands out one `RwLock` per scope name and per stream key. Callers always
//! take the scope lock before the stream lock.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::registry::StreamKey;

type LockMap<K> = Mutex<HashMap<K, Arc<RwLock<()>>>>;

/// Lock table keyed by scope name and by stream key
#[derive(Default)]
pub(crate) struct KeyLocks {
    scopes: LockMap<String>,
    streams: LockMap<StreamKey>,
}

impl KeyLocks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Lock guarding a scope record and its member set
    pub(crate) async fn scope(&self, name: &str) -> Arc<RwLock<()>> {
        let mut scopes = self.scopes.lock().await;
        if let Some(lock) = scopes.get(name) {
            return Arc::clone(lock);
        }

        let lock = Arc::new(RwLock::new(()));
        scopes.insert(name.to_string(), Arc::clone(&lock));
        lock
    }

    /// Lock guarding a stream record
    pub(crate) async fn stream(&self, key: &StreamKey) -> Arc<RwLock<()>> {
        let mut streams = self.streams.lock().await;
        Arc::clone(
            streams
                .entry(key.clone())
                .or_insert_with(|| Arc::new(RwLock::new(()))),
        )
    }

    /// Drop locks nobody holds
    ///
    /// Handles are only cloned while the table mutex is held, so a lock
    /// whose only reference is the table cannot be in use.
    pub(crate) async fn prune(&self) {
        retain_in_use(&mut *self.streams.lock().await);
        retain_in_use(&mut *self.scopes.lock().await);
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.scopes.lock().await.len() + self.streams.lock().await.len()
    }
}

fn retain_in_use<K: Eq + Hash>(locks: &mut HashMap<K, Arc<RwLock<()>>>) {
    let before = locks.len();
    locks.retain(|_, lock| Arc::strong_count(lock) > 1);

    if locks.len() < before {
        tracing::trace!(removed = before - locks.len(), "Pruned idle locks");
    }
}
