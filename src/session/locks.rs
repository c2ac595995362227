//! Per-session lock table
//!
//! Each session ID that is currently locked (or waited on) has one async mutex
//! in a `DashMap`. Operations on the same session serialize; unrelated sessions
//! never contend. An entry is dropped once its last holder releases it.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Lock table keyed by session ID
#[derive(Debug, Default)]
pub struct SessionLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `sid`
    pub async fn lock(&self, sid: &str) -> SessionGuard<'_> {
        // Clone the Arc out so the map shard is not held across the await
        let mutex = self.locks.entry(sid.to_string()).or_default().clone();
        let guard = mutex.lock_owned().await;
        SessionGuard {
            table: self,
            sid: sid.to_string(),
            guard: Some(guard),
        }
    }

    /// Number of session IDs currently locked or waited on
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Exclusive access to one session ID, released on drop
#[derive(Debug)]
pub struct SessionGuard<'a> {
    table: &'a SessionLocks,
    sid: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Only the map still points at the mutex: nobody holds or waits on it
        self.table
            .locks
            .remove_if(&self.sid, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
