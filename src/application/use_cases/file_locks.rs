use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::value_objects::FileId;

/// Optional per-file mutual exclusion for mutating operations.
///
/// When disabled, overlapping operations on the same file are not excluded
/// and callers have to serialize them themselves.
pub struct FileLocks {
    enabled: bool,
    locks: DashMap<FileId, Arc<Mutex<()>>>,
}

impl FileLocks {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            locks: DashMap::new(),
        }
    }

    pub fn disabled() -> Self {
        Self::new(false)
    }

    /// `None` when locking is disabled
    pub async fn acquire(&self, file_id: &FileId) -> Option<OwnedMutexGuard<()>> {
        if !self.enabled {
            return None;
        }
        // Clone the Arc out so the map shard is not held across the await
        let lock = self
            .locks
            .entry(file_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        Some(lock.lock_owned().await)
    }

    /// Drop the lock entry of a file that no longer exists
    pub fn forget(&self, file_id: &FileId) {
        self.locks.remove(file_id);
    }
}
