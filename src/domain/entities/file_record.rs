use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{Address, FileId};

/// A stored file as seen by the access layer.
///
/// `id` and `size` are fixed once the upload completes. Ownership is never
/// mutated in place: a transfer produces a new record under the new owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    id: FileId,
    owner: Address,
    size: u64,
    created_at: DateTime<Utc>,
}

impl FileRecord {
    pub fn new(id: FileId, owner: Address, size: u64, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            owner,
            size,
            created_at,
        }
    }

    pub fn id(&self) -> &FileId {
        &self.id
    }

    pub fn owner(&self) -> &Address {
        &self.owner
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_owned_by(&self, address: &Address) -> bool {
        &self.owner == address
    }

    /// Same file re-issued under a new owner
    pub fn with_owner(&self, owner: Address) -> Self {
        Self {
            owner,
            ..self.clone()
        }
    }
}
