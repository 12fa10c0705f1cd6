use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::capability::WrappedCapability;
use crate::domain::value_objects::{Address, FileId, PublicKey};

/// Authorization for one grantee to recover a file's key.
///
/// At most one grant exists per (file, grantee); issuing again replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareGrant {
    pub file_id: FileId,
    pub grantee: Address,
    pub grantee_key: PublicKey,
    pub capability: WrappedCapability,
    pub granted_at: DateTime<Utc>,
}

impl ShareGrant {
    pub fn new(file_id: FileId, grantee_key: PublicKey, capability: WrappedCapability) -> Self {
        Self {
            file_id,
            grantee: Address::from_public_key(&grantee_key),
            grantee_key,
            capability,
            granted_at: Utc::now(),
        }
    }
}
