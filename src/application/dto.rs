use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::domain::entities::FileRecord;
use crate::domain::value_objects::{Address, FileId};

/// Plaintext of a completed download
#[derive(Debug, Clone)]
pub struct DownloadedFile {
    pub record: FileRecord,
    pub data: Bytes,
}

/// Outcome of an ownership transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub file_id: FileId,
    pub previous_owner: Address,
    pub new_owner: Address,
    /// Third-party grants still in force after the transfer
    pub retained_grants: usize,
}

/// Outcome of a revoke call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevokeOutcome {
    /// No grant existed for the address
    NothingToRevoke,
    /// The grant was deleted and confirmed gone
    GrantInvalidated,
    /// The grant was deleted and the file re-keyed for the remaining holders
    KeyRotated { remaining_grantees: usize },
}
