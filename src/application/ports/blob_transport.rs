use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
#[cfg(test)]
use mockall::{automock, predicate::*};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::application::events::TransferProgress;
use crate::domain::value_objects::{Address, FileId, PublicKey};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Rejected: {0}")]
    Rejected(String),

    #[error("Transport unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Sender half of an operation's progress channel.
///
/// Transports report `(transferred, total)` here at whatever granularity
/// they like and must drop the sender once the operation finishes.
pub type ProgressSender = mpsc::UnboundedSender<TransferProgress>;

/// Identity the transport session is bound to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub address: Address,
    pub public_key: PublicKey,
}

/// Ciphertext plus the metadata the transport records for a new file
#[derive(Debug, Clone)]
pub struct BlobUpload {
    pub ciphertext: Bytes,
    /// Plaintext size in bytes
    pub size: u64,
    pub created_at: DateTime<Utc>,
}

/// Port for the encrypted blob transport (chunked upload/download engine)
#[cfg_attr(test, automock)]
#[async_trait]
pub trait BlobTransport: Send + Sync {
    /// Bind the transport session to the caller's identity
    async fn connect(&self, session: &SessionContext) -> Result<(), TransportError>;

    /// Store a new blob owned by the session identity and return its id
    async fn put(&self, upload: BlobUpload, progress: ProgressSender)
        -> Result<FileId, TransportError>;

    /// Fetch a blob's ciphertext; the transport enforces owner-or-grantee access
    async fn get(&self, file_id: &FileId, progress: ProgressSender)
        -> Result<Bytes, TransportError>;

    /// Replace a blob's ciphertext in place, keeping its id
    async fn rewrite(&self, file_id: &FileId, ciphertext: Bytes) -> Result<(), TransportError>;

    /// Delete a blob. Cascades to its grants and owner capability.
    async fn delete(&self, file_id: &FileId) -> Result<(), TransportError>;
}
