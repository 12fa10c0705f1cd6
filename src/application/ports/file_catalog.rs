use async_trait::async_trait;
#[cfg(test)]
use mockall::{automock, predicate::*};

use crate::application::ports::TransportError;
use crate::domain::entities::FileRecord;
use crate::domain::value_objects::{Address, FileId};

/// Port for the transport's authoritative file metadata
#[cfg_attr(test, automock)]
#[async_trait]
pub trait FileCatalog: Send + Sync {
    /// Look up a file visible to the session (owned or shared)
    async fn describe(&self, file_id: &FileId) -> Result<Option<FileRecord>, TransportError>;

    /// Files owned by the session identity
    async fn list_owned(&self) -> Result<Vec<FileRecord>, TransportError>;

    /// Files other identities have shared with the session identity
    async fn list_shared(&self) -> Result<Vec<FileRecord>, TransportError>;

    /// Move ownership of a file owned by the session identity
    async fn reassign_owner(
        &self,
        file_id: &FileId,
        new_owner: &Address,
    ) -> Result<(), TransportError>;
}
