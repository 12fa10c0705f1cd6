use async_trait::async_trait;
#[cfg(test)]
use mockall::{automock, predicate::*};

use crate::application::ports::TransportError;
use crate::domain::capability::WrappedCapability;
use crate::domain::entities::ShareGrant;
use crate::domain::value_objects::{Address, FileId};

/// Port for wrapped capabilities held by the transport: one owner capability
/// per file plus any number of share grants.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait GrantStore: Send + Sync {
    /// Insert or replace the grant for `(grant.file_id, grant.grantee)`
    async fn upsert(&self, grant: &ShareGrant) -> Result<(), TransportError>;

    async fn find(
        &self,
        file_id: &FileId,
        grantee: &Address,
    ) -> Result<Option<ShareGrant>, TransportError>;

    async fn list(&self, file_id: &FileId) -> Result<Vec<ShareGrant>, TransportError>;

    /// Returns whether a grant existed
    async fn remove(&self, file_id: &FileId, grantee: &Address) -> Result<bool, TransportError>;

    async fn remove_all(&self, file_id: &FileId) -> Result<(), TransportError>;

    /// Swap the whole grant set in one call
    async fn replace_all(
        &self,
        file_id: &FileId,
        grants: Vec<ShareGrant>,
    ) -> Result<(), TransportError>;

    async fn owner_capability(
        &self,
        file_id: &FileId,
    ) -> Result<Option<WrappedCapability>, TransportError>;

    async fn store_owner_capability(
        &self,
        file_id: &FileId,
        capability: &WrappedCapability,
    ) -> Result<(), TransportError>;
}
