//! Use case: issue, list and revoke share grants.
//!
//! A grant is the file key wrapped for the grantee's public key. Revocation
//! has to leave no usable wrapped copy behind, which is why the default
//! policy re-keys the file: the grant is dropped and everyone who remains
//! receives a capability for a fresh key, so an old copy of the revoked
//! capability no longer opens the stored ciphertext.

use std::sync::Arc;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::application::dto::RevokeOutcome;
use crate::application::errors::VaultError;
use crate::application::events::{Notifier, OperationKind};
use crate::application::ports::{BlobTransport, FileCatalog, GrantStore};
use crate::application::session::Session;
use crate::application::use_cases::file_locks::FileLocks;
use crate::application::use_cases::ownership::{require_owned, unwrap_file_key};
use crate::application::use_cases::progress::drive_with_progress;
use crate::application::use_cases::{IdentityResolver, QuotaTracker};
use crate::application::validation::parse_identifier;
use crate::config::RevocationPolicy;
use crate::domain::capability::FileKey;
use crate::domain::entities::{FileRecord, ShareGrant};
use crate::domain::value_objects::{Address, FileId};

pub struct AccessGrantManager {
    session: Arc<Session>,
    resolver: Arc<IdentityResolver>,
    catalog: Arc<dyn FileCatalog>,
    grants: Arc<dyn GrantStore>,
    transport: Arc<dyn BlobTransport>,
    quota: Arc<QuotaTracker>,
    locks: Arc<FileLocks>,
    notifier: Notifier,
    policy: RevocationPolicy,
}

/// Everything needed to put a file back the way it was before a rotation
struct RotationSnapshot {
    ciphertext: Bytes,
    grants: Vec<ShareGrant>,
}

impl AccessGrantManager {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        session: Arc<Session>,
        resolver: Arc<IdentityResolver>,
        catalog: Arc<dyn FileCatalog>,
        grants: Arc<dyn GrantStore>,
        transport: Arc<dyn BlobTransport>,
        quota: Arc<QuotaTracker>,
        locks: Arc<FileLocks>,
        notifier: Notifier,
        policy: RevocationPolicy,
    ) -> Self {
        Self {
            session,
            resolver,
            catalog,
            grants,
            transport,
            quota,
            locks,
            notifier,
            policy,
        }
    }

    /// Grant the identity behind `identifier` access to `file_id`
    pub async fn share(&self, file_id: &FileId, identifier: &str) -> Result<ShareGrant, VaultError> {
        let _guard = self.notifier.begin(OperationKind::Share);
        let result = self.share_inner(file_id, identifier).await;
        if result.is_ok() {
            self.notifier.succeeded(
                OperationKind::Share,
                format!("Shared file successfully with {}", identifier.trim()),
            );
        }
        self.notifier.report(OperationKind::Share, result)
    }

    async fn share_inner(&self, file_id: &FileId, identifier: &str) -> Result<ShareGrant, VaultError> {
        self.session.ensure_connected()?;
        let identifier = parse_identifier(identifier)?;
        let recipient = self.resolver.resolve(&identifier).await?;

        let caller = self.session.address();
        if recipient.address == caller {
            return Err(VaultError::AlreadyOwnerOrSelfShare(recipient.address));
        }

        let _lock = self.locks.acquire(file_id).await;
        let record = self
            .catalog
            .describe(file_id)
            .await?
            .ok_or_else(|| VaultError::NotFound(file_id.to_string()))?;
        if record.is_owned_by(&recipient.address) {
            return Err(VaultError::AlreadyOwnerOrSelfShare(recipient.address));
        }

        let key = unwrap_file_key(self.grants.as_ref(), self.session.wallet().as_ref(), &record)
            .await?;
        let capability = key.wrap_for(&recipient.public_key)?;
        let grant = ShareGrant::new(file_id.clone(), recipient.public_key, capability);

        self.grants
            .upsert(&grant)
            .await
            .map_err(VaultError::grant_rejected)?;

        info!(file_id = %file_id, grantee = %grant.grantee, "File shared");
        Ok(grant)
    }

    /// Addresses currently holding a grant on an owned file
    pub async fn list_grantees(&self, file_id: &FileId) -> Result<Vec<Address>, VaultError> {
        let _guard = self.notifier.begin(OperationKind::ListGrantees);
        let result = self.list_grantees_inner(file_id).await;
        self.notifier.report(OperationKind::ListGrantees, result)
    }

    async fn list_grantees_inner(&self, file_id: &FileId) -> Result<Vec<Address>, VaultError> {
        self.session.ensure_connected()?;
        require_owned(self.catalog.as_ref(), file_id, &self.session.address()).await?;
        let grants = self.grants.list(file_id).await?;
        Ok(grants.into_iter().map(|grant| grant.grantee).collect())
    }

    /// Remove `grantee`'s access. Revoking an address without a grant succeeds.
    pub async fn revoke(
        &self,
        file_id: &FileId,
        grantee: &Address,
    ) -> Result<RevokeOutcome, VaultError> {
        let _guard = self.notifier.begin(OperationKind::Revoke);
        let result = self.revoke_inner(file_id, grantee).await;
        if result.is_ok() {
            self.notifier
                .succeeded(OperationKind::Revoke, "File access revoked");
        }
        self.notifier.report(OperationKind::Revoke, result)
    }

    async fn revoke_inner(
        &self,
        file_id: &FileId,
        grantee: &Address,
    ) -> Result<RevokeOutcome, VaultError> {
        self.session.ensure_connected()?;
        let _lock = self.locks.acquire(file_id).await;
        let record = require_owned(self.catalog.as_ref(), file_id, &self.session.address()).await?;

        let current = self.grants.list(file_id).await?;
        if !current.iter().any(|grant| &grant.grantee == grantee) {
            debug!(file_id = %file_id, grantee = %grantee, "No grant to revoke");
            return Ok(RevokeOutcome::NothingToRevoke);
        }

        match self.policy {
            RevocationPolicy::InvalidateGrant => {
                self.grants.remove(file_id, grantee).await?;
                if self.grants.find(file_id, grantee).await?.is_some() {
                    return Err(VaultError::GrantRejected(format!(
                        "grant for {grantee} still present after revoke"
                    )));
                }
                info!(file_id = %file_id, grantee = %grantee, "Grant invalidated");
                Ok(RevokeOutcome::GrantInvalidated)
            }
            RevocationPolicy::RotateKey => {
                let remaining_grantees = self.rotate_key(&record, current, grantee).await?;
                self.quota.refresh_after(OperationKind::Revoke).await;
                info!(file_id = %file_id, grantee = %grantee, remaining_grantees, "Grant revoked and file re-keyed");
                Ok(RevokeOutcome::KeyRotated { remaining_grantees })
            }
        }
    }

    /// Re-encrypt the file under a fresh key and re-issue capabilities for
    /// the owner and every grantee except `revoked`. Either all of it lands
    /// or the previous ciphertext and grant set are restored.
    ///
    /// Returns the number of grantees that kept access.
    async fn rotate_key(
        &self,
        record: &FileRecord,
        current: Vec<ShareGrant>,
        revoked: &Address,
    ) -> Result<usize, VaultError> {
        let file_id = record.id();
        let old_key =
            unwrap_file_key(self.grants.as_ref(), self.session.wallet().as_ref(), record).await?;
        let snapshot = RotationSnapshot {
            ciphertext: self.fetch_ciphertext(file_id).await?,
            grants: current,
        };

        let plaintext = old_key.open(&snapshot.ciphertext)?;
        let new_key = FileKey::generate();
        let new_ciphertext = Bytes::from(new_key.seal(&plaintext)?);
        let owner_capability = new_key.wrap_for(&self.session.public_key())?;
        let mut new_grants = Vec::with_capacity(snapshot.grants.len());
        for grant in snapshot.grants.iter().filter(|g| &g.grantee != revoked) {
            new_grants.push(ShareGrant {
                capability: new_key.wrap_for(&grant.grantee_key)?,
                ..grant.clone()
            });
        }
        let kept = new_grants.len();

        self.transport.rewrite(file_id, new_ciphertext).await?;

        if let Err(e) = self.grants.replace_all(file_id, new_grants).await {
            return Err(self
                .roll_back_rotation(file_id, &snapshot, false, VaultError::grant_rejected(e))
                .await);
        }

        if let Err(e) = self
            .grants
            .store_owner_capability(file_id, &owner_capability)
            .await
        {
            return Err(self
                .roll_back_rotation(file_id, &snapshot, true, VaultError::from_transport(e))
                .await);
        }

        Ok(kept)
    }

    /// Put back the pre-rotation state and return the error to surface:
    /// `cause` when the rollback worked, `RollbackFailed` when it did not.
    async fn roll_back_rotation(
        &self,
        file_id: &FileId,
        snapshot: &RotationSnapshot,
        grants_replaced: bool,
        cause: VaultError,
    ) -> VaultError {
        let mut result = self
            .transport
            .rewrite(file_id, snapshot.ciphertext.clone())
            .await;
        if result.is_ok() && grants_replaced {
            result = self
                .grants
                .replace_all(file_id, snapshot.grants.clone())
                .await;
        }

        match result {
            Ok(()) => {
                warn!(file_id = %file_id, error = %cause, "Key rotation aborted and rolled back");
                cause
            }
            Err(e) => {
                error!(file_id = %file_id, error = %e, "Failed to restore file after aborted key rotation");
                VaultError::RollbackFailed {
                    operation_error: cause.to_string(),
                    rollback_error: e.to_string(),
                }
            }
        }
    }

    async fn fetch_ciphertext(&self, file_id: &FileId) -> Result<Bytes, VaultError> {
        let transport = Arc::clone(&self.transport);
        drive_with_progress(
            &self.notifier,
            OperationKind::Revoke,
            &CancellationToken::new(),
            |progress| async move {
                transport
                    .get(file_id, progress)
                    .await
                    .map_err(VaultError::from_transport)
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use parking_lot::Mutex;

    use crate::application::errors::ErrorKind;
    use crate::application::ports::{
        MockBlobTransport, MockFileCatalog, MockGrantStore, TransportError,
    };
    use crate::application::use_cases::test_support::{
        connected_session, quiet_notifier, resolver_for, steady_quota,
    };
    use crate::domain::capability::SecretKey;

    async fn manager(
        owner: &SecretKey,
        directory: &[(&str, &SecretKey)],
        transport: MockBlobTransport,
        catalog: MockFileCatalog,
        grants: MockGrantStore,
        policy: RevocationPolicy,
    ) -> AccessGrantManager {
        let (session, transport) = connected_session(owner, transport).await;
        let notifier = quiet_notifier();
        AccessGrantManager::new(
            session,
            resolver_for(directory),
            Arc::new(catalog),
            Arc::new(grants),
            transport,
            steady_quota(&notifier),
            Arc::new(FileLocks::disabled()),
            notifier,
            policy,
        )
    }

    fn owned_record(owner: &SecretKey, size: u64) -> FileRecord {
        FileRecord::new(FileId::new("bafy-shared").unwrap(), owner.address(), size, Utc::now())
    }

    #[tokio::test]
    async fn test_share_wraps_key_for_recipient() {
        // Arrange
        let owner = SecretKey::generate();
        let bob = SecretKey::generate();
        let key = FileKey::generate();
        let owner_cap = key.wrap_for(&owner.public_key()).unwrap();
        let record = owned_record(&owner, 4);

        let mut catalog = MockFileCatalog::new();
        catalog
            .expect_describe()
            .returning(move |_| Ok(Some(record.clone())));
        let mut grants = MockGrantStore::new();
        grants
            .expect_owner_capability()
            .returning(move |_| Ok(Some(owner_cap.clone())));
        let stored = Arc::new(Mutex::new(None));
        let stored_in = Arc::clone(&stored);
        grants.expect_upsert().times(1).returning(move |grant| {
            *stored_in.lock() = Some(grant.clone());
            Ok(())
        });

        let manager = manager(
            &owner,
            &[("bob@example.com", &bob)],
            MockBlobTransport::new(),
            catalog,
            grants,
            RevocationPolicy::RotateKey,
        )
        .await;

        // Act
        let grant = manager
            .share(&FileId::new("bafy-shared").unwrap(), "Bob@Example.com")
            .await
            .unwrap();

        // Assert
        assert_eq!(grant.grantee, bob.address());
        let upserted = stored.lock().clone().unwrap();
        assert_eq!(bob.unwrap(&upserted.capability).unwrap(), key);
    }

    #[tokio::test]
    async fn test_share_with_self_is_rejected_before_any_grant() {
        let owner = SecretKey::generate();
        let mut grants = MockGrantStore::new();
        grants.expect_upsert().never();

        let manager = manager(
            &owner,
            &[("me@example.com", &owner)],
            MockBlobTransport::new(),
            MockFileCatalog::new(),
            grants,
            RevocationPolicy::RotateKey,
        )
        .await;

        let err = manager
            .share(&FileId::new("bafy-shared").unwrap(), "me@example.com")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::AlreadyOwnerOrSelfShare);
    }

    #[tokio::test]
    async fn test_share_with_unknown_identifier() {
        let owner = SecretKey::generate();
        let manager = manager(
            &owner,
            &[],
            MockBlobTransport::new(),
            MockFileCatalog::new(),
            MockGrantStore::new(),
            RevocationPolicy::RotateKey,
        )
        .await;

        let err = manager
            .share(&FileId::new("bafy-shared").unwrap(), "nobody@example.com")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::IdentityNotFound);
    }

    #[tokio::test]
    async fn test_revoke_without_grant_is_a_no_op() {
        let owner = SecretKey::generate();
        let record = owned_record(&owner, 4);
        let mut catalog = MockFileCatalog::new();
        catalog
            .expect_describe()
            .returning(move |_| Ok(Some(record.clone())));
        let mut grants = MockGrantStore::new();
        grants.expect_list().returning(|_| Ok(Vec::new()));
        grants.expect_remove().never();
        grants.expect_replace_all().never();

        let manager = manager(
            &owner,
            &[],
            MockBlobTransport::new(),
            catalog,
            grants,
            RevocationPolicy::RotateKey,
        )
        .await;

        let outcome = manager
            .revoke(
                &FileId::new("bafy-shared").unwrap(),
                &SecretKey::generate().address(),
            )
            .await
            .unwrap();

        assert_eq!(outcome, RevokeOutcome::NothingToRevoke);
    }

    #[tokio::test]
    async fn test_invalidate_policy_confirms_removal() {
        let owner = SecretKey::generate();
        let bob = SecretKey::generate();
        let key = FileKey::generate();
        let file_id = FileId::new("bafy-shared").unwrap();
        let grant = ShareGrant::new(
            file_id.clone(),
            bob.public_key(),
            key.wrap_for(&bob.public_key()).unwrap(),
        );
        let record = owned_record(&owner, 4);

        let mut catalog = MockFileCatalog::new();
        catalog
            .expect_describe()
            .returning(move |_| Ok(Some(record.clone())));
        let mut grants = MockGrantStore::new();
        grants
            .expect_list()
            .returning(move |_| Ok(vec![grant.clone()]));
        grants.expect_remove().times(1).returning(|_, _| Ok(true));
        grants.expect_find().times(1).returning(|_, _| Ok(None));

        let manager = manager(
            &owner,
            &[],
            MockBlobTransport::new(),
            catalog,
            grants,
            RevocationPolicy::InvalidateGrant,
        )
        .await;

        let outcome = manager.revoke(&file_id, &bob.address()).await.unwrap();

        assert_eq!(outcome, RevokeOutcome::GrantInvalidated);
    }

    #[tokio::test]
    async fn test_rotation_restores_ciphertext_when_grants_are_rejected() {
        // Arrange
        let owner = SecretKey::generate();
        let bob = SecretKey::generate();
        let key = FileKey::generate();
        let file_id = FileId::new("bafy-shared").unwrap();
        let original = Bytes::from(key.seal(b"data").unwrap());
        let owner_cap = key.wrap_for(&owner.public_key()).unwrap();
        let grant = ShareGrant::new(
            file_id.clone(),
            bob.public_key(),
            key.wrap_for(&bob.public_key()).unwrap(),
        );
        let record = owned_record(&owner, 4);

        let mut catalog = MockFileCatalog::new();
        catalog
            .expect_describe()
            .returning(move |_| Ok(Some(record.clone())));
        let mut grants = MockGrantStore::new();
        grants
            .expect_list()
            .returning(move |_| Ok(vec![grant.clone()]));
        grants
            .expect_owner_capability()
            .returning(move |_| Ok(Some(owner_cap.clone())));
        grants
            .expect_replace_all()
            .times(1)
            .returning(|_, _| Err(TransportError::Rejected("grant set locked".to_string())));
        grants.expect_store_owner_capability().never();

        let mut transport = MockBlobTransport::new();
        let served = original.clone();
        transport
            .expect_get()
            .returning(move |_, _| Ok(served.clone()));
        let rewrites = Arc::new(Mutex::new(Vec::new()));
        let rewrites_in = Arc::clone(&rewrites);
        transport.expect_rewrite().times(2).returning(move |_, bytes| {
            rewrites_in.lock().push(bytes);
            Ok(())
        });

        let manager = manager(
            &owner,
            &[],
            transport,
            catalog,
            grants,
            RevocationPolicy::RotateKey,
        )
        .await;

        // Act
        let err = manager.revoke(&file_id, &bob.address()).await.unwrap_err();

        // Assert
        assert_eq!(err.kind(), ErrorKind::GrantRejected);
        let rewrites = rewrites.lock();
        assert_ne!(rewrites[0], original);
        assert_eq!(rewrites[1], original);
    }

    #[tokio::test]
    async fn test_revoke_requires_ownership() {
        let owner = SecretKey::generate();
        let stranger = SecretKey::generate();
        let record = owned_record(&stranger, 4);
        let mut catalog = MockFileCatalog::new();
        catalog
            .expect_describe()
            .returning(move |_| Ok(Some(record.clone())));

        let manager = manager(
            &owner,
            &[],
            MockBlobTransport::new(),
            catalog,
            MockGrantStore::new(),
            RevocationPolicy::RotateKey,
        )
        .await;

        let err = manager
            .revoke(&FileId::new("bafy-shared").unwrap(), &owner.address())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotOwner);
    }
}
