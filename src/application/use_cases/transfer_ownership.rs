//! Use case: move ownership of a file to another identity as one unit.
//!
//! All capability and grant edits are made while the caller still owns the
//! file; the catalog owner reassignment is the commit point. Anything that
//! fails before the commit is undone, so the file never ends up with two
//! owners or none.
//!
//! When third-party grants are dropped on transfer the file is re-encrypted
//! under a fresh key first, so capabilities issued before the transfer stop
//! opening the stored ciphertext.

use std::sync::Arc;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::application::dto::TransferReceipt;
use crate::application::errors::VaultError;
use crate::application::events::{Notifier, OperationKind, StorageEvent};
use crate::application::ports::{BlobTransport, FileCatalog, GrantStore};
use crate::application::session::Session;
use crate::application::use_cases::file_locks::FileLocks;
use crate::application::use_cases::ownership::{require_owned, unwrap_file_key};
use crate::application::use_cases::progress::drive_with_progress;
use crate::application::use_cases::{FileRegistry, IdentityResolver, QuotaTracker};
use crate::application::validation::parse_identifier;
use crate::config::GrantTransferPolicy;
use crate::domain::capability::{FileKey, WrappedCapability};
use crate::domain::entities::{FileRecord, ShareGrant};
use crate::domain::value_objects::{Address, FileId};

pub struct TransferCoordinator {
    session: Arc<Session>,
    resolver: Arc<IdentityResolver>,
    catalog: Arc<dyn FileCatalog>,
    grants: Arc<dyn GrantStore>,
    transport: Arc<dyn BlobTransport>,
    registry: Arc<FileRegistry>,
    quota: Arc<QuotaTracker>,
    locks: Arc<FileLocks>,
    notifier: Notifier,
    policy: GrantTransferPolicy,
}

/// Pre-transfer state needed to undo the capability and grant edits
struct TransferSnapshot {
    owner_capability: WrappedCapability,
    grants: Vec<ShareGrant>,
    /// Set when the file is re-keyed as part of the transfer
    ciphertext: Option<Bytes>,
}

/// The file re-sealed under a fresh key, ready to replace the stored blob
struct Rekey {
    key: FileKey,
    ciphertext: Bytes,
    original: Bytes,
}

impl TransferCoordinator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        session: Arc<Session>,
        resolver: Arc<IdentityResolver>,
        catalog: Arc<dyn FileCatalog>,
        grants: Arc<dyn GrantStore>,
        transport: Arc<dyn BlobTransport>,
        registry: Arc<FileRegistry>,
        quota: Arc<QuotaTracker>,
        locks: Arc<FileLocks>,
        notifier: Notifier,
        policy: GrantTransferPolicy,
    ) -> Self {
        Self {
            session,
            resolver,
            catalog,
            grants,
            transport,
            registry,
            quota,
            locks,
            notifier,
            policy,
        }
    }

    pub async fn transfer_ownership(
        &self,
        file_id: &FileId,
        identifier: &str,
    ) -> Result<TransferReceipt, VaultError> {
        let _guard = self.notifier.begin(OperationKind::Transfer);
        let result = self.transfer_inner(file_id, identifier).await;
        if let Ok(receipt) = &result {
            self.notifier.emit(StorageEvent::FileTransferred {
                file_id: receipt.file_id.clone(),
                new_owner: receipt.new_owner.clone(),
            });
            self.notifier.succeeded(
                OperationKind::Transfer,
                format!("Transferred file ownership to {}", identifier.trim()),
            );
        }
        self.notifier.report(OperationKind::Transfer, result)
    }

    async fn transfer_inner(
        &self,
        file_id: &FileId,
        identifier: &str,
    ) -> Result<TransferReceipt, VaultError> {
        self.session.ensure_connected()?;
        let identifier = parse_identifier(identifier)?;
        let recipient = self.resolver.resolve(&identifier).await?;

        let caller = self.session.address();
        if recipient.address == caller {
            return Err(VaultError::AlreadyOwnerOrSelfShare(recipient.address));
        }

        let _lock = self.locks.acquire(file_id).await;
        let record = require_owned(self.catalog.as_ref(), file_id, &caller).await?;

        let key =
            unwrap_file_key(self.grants.as_ref(), self.session.wallet().as_ref(), &record).await?;
        let rekey = match self.policy {
            GrantTransferPolicy::Preserve => None,
            GrantTransferPolicy::Revoke => Some(self.prepare_rekey(file_id, &key).await?),
        };
        let handover_key = rekey.as_ref().map_or(&key, |rekey| &rekey.key);
        let new_owner_capability = handover_key.wrap_for(&recipient.public_key)?;

        let snapshot = TransferSnapshot {
            owner_capability: self
                .grants
                .owner_capability(file_id)
                .await?
                .ok_or_else(|| {
                    VaultError::AccessDenied(format!("no owner capability for {file_id}"))
                })?,
            grants: self.grants.list(file_id).await?,
            ciphertext: rekey.as_ref().map(|rekey| rekey.original.clone()),
        };

        if let Err(e) = self
            .stage(
                &record,
                &caller,
                &recipient.address,
                &new_owner_capability,
                rekey.as_ref(),
                &snapshot,
            )
            .await
        {
            return Err(self.roll_back(file_id, &snapshot, e).await);
        }

        if let Err(e) = self.catalog.reassign_owner(file_id, &recipient.address).await {
            let e = VaultError::from_transport(e);
            // The call may have landed even though it reported failure
            match self.catalog.describe(file_id).await {
                Ok(Some(current)) if current.is_owned_by(&recipient.address) => {
                    warn!(file_id = %file_id, error = %e, "Owner reassignment reported failure but took effect");
                }
                Ok(Some(current)) if current.is_owned_by(&caller) => {
                    return Err(self.roll_back(file_id, &snapshot, e).await);
                }
                Ok(None) => {
                    // No longer visible to the caller, so the caller is not the owner
                    warn!(file_id = %file_id, error = %e, "File no longer visible after failed reassignment");
                }
                Ok(Some(current)) => {
                    error!(file_id = %file_id, owner = %current.owner(), "File owned by an unexpected address after failed reassignment");
                    return Err(VaultError::RollbackFailed {
                        operation_error: e.to_string(),
                        rollback_error: format!("unexpected owner {}", current.owner()),
                    });
                }
                Err(probe) => {
                    error!(file_id = %file_id, error = %probe, "Cannot determine owner after failed reassignment");
                    return Err(VaultError::RollbackFailed {
                        operation_error: e.to_string(),
                        rollback_error: probe.to_string(),
                    });
                }
            }
        }

        self.registry.remove(file_id);
        self.quota.refresh_after(OperationKind::Transfer).await;

        let retained_grants = match self.policy {
            GrantTransferPolicy::Preserve => snapshot
                .grants
                .iter()
                .filter(|g| g.grantee != caller && g.grantee != recipient.address)
                .count(),
            GrantTransferPolicy::Revoke => 0,
        };

        info!(
            file_id = %file_id,
            previous_owner = %caller,
            new_owner = %recipient.address,
            retained_grants,
            "File ownership transferred"
        );

        Ok(TransferReceipt {
            file_id: file_id.clone(),
            previous_owner: caller,
            new_owner: recipient.address,
            retained_grants,
        })
    }

    /// Grant and capability edits made before the commit point
    async fn stage(
        &self,
        record: &FileRecord,
        caller: &Address,
        new_owner: &Address,
        new_owner_capability: &WrappedCapability,
        rekey: Option<&Rekey>,
        snapshot: &TransferSnapshot,
    ) -> Result<(), VaultError> {
        let file_id = record.id();

        match self.policy {
            GrantTransferPolicy::Revoke => {
                if !snapshot.grants.is_empty() {
                    self.grants
                        .remove_all(file_id)
                        .await
                        .map_err(VaultError::grant_rejected)?;
                }
                if let Some(rekey) = rekey {
                    self.transport
                        .rewrite(file_id, rekey.ciphertext.clone())
                        .await
                        .map_err(VaultError::from_transport)?;
                }
            }
            GrantTransferPolicy::Preserve => {
                // Owners hold the owner capability, never a grant
                for stale in snapshot
                    .grants
                    .iter()
                    .filter(|g| &g.grantee == new_owner || &g.grantee == caller)
                {
                    self.grants
                        .remove(file_id, &stale.grantee)
                        .await
                        .map_err(VaultError::grant_rejected)?;
                }
            }
        }

        self.grants
            .store_owner_capability(file_id, new_owner_capability)
            .await
            .map_err(VaultError::grant_rejected)?;

        Ok(())
    }

    /// Re-seal the file under a fresh key. Nothing is written yet.
    async fn prepare_rekey(&self, file_id: &FileId, key: &FileKey) -> Result<Rekey, VaultError> {
        let transport = Arc::clone(&self.transport);
        let original = drive_with_progress(
            &self.notifier,
            OperationKind::Transfer,
            &CancellationToken::new(),
            |progress| async move {
                transport
                    .get(file_id, progress)
                    .await
                    .map_err(VaultError::from_transport)
            },
        )
        .await?;

        let plaintext = key.open(&original)?;
        let fresh = FileKey::generate();
        let ciphertext = Bytes::from(fresh.seal(&plaintext)?);
        Ok(Rekey {
            key: fresh,
            ciphertext,
            original,
        })
    }

    async fn roll_back(
        &self,
        file_id: &FileId,
        snapshot: &TransferSnapshot,
        cause: VaultError,
    ) -> VaultError {
        let restored = async {
            if let Some(ciphertext) = &snapshot.ciphertext {
                self.transport.rewrite(file_id, ciphertext.clone()).await?;
            }
            self.grants
                .store_owner_capability(file_id, &snapshot.owner_capability)
                .await?;
            self.grants
                .replace_all(file_id, snapshot.grants.clone())
                .await
        }
        .await;

        match restored {
            Ok(()) => {
                warn!(file_id = %file_id, error = %cause, "Transfer aborted and rolled back");
                cause
            }
            Err(e) => {
                error!(file_id = %file_id, error = %e, "Failed to roll back aborted transfer");
                VaultError::RollbackFailed {
                    operation_error: cause.to_string(),
                    rollback_error: e.to_string(),
                }
            }
        }
    }
}
