//! Use case: upload, download and delete against the blob transport.
//!
//! Content is sealed with a per-file key before it reaches the transport and
//! opened again after download; the transport only handles ciphertext.

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::dto::DownloadedFile;
use crate::application::errors::VaultError;
use crate::application::events::{Notifier, OperationKind};
use crate::application::ports::{BlobTransport, BlobUpload, FileCatalog, GrantStore, TransportError};
use crate::application::session::Session;
use crate::application::use_cases::file_locks::FileLocks;
use crate::application::use_cases::ownership::unwrap_file_key;
use crate::application::use_cases::progress::drive_with_progress;
use crate::application::use_cases::{FileRegistry, QuotaTracker};
use crate::application::validation::validate_upload_size;
use crate::domain::capability::FileKey;
use crate::domain::entities::FileRecord;
use crate::domain::value_objects::FileId;

pub struct StorageOperationPipeline {
    session: Arc<Session>,
    transport: Arc<dyn BlobTransport>,
    catalog: Arc<dyn FileCatalog>,
    grants: Arc<dyn GrantStore>,
    registry: Arc<FileRegistry>,
    quota: Arc<QuotaTracker>,
    locks: Arc<FileLocks>,
    notifier: Notifier,
    max_upload_bytes: u64,
}

impl StorageOperationPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        session: Arc<Session>,
        transport: Arc<dyn BlobTransport>,
        catalog: Arc<dyn FileCatalog>,
        grants: Arc<dyn GrantStore>,
        registry: Arc<FileRegistry>,
        quota: Arc<QuotaTracker>,
        locks: Arc<FileLocks>,
        notifier: Notifier,
        max_upload_bytes: u64,
    ) -> Self {
        Self {
            session,
            transport,
            catalog,
            grants,
            registry,
            quota,
            locks,
            notifier,
            max_upload_bytes,
        }
    }

    /// Seal and store `data`, returning the id the transport assigned.
    ///
    /// The size checks run before anything touches the transport.
    pub async fn upload(
        &self,
        data: Bytes,
        size: u64,
        cancel: &CancellationToken,
    ) -> Result<FileId, VaultError> {
        let _guard = self.notifier.begin(OperationKind::Upload);
        let result = self.upload_inner(data, size, cancel).await;
        if result.is_ok() {
            self.notifier.succeeded(OperationKind::Upload, "Upload success");
        }
        self.notifier.report(OperationKind::Upload, result)
    }

    async fn upload_inner(
        &self,
        data: Bytes,
        size: u64,
        cancel: &CancellationToken,
    ) -> Result<FileId, VaultError> {
        validate_upload_size(size, data.len(), self.max_upload_bytes)?;
        self.session.ensure_connected()?;

        let started_at = Utc::now();
        let key = FileKey::generate();
        let ciphertext = Bytes::from(key.seal(&data)?);
        let owner_capability = key.wrap_for(&self.session.public_key())?;

        let upload = BlobUpload {
            ciphertext,
            size,
            created_at: started_at,
        };
        let transport = Arc::clone(&self.transport);
        let file_id = drive_with_progress(&self.notifier, OperationKind::Upload, cancel, |progress| {
            async move {
                transport
                    .put(upload, progress)
                    .await
                    .map_err(VaultError::from_transport)
            }
        })
        .await?;

        if let Err(e) = self
            .grants
            .store_owner_capability(&file_id, &owner_capability)
            .await
        {
            // Without an owner capability the blob is unreadable, so drop it
            if let Err(cleanup) = self.transport.delete(&file_id).await {
                warn!(file_id = %file_id, error = %cleanup, "Failed to delete blob after capability write failed");
            }
            return Err(VaultError::from_transport(e));
        }

        let record = FileRecord::new(file_id.clone(), self.session.address(), size, started_at);
        self.registry.add(record);
        self.quota.refresh_after(OperationKind::Upload).await;

        info!(file_id = %file_id, size, "File uploaded");
        Ok(file_id)
    }

    /// Fetch and open a file the caller owns or holds a grant for
    pub async fn download(
        &self,
        file_id: &FileId,
        cancel: &CancellationToken,
    ) -> Result<DownloadedFile, VaultError> {
        let _guard = self.notifier.begin(OperationKind::Download);
        let result = self.download_inner(file_id, cancel).await;
        if result.is_ok() {
            self.notifier
                .succeeded(OperationKind::Download, "Download success");
        }
        self.notifier.report(OperationKind::Download, result)
    }

    async fn download_inner(
        &self,
        file_id: &FileId,
        cancel: &CancellationToken,
    ) -> Result<DownloadedFile, VaultError> {
        self.session.ensure_connected()?;
        let record = self
            .catalog
            .describe(file_id)
            .await?
            .ok_or_else(|| VaultError::NotFound(file_id.to_string()))?;

        let key =
            unwrap_file_key(self.grants.as_ref(), self.session.wallet().as_ref(), &record).await?;

        let transport = Arc::clone(&self.transport);
        let ciphertext =
            drive_with_progress(&self.notifier, OperationKind::Download, cancel, |progress| {
                async move {
                    transport
                        .get(file_id, progress)
                        .await
                        .map_err(VaultError::from_transport)
                }
            })
            .await?;

        let plaintext = key.open(&ciphertext)?;
        if plaintext.len() as u64 != record.size() {
            return Err(VaultError::TransportFailure(format!(
                "file {} delivered {} bytes, expected {}",
                file_id,
                plaintext.len(),
                record.size()
            )));
        }

        self.quota.refresh_after(OperationKind::Download).await;

        info!(file_id = %file_id, size = record.size(), "File downloaded");
        Ok(DownloadedFile {
            record,
            data: Bytes::from(plaintext),
        })
    }

    /// Delete an owned file together with every grant issued for it
    pub async fn remove(&self, file_id: &FileId) -> Result<(), VaultError> {
        let _guard = self.notifier.begin(OperationKind::Delete);
        let result = self.remove_inner(file_id).await;
        if result.is_ok() {
            self.notifier.succeeded(OperationKind::Delete, "Delete success");
        }
        self.notifier.report(OperationKind::Delete, result)
    }

    async fn remove_inner(&self, file_id: &FileId) -> Result<(), VaultError> {
        self.session.ensure_connected()?;
        let _lock = self.locks.acquire(file_id).await;

        let caller = self.session.address();
        let record = match self.catalog.describe(file_id).await? {
            Some(record) => record,
            None if self.registry.was_deleted(file_id) => {
                debug!(file_id = %file_id, "File already removed, clearing leftover grants");
                self.clear_grants(file_id).await?;
                return Ok(());
            }
            None => return Err(VaultError::NotOwner(file_id.clone())),
        };
        if !record.is_owned_by(&caller) {
            return Err(VaultError::NotOwner(file_id.clone()));
        }

        self.transport
            .delete(file_id)
            .await
            .map_err(VaultError::from_transport)?;
        self.registry.record_deletion(file_id);
        self.clear_grants(file_id).await?;
        self.locks.forget(file_id);
        self.quota.refresh_after(OperationKind::Delete).await;

        info!(file_id = %file_id, "File deleted");
        Ok(())
    }

    /// Grants die with the file. The transport cascades on delete; this
    /// covers a transport that left some behind.
    async fn clear_grants(&self, file_id: &FileId) -> Result<(), VaultError> {
        match self.grants.remove_all(file_id).await {
            Ok(()) | Err(TransportError::NotFound(_)) => Ok(()),
            Err(e) => Err(VaultError::grant_rejected(e)),
        }
    }

    /// Reload the caller's owned files from the catalog
    pub async fn fetch_my_files(&self) -> Result<Vec<FileRecord>, VaultError> {
        let _guard = self.notifier.begin(OperationKind::FetchMyFiles);
        let result = async {
            self.session.ensure_connected()?;
            let records = self.catalog.list_owned().await?;
            self.registry.replace_mine(records);
            Ok::<_, VaultError>(self.registry.list_mine())
        }
        .await;
        self.notifier.report(OperationKind::FetchMyFiles, result)
    }

    /// Reload the files other identities shared with the caller
    pub async fn fetch_shared_files(&self) -> Result<Vec<FileRecord>, VaultError> {
        let _guard = self.notifier.begin(OperationKind::FetchSharedFiles);
        let result = async {
            self.session.ensure_connected()?;
            let records = self.catalog.list_shared().await?;
            self.registry.replace_shared(records);
            Ok::<_, VaultError>(self.registry.list_shared_with_me())
        }
        .await;
        self.notifier.report(OperationKind::FetchSharedFiles, result)
    }
}
