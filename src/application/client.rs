//! The caller-facing storage service.
//!
//! [`StorageClient`] is an explicitly constructed handle (see
//! [`StorageClientBuilder`](crate::application::builder::StorageClientBuilder))
//! that fans the public operations out to the use cases. It holds no state of
//! its own beyond the shared pieces the use cases were built with.

use std::sync::Arc;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use crate::application::dto::{DownloadedFile, RevokeOutcome, TransferReceipt};
use crate::application::errors::VaultError;
use crate::application::events::{Notifier, OperationKind};
use crate::application::session::Session;
use crate::application::use_cases::{
    AccessGrantManager, FileRegistry, QuotaTracker, StorageOperationPipeline, TransferCoordinator,
};
use crate::config::Config;
use crate::domain::entities::{FileRecord, ShareGrant};
use crate::domain::value_objects::{Address, FileId, QuotaSnapshot};

pub struct StorageClient {
    pub(crate) config: Config,
    pub(crate) session: Arc<Session>,
    pub(crate) registry: Arc<FileRegistry>,
    pub(crate) quota: Arc<QuotaTracker>,
    pub(crate) pipeline: StorageOperationPipeline,
    pub(crate) access: AccessGrantManager,
    pub(crate) transfers: TransferCoordinator,
    pub(crate) notifier: Notifier,
}

impl StorageClient {
    /// Bind the transport session to the wallet identity.
    ///
    /// Must succeed before any other operation.
    pub async fn init_storage(&self) -> Result<(), VaultError> {
        let _guard = self.notifier.begin(OperationKind::InitStorage);
        let result = self.session.connect().await;
        self.notifier.report(OperationKind::InitStorage, result)
    }

    pub async fn fetch_storage_limits(&self) -> Result<QuotaSnapshot, VaultError> {
        let _guard = self.notifier.begin(OperationKind::FetchStorageLimits);
        let result = match self.session.ensure_connected() {
            Ok(()) => self.quota.refresh().await,
            Err(e) => Err(e),
        };
        self.notifier
            .report(OperationKind::FetchStorageLimits, result)
    }

    pub async fn fetch_my_files(&self) -> Result<Vec<FileRecord>, VaultError> {
        self.pipeline.fetch_my_files().await
    }

    pub async fn fetch_shared_files(&self) -> Result<Vec<FileRecord>, VaultError> {
        self.pipeline.fetch_shared_files().await
    }

    pub async fn upload(&self, data: Bytes, size: u64) -> Result<FileId, VaultError> {
        self.pipeline
            .upload(data, size, &CancellationToken::new())
            .await
    }

    /// [`upload`](Self::upload) that stops with `Cancelled` once `cancel` fires
    pub async fn upload_with_cancel(
        &self,
        data: Bytes,
        size: u64,
        cancel: &CancellationToken,
    ) -> Result<FileId, VaultError> {
        self.pipeline.upload(data, size, cancel).await
    }

    pub async fn download(&self, file_id: &FileId) -> Result<DownloadedFile, VaultError> {
        self.pipeline
            .download(file_id, &CancellationToken::new())
            .await
    }

    pub async fn download_with_cancel(
        &self,
        file_id: &FileId,
        cancel: &CancellationToken,
    ) -> Result<DownloadedFile, VaultError> {
        self.pipeline.download(file_id, cancel).await
    }

    pub async fn remove(&self, file_id: &FileId) -> Result<(), VaultError> {
        self.pipeline.remove(file_id).await
    }

    pub async fn share(&self, file_id: &FileId, identifier: &str) -> Result<ShareGrant, VaultError> {
        self.access.share(file_id, identifier).await
    }

    pub async fn get_shared_users(&self, file_id: &FileId) -> Result<Vec<Address>, VaultError> {
        self.access.list_grantees(file_id).await
    }

    pub async fn revoke(
        &self,
        file_id: &FileId,
        address: &Address,
    ) -> Result<RevokeOutcome, VaultError> {
        self.access.revoke(file_id, address).await
    }

    pub async fn change_file_owner(
        &self,
        file_id: &FileId,
        identifier: &str,
    ) -> Result<TransferReceipt, VaultError> {
        self.transfers.transfer_ownership(file_id, identifier).await
    }

    /// Owned files as last seen by this client, without a catalog round trip
    pub fn my_files(&self) -> Vec<FileRecord> {
        self.registry.list_mine()
    }

    pub fn shared_files(&self) -> Vec<FileRecord> {
        self.registry.list_shared_with_me()
    }

    /// Last successfully fetched quota, if any
    pub fn storage_limits(&self) -> Option<QuotaSnapshot> {
        self.quota.snapshot()
    }

    pub fn address(&self) -> Address {
        self.session.address()
    }

    pub fn is_initialized(&self) -> bool {
        self.session.is_connected()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
