//! Operation events delivered to the [`NotificationSink`].
//!
//! Every user-facing operation follows the same shape: an [`OperationGuard`]
//! announces that it started and, on drop, that it finished, so an
//! "operation in progress" indicator is released on every exit path including
//! early returns and cancellation. Progress and the final success or failure
//! message are emitted in between.

use std::sync::Arc;

use serde::Serialize;

use crate::application::errors::VaultError;
use crate::application::ports::NotificationSink;
use crate::domain::value_objects::{Address, FileId, QuotaSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    InitStorage,
    FetchStorageLimits,
    FetchMyFiles,
    FetchSharedFiles,
    Upload,
    Download,
    Delete,
    Share,
    ListGrantees,
    Revoke,
    Transfer,
}

impl OperationKind {
    /// Label shown while the operation is running
    pub fn label(&self) -> &'static str {
        match self {
            OperationKind::InitStorage => "Connecting to storage",
            OperationKind::FetchStorageLimits => "Fetching storage limits",
            OperationKind::FetchMyFiles => "Fetching files",
            OperationKind::FetchSharedFiles => "Fetching shared files",
            OperationKind::Upload => "Uploading file",
            OperationKind::Download => "Downloading file",
            OperationKind::Delete => "Deleting file",
            OperationKind::Share => "Sharing file",
            OperationKind::ListGrantees => "Fetch shared users",
            OperationKind::Revoke => "Revoking file access",
            OperationKind::Transfer => "Transferring file",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OperationKind::InitStorage => "init_storage",
            OperationKind::FetchStorageLimits => "fetch_storage_limits",
            OperationKind::FetchMyFiles => "fetch_my_files",
            OperationKind::FetchSharedFiles => "fetch_shared_files",
            OperationKind::Upload => "upload",
            OperationKind::Download => "download",
            OperationKind::Delete => "delete",
            OperationKind::Share => "share",
            OperationKind::ListGrantees => "list_grantees",
            OperationKind::Revoke => "revoke",
            OperationKind::Transfer => "transfer",
        };
        f.write_str(name)
    }
}

/// Advisory progress of a blob transfer, in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransferProgress {
    pub transferred: u64,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StorageEvent {
    Started {
        operation: OperationKind,
        label: String,
    },
    Progress {
        operation: OperationKind,
        transferred: u64,
        total: u64,
    },
    Finished {
        operation: OperationKind,
    },
    Succeeded {
        operation: OperationKind,
        message: String,
    },
    Failed {
        operation: OperationKind,
        message: String,
    },
    QuotaUpdated(QuotaSnapshot),
    FileTransferred {
        file_id: FileId,
        new_owner: Address,
    },
}

/// Cheap handle around the sink with the emit helpers operations share
#[derive(Clone)]
pub struct Notifier {
    sink: Arc<dyn NotificationSink>,
}

impl Notifier {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    pub fn emit(&self, event: StorageEvent) {
        self.sink.notify(&event);
    }

    /// Mark `operation` as in progress until the returned guard drops
    pub fn begin(&self, operation: OperationKind) -> OperationGuard {
        self.emit(StorageEvent::Started {
            operation,
            label: operation.label().to_string(),
        });
        OperationGuard {
            notifier: self.clone(),
            operation,
        }
    }

    pub fn progress(&self, operation: OperationKind, progress: TransferProgress) {
        self.emit(StorageEvent::Progress {
            operation,
            transferred: progress.transferred,
            total: progress.total,
        });
    }

    pub fn succeeded(&self, operation: OperationKind, message: impl Into<String>) {
        self.emit(StorageEvent::Succeeded {
            operation,
            message: message.into(),
        });
    }

    pub fn failed(&self, operation: OperationKind, error: &VaultError) {
        tracing::error!(%operation, error = %error, "Operation failed");
        self.emit(StorageEvent::Failed {
            operation,
            message: error.user_message(),
        });
    }

    /// Emit the failure event for `result` if it is an error, then hand it back
    pub fn report<T>(
        &self,
        operation: OperationKind,
        result: Result<T, VaultError>,
    ) -> Result<T, VaultError> {
        if let Err(e) = &result {
            self.failed(operation, e);
        }
        result
    }
}

/// Scoped "operation in progress" marker; emits `Finished` on drop
pub struct OperationGuard {
    notifier: Notifier,
    operation: OperationKind,
}

impl Drop for OperationGuard {
    fn drop(&mut self) {
        self.notifier.emit(StorageEvent::Finished {
            operation: self.operation,
        });
    }
}
