mod blob_transport;
mod file_catalog;
mod grant_store;
mod identity_directory;
mod notification_sink;
mod quota_source;
mod wallet;

pub use blob_transport::{
    BlobTransport, BlobUpload, ProgressSender, SessionContext, TransportError,
};
pub use file_catalog::FileCatalog;
pub use grant_store::GrantStore;
pub use identity_directory::{DirectoryError, IdentityDirectory};
pub use notification_sink::NotificationSink;
pub use quota_source::QuotaSource;
pub use wallet::{Wallet, WalletError};

#[cfg(test)]
pub use blob_transport::MockBlobTransport;
#[cfg(test)]
pub use file_catalog::MockFileCatalog;
#[cfg(test)]
pub use grant_store::MockGrantStore;
#[cfg(test)]
pub use identity_directory::MockIdentityDirectory;
#[cfg(test)]
pub use notification_sink::MockNotificationSink;
#[cfg(test)]
pub use quota_source::MockQuotaSource;
#[cfg(test)]
pub use wallet::MockWallet;
