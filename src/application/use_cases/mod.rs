mod access_grants;
mod file_locks;
mod file_registry;
mod identity_resolver;
mod ownership;
mod progress;
mod quota_tracker;
mod storage_pipeline;
mod transfer_ownership;

#[cfg(test)]
pub(crate) mod test_support;

pub use access_grants::AccessGrantManager;
pub use file_locks::FileLocks;
pub use file_registry::FileRegistry;
pub use identity_resolver::IdentityResolver;
pub use quota_tracker::QuotaTracker;
pub use storage_pipeline::StorageOperationPipeline;
pub use transfer_ownership::TransferCoordinator;
