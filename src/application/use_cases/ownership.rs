use crate::application::errors::VaultError;
use crate::application::ports::{FileCatalog, GrantStore, Wallet};
use crate::domain::capability::FileKey;
use crate::domain::entities::FileRecord;
use crate::domain::value_objects::{Address, FileId};

/// Load a file record and require that `caller` owns it
pub(crate) async fn require_owned(
    catalog: &dyn FileCatalog,
    file_id: &FileId,
    caller: &Address,
) -> Result<FileRecord, VaultError> {
    match catalog.describe(file_id).await? {
        None => Err(VaultError::NotFound(file_id.to_string())),
        Some(record) if !record.is_owned_by(caller) => Err(VaultError::NotOwner(file_id.clone())),
        Some(record) => Ok(record),
    }
}

/// Recover the file key through whichever capability the caller holds:
/// the owner capability when it owns the file, its grant otherwise.
pub(crate) async fn unwrap_file_key(
    grants: &dyn GrantStore,
    wallet: &dyn Wallet,
    record: &FileRecord,
) -> Result<FileKey, VaultError> {
    let caller = wallet.address();
    let wrapped = if record.is_owned_by(&caller) {
        grants.owner_capability(record.id()).await?
    } else {
        grants
            .find(record.id(), &caller)
            .await?
            .map(|grant| grant.capability)
    };

    let wrapped = wrapped.ok_or_else(|| {
        VaultError::AccessDenied(format!("no capability for {} held by {}", record.id(), caller))
    })?;

    Ok(wallet.unwrap_capability(&wrapped).await?)
}
