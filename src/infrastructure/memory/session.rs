use std::collections::BTreeMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use tracing::debug;

use super::faults::FaultPoint;
use super::network::{NetworkShared, StoredBlob, CHUNK_SIZE};
use crate::application::events::TransferProgress;
use crate::application::ports::{
    BlobTransport, BlobUpload, FileCatalog, GrantStore, ProgressSender, QuotaSource,
    SessionContext, TransportError,
};
use crate::domain::capability::WrappedCapability;
use crate::domain::entities::{FileRecord, ShareGrant};
use crate::domain::value_objects::{Address, FileId, QuotaSnapshot};

/// One caller's connection to the [`InMemoryNetwork`](super::InMemoryNetwork).
///
/// Implements every storage-side port. Calls before `connect` are refused.
pub struct NetworkSession {
    shared: Arc<NetworkShared>,
    bound: RwLock<Option<SessionContext>>,
}

fn injected(point: FaultPoint) -> TransportError {
    TransportError::Unavailable(format!("injected fault at {point:?}"))
}

fn not_found(file_id: &FileId) -> TransportError {
    TransportError::NotFound(format!("file {file_id}"))
}

fn not_owner(file_id: &FileId) -> TransportError {
    TransportError::AccessDenied(format!("caller does not own {file_id}"))
}

impl NetworkSession {
    pub(crate) fn new(shared: Arc<NetworkShared>) -> Self {
        Self {
            shared,
            bound: RwLock::new(None),
        }
    }

    fn caller(&self) -> Result<Address, TransportError> {
        self.bound
            .read()
            .as_ref()
            .map(|context| context.address.clone())
            .ok_or_else(|| TransportError::AccessDenied("session not connected".to_string()))
    }

    fn check_fault(&self, point: FaultPoint) -> Result<(), TransportError> {
        if self.shared.faults.trip(point) {
            debug!(?point, "Injecting transport fault");
            return Err(injected(point));
        }
        Ok(())
    }

    /// Run `f` against a blob the caller owns
    fn with_owned<T>(
        &self,
        file_id: &FileId,
        f: impl FnOnce(&mut StoredBlob) -> T,
    ) -> Result<T, TransportError> {
        let caller = self.caller()?;
        let mut state = self.shared.state.lock();
        let blob = state.blobs.get_mut(file_id).ok_or_else(|| not_found(file_id))?;
        if blob.owner != caller {
            return Err(not_owner(file_id));
        }
        Ok(f(blob))
    }

    async fn report_chunks(&self, total: usize, progress: ProgressSender) {
        let total_u64 = total as u64;
        if total == 0 {
            let _ = progress.send(TransferProgress {
                transferred: 0,
                total: 0,
            });
            return;
        }

        let mut transferred = 0;
        while transferred < total {
            if let Some(delay) = self.shared.chunk_delay {
                tokio::time::sleep(delay).await;
            }
            transferred = (transferred + CHUNK_SIZE).min(total);
            // The receiver may be gone if the operation was abandoned
            let _ = progress.send(TransferProgress {
                transferred: transferred as u64,
                total: total_u64,
            });
        }
    }
}

#[async_trait]
impl BlobTransport for NetworkSession {
    async fn connect(&self, session: &SessionContext) -> Result<(), TransportError> {
        *self.bound.write() = Some(session.clone());
        debug!(address = %session.address, "Network session bound");
        Ok(())
    }

    async fn put(
        &self,
        upload: BlobUpload,
        progress: ProgressSender,
    ) -> Result<FileId, TransportError> {
        let caller = self.caller()?;
        self.shared.calls.put.fetch_add(1, Ordering::SeqCst);
        self.check_fault(FaultPoint::Put)?;

        {
            let state = self.shared.state.lock();
            let used = state.storage_used_by(&caller);
            if used + upload.size > self.shared.limits.total_storage {
                return Err(TransportError::Rejected(format!(
                    "storage allowance exceeded: {} + {} > {}",
                    used, upload.size, self.shared.limits.total_storage
                )));
            }
        }

        self.report_chunks(upload.ciphertext.len(), progress).await;

        let mut state = self.shared.state.lock();
        let file_id = state.assign_id(&upload.ciphertext)?;
        state.blobs.insert(
            file_id.clone(),
            StoredBlob {
                ciphertext: upload.ciphertext,
                owner: caller,
                size: upload.size,
                created_at: upload.created_at,
                owner_capability: None,
                grants: BTreeMap::new(),
            },
        );
        Ok(file_id)
    }

    async fn get(&self, file_id: &FileId, progress: ProgressSender) -> Result<Bytes, TransportError> {
        let caller = self.caller()?;
        self.shared.calls.get.fetch_add(1, Ordering::SeqCst);
        self.check_fault(FaultPoint::Get)?;

        let (ciphertext, size) = {
            let state = self.shared.state.lock();
            let blob = state.blobs.get(file_id).ok_or_else(|| not_found(file_id))?;
            if !blob.readable_by(&caller) {
                return Err(TransportError::AccessDenied(format!(
                    "{caller} holds no grant for {file_id}"
                )));
            }
            (blob.ciphertext.clone(), blob.size)
        };

        self.report_chunks(ciphertext.len(), progress).await;

        *self
            .shared
            .state
            .lock()
            .bandwidth_used
            .entry(caller)
            .or_insert(0) += size;
        Ok(ciphertext)
    }

    async fn rewrite(&self, file_id: &FileId, ciphertext: Bytes) -> Result<(), TransportError> {
        self.check_fault(FaultPoint::Rewrite)?;
        self.with_owned(file_id, |blob| blob.ciphertext = ciphertext)
    }

    async fn delete(&self, file_id: &FileId) -> Result<(), TransportError> {
        self.check_fault(FaultPoint::Delete)?;
        self.with_owned(file_id, |_| ())?;
        // Grants and the owner capability go with the blob
        self.shared.state.lock().blobs.remove(file_id);
        Ok(())
    }
}

#[async_trait]
impl FileCatalog for NetworkSession {
    async fn describe(&self, file_id: &FileId) -> Result<Option<FileRecord>, TransportError> {
        let caller = self.caller()?;
        self.check_fault(FaultPoint::Describe)?;
        let state = self.shared.state.lock();
        Ok(state
            .blobs
            .get(file_id)
            .filter(|blob| blob.readable_by(&caller))
            .map(|blob| blob.record(file_id)))
    }

    async fn list_owned(&self) -> Result<Vec<FileRecord>, TransportError> {
        let caller = self.caller()?;
        let state = self.shared.state.lock();
        let mut records: Vec<FileRecord> = state
            .blobs
            .iter()
            .filter(|(_, blob)| blob.owner == caller)
            .map(|(id, blob)| blob.record(id))
            .collect();
        records.sort_by_key(|record| record.created_at());
        Ok(records)
    }

    async fn list_shared(&self) -> Result<Vec<FileRecord>, TransportError> {
        let caller = self.caller()?;
        let state = self.shared.state.lock();
        let mut records: Vec<FileRecord> = state
            .blobs
            .iter()
            .filter(|(_, blob)| blob.grants.contains_key(&caller))
            .map(|(id, blob)| blob.record(id))
            .collect();
        records.sort_by_key(|record| record.created_at());
        Ok(records)
    }

    async fn reassign_owner(
        &self,
        file_id: &FileId,
        new_owner: &Address,
    ) -> Result<(), TransportError> {
        self.check_fault(FaultPoint::ReassignOwner)?;
        self.with_owned(file_id, |blob| blob.owner = new_owner.clone())?;
        self.check_fault(FaultPoint::ReassignOwnerLostResponse)
    }
}

#[async_trait]
impl GrantStore for NetworkSession {
    async fn upsert(&self, grant: &ShareGrant) -> Result<(), TransportError> {
        self.check_fault(FaultPoint::UpsertGrant)?;
        self.with_owned(&grant.file_id, |blob| {
            if blob.owner == grant.grantee {
                return Err(TransportError::Rejected(
                    "owner cannot hold a grant on its own file".to_string(),
                ));
            }
            blob.grants.insert(grant.grantee.clone(), grant.clone());
            Ok(())
        })?
    }

    async fn find(
        &self,
        file_id: &FileId,
        grantee: &Address,
    ) -> Result<Option<ShareGrant>, TransportError> {
        let caller = self.caller()?;
        let state = self.shared.state.lock();
        let Some(blob) = state.blobs.get(file_id) else {
            return Ok(None);
        };
        if blob.owner != caller && &caller != grantee {
            return Err(not_owner(file_id));
        }
        Ok(blob.grants.get(grantee).cloned())
    }

    async fn list(&self, file_id: &FileId) -> Result<Vec<ShareGrant>, TransportError> {
        self.with_owned(file_id, |blob| blob.grants.values().cloned().collect())
    }

    async fn remove(&self, file_id: &FileId, grantee: &Address) -> Result<bool, TransportError> {
        self.check_fault(FaultPoint::RemoveGrant)?;
        self.with_owned(file_id, |blob| blob.grants.remove(grantee).is_some())
    }

    async fn remove_all(&self, file_id: &FileId) -> Result<(), TransportError> {
        self.check_fault(FaultPoint::RemoveGrant)?;
        self.with_owned(file_id, |blob| blob.grants.clear())
    }

    async fn replace_all(
        &self,
        file_id: &FileId,
        grants: Vec<ShareGrant>,
    ) -> Result<(), TransportError> {
        self.check_fault(FaultPoint::ReplaceGrants)?;
        if grants.iter().any(|grant| &grant.file_id != file_id) {
            return Err(TransportError::Rejected(
                "grant set refers to another file".to_string(),
            ));
        }
        self.with_owned(file_id, |blob| {
            blob.grants = grants
                .into_iter()
                .map(|grant| (grant.grantee.clone(), grant))
                .collect();
        })
    }

    async fn owner_capability(
        &self,
        file_id: &FileId,
    ) -> Result<Option<WrappedCapability>, TransportError> {
        self.with_owned(file_id, |blob| blob.owner_capability.clone())
    }

    async fn store_owner_capability(
        &self,
        file_id: &FileId,
        capability: &WrappedCapability,
    ) -> Result<(), TransportError> {
        self.check_fault(FaultPoint::StoreOwnerCapability)?;
        self.with_owned(file_id, |blob| {
            blob.owner_capability = Some(capability.clone())
        })
    }
}

#[async_trait]
impl QuotaSource for NetworkSession {
    async fn usage(&self) -> Result<QuotaSnapshot, TransportError> {
        let caller = self.caller()?;
        self.check_fault(FaultPoint::Usage)?;
        let state = self.shared.state.lock();
        let limits = self.shared.limits;
        Ok(QuotaSnapshot::new(
            state.storage_used_by(&caller),
            limits.total_storage,
            state.bandwidth_used.get(&caller).copied().unwrap_or(0),
            limits.total_bandwidth,
        ))
    }
}
