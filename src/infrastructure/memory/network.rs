use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use super::faults::FaultInjector;
use super::session::NetworkSession;
use crate::application::ports::TransportError;
use crate::domain::capability::WrappedCapability;
use crate::domain::entities::{FileRecord, ShareGrant};
use crate::domain::value_objects::{Address, FileId};

/// Chunk size the simulated transfer engine reports progress at
pub(crate) const CHUNK_SIZE: usize = 256 * 1024;

pub(crate) struct StoredBlob {
    pub(crate) ciphertext: Bytes,
    pub(crate) owner: Address,
    pub(crate) size: u64,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) owner_capability: Option<WrappedCapability>,
    pub(crate) grants: BTreeMap<Address, ShareGrant>,
}

impl StoredBlob {
    pub(crate) fn record(&self, id: &FileId) -> FileRecord {
        FileRecord::new(id.clone(), self.owner.clone(), self.size, self.created_at)
    }

    pub(crate) fn readable_by(&self, address: &Address) -> bool {
        &self.owner == address || self.grants.contains_key(address)
    }
}

#[derive(Default)]
pub(crate) struct NetworkState {
    pub(crate) blobs: HashMap<FileId, StoredBlob>,
    pub(crate) bandwidth_used: HashMap<Address, u64>,
    next_sequence: u64,
}

impl NetworkState {
    pub(crate) fn storage_used_by(&self, address: &Address) -> u64 {
        self.blobs
            .values()
            .filter(|blob| &blob.owner == address)
            .map(|blob| blob.size)
            .sum()
    }

    /// Content-derived id, salted with a sequence number so identical
    /// uploads still get distinct ids
    pub(crate) fn assign_id(&mut self, ciphertext: &[u8]) -> Result<FileId, TransportError> {
        self.next_sequence += 1;
        let mut hasher = Sha256::new();
        hasher.update(ciphertext);
        hasher.update(self.next_sequence.to_be_bytes());
        let digest = hasher.finalize();
        FileId::new(format!("bafk{}", hex::encode(&digest[..20])))
            .map_err(|e| TransportError::Internal(e.to_string()))
    }
}

/// Per-identity allowance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountLimits {
    pub total_storage: u64,
    pub total_bandwidth: u64,
}

impl Default for AccountLimits {
    fn default() -> Self {
        Self {
            total_storage: 5 * 1024 * 1024 * 1024,
            total_bandwidth: 50 * 1024 * 1024 * 1024,
        }
    }
}

#[derive(Default)]
pub(crate) struct CallCounters {
    pub(crate) put: AtomicUsize,
    pub(crate) get: AtomicUsize,
}

pub(crate) struct NetworkShared {
    pub(crate) state: Mutex<NetworkState>,
    pub(crate) faults: FaultInjector,
    pub(crate) limits: AccountLimits,
    pub(crate) chunk_delay: Option<Duration>,
    pub(crate) calls: CallCounters,
}

/// In-process stand-in for the decentralized storage network.
///
/// Holds ciphertext, ownership, wrapped capabilities and usage for every
/// identity. Each caller talks to it through its own [`NetworkSession`],
/// which enforces owner/grantee authorization the way the real network does.
#[derive(Clone)]
pub struct InMemoryNetwork {
    shared: Arc<NetworkShared>,
}

impl InMemoryNetwork {
    pub fn new() -> Self {
        Self::with_limits(AccountLimits::default())
    }

    pub fn with_limits(limits: AccountLimits) -> Self {
        Self::build(limits, None)
    }

    /// Sleep `delay` per transferred chunk, so transfers can be observed
    /// and cancelled mid-flight
    pub fn with_chunk_delay(self, delay: Duration) -> Self {
        Self::build(self.shared.limits, Some(delay))
    }

    fn build(limits: AccountLimits, chunk_delay: Option<Duration>) -> Self {
        Self {
            shared: Arc::new(NetworkShared {
                state: Mutex::new(NetworkState::default()),
                faults: FaultInjector::new(),
                limits,
                chunk_delay,
                calls: CallCounters::default(),
            }),
        }
    }

    /// A fresh, unbound session; it binds to an identity on `connect`
    pub fn session(&self) -> Arc<NetworkSession> {
        Arc::new(NetworkSession::new(Arc::clone(&self.shared)))
    }

    pub fn faults(&self) -> &FaultInjector {
        &self.shared.faults
    }

    /// Number of `put` calls that reached the network
    pub fn put_calls(&self) -> usize {
        self.shared.calls.put.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> usize {
        self.shared.calls.get.load(Ordering::SeqCst)
    }

    pub fn owner_of(&self, file_id: &FileId) -> Option<Address> {
        self.shared
            .state
            .lock()
            .blobs
            .get(file_id)
            .map(|blob| blob.owner.clone())
    }

    pub fn grantees_of(&self, file_id: &FileId) -> Vec<Address> {
        self.shared
            .state
            .lock()
            .blobs
            .get(file_id)
            .map(|blob| blob.grants.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn ciphertext_of(&self, file_id: &FileId) -> Option<Bytes> {
        self.shared
            .state
            .lock()
            .blobs
            .get(file_id)
            .map(|blob| blob.ciphertext.clone())
    }

    pub fn owner_capability_of(&self, file_id: &FileId) -> Option<WrappedCapability> {
        self.shared
            .state
            .lock()
            .blobs
            .get(file_id)
            .and_then(|blob| blob.owner_capability.clone())
    }

    pub fn grant_of(&self, file_id: &FileId, grantee: &Address) -> Option<ShareGrant> {
        self.shared
            .state
            .lock()
            .blobs
            .get(file_id)
            .and_then(|blob| blob.grants.get(grantee).cloned())
    }

    pub fn storage_used_by(&self, address: &Address) -> u64 {
        self.shared.state.lock().storage_used_by(address)
    }

    pub fn file_count(&self) -> usize {
        self.shared.state.lock().blobs.len()
    }
}

impl Default for InMemoryNetwork {
    fn default() -> Self {
        Self::new()
    }
}
