use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::application::ports::{DirectoryError, IdentityDirectory};
use crate::domain::value_objects::{Identifier, PublicKey};

/// Identity directory backed by a concurrent map
#[derive(Default)]
pub struct InMemoryDirectory {
    keys: DashMap<Identifier, PublicKey>,
    offline: AtomicBool,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, identifier: Identifier, public_key: PublicKey) {
        self.keys.insert(identifier, public_key);
    }

    /// Make every lookup fail with `Unavailable` until switched back
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

#[async_trait]
impl IdentityDirectory for InMemoryDirectory {
    async fn public_key_for(
        &self,
        identifier: &Identifier,
    ) -> Result<Option<PublicKey>, DirectoryError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(DirectoryError::Unavailable(
                "directory is offline".to_string(),
            ));
        }
        Ok(self.keys.get(identifier).map(|entry| *entry.value()))
    }
}
