use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::debug;

use crate::application::errors::VaultError;
use crate::application::ports::IdentityDirectory;
use crate::domain::entities::Identity;
use crate::domain::value_objects::Identifier;

/// Use case: resolve a human-readable identifier to a key and address.
///
/// Side-effect free apart from the optional TTL cache, so it is safe to call
/// concurrently and repeatedly.
pub struct IdentityResolver {
    directory: Arc<dyn IdentityDirectory>,
    timeout: Duration,
    cache_ttl: Option<Duration>,
    cache: DashMap<Identifier, (Identity, Instant)>,
}

impl IdentityResolver {
    pub fn new(directory: Arc<dyn IdentityDirectory>, timeout: Duration) -> Self {
        Self {
            directory,
            timeout,
            cache_ttl: None,
            cache: DashMap::new(),
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub async fn resolve(&self, identifier: &Identifier) -> Result<Identity, VaultError> {
        if let Some(identity) = self.cached(identifier) {
            debug!(%identifier, "Identity served from cache");
            return Ok(identity);
        }

        let lookup = self.directory.public_key_for(identifier);
        let public_key = tokio::time::timeout(self.timeout, lookup)
            .await
            .map_err(|_| {
                VaultError::ResolutionUnavailable(format!(
                    "lookup of {} timed out after {:?}",
                    identifier, self.timeout
                ))
            })??
            .ok_or_else(|| VaultError::IdentityNotFound(identifier.to_string()))?;

        let identity = Identity::new(identifier.clone(), public_key);
        debug!(%identifier, address = %identity.address, "Identity resolved");

        if self.cache_ttl.is_some() {
            self.cache
                .insert(identifier.clone(), (identity.clone(), Instant::now()));
        }

        Ok(identity)
    }

    fn cached(&self, identifier: &Identifier) -> Option<Identity> {
        let ttl = self.cache_ttl?;
        let entry = self.cache.get(identifier)?;
        let (identity, stored_at) = entry.value();
        if stored_at.elapsed() < ttl {
            return Some(identity.clone());
        }
        drop(entry);
        self.cache.remove(identifier);
        None
    }
}
