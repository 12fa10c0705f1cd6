use async_trait::async_trait;
#[cfg(test)]
use mockall::{automock, predicate::*};
use thiserror::Error;

use crate::domain::value_objects::{Identifier, PublicKey};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error("Identity directory unavailable: {0}")]
    Unavailable(String),
}

/// Port for the identity resolution service
#[cfg_attr(test, automock)]
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// `Ok(None)` when no key is registered for the identifier
    async fn public_key_for(
        &self,
        identifier: &Identifier,
    ) -> Result<Option<PublicKey>, DirectoryError>;
}
