use async_trait::async_trait;
#[cfg(test)]
use mockall::{automock, predicate::*};
use thiserror::Error;

use crate::domain::capability::{FileKey, WrappedCapability};
use crate::domain::value_objects::{Address, PublicKey};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("Wallet is locked")]
    Locked,

    #[error("Capability cannot be unwrapped: {0}")]
    Unwrap(String),
}

/// Port for the caller's key management. Secret keys stay behind this trait.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Wallet: Send + Sync {
    fn public_key(&self) -> PublicKey;

    fn address(&self) -> Address;

    async fn unwrap_capability(
        &self,
        capability: &WrappedCapability,
    ) -> Result<FileKey, WalletError>;
}
