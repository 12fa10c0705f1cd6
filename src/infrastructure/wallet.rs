use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::application::ports::{Wallet, WalletError};
use crate::domain::capability::{FileKey, SecretKey, WrappedCapability};
use crate::domain::value_objects::{Address, PublicKey};

/// Wallet holding an X25519 secret in process memory
pub struct LocalWallet {
    secret: SecretKey,
    public_key: PublicKey,
    address: Address,
    locked: AtomicBool,
}

impl LocalWallet {
    pub fn new(secret: SecretKey) -> Self {
        let public_key = secret.public_key();
        Self {
            address: Address::from_public_key(&public_key),
            public_key,
            secret,
            locked: AtomicBool::new(false),
        }
    }

    pub fn generate() -> Self {
        Self::new(SecretKey::generate())
    }

    pub fn lock(&self) {
        self.locked.store(true, Ordering::SeqCst);
    }

    pub fn unlock(&self) {
        self.locked.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl Wallet for LocalWallet {
    fn public_key(&self) -> PublicKey {
        self.public_key
    }

    fn address(&self) -> Address {
        self.address.clone()
    }

    async fn unwrap_capability(
        &self,
        capability: &WrappedCapability,
    ) -> Result<FileKey, WalletError> {
        if self.locked.load(Ordering::SeqCst) {
            return Err(WalletError::Locked);
        }
        self.secret
            .unwrap(capability)
            .map_err(|e| WalletError::Unwrap(e.to_string()))
    }
}
