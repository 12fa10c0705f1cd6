use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;

use crate::application::errors::VaultError;
use crate::application::ports::{BlobTransport, SessionContext, Wallet};
use crate::domain::value_objects::{Address, PublicKey};

/// The caller's identity plus whether the transport session is bound to it
pub struct Session {
    wallet: Arc<dyn Wallet>,
    transport: Arc<dyn BlobTransport>,
    connected: AtomicBool,
}

impl Session {
    pub fn new(wallet: Arc<dyn Wallet>, transport: Arc<dyn BlobTransport>) -> Self {
        Self {
            wallet,
            transport,
            connected: AtomicBool::new(false),
        }
    }

    /// Bind the transport to the wallet identity. Calling again re-binds.
    pub async fn connect(&self) -> Result<(), VaultError> {
        let context = SessionContext {
            address: self.wallet.address(),
            public_key: self.wallet.public_key(),
        };
        self.transport
            .connect(&context)
            .await
            .map_err(VaultError::from_transport)?;
        self.connected.store(true, Ordering::Release);
        info!(address = %context.address, "Storage session established");
        Ok(())
    }

    pub fn ensure_connected(&self) -> Result<(), VaultError> {
        if self.connected.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(VaultError::SessionNotInitialized)
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    pub fn public_key(&self) -> PublicKey {
        self.wallet.public_key()
    }

    pub fn wallet(&self) -> &Arc<dyn Wallet> {
        &self.wallet
    }
}
