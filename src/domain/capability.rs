//! File capabilities: the per-file content key and its wrapped forms.
//!
//! Every file is sealed client-side with a random [`FileKey`] before it
//! reaches the transport. Access to a file is the ability to recover that key,
//! so sharing means sealing the key for another identity's X25519 public key
//! (a [`WrappedCapability`]) and revoking means making sure no usable wrapped
//! copy remains.
//!
//! Wrapping uses an ephemeral X25519 agreement, HKDF-SHA256 bound to both
//! public keys, and ChaCha20-Poly1305 with the recipient key as associated data.

use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use curve25519_dalek::montgomery::MontgomeryPoint;
use hkdf::Hkdf;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::domain::errors::DomainError;
use crate::domain::value_objects::{Address, PublicKey};

const NONCE_LEN: usize = 12;
const WRAP_INFO: &[u8] = b"sharevault/capability-wrap/v1";

/// Symmetric content key of a single file
#[derive(Clone, PartialEq, Eq)]
pub struct FileKey([u8; 32]);

impl FileKey {
    pub fn generate() -> Self {
        Self(rand::random())
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Encrypt file content; output is `nonce || ciphertext`
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, DomainError> {
        let nonce_bytes: [u8; NONCE_LEN] = rand::random();
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&self.0));
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
            .map_err(|_| DomainError::Capability("content encryption failed".to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    /// Decrypt content produced by [`FileKey::seal`]
    pub fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, DomainError> {
        if sealed.len() < NONCE_LEN {
            return Err(DomainError::Capability(
                "sealed content shorter than nonce".to_string(),
            ));
        }
        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&self.0));
        cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| {
                DomainError::Capability("content does not open with this key".to_string())
            })
    }

    /// Seal this key so only the holder of `recipient`'s secret can recover it
    pub fn wrap_for(&self, recipient: &PublicKey) -> Result<WrappedCapability, DomainError> {
        let ephemeral_secret: [u8; 32] = rand::random();
        let ephemeral_public = MontgomeryPoint::mul_base_clamped(ephemeral_secret).to_bytes();
        let shared = MontgomeryPoint(*recipient.as_bytes()).mul_clamped(ephemeral_secret);

        let wrapping_key = derive_wrapping_key(&shared, &ephemeral_public, recipient)?;
        let nonce: [u8; NONCE_LEN] = rand::random();
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&wrapping_key));
        let ciphertext = cipher
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: &self.0,
                    aad: recipient.as_bytes(),
                },
            )
            .map_err(|_| DomainError::Capability("capability wrapping failed".to_string()))?;

        Ok(WrappedCapability {
            recipient: *recipient,
            ephemeral_public: PublicKey::from_bytes(ephemeral_public),
            nonce,
            ciphertext,
        })
    }
}

impl std::fmt::Debug for FileKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FileKey(<redacted>)")
    }
}

/// X25519 secret key of an identity. Held by wallets, never by the core.
#[derive(Clone)]
pub struct SecretKey([u8; 32]);

impl SecretKey {
    pub fn generate() -> Self {
        Self(rand::random())
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_bytes(MontgomeryPoint::mul_base_clamped(self.0).to_bytes())
    }

    pub fn address(&self) -> Address {
        Address::from_public_key(&self.public_key())
    }

    /// Recover the file key from a capability wrapped for this secret's public key
    pub fn unwrap(&self, capability: &WrappedCapability) -> Result<FileKey, DomainError> {
        let own_public = self.public_key();
        if capability.recipient != own_public {
            return Err(DomainError::Capability(
                "capability was wrapped for a different key".to_string(),
            ));
        }

        let shared = MontgomeryPoint(*capability.ephemeral_public.as_bytes()).mul_clamped(self.0);
        let wrapping_key =
            derive_wrapping_key(&shared, capability.ephemeral_public.as_bytes(), &own_public)?;

        let cipher = ChaCha20Poly1305::new(Key::from_slice(&wrapping_key));
        let plaintext = cipher
            .decrypt(
                Nonce::from_slice(&capability.nonce),
                Payload {
                    msg: &capability.ciphertext,
                    aad: own_public.as_bytes(),
                },
            )
            .map_err(|_| DomainError::Capability("capability failed to unwrap".to_string()))?;

        let bytes: [u8; 32] = plaintext
            .try_into()
            .map_err(|_| DomainError::Capability("unwrapped key has wrong length".to_string()))?;
        Ok(FileKey(bytes))
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}

/// A [`FileKey`] sealed for one recipient public key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedCapability {
    pub recipient: PublicKey,
    pub ephemeral_public: PublicKey,
    pub nonce: [u8; NONCE_LEN],
    pub ciphertext: Vec<u8>,
}

fn derive_wrapping_key(
    shared: &MontgomeryPoint,
    ephemeral_public: &[u8; 32],
    recipient: &PublicKey,
) -> Result<[u8; 32], DomainError> {
    let shared_bytes = shared.to_bytes();
    // All-zero output means a low-order point was supplied
    if shared_bytes.iter().all(|b| *b == 0) {
        return Err(DomainError::Capability(
            "degenerate key agreement".to_string(),
        ));
    }

    let mut salt = [0u8; 64];
    salt[..32].copy_from_slice(ephemeral_public);
    salt[32..].copy_from_slice(recipient.as_bytes());

    let hk = Hkdf::<Sha256>::new(Some(&salt), &shared_bytes);
    let mut okm = [0u8; 32];
    hk.expand(WRAP_INFO, &mut okm)
        .map_err(|e| DomainError::Capability(format!("key derivation failed: {e}")))?;
    Ok(okm)
}
