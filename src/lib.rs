//! # ShareVault - Client-side access control for encrypted file storage
//!
//! Lets an authenticated identity upload, download, delete and share files on
//! a decentralized storage network that only ever sees ciphertext. Sharing a
//! file means handing another identity a wrapped decryption capability;
//! revoking it means leaving no usable copy of that capability behind.
//!
//! ## Architecture Layers
//!
//! - **Domain**: value objects, entities and the capability cryptography
//! - **Application**: use cases, ports (collaborator traits), events and the
//!   [`StorageClient`] facade
//! - **Infrastructure**: an in-memory storage network, identity directory,
//!   local wallet and notification sinks
//!
//! ## Key Features
//!
//! - Files sealed client-side with a per-file key (ChaCha20-Poly1305)
//! - Grants wrapped for the recipient's X25519 key
//! - Revocation by key rotation or verified grant invalidation
//! - All-or-nothing ownership transfer with rollback
//! - Quota tracking that never turns a completed operation into a failure
//!
//! ## Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use bytes::Bytes;
//! use sharevault::{Config, StorageClientBuilder};
//! use sharevault::infrastructure::{InMemoryDirectory, InMemoryNetwork, LocalWallet};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let network = InMemoryNetwork::new();
//! let client = StorageClientBuilder::new(Config::default())
//!     .with_wallet(Arc::new(LocalWallet::generate()))
//!     .with_directory(Arc::new(InMemoryDirectory::new()))
//!     .with_network(network.session())
//!     .build()?;
//!
//! client.init_storage().await?;
//! let file_id = client.upload(Bytes::from_static(b"hello"), 5).await?;
//! # let _ = file_id;
//! # Ok(())
//! # }
//! ```

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod telemetry;

pub use application::builder::StorageClientBuilder;
pub use application::client::StorageClient;
pub use application::errors::{ErrorKind, VaultError};
pub use application::events::{OperationKind, StorageEvent, TransferProgress};
pub use application::{dto, ports, use_cases};
pub use config::Config;
pub use domain::errors as domain_errors;
pub use domain::{capability, entities, value_objects};
