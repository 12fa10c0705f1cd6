use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{Address, Identifier, PublicKey};

/// A resolved identity. Request-scoped; never persisted by the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub identifier: Identifier,
    pub public_key: PublicKey,
    pub address: Address,
}

impl Identity {
    pub fn new(identifier: Identifier, public_key: PublicKey) -> Self {
        Self {
            address: Address::from_public_key(&public_key),
            identifier,
            public_key,
        }
    }
}
