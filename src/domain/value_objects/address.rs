use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::domain::errors::DomainError;
use crate::domain::value_objects::PublicKey;

/// Authorization subject derived from a public key.
///
/// Always stored in canonical form: `0x` followed by 40 lowercase hex digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(String);

impl Address {
    const HEX_LENGTH: usize = 40;

    /// Last 20 bytes of the SHA-256 digest of the key
    pub fn from_public_key(key: &PublicKey) -> Self {
        let digest = Sha256::digest(key.as_bytes());
        Self(format!("0x{}", hex::encode(&digest[12..])))
    }

    pub fn parse(value: &str) -> Result<Self, DomainError> {
        let trimmed = value.trim();
        let hex_part = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| DomainError::InvalidAddress(format!("missing 0x prefix: {trimmed}")))?;

        if hex_part.len() != Self::HEX_LENGTH {
            return Err(DomainError::InvalidAddress(format!(
                "expected {} hex digits, got {}",
                Self::HEX_LENGTH,
                hex_part.len()
            )));
        }

        if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DomainError::InvalidAddress(format!(
                "non-hex characters in {trimmed}"
            )));
        }

        Ok(Self(format!("0x{}", hex_part.to_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Address {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
