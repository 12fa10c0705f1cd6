use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::errors::DomainError;

/// X25519 public key of an identity, used as the target of capability wrapping.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; 32]);

impl PublicKey {
    pub const LENGTH: usize = 32;

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse from hex, with or without a `0x` prefix
    pub fn from_hex(value: &str) -> Result<Self, DomainError> {
        let trimmed = value.trim();
        let hex_part = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        let decoded =
            hex::decode(hex_part).map_err(|e| DomainError::InvalidPublicKey(e.to_string()))?;
        let bytes: [u8; 32] = decoded.try_into().map_err(|v: Vec<u8>| {
            DomainError::InvalidPublicKey(format!(
                "expected {} bytes, got {}",
                Self::LENGTH,
                v.len()
            ))
        })?;

        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl std::fmt::Display for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl std::str::FromStr for PublicKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::from_hex(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_key_hex_round_trip_accepts_prefix() {
        let key = PublicKey::from_bytes([7u8; 32]);
        let parsed: PublicKey = key.to_string().parse().unwrap();
        assert_eq!(parsed, key);

        let unprefixed = PublicKey::from_hex(&key.to_hex()).unwrap();
        assert_eq!(unprefixed, key);
    }

    #[test]
    fn test_public_key_rejects_wrong_length() {
        let err = PublicKey::from_hex("0xabcd").unwrap_err();
        assert!(matches!(err, DomainError::InvalidPublicKey(_)));
        assert!(err.to_string().contains("expected 32 bytes"));
    }
}
