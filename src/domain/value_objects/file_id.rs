use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// Content identifier assigned by the transport once an upload completes.
///
/// Opaque to the core: it is compared and displayed, never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(DomainError::validation("file_id", "File id cannot be empty"));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for FileId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_id_rejects_blank() {
        assert!(FileId::new("").is_err());
        assert!(FileId::new("   ").is_err());
    }

    #[test]
    fn test_file_id_serializes_as_plain_string() {
        let id: FileId = "bafy123".parse().unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"bafy123\"");
        assert_eq!(id.to_string(), "bafy123");
    }
}
