use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("Invalid email regex")
});

/// Human-readable handle of an identity (usually an email address).
///
/// Emails are lowercased so that `Alice@Example.com` and `alice@example.com`
/// resolve to the same identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier(String);

impl Identifier {
    const MAX_LENGTH: usize = 254;

    pub fn parse(value: &str) -> Result<Self, DomainError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidIdentifier(
                "Identifier cannot be empty".to_string(),
            ));
        }

        if trimmed.len() > Self::MAX_LENGTH {
            return Err(DomainError::InvalidIdentifier(format!(
                "Identifier too long: {} > {}",
                trimmed.len(),
                Self::MAX_LENGTH
            )));
        }

        if trimmed.contains('@') {
            if !EMAIL_REGEX.is_match(trimmed) {
                return Err(DomainError::InvalidIdentifier(format!(
                    "Invalid email address: {trimmed}"
                )));
            }
            return Ok(Self(trimmed.to_lowercase()));
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_email(&self) -> bool {
        self.0.contains('@')
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Identifier {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Identifier {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Identifier> for String {
    fn from(value: Identifier) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_is_trimmed_and_lowercased() {
        let id = Identifier::parse("  Alice@Example.COM ").unwrap();
        assert_eq!(id.as_str(), "alice@example.com");
        assert!(id.is_email());
    }

    #[test]
    fn test_non_email_handles_keep_case() {
        let id = Identifier::parse("RootUser").unwrap();
        assert_eq!(id.as_str(), "RootUser");
        assert!(!id.is_email());
    }

    #[test]
    fn test_invalid_identifiers() {
        for value in ["", "   ", "a@", "@b.com", "a@b", "a b@c.com"] {
            assert!(
                Identifier::parse(value).is_err(),
                "should reject {value:?}"
            );
        }
    }
}
