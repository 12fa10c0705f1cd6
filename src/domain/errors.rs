use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Validation error in field '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("File size exceeds maximum allowed: {size} > {max}")]
    SizeExceedsMaximum { size: u64, max: u64 },

    #[error("Capability error: {0}")]
    Capability(String),
}

impl DomainError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}
