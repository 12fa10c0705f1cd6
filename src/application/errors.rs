//! Caller-facing error model.
//!
//! Port errors are translated into [`VaultError`] at the use case boundary.
//! Each variant maps onto a coarse [`ErrorKind`] and carries a message fit
//! for display.

use serde::Serialize;
use thiserror::Error;

use crate::application::ports::{DirectoryError, TransportError, WalletError};
use crate::application::validation::format_bytes;
use crate::domain::errors::DomainError;
use crate::domain::value_objects::{Address, FileId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    IdentityNotFound,
    ResolutionUnavailable,
    NotOwner,
    AccessDenied,
    NotFound,
    AlreadyOwnerOrSelfShare,
    GrantRejected,
    TransportFailure,
    QuotaUnavailable,
    Cancelled,
    SessionNotInitialized,
    Inconsistent,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("File size {size} exceeds the upload limit of {max} bytes")]
    SizeLimitExceeded { size: u64, max: u64 },

    #[error("No public key registered for {0}")]
    IdentityNotFound(String),

    #[error("Identity resolution unavailable: {0}")]
    ResolutionUnavailable(String),

    #[error("Caller does not own file {0}")]
    NotOwner(FileId),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0} is already the owner or the caller")]
    AlreadyOwnerOrSelfShare(Address),

    #[error("Grant rejected: {0}")]
    GrantRejected(String),

    #[error("Transport failure: {0}")]
    TransportFailure(String),

    #[error("Quota unavailable: {0}")]
    QuotaUnavailable(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Storage session not initialized")]
    SessionNotInitialized,

    #[error("Rollback failed after {operation_error}: {rollback_error}")]
    RollbackFailed {
        operation_error: String,
        rollback_error: String,
    },
}

impl VaultError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            VaultError::Validation(_) | VaultError::SizeLimitExceeded { .. } => {
                ErrorKind::Validation
            }
            VaultError::IdentityNotFound(_) => ErrorKind::IdentityNotFound,
            VaultError::ResolutionUnavailable(_) => ErrorKind::ResolutionUnavailable,
            VaultError::NotOwner(_) => ErrorKind::NotOwner,
            VaultError::AccessDenied(_) => ErrorKind::AccessDenied,
            VaultError::NotFound(_) => ErrorKind::NotFound,
            VaultError::AlreadyOwnerOrSelfShare(_) => ErrorKind::AlreadyOwnerOrSelfShare,
            VaultError::GrantRejected(_) => ErrorKind::GrantRejected,
            VaultError::TransportFailure(_) => ErrorKind::TransportFailure,
            VaultError::QuotaUnavailable(_) => ErrorKind::QuotaUnavailable,
            VaultError::Cancelled => ErrorKind::Cancelled,
            VaultError::SessionNotInitialized => ErrorKind::SessionNotInitialized,
            VaultError::RollbackFailed { .. } => ErrorKind::Inconsistent,
        }
    }

    /// Text suitable for a toast or status line
    pub fn user_message(&self) -> String {
        match self {
            VaultError::SizeLimitExceeded { max, .. } => format!(
                "You are not allowed to upload files bigger than {}.",
                format_bytes(*max)
            ),
            VaultError::IdentityNotFound(identifier) => {
                format!("No account found for {identifier}")
            }
            VaultError::NotOwner(_) => "Only the file owner can do that".to_string(),
            VaultError::AlreadyOwnerOrSelfShare(_) => {
                "You cannot share or transfer a file to yourself".to_string()
            }
            VaultError::Cancelled => "Operation cancelled".to_string(),
            other => other.to_string(),
        }
    }

    /// Map a transport failure, letting `NotFound` and `AccessDenied` keep their kinds
    pub fn from_transport(error: TransportError) -> Self {
        match error {
            TransportError::NotFound(m) => VaultError::NotFound(m),
            TransportError::AccessDenied(m) => VaultError::AccessDenied(m),
            other => VaultError::TransportFailure(other.to_string()),
        }
    }

    /// Map a transport failure on a grant write
    pub fn grant_rejected(error: TransportError) -> Self {
        match error {
            TransportError::AccessDenied(m) | TransportError::Rejected(m) => {
                VaultError::GrantRejected(m)
            }
            other => VaultError::from_transport(other),
        }
    }
}

impl From<TransportError> for VaultError {
    fn from(error: TransportError) -> Self {
        VaultError::from_transport(error)
    }
}

impl From<DirectoryError> for VaultError {
    fn from(error: DirectoryError) -> Self {
        match error {
            DirectoryError::Unavailable(m) => VaultError::ResolutionUnavailable(m),
        }
    }
}

impl From<WalletError> for VaultError {
    fn from(error: WalletError) -> Self {
        VaultError::AccessDenied(error.to_string())
    }
}

impl From<DomainError> for VaultError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::SizeExceedsMaximum { size, max } => {
                VaultError::SizeLimitExceeded { size, max }
            }
            DomainError::Capability(m) => VaultError::AccessDenied(m),
            other => VaultError::Validation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_limit_maps_to_validation_kind() {
        let err: VaultError = DomainError::SizeExceedsMaximum {
            size: 200 * 1024 * 1024,
            max: 100 * 1024 * 1024,
        }
        .into();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(
            err.user_message(),
            "You are not allowed to upload files bigger than 100.0 MB."
        );
    }

    #[test]
    fn test_transport_errors_keep_authorization_kinds() {
        let not_found: VaultError = TransportError::NotFound("f1".to_string()).into();
        let denied: VaultError = TransportError::AccessDenied("f1".to_string()).into();
        let down: VaultError = TransportError::Unavailable("timeout".to_string()).into();

        assert_eq!(not_found.kind(), ErrorKind::NotFound);
        assert_eq!(denied.kind(), ErrorKind::AccessDenied);
        assert_eq!(down.kind(), ErrorKind::TransportFailure);
        assert!(down.to_string().contains("timeout"));
    }

    #[test]
    fn test_grant_write_denial_is_grant_rejected() {
        let err = VaultError::grant_rejected(TransportError::Rejected("not owner".to_string()));
        assert_eq!(err.kind(), ErrorKind::GrantRejected);

        let err = VaultError::grant_rejected(TransportError::Unavailable("down".to_string()));
        assert_eq!(err.kind(), ErrorKind::TransportFailure);
    }

    #[test]
    fn test_directory_outage_is_resolution_unavailable() {
        let err: VaultError = DirectoryError::Unavailable("dns".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::ResolutionUnavailable);
    }

    #[test]
    fn test_error_debug_formatting() {
        let errors = vec![
            VaultError::Validation("bad".to_string()),
            VaultError::Cancelled,
            VaultError::SessionNotInitialized,
            VaultError::RollbackFailed {
                operation_error: "a".to_string(),
                rollback_error: "b".to_string(),
            },
        ];

        for err in errors {
            let _ = format!("{:?}", err);
            assert!(!err.user_message().is_empty());
        }
    }
}
