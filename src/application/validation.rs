//! Common validation utilities for use cases
//!
//! Checks here run before any transport call so a rejected request has no
//! side effects.

use crate::application::errors::VaultError;
use crate::domain::errors::DomainError;
use crate::domain::value_objects::Identifier;

/// Upload ceiling used when no configuration overrides it (100 MB)
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

/// Reject an upload whose declared size is over the ceiling or disagrees
/// with the number of bytes actually supplied
pub fn validate_upload_size(declared: u64, actual: usize, max: u64) -> Result<(), VaultError> {
    if declared > max {
        return Err(DomainError::SizeExceedsMaximum {
            size: declared,
            max,
        }
        .into());
    }

    if declared != actual as u64 {
        return Err(VaultError::Validation(format!(
            "declared size {declared} does not match {actual} supplied bytes"
        )));
    }

    Ok(())
}

pub fn parse_identifier(value: &str) -> Result<Identifier, VaultError> {
    Identifier::parse(value).map_err(VaultError::from)
}

/// Format bytes in human-readable format
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let base = 1024_f64;
    let log = (bytes as f64).log(base).floor() as usize;
    let unit_index = log.min(UNITS.len() - 1);
    let value = bytes as f64 / base.powi(unit_index as i32);

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit_index])
    }
}
