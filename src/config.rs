use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::validation::DEFAULT_MAX_UPLOAD_BYTES;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// How a revoke makes the revoked capability unusable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevocationPolicy {
    /// Re-encrypt the file under a new key and re-wrap for everyone remaining
    #[default]
    RotateKey,
    /// Delete the grant and confirm by read-back
    InvalidateGrant,
}

/// What happens to third-party grants when ownership moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantTransferPolicy {
    #[default]
    Preserve,
    Revoke,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for RevocationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rotate_key" | "rotate" => Ok(RevocationPolicy::RotateKey),
            "invalidate_grant" | "invalidate" => Ok(RevocationPolicy::InvalidateGrant),
            _ => Err(format!("Invalid revocation policy: {}", s)),
        }
    }
}

impl std::str::FromStr for GrantTransferPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "preserve" => Ok(GrantTransferPolicy::Preserve),
            "revoke" => Ok(GrantTransferPolicy::Revoke),
            _ => Err(format!("Invalid transfer grant policy: {}", s)),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub max_upload_bytes: u64,
    pub resolution_timeout_secs: u64,
    pub quota_timeout_secs: u64,
    /// 0 disables the identity cache
    pub identity_cache_ttl_secs: u64,
    pub revocation_policy: RevocationPolicy,
    pub transfer_grant_policy: GrantTransferPolicy,
    /// Hold a per-file lock across share/revoke/remove/transfer
    pub serialize_file_operations: bool,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            resolution_timeout_secs: 10,
            quota_timeout_secs: 10,
            identity_cache_ttl_secs: 60,
            revocation_policy: RevocationPolicy::default(),
            transfer_grant_policy: GrantTransferPolicy::default(),
            serialize_file_operations: false,
            log_format: LogFormat::default(),
        }
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_upload_bytes: env_or("SHAREVAULT_MAX_UPLOAD_BYTES", defaults.max_upload_bytes),
            resolution_timeout_secs: env_or(
                "SHAREVAULT_RESOLUTION_TIMEOUT_SECS",
                defaults.resolution_timeout_secs,
            ),
            quota_timeout_secs: env_or(
                "SHAREVAULT_QUOTA_TIMEOUT_SECS",
                defaults.quota_timeout_secs,
            ),
            identity_cache_ttl_secs: env_or(
                "SHAREVAULT_IDENTITY_CACHE_TTL_SECS",
                defaults.identity_cache_ttl_secs,
            ),
            revocation_policy: env_or(
                "SHAREVAULT_REVOCATION_POLICY",
                defaults.revocation_policy,
            ),
            transfer_grant_policy: env_or(
                "SHAREVAULT_TRANSFER_GRANT_POLICY",
                defaults.transfer_grant_policy,
            ),
            serialize_file_operations: env_or(
                "SHAREVAULT_SERIALIZE_FILE_OPERATIONS",
                defaults.serialize_file_operations,
            ),
            log_format: env_or("SHAREVAULT_LOG_FORMAT", defaults.log_format),
        }
    }

    /// Parse a TOML document; missing keys take their defaults
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Validate configuration. The upload ceiling may be lowered but never
    /// raised above 100 MB.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_upload_bytes must be greater than zero".to_string(),
            ));
        }

        if self.max_upload_bytes > DEFAULT_MAX_UPLOAD_BYTES {
            return Err(ConfigError::Invalid(format!(
                "max_upload_bytes must not exceed {DEFAULT_MAX_UPLOAD_BYTES}"
            )));
        }

        if self.resolution_timeout_secs == 0 || self.quota_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "timeouts must be at least 1 second".to_string(),
            ));
        }

        if self.resolution_timeout_secs > 300 || self.quota_timeout_secs > 300 {
            return Err(ConfigError::Invalid(
                "timeouts must not exceed 300 seconds".to_string(),
            ));
        }

        Ok(())
    }

    pub fn resolution_timeout(&self) -> Duration {
        Duration::from_secs(self.resolution_timeout_secs)
    }

    pub fn quota_timeout(&self) -> Duration {
        Duration::from_secs(self.quota_timeout_secs)
    }

    pub fn identity_cache_ttl(&self) -> Option<Duration> {
        (self.identity_cache_ttl_secs > 0).then(|| Duration::from_secs(self.identity_cache_ttl_secs))
    }
}
