use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time view of the caller's storage and bandwidth usage, in bytes.
///
/// Never partially updated: a newer snapshot replaces the old one wholesale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaSnapshot {
    pub storage_used: u64,
    pub total_storage: u64,
    pub bandwidth_used: u64,
    pub total_bandwidth: u64,
    pub fetched_at: DateTime<Utc>,
}

impl QuotaSnapshot {
    pub fn new(
        storage_used: u64,
        total_storage: u64,
        bandwidth_used: u64,
        total_bandwidth: u64,
    ) -> Self {
        Self {
            storage_used,
            total_storage,
            bandwidth_used,
            total_bandwidth,
            fetched_at: Utc::now(),
        }
    }

    pub fn storage_remaining(&self) -> u64 {
        self.total_storage.saturating_sub(self.storage_used)
    }

    pub fn bandwidth_remaining(&self) -> u64 {
        self.total_bandwidth.saturating_sub(self.bandwidth_used)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remaining_saturates_when_over_quota() {
        let snapshot = QuotaSnapshot::new(150, 100, 10, 50);
        assert_eq!(snapshot.storage_remaining(), 0);
        assert_eq!(snapshot.bandwidth_remaining(), 40);
    }
}
