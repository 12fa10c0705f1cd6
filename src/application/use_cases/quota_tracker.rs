use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::application::errors::VaultError;
use crate::application::events::{Notifier, OperationKind, StorageEvent};
use crate::application::ports::QuotaSource;
use crate::domain::value_objects::QuotaSnapshot;

/// Use case: fetch and cache the caller's storage/bandwidth usage.
///
/// The cached snapshot is replaced as a whole under a write lock; on a failed
/// refresh the previous snapshot stays in place.
pub struct QuotaTracker {
    source: Arc<dyn QuotaSource>,
    timeout: Duration,
    snapshot: RwLock<Option<QuotaSnapshot>>,
    notifier: Notifier,
}

impl QuotaTracker {
    pub fn new(source: Arc<dyn QuotaSource>, timeout: Duration, notifier: Notifier) -> Self {
        Self {
            source,
            timeout,
            snapshot: RwLock::new(None),
            notifier,
        }
    }

    pub async fn refresh(&self) -> Result<QuotaSnapshot, VaultError> {
        let snapshot = tokio::time::timeout(self.timeout, self.source.usage())
            .await
            .map_err(|_| {
                VaultError::QuotaUnavailable(format!("timed out after {:?}", self.timeout))
            })?
            .map_err(|e| VaultError::QuotaUnavailable(e.to_string()))?;

        *self.snapshot.write() = Some(snapshot);
        debug!(
            storage_used = snapshot.storage_used,
            bandwidth_used = snapshot.bandwidth_used,
            "Quota snapshot refreshed"
        );
        self.notifier.emit(StorageEvent::QuotaUpdated(snapshot));
        Ok(snapshot)
    }

    /// Refresh following a completed mutation. A failure here does not undo
    /// the mutation, so it is reported and the stale snapshot kept.
    pub async fn refresh_after(&self, operation: OperationKind) -> Option<QuotaSnapshot> {
        match self.refresh().await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(%operation, error = %e, "Quota refresh failed, keeping previous snapshot");
                self.notifier.failed(OperationKind::FetchStorageLimits, &e);
                None
            }
        }
    }

    pub fn snapshot(&self) -> Option<QuotaSnapshot> {
        *self.snapshot.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::errors::ErrorKind;
    use crate::application::ports::{MockNotificationSink, MockQuotaSource, TransportError};

    fn quiet_notifier() -> Notifier {
        let mut sink = MockNotificationSink::new();
        sink.expect_notify().returning(|_| ());
        Notifier::new(Arc::new(sink))
    }

    #[tokio::test]
    async fn test_refresh_replaces_snapshot() {
        let mut source = MockQuotaSource::new();
        source
            .expect_usage()
            .times(1)
            .returning(|| Ok(QuotaSnapshot::new(10, 100, 5, 50)));

        let tracker = QuotaTracker::new(Arc::new(source), Duration::from_secs(1), quiet_notifier());
        assert!(tracker.snapshot().is_none());

        let snapshot = tracker.refresh().await.unwrap();
        assert_eq!(tracker.snapshot(), Some(snapshot));
        assert_eq!(snapshot.storage_used, 10);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_snapshot() {
        let mut source = MockQuotaSource::new();
        let mut calls = 0;
        source.expect_usage().times(2).returning(move || {
            calls += 1;
            if calls == 1 {
                Ok(QuotaSnapshot::new(1, 2, 3, 4))
            } else {
                Err(TransportError::Unavailable("down".to_string()))
            }
        });

        let tracker = QuotaTracker::new(Arc::new(source), Duration::from_secs(1), quiet_notifier());
        let first = tracker.refresh().await.unwrap();

        let err = tracker.refresh().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::QuotaUnavailable);
        assert_eq!(tracker.snapshot(), Some(first));
    }

    #[tokio::test]
    async fn test_refresh_after_swallows_into_notification() {
        let mut source = MockQuotaSource::new();
        source
            .expect_usage()
            .returning(|| Err(TransportError::Unavailable("down".to_string())));

        let mut sink = MockNotificationSink::new();
        sink.expect_notify()
            .withf(|event| matches!(event, StorageEvent::Failed { operation: OperationKind::FetchStorageLimits, .. }))
            .times(1)
            .returning(|_| ());

        let tracker = QuotaTracker::new(
            Arc::new(source),
            Duration::from_secs(1),
            Notifier::new(Arc::new(sink)),
        );

        assert!(tracker.refresh_after(OperationKind::Upload).await.is_none());
    }
}
