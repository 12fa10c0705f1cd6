//! [`NotificationSink`] implementations.

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::application::events::{OperationKind, StorageEvent};
use crate::application::ports::NotificationSink;

/// Writes every event to the tracing subscriber
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, event: &StorageEvent) {
        match event {
            StorageEvent::Started { operation, label } => {
                debug!(%operation, label = %label, "Operation started")
            }
            StorageEvent::Progress {
                operation,
                transferred,
                total,
            } => debug!(%operation, transferred, total, "Transfer progress"),
            StorageEvent::Finished { operation } => debug!(%operation, "Operation finished"),
            StorageEvent::Succeeded { operation, message } => {
                info!(%operation, message = %message, "Operation succeeded")
            }
            StorageEvent::Failed { operation, message } => {
                warn!(%operation, message = %message, "Operation failed")
            }
            StorageEvent::QuotaUpdated(snapshot) => debug!(
                storage_used = snapshot.storage_used,
                total_storage = snapshot.total_storage,
                bandwidth_used = snapshot.bandwidth_used,
                total_bandwidth = snapshot.total_bandwidth,
                "Quota updated"
            ),
            StorageEvent::FileTransferred { file_id, new_owner } => {
                info!(file_id = %file_id, new_owner = %new_owner, "File transferred")
            }
        }
    }
}

/// Forwards events into an unbounded channel, e.g. towards a UI task
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<StorageEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<StorageEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NotificationSink for ChannelSink {
    fn notify(&self, event: &StorageEvent) {
        // A closed receiver means nobody is listening any more
        let _ = self.tx.send(event.clone());
    }
}

/// Keeps every event in memory for later inspection
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<StorageEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<StorageEvent> {
        self.events.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    /// Success and failure messages, in order
    pub fn messages(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                StorageEvent::Succeeded { message, .. } | StorageEvent::Failed { message, .. } => {
                    Some(message.clone())
                }
                _ => None,
            })
            .collect()
    }

    /// Whether every started operation of `kind` has also finished
    pub fn is_idle(&self, kind: OperationKind) -> bool {
        let events = self.events.lock();
        let started = events
            .iter()
            .filter(|e| matches!(e, StorageEvent::Started { operation, .. } if *operation == kind))
            .count();
        let finished = events
            .iter()
            .filter(|e| matches!(e, StorageEvent::Finished { operation } if *operation == kind))
            .count();
        started == finished
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, event: &StorageEvent) {
        self.events.lock().push(event.clone());
    }
}
