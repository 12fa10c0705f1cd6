#[cfg(test)]
use mockall::automock;

use crate::application::events::StorageEvent;

/// Observer for progress, success and failure events.
///
/// Called synchronously from inside operations, so implementations must not
/// block.
#[cfg_attr(test, automock)]
pub trait NotificationSink: Send + Sync {
    fn notify(&self, event: &StorageEvent);
}
