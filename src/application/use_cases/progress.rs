use std::future::Future;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::application::errors::VaultError;
use crate::application::events::{Notifier, OperationKind};
use crate::application::ports::ProgressSender;

/// Run a transport call with its own progress channel, forwarding progress
/// to the notifier until the call completes.
///
/// Cancelling `cancel` abandons the call and yields [`VaultError::Cancelled`].
pub(crate) async fn drive_with_progress<T, F, Fut>(
    notifier: &Notifier,
    operation: OperationKind,
    cancel: &CancellationToken,
    call: F,
) -> Result<T, VaultError>
where
    F: FnOnce(ProgressSender) -> Fut,
    Fut: Future<Output = Result<T, VaultError>>,
{
    let (tx, mut rx) = mpsc::unbounded_channel();
    let call = call(tx);
    tokio::pin!(call);

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                tracing::info!(%operation, "Transfer cancelled");
                return Err(VaultError::Cancelled);
            }
            result = &mut call => {
                while let Ok(progress) = rx.try_recv() {
                    notifier.progress(operation, progress);
                }
                return result;
            }
            Some(progress) = rx.recv() => notifier.progress(operation, progress),
        }
    }
}
