mod faults;
mod network;
mod session;

pub use faults::{FaultInjector, FaultPoint};
pub use network::{AccountLimits, InMemoryNetwork};
pub use session::NetworkSession;

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use chrono::Utc;
    use tokio::sync::mpsc;

    use crate::application::ports::{
        BlobTransport, BlobUpload, FileCatalog, GrantStore, QuotaSource, SessionContext,
        TransportError,
    };
    use crate::domain::capability::{FileKey, SecretKey};
    use crate::domain::entities::ShareGrant;

    async fn bound_session(network: &InMemoryNetwork, secret: &SecretKey) -> std::sync::Arc<NetworkSession> {
        let session = network.session();
        session
            .connect(&SessionContext {
                address: secret.address(),
                public_key: secret.public_key(),
            })
            .await
            .unwrap();
        session
    }

    fn upload(data: &'static [u8]) -> BlobUpload {
        BlobUpload {
            ciphertext: Bytes::from_static(data),
            size: data.len() as u64,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_unbound_session_is_refused() {
        let network = InMemoryNetwork::new();
        let session = network.session();
        let (tx, _rx) = mpsc::unbounded_channel();

        let err = session.put(upload(b"abc"), tx).await.unwrap_err();

        assert!(matches!(err, TransportError::AccessDenied(_)));
    }

    #[tokio::test]
    async fn test_put_reports_progress_and_accounts_storage() {
        let network = InMemoryNetwork::new();
        let alice = SecretKey::generate();
        let session = bound_session(&network, &alice).await;
        let (tx, mut rx) = mpsc::unbounded_channel();

        let file_id = session.put(upload(b"hello world"), tx).await.unwrap();

        let mut last = None;
        while let Some(progress) = rx.recv().await {
            last = Some(progress);
        }
        let last = last.unwrap();
        assert_eq!(last.transferred, last.total);
        assert_eq!(network.owner_of(&file_id), Some(alice.address()));
        assert_eq!(session.usage().await.unwrap().storage_used, 11);
    }

    #[tokio::test]
    async fn test_only_owner_and_grantees_can_read() {
        let network = InMemoryNetwork::new();
        let alice = SecretKey::generate();
        let bob = SecretKey::generate();
        let alice_session = bound_session(&network, &alice).await;
        let bob_session = bound_session(&network, &bob).await;
        let (tx, _rx) = mpsc::unbounded_channel();
        let file_id = alice_session.put(upload(b"private"), tx).await.unwrap();

        let (tx, _rx) = mpsc::unbounded_channel();
        let denied = bob_session.get(&file_id, tx).await.unwrap_err();
        assert!(matches!(denied, TransportError::AccessDenied(_)));
        assert!(bob_session.describe(&file_id).await.unwrap().is_none());

        let key = FileKey::generate();
        let grant = ShareGrant::new(
            file_id.clone(),
            bob.public_key(),
            key.wrap_for(&bob.public_key()).unwrap(),
        );
        alice_session.upsert(&grant).await.unwrap();

        let (tx, _rx) = mpsc::unbounded_channel();
        assert!(bob_session.get(&file_id, tx).await.is_ok());
        assert_eq!(bob_session.list_shared().await.unwrap().len(), 1);
        assert!(matches!(
            bob_session.list(&file_id).await.unwrap_err(),
            TransportError::AccessDenied(_)
        ));
    }

    #[tokio::test]
    async fn test_delete_cascades_to_grants() {
        let network = InMemoryNetwork::new();
        let alice = SecretKey::generate();
        let bob = SecretKey::generate();
        let session = bound_session(&network, &alice).await;
        let (tx, _rx) = mpsc::unbounded_channel();
        let file_id = session.put(upload(b"doomed"), tx).await.unwrap();
        let key = FileKey::generate();
        session
            .upsert(&ShareGrant::new(
                file_id.clone(),
                bob.public_key(),
                key.wrap_for(&bob.public_key()).unwrap(),
            ))
            .await
            .unwrap();

        session.delete(&file_id).await.unwrap();

        assert!(network.grantees_of(&file_id).is_empty());
        assert_eq!(network.file_count(), 0);
    }

    #[tokio::test]
    async fn test_lost_response_still_reassigns() {
        let network = InMemoryNetwork::new();
        let alice = SecretKey::generate();
        let bob = SecretKey::generate();
        let session = bound_session(&network, &alice).await;
        let (tx, _rx) = mpsc::unbounded_channel();
        let file_id = session.put(upload(b"moving"), tx).await.unwrap();
        network
            .faults()
            .fail_next(FaultPoint::ReassignOwnerLostResponse);

        let result = session.reassign_owner(&file_id, &bob.address()).await;

        assert!(result.is_err());
        assert_eq!(network.owner_of(&file_id), Some(bob.address()));
    }

    #[tokio::test]
    async fn test_storage_allowance_is_enforced() {
        let network = InMemoryNetwork::with_limits(AccountLimits {
            total_storage: 4,
            total_bandwidth: 100,
        });
        let alice = SecretKey::generate();
        let session = bound_session(&network, &alice).await;
        let (tx, _rx) = mpsc::unbounded_channel();

        let err = session.put(upload(b"too large"), tx).await.unwrap_err();

        assert!(matches!(err, TransportError::Rejected(_)));
    }
}
