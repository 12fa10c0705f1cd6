//! Shared wiring for use case unit tests

use std::sync::Arc;
use std::time::Duration;

use crate::application::events::Notifier;
use crate::application::ports::{
    BlobTransport, IdentityDirectory, MockBlobTransport, MockIdentityDirectory,
    MockNotificationSink, MockQuotaSource, MockWallet, WalletError,
};
use crate::application::session::Session;
use crate::application::use_cases::{IdentityResolver, QuotaTracker};
use crate::domain::capability::SecretKey;
use crate::domain::value_objects::QuotaSnapshot;

pub(crate) fn quiet_notifier() -> Notifier {
    let mut sink = MockNotificationSink::new();
    sink.expect_notify().returning(|_| ());
    Notifier::new(Arc::new(sink))
}

/// Wallet mock backed by a real secret so capabilities unwrap for real
pub(crate) fn wallet_for(secret: &SecretKey) -> MockWallet {
    let mut wallet = MockWallet::new();
    wallet.expect_public_key().return_const(secret.public_key());
    wallet.expect_address().return_const(secret.address());
    let unwrap_with = secret.clone();
    wallet.expect_unwrap_capability().returning(move |cap| {
        unwrap_with
            .unwrap(cap)
            .map_err(|e| WalletError::Unwrap(e.to_string()))
    });
    wallet
}

/// Session already bound through `transport`; the mock gets a `connect` expectation
pub(crate) async fn connected_session(
    secret: &SecretKey,
    mut transport: MockBlobTransport,
) -> (Arc<Session>, Arc<dyn BlobTransport>) {
    transport.expect_connect().returning(|_| Ok(()));
    let transport: Arc<dyn BlobTransport> = Arc::new(transport);
    let session = Arc::new(Session::new(
        Arc::new(wallet_for(secret)),
        Arc::clone(&transport),
    ));
    session
        .connect()
        .await
        .expect("mock transport accepts the session");
    (session, transport)
}

/// Directory that knows exactly the given secrets, keyed by identifier
pub(crate) fn resolver_for(entries: &[(&str, &SecretKey)]) -> Arc<IdentityResolver> {
    let known: Vec<(String, crate::domain::value_objects::PublicKey)> = entries
        .iter()
        .map(|(identifier, secret)| (identifier.to_string(), secret.public_key()))
        .collect();
    let mut directory = MockIdentityDirectory::new();
    directory.expect_public_key_for().returning(move |identifier| {
        Ok(known
            .iter()
            .find(|(name, _)| name == identifier.as_str())
            .map(|(_, key)| *key))
    });
    let directory: Arc<dyn IdentityDirectory> = Arc::new(directory);
    Arc::new(IdentityResolver::new(directory, Duration::from_secs(1)))
}

pub(crate) fn steady_quota(notifier: &Notifier) -> Arc<QuotaTracker> {
    let mut source = MockQuotaSource::new();
    source
        .expect_usage()
        .returning(|| Ok(QuotaSnapshot::new(0, 1024, 0, 1024)));
    Arc::new(QuotaTracker::new(
        Arc::new(source),
        Duration::from_secs(1),
        notifier.clone(),
    ))
}
