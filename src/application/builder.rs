use std::sync::Arc;

use tracing::info;

use crate::application::client::StorageClient;
use crate::application::events::Notifier;
use crate::application::ports::{
    BlobTransport, FileCatalog, GrantStore, IdentityDirectory, NotificationSink, QuotaSource,
    Wallet,
};
use crate::application::session::Session;
use crate::application::use_cases::{
    AccessGrantManager, FileLocks, FileRegistry, IdentityResolver, QuotaTracker,
    StorageOperationPipeline, TransferCoordinator,
};
use crate::config::Config;
use crate::infrastructure::notifications::TracingSink;

type BuildResult = Result<StorageClient, Box<dyn std::error::Error + Send + Sync>>;

/// Wires the collaborators into a [`StorageClient`].
///
/// Every collaborator is passed in explicitly; the only default is the
/// notification sink, which falls back to [`TracingSink`].
pub struct StorageClientBuilder {
    config: Config,
    wallet: Option<Arc<dyn Wallet>>,
    directory: Option<Arc<dyn IdentityDirectory>>,
    transport: Option<Arc<dyn BlobTransport>>,
    catalog: Option<Arc<dyn FileCatalog>>,
    grants: Option<Arc<dyn GrantStore>>,
    quota_source: Option<Arc<dyn QuotaSource>>,
    sink: Option<Arc<dyn NotificationSink>>,
}

impl StorageClientBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            wallet: None,
            directory: None,
            transport: None,
            catalog: None,
            grants: None,
            quota_source: None,
            sink: None,
        }
    }

    pub fn with_wallet(mut self, wallet: Arc<dyn Wallet>) -> Self {
        self.wallet = Some(wallet);
        self
    }

    pub fn with_directory(mut self, directory: Arc<dyn IdentityDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn BlobTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_catalog(mut self, catalog: Arc<dyn FileCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn with_grant_store(mut self, grants: Arc<dyn GrantStore>) -> Self {
        self.grants = Some(grants);
        self
    }

    pub fn with_quota_source(mut self, quota_source: Arc<dyn QuotaSource>) -> Self {
        self.quota_source = Some(quota_source);
        self
    }

    /// Use one storage network session for the transport, catalog, grant
    /// store and quota source
    pub fn with_network<N>(self, network: Arc<N>) -> Self
    where
        N: BlobTransport + FileCatalog + GrantStore + QuotaSource + 'static,
    {
        self.with_transport(network.clone())
            .with_catalog(network.clone())
            .with_grant_store(network.clone())
            .with_quota_source(network)
    }

    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn build(self) -> BuildResult {
        self.config.validate()?;

        let wallet = self.wallet.ok_or("Wallet not configured")?;
        let directory = self.directory.ok_or("Identity directory not configured")?;
        let transport = self.transport.ok_or("Blob transport not configured")?;
        let catalog = self.catalog.ok_or("File catalog not configured")?;
        let grants = self.grants.ok_or("Grant store not configured")?;
        let quota_source = self.quota_source.ok_or("Quota source not configured")?;
        let sink = self
            .sink
            .unwrap_or_else(|| Arc::new(TracingSink) as Arc<dyn NotificationSink>);

        let config = self.config;
        let notifier = Notifier::new(sink);
        let session = Arc::new(Session::new(wallet, Arc::clone(&transport)));
        let registry = Arc::new(FileRegistry::new());
        let locks = Arc::new(FileLocks::new(config.serialize_file_operations));
        let resolver = Arc::new(
            IdentityResolver::new(directory, config.resolution_timeout())
                .with_cache_ttl(config.identity_cache_ttl()),
        );
        let quota = Arc::new(QuotaTracker::new(
            quota_source,
            config.quota_timeout(),
            notifier.clone(),
        ));

        let pipeline = StorageOperationPipeline::new(
            Arc::clone(&session),
            Arc::clone(&transport),
            Arc::clone(&catalog),
            Arc::clone(&grants),
            Arc::clone(&registry),
            Arc::clone(&quota),
            Arc::clone(&locks),
            notifier.clone(),
            config.max_upload_bytes,
        );

        let access = AccessGrantManager::new(
            Arc::clone(&session),
            Arc::clone(&resolver),
            Arc::clone(&catalog),
            Arc::clone(&grants),
            Arc::clone(&transport),
            Arc::clone(&quota),
            Arc::clone(&locks),
            notifier.clone(),
            config.revocation_policy,
        );

        let transfers = TransferCoordinator::new(
            Arc::clone(&session),
            resolver,
            catalog,
            grants,
            Arc::clone(&transport),
            Arc::clone(&registry),
            Arc::clone(&quota),
            locks,
            notifier.clone(),
            config.transfer_grant_policy,
        );

        info!(
            revocation_policy = ?config.revocation_policy,
            transfer_grant_policy = ?config.transfer_grant_policy,
            max_upload_bytes = config.max_upload_bytes,
            "Storage client initialized"
        );

        Ok(StorageClient {
            config,
            session,
            registry,
            quota,
            pipeline,
            access,
            transfers,
            notifier,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
