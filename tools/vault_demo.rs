use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use bytes::Bytes;
use clap::Parser;

use sharevault::config::{GrantTransferPolicy, RevocationPolicy};
use sharevault::infrastructure::{InMemoryDirectory, InMemoryNetwork, LocalWallet, RecordingSink};
use sharevault::ports::Wallet;
use sharevault::telemetry::init_tracing;
use sharevault::value_objects::Identifier;
use sharevault::{Config, StorageClient, StorageClientBuilder};

/// Walk two identities through upload, share, revoke and transfer on an
/// in-memory storage network
#[derive(Parser)]
struct Cli {
    /// File to upload; random bytes are generated when omitted
    #[arg(long)]
    file: Option<PathBuf>,

    /// Size of the generated payload in bytes
    #[arg(long, default_value_t = 1024 * 1024)]
    size: usize,

    #[arg(long, default_value = "alice@example.com")]
    owner: String,

    #[arg(long, default_value = "bob@example.com")]
    recipient: String,

    /// TOML config file; SHAREVAULT_* environment variables otherwise
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    revocation_policy: Option<RevocationPolicy>,

    #[arg(long)]
    transfer_grant_policy: Option<GrantTransferPolicy>,

    /// Print the owner's event log as JSON lines
    #[arg(long)]
    json_events: bool,
}

fn build_client(
    config: &Config,
    network: &InMemoryNetwork,
    directory: &Arc<InMemoryDirectory>,
    wallet: LocalWallet,
    sink: Arc<RecordingSink>,
) -> anyhow::Result<StorageClient> {
    StorageClientBuilder::new(config.clone())
        .with_wallet(Arc::new(wallet))
        .with_directory(directory.clone())
        .with_network(network.session())
        .with_sink(sink)
        .build()
        .map_err(|e| anyhow::anyhow!(e))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::from_env(),
    };
    if let Some(policy) = cli.revocation_policy {
        config.revocation_policy = policy;
    }
    if let Some(policy) = cli.transfer_grant_policy {
        config.transfer_grant_policy = policy;
    }
    init_tracing(&config);

    let payload = match &cli.file {
        Some(path) => Bytes::from(
            tokio::fs::read(path)
                .await
                .with_context(|| format!("reading {}", path.display()))?,
        ),
        None => Bytes::from((0..cli.size).map(|_| rand::random::<u8>()).collect::<Vec<_>>()),
    };

    let network = InMemoryNetwork::new();
    let directory = Arc::new(InMemoryDirectory::new());
    let owner_wallet = LocalWallet::generate();
    let recipient_wallet = LocalWallet::generate();
    directory.register(Identifier::parse(&cli.owner)?, owner_wallet.public_key());
    directory.register(
        Identifier::parse(&cli.recipient)?,
        recipient_wallet.public_key(),
    );

    let owner_events = Arc::new(RecordingSink::new());
    let owner = build_client(&config, &network, &directory, owner_wallet, owner_events.clone())?;
    let recipient = build_client(
        &config,
        &network,
        &directory,
        recipient_wallet,
        Arc::new(RecordingSink::new()),
    )?;

    owner.init_storage().await?;
    recipient.init_storage().await?;

    let file_id = owner
        .upload(payload.clone(), payload.len() as u64)
        .await?;
    let limits = owner.fetch_storage_limits().await?;
    println!(
        "uploaded {file_id} ({} bytes), storage used {}/{}",
        payload.len(),
        limits.storage_used,
        limits.total_storage
    );

    owner.share(&file_id, &cli.recipient).await?;
    let grantees = owner.get_shared_users(&file_id).await?;
    println!("shared with {:?}", grantees.iter().map(|a| a.as_str()).collect::<Vec<_>>());

    let copy = recipient.download(&file_id).await?;
    println!("{} downloaded {} bytes", cli.recipient, copy.data.len());

    let outcome = owner.revoke(&file_id, &recipient.address()).await?;
    println!("revoked: {outcome:?}");
    match recipient.download(&file_id).await {
        Ok(_) => println!("unexpected: download still works after revoke"),
        Err(e) => println!("{} after revoke: {}", cli.recipient, e.user_message()),
    }

    let receipt = owner.change_file_owner(&file_id, &cli.recipient).await?;
    println!(
        "ownership moved {} -> {}",
        receipt.previous_owner, receipt.new_owner
    );
    println!(
        "{} now owns {} file(s), {} owns {}",
        cli.recipient,
        recipient.fetch_my_files().await?.len(),
        cli.owner,
        owner.fetch_my_files().await?.len()
    );

    if cli.json_events {
        for event in owner_events.events() {
            println!("{}", serde_json::to_string(&event)?);
        }
    } else {
        for message in owner_events.messages() {
            println!("> {message}");
        }
    }

    Ok(())
}
