// Command line front-end: one invocation runs one snapshot operation

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use search_snapshot::client::{Endpoint, SignedRequest};
use search_snapshot::config::SnapshotConfig;
use search_snapshot::notification::WebhookNotifier;
use search_snapshot::operations::{
    BackupRequest, ListRequest, RestoreRequest, SnapshotService, StatusRequest,
};
use search_snapshot::signing::AwsCredentials;

#[derive(Parser, Debug)]
#[command(name = "search-snapshot", version, about = "Back up, list and restore search cluster snapshots")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Invocation payload as JSON, e.g. '{"indices": "logs-*"}'
    #[arg(long, global = true, default_value = "{}", env = "SNAPSHOT_PAYLOAD")]
    payload: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Take a snapshot and wait until it finishes
    Backup,
    /// List one snapshot, or all of them
    List,
    /// Start restoring a snapshot
    Restore,
    /// Wait for an existing snapshot to finish
    Status,
}

fn payload<T: DeserializeOwned>(raw: &str) -> anyhow::Result<T> {
    serde_json::from_str(raw).with_context(|| format!("invalid payload: {}", raw))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = SnapshotConfig::from_env().context("loading configuration")?;

    let signer = SignedRequest::new(
        config.repository.region.clone(),
        Endpoint::parse(&config.endpoint)?,
        Arc::new(AwsCredentials::from_environment()),
    )?;

    let mut service = SnapshotService::new(signer, config.repository.clone(), config.poll_interval())
        .with_cluster_label(config.endpoint.clone());
    if let Some(url) = &config.webhook_url {
        match WebhookNotifier::new(url.clone()) {
            Ok(notifier) => service = service.with_notifier(Arc::new(notifier)),
            Err(error) => warn!(error = %error, "notifications disabled"),
        }
    }

    let output: Value = match cli.command {
        Command::Backup => {
            let record = service.backup(&payload::<BackupRequest>(&cli.payload)?).await?;
            record.into_raw()
        }
        Command::List => service.list(&payload::<ListRequest>(&cli.payload)?).await?,
        Command::Restore => service.restore(&payload::<RestoreRequest>(&cli.payload)?).await?,
        Command::Status => {
            let record = service.status(&payload::<StatusRequest>(&cli.payload)?).await?;
            record.into_raw()
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
