use anyhow::Context;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use torii_producer::{
    builder::ThreadRngNonce,
    config::Config,
    producer::{LoopDriver, Stats, submitter},
    SubmitOptions, ToriiClient, TransactionBuilder,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Entry point of the producer.
///
/// Loads configuration, builds the ledger client and runs the production loop
/// until Ctrl-C (or until `PRODUCER_MAX_BATCHES` batches were sent).
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Everything below is fatal on failure; the loop never starts.
    let config = Config::from_env().context("failed to load configuration")?;
    info!("Producer starting with config: {:?}", config);

    let client_config = config.client_config().context("invalid authority credentials")?;
    let client = Arc::new(ToriiClient::new(client_config).context("failed to construct ledger client")?);

    let builder = Arc::new(TransactionBuilder::new(Arc::new(ThreadRngNonce::new(
        config.producer.nonce_range,
    ))));
    let options = SubmitOptions {
        verify: config.producer.verify,
    };

    let shutdown = CancellationToken::new();
    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received");
                ctrl_c.cancel();
            }
            Err(e) => warn!("Failed to listen for Ctrl-C, graceful shutdown disabled: {}", e),
        }
    });

    let stats = Arc::new(Stats::new());
    let mut driver = LoopDriver::new(config.producer_settings(), stats.clone(), shutdown);
    let submit_one = submitter(client, builder, options);

    info!("Producing dummy transactions...");
    let batches = match config.producer.max_batches {
        Some(limit) => driver.run_batches(limit, submit_one).await,
        None => driver.run(submit_one).await,
    };

    info!(
        batches,
        succeeded = stats.succeeded(),
        failed = stats.failed(),
        abandoned = stats.abandoned(),
        "Producer finished"
    );
    Ok(())
}
