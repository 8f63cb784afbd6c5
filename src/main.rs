//! Bulk domain-name registrar
//!
//! Derives one signing wallet per seed phrase, registers an available
//! domain name for each and makes it primary, under bounded concurrency
//! with proxy rotation and retry.

use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

mod chain;
mod config;
mod error;
mod names;
mod pool;
mod registrar;
mod retry;
mod state;
mod tx;
mod wallet;

use chain::{NodeClient, SessionPool};
use config::Settings;
use pool::WorkerPool;
use registrar::DomainRegistrar;
use retry::RetryPolicy;
use state::OutcomeLog;
use tx::{GasPolicy, SubmitterConfig, TransactionSubmitter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    init_logging();

    info!("Starting names-registrar v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let settings = Settings::load()?;

    // Fresh outcome files for this run
    let outcome_log = Arc::new(OutcomeLog::new(
        settings.files.succeeded.clone(),
        settings.files.failed.clone(),
    ));
    outcome_log
        .reset()
        .await
        .context("Failed to reset outcome files")?;

    // Sessions: one per proxy, or a single direct one
    let proxies = if settings.run.use_proxy {
        let proxies = state::read_lines(&settings.files.proxies)
            .await
            .context("Failed to read proxy list")?;
        if proxies.is_empty() {
            error!("Proxy usage is enabled, but the file with them is empty");
            return Ok(());
        }
        proxies
    } else {
        info!("Working without proxies");
        Vec::new()
    };
    let timeout = Duration::from_secs(settings.node.request_timeout_secs);
    let sessions = Arc::new(SessionPool::build(&proxies, timeout)?);

    let mut seed_phrases = state::read_lines(&settings.files.seed_phrases)
        .await
        .context("Failed to read seed phrases")?;
    if seed_phrases.is_empty() {
        error!("No seed phrases to process");
        return Ok(());
    }
    if settings.run.shuffle_accounts {
        seed_phrases.shuffle(&mut rand::thread_rng());
    }
    info!(
        "Loaded {} wallets across {} sessions",
        seed_phrases.len(),
        sessions.len()
    );

    // Wire the workflow: node client -> submitter -> registrar -> pool
    let node = Arc::new(NodeClient::new(settings.node.url.clone()));
    let submitter = TransactionSubmitter::new(
        node,
        GasPolicy::new(settings.run.gas_amount_range, settings.node.gas_unit_price),
        SubmitterConfig {
            expiration_ttl_secs: settings.node.expiration_ttl_secs,
            transaction_wait_secs: settings.node.transaction_wait_secs,
        },
    );
    let retry_policy = RetryPolicy {
        max_attempts: settings.run.max_retries,
        sleep_range: settings.run.sleep_range,
    };
    let registrar = Arc::new(DomainRegistrar::new(
        submitter,
        settings.names.clone(),
        &settings.node,
        retry_policy,
    ));

    let pool = WorkerPool::new(registrar, sessions, outcome_log, settings.run.clone());
    let summary = pool.run(seed_phrases).await;

    info!(
        "Wallets: {} Succeeded: {} Failed: {}",
        summary.total, summary.succeeded, summary.failed
    );

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,names_registrar=debug,hyper=warn,reqwest=warn")
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();
}
