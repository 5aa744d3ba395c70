//! ERC-1155 dry-run deployer
//!
//! Builds and signs a contract-creation transaction for a compiled ERC-1155
//! artifact, asks the node how much gas it would take, and prints the estimate.
//! The transaction is never broadcast.

use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};

mod account;
mod chain;
mod config;
mod contract;
mod error;
mod pipeline;
mod tx;

use account::Account;
use chain::ChainProvider;
use config::Settings;
use contract::ContractArtifact;
use error::{DeployerError, DeployerResult};
use pipeline::{DryRun, DryRunReport};
use tx::GasEstimator;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    init_logging();

    info!("Starting ERC-1155 dry-run deployer v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let settings = Settings::load()?;
    let deadline = Duration::from_secs(settings.run.timeout_secs);

    let result = run_bounded(deadline, run(&settings), shutdown_signal()).await;

    match result {
        Ok(report) => {
            info!(
                "Chain {}: deployment {:?} ({} bytes signed, not sent) would create {:?}",
                report.chain.chain_id,
                report.deployment.hash,
                report.deployment.raw.len(),
                report.deployment.contract_address
            );
            println!("{}", report);
            Ok(())
        }
        Err(e) => {
            if e.is_operator_error() {
                error!("Dry run aborted, check configuration: {}", e);
            } else {
                error!("Dry run failed: {}", e);
            }
            Err(e.into())
        }
    }
}

/// Drive `work` until it finishes, `deadline` elapses or `shutdown` resolves
async fn run_bounded<T, W, S>(deadline: Duration, work: W, shutdown: S) -> DeployerResult<T>
where
    W: Future<Output = DeployerResult<T>>,
    S: Future<Output = ()>,
{
    tokio::select! {
        outcome = tokio::time::timeout(deadline, work) => {
            outcome.unwrap_or_else(|_| Err(DeployerError::Timeout {
                operation: format!("dry run ({}s deadline)", deadline.as_secs()),
            }))
        }
        _ = shutdown => Err(DeployerError::Cancelled),
    }
}

async fn run(settings: &Settings) -> DeployerResult<DryRunReport> {
    let artifact = ContractArtifact::load(&settings.contract.artifact_path)?;
    info!(
        "Loaded {} ({} bytes of bytecode)",
        artifact.name(),
        artifact.bytecode().len()
    );

    let provider = ChainProvider::connect(&settings.node)?;
    info!("Using node {}", provider.url());

    let account = Account::load(&settings.wallet)?;

    DryRun::new(
        &provider,
        settings.node.chain_id,
        GasEstimator::new(settings.run.gas_limit_buffer_percent),
    )
    .execute(&account, &artifact, &settings.contract.constructor_args)
    .await
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,erc1155_dry_deployer=debug,hyper=warn"));

    // stdout carries only the estimate line
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
