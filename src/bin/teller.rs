use std::fs::File;

use anyhow::{Context, Result};
use teller::{
    bin_utils::{RowError, Service},
    config::TellerConfig,
    error::LedgerError,
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let filename = args
        .next()
        .context("Expected an operations file name as the first argument")?;
    let config = match args.next() {
        Some(path) => TellerConfig::from_file(&path)
            .with_context(|| format!("Failed to load config `{path}`"))?,
        None => TellerConfig::default(),
    }
    .with_env_overrides();

    // logs go to stderr, stdout carries the account table
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let file = File::open(&filename).with_context(|| format!("Failed to open `{filename}`"))?;

    let service = Service {
        input: file,
        output: &mut std::io::stdout(),
        config,
        error_printer: Box::new(|line, err| match err {
            RowError::Ledger(LedgerError::InvariantViolation(_)) => {
                // business rejections, not technical errors, so we don't print them
            }
            RowError::Ledger(err) if err.leaves_partial_state() => {
                eprintln!("Line {line} left partial state, reconcile: {err}")
            }
            err => eprintln!("Error at line {line}: {err}"),
        }),
    };
    service.run().await
}
