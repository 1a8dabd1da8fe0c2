//! CLI Adapter
//!
//! Command-line interface for the sniper keystore.
//! Uses clap derive macros for argument parsing.

mod commands;

pub use commands::{CliApp, Command, ListCmd, PubkeyCmd, SignCmd, WalletArgs};

use anyhow::{Context, Result};
use std::future::Future;
use std::time::Duration;

/// How long to wait for blocking workers on exit. A discovery thread stuck
/// on a hung filesystem is abandoned after this.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// Execute the CLI command
pub async fn execute(app: CliApp) -> Result<()> {
    commands::execute(app).await
}

/// Build the runtime, execute the command and shut down without waiting on
/// stalled filesystem reads
pub fn run(app: CliApp) -> Result<()> {
    run_on_runtime(execute(app))
}

fn run_on_runtime<F>(future: F) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let result = runtime.block_on(future);
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    result
}
