//! Start command for the evm CLI.
//!
//! Launches the active version in the background and blocks until it
//! answers its status endpoint.
//!
//! ## Usage
//!
//! ```bash
//! evm start
//! evm start -E cluster.name=dev -E http.port=9201
//! ```

use anyhow::Result;
use clap::Args;

use crate::manager::EvmConfig;
use crate::manager::process::PsProcessLocator;
use crate::manager::supervisor::{ProcessSupervisor, Setting};

/// Arguments for the start command.
#[derive(Args)]
pub struct StartArgs {
    /// Server setting passed through as `-E key=value` (repeatable).
    #[arg(short = 'E', value_name = "KEY=VALUE", value_parser = Setting::parse)]
    pub settings: Vec<Setting>,
}

/// Executes the start command.
///
/// # Errors
///
/// Returns an error if:
/// - A server is already running
/// - No version is active
/// - The server exits early or never becomes ready
pub async fn execute(config: &EvmConfig, args: &StartArgs) -> Result<()> {
    let locator = PsProcessLocator::new();
    let supervisor = ProcessSupervisor::new(config, &locator)?;

    println!("Starting Elasticsearch...");
    let started = supervisor.start(&args.settings).await?;

    match started.pid {
        Some(pid) => println!("Elasticsearch {} is running (pid {pid})", started.version),
        None => println!("Elasticsearch {} is running", started.version),
    }
    Ok(())
}
