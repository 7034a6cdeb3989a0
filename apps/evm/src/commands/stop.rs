//! Stop command for the evm CLI.

use anyhow::Result;

use crate::manager::EvmConfig;
use crate::manager::process::PsProcessLocator;
use crate::manager::supervisor::ProcessSupervisor;

/// Executes the stop command.
///
/// Sends SIGTERM and waits, without a deadline, for the process to exit.
///
/// # Errors
///
/// Returns an error if no server is running or the signal cannot be sent.
pub async fn execute(config: &EvmConfig) -> Result<()> {
    let locator = PsProcessLocator::new();
    let supervisor = ProcessSupervisor::new(config, &locator)?;

    println!("Stopping Elasticsearch...");
    let pid = supervisor.stop().await?;
    println!("Elasticsearch stopped (pid {pid})");
    Ok(())
}
