//! Status command for the evm CLI.
//!
//! ## Output Format
//!
//! ```text
//! Elasticsearch 8.9.0 is running (pid 4242)
//! ```

use anyhow::Result;

use crate::manager::EvmConfig;
use crate::manager::process::PsProcessLocator;
use crate::manager::registry::VersionRegistry;
use crate::manager::supervisor::{ProcessSupervisor, ServerStatus};

/// Executes the status command.
///
/// # Errors
///
/// Returns an error if the process table or the active pointer cannot be read.
pub fn execute(config: &EvmConfig) -> Result<()> {
    let locator = PsProcessLocator::new();
    let status = ProcessSupervisor::new(config, &locator)?.status()?;
    let active = VersionRegistry::new(config).current_version()?;

    let label = active.map_or_else(|| "Elasticsearch".to_string(), |v| format!("Elasticsearch {v}"));
    match status {
        ServerStatus::Running { pid } => println!("{label} is running (pid {pid})"),
        ServerStatus::Stopped => println!("{label} is not running"),
    }
    Ok(())
}
