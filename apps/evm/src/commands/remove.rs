//! Remove command for the evm CLI.
//!
//! Deletes an installed version directory. The active version and any
//! version while a server is running cannot be removed.
//!
//! ## Usage
//!
//! ```bash
//! evm remove 7.17.10
//! ```

use anyhow::Result;
use clap::Args;

use crate::manager::install::remove_version;
use crate::manager::lock::OperationLock;
use crate::manager::process::PsProcessLocator;
use crate::manager::{EsVersion, EvmConfig};

/// Arguments for the remove command.
#[derive(Args)]
pub struct RemoveArgs {
    /// Version to remove (e.g., "7.17.10").
    pub version: String,
}

/// Executes the remove command.
///
/// # Errors
///
/// Returns an error if:
/// - The version string is invalid
/// - Another evm operation holds the lock
/// - A server is running
/// - The version is not installed or is the active version
pub fn execute(config: &EvmConfig, args: &RemoveArgs) -> Result<()> {
    let version = EsVersion::parse(&args.version)?;
    let _lock = OperationLock::acquire(config)?;

    remove_version(config, &PsProcessLocator::new(), &version)?;
    println!("Elasticsearch {version} removed");
    Ok(())
}
