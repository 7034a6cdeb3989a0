//! Use command for the evm CLI.
//!
//! Switches the active version by repointing the `elasticsearch` symlink.
//!
//! ## Usage
//!
//! ```bash
//! evm use 7.17.10
//! ```

use anyhow::Result;
use clap::Args;

use crate::manager::activation::{Activation, activate};
use crate::manager::lock::OperationLock;
use crate::manager::process::PsProcessLocator;
use crate::manager::{EsVersion, EvmConfig};

/// Arguments for the use command.
#[derive(Args)]
pub struct UseArgs {
    /// Version to activate (e.g., "7.17.10").
    pub version: String,
}

/// Executes the use command.
///
/// A version that is not installed is not an error: the installed versions
/// are printed instead and the command succeeds.
///
/// # Errors
///
/// Returns an error if:
/// - The version string is invalid
/// - Another evm operation holds the lock
/// - A server is running
/// - The version is already active
pub fn execute(config: &EvmConfig, args: &UseArgs) -> Result<()> {
    let version = EsVersion::parse(&args.version)?;
    let _lock = OperationLock::acquire(config)?;

    match activate(config, &PsProcessLocator::new(), &version)? {
        Activation::Activated(version) => {
            println!("Now using Elasticsearch {version}");
        }
        Activation::NotInstalled {
            requested,
            installed,
        } => {
            println!("Elasticsearch {requested} is not installed.");
            if installed.is_empty() {
                println!("No versions installed. Run 'evm install {requested}' first.");
            } else {
                println!("Installed versions:");
                for version in &installed {
                    println!("  {version}");
                }
            }
        }
    }

    Ok(())
}
