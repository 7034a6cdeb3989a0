//! Which command for the evm CLI.
//!
//! ## Usage
//!
//! ```bash
//! evm which           # Directory of the active version
//! evm which 7.17.10   # Directory of a specific installed version
//! ```

use anyhow::Result;
use clap::Args;

use crate::errors::EvmError;
use crate::manager::registry::VersionRegistry;
use crate::manager::{EsVersion, EvmConfig};

/// Arguments for the which command.
#[derive(Args)]
pub struct WhichArgs {
    /// Installed version to locate; defaults to the active version.
    pub version: Option<String>,
}

/// Executes the which command.
///
/// # Errors
///
/// Returns an error if the version string is invalid, no version is active
/// and none was given, or the version is not installed.
pub fn execute(config: &EvmConfig, args: &WhichArgs) -> Result<()> {
    let registry = VersionRegistry::new(config);
    let version = match &args.version {
        Some(raw) => EsVersion::parse(raw)?,
        None => registry
            .current_version()?
            .ok_or(EvmError::NoActiveVersion)?,
    };

    if !registry.is_installed(&version) {
        return Err(EvmError::NotInstalled {
            version: version.to_string(),
        }
        .into());
    }

    println!("{}", registry.version_directory(&version).display());
    Ok(())
}
