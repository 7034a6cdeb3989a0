//! Install command for the evm CLI.
//!
//! Downloads, verifies, and installs a specific Elasticsearch version.
//!
//! ## Usage
//!
//! ```bash
//! evm install 8.9.0
//! ```

use anyhow::Result;
use clap::Args;

use crate::manager::download::Downloader;
use crate::manager::install::install;
use crate::manager::lock::OperationLock;
use crate::manager::platform::Platform;
use crate::manager::process::PsProcessLocator;
use crate::manager::{EsVersion, EvmConfig};

/// Arguments for the install command.
#[derive(Args)]
pub struct InstallArgs {
    /// Version to install (e.g., "8.9.0").
    pub version: String,
}

/// Executes the install command.
///
/// # Process
///
/// 1. Validate the version and detect the platform
/// 2. Take the operation lock
/// 3. Probe mirrors and download the artifact with progress display
/// 4. Verify the published checksum, if any
/// 5. Extract into the root and activate if nothing is active and no
///    server is running
///
/// # Errors
///
/// Returns an error if:
/// - The version string or platform is invalid
/// - Another evm operation holds the lock
/// - The version is already installed
/// - Download, verification, or extraction fails
pub async fn execute(config: &EvmConfig, args: &InstallArgs) -> Result<()> {
    let version = EsVersion::parse(&args.version)?;
    let platform = Platform::detect()?;
    let _lock = OperationLock::acquire(config)?;

    let downloader = Downloader::new(config)?;
    let outcome = install(
        config,
        &PsProcessLocator::new(),
        &downloader,
        &version,
        platform,
    )
    .await?;

    println!(
        "Elasticsearch {} installed to {}",
        outcome.version,
        outcome.dir.display()
    );
    if outcome.activated {
        println!("Now using Elasticsearch {}", outcome.version);
    }

    Ok(())
}
