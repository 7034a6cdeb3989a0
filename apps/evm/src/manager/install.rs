//! Installing and removing versions.
//!
//! Extraction happens in a hidden staging directory inside the root and the
//! payload is renamed into `elasticsearch-<version>` only once it is complete,
//! so an interrupted install never leaves a half-populated version directory
//! that `list` would report.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use super::activation::{Activation, activate};
use super::archive::extract_tar_gz;
use super::config::EvmConfig;
use super::download::Downloader;
use super::platform::Platform;
use super::process::ProcessLocator;
use super::registry::VersionRegistry;
use super::version::EsVersion;
use crate::errors::EvmError;

const STAGING_PREFIX: &str = ".install-";

/// Result of a successful install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub version: EsVersion,
    pub dir: PathBuf,
    /// Set when no version was active and this one became active.
    pub activated: bool,
}

/// Downloads, verifies, and installs `version`.
///
/// The artifact is deleted afterwards whether extraction succeeded or not.
/// When nothing is active the new version is activated, unless a server is
/// running, in which case the pointer is left alone.
///
/// # Errors
///
/// Returns [`EvmError::AlreadyInstalled`] if the version directory exists,
/// any download or verification error, or an I/O error during extraction.
pub async fn install(
    config: &EvmConfig,
    locator: &dyn ProcessLocator,
    downloader: &Downloader<'_>,
    version: &EsVersion,
    platform: Platform,
) -> Result<InstallOutcome> {
    let registry = VersionRegistry::new(config);
    if registry.is_installed(version) {
        return Err(EvmError::AlreadyInstalled {
            version: version.to_string(),
        }
        .into());
    }
    config.ensure_root()?;

    let artifact = downloader.download(version, platform).await?;
    let unpacked = unpack(config, &artifact, version);
    if let Err(e) = std::fs::remove_file(&artifact) {
        debug!(artifact = %artifact.display(), error = %e, "artifact cleanup failed");
    }
    let dir = unpacked?;
    info!(%version, dir = %dir.display(), "installed");

    let activated = if registry.current_version()?.is_some() {
        false
    } else if let Some(pid) = locator.find_running_server_pid()? {
        warn!(%version, pid, "server running; active version left unchanged");
        false
    } else {
        matches!(
            activate(config, locator, version)?,
            Activation::Activated(_)
        )
    };

    Ok(InstallOutcome {
        version: version.clone(),
        dir,
        activated,
    })
}

/// Deletes an installed version directory.
///
/// Checks run in order: a live server blocks removal, then the version must
/// be installed, then it must not be the active one.
///
/// # Errors
///
/// Returns [`EvmError::ServerRunning`], [`EvmError::NotInstalled`],
/// [`EvmError::RemoveActive`], or an I/O error if deletion fails.
pub fn remove_version(
    config: &EvmConfig,
    locator: &dyn ProcessLocator,
    version: &EsVersion,
) -> Result<PathBuf> {
    if let Some(pid) = locator.find_running_server_pid()? {
        return Err(EvmError::ServerRunning { pid }.into());
    }

    let registry = VersionRegistry::new(config);
    if !registry.is_installed(version) {
        return Err(EvmError::NotInstalled {
            version: version.to_string(),
        }
        .into());
    }
    if registry.current_version()?.as_ref() == Some(version) {
        return Err(EvmError::RemoveActive {
            version: version.to_string(),
        }
        .into());
    }

    let dir = registry.version_directory(version);
    std::fs::remove_dir_all(&dir)
        .with_context(|| format!("Failed to remove {}", dir.display()))?;
    info!(%version, "removed");
    Ok(dir)
}

fn unpack(config: &EvmConfig, artifact: &std::path::Path, version: &EsVersion) -> Result<PathBuf> {
    let staging = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir_in(&config.root)
        .with_context(|| format!("Failed to create staging directory in {}", config.root.display()))?;

    let payload = staging.path().join("payload");
    extract_tar_gz(artifact, &payload)
        .with_context(|| format!("Failed to extract {}", artifact.display()))?;

    let dest = config.version_dir(version);
    std::fs::rename(&payload, &dest).with_context(|| {
        format!("Failed to move {} to {}", payload.display(), dest.display())
    })?;
    Ok(dest)
}
