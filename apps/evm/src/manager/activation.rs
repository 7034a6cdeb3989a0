//! Switching the active version.

use anyhow::Result;
use tracing::{debug, info};

use super::config::EvmConfig;
use super::process::ProcessLocator;
use super::registry::VersionRegistry;
use super::version::EsVersion;
use crate::errors::EvmError;

/// Result of a successful [`activate`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// The pointer now targets the requested version.
    Activated(EsVersion),
    /// The version is not installed; the pointer was left alone.
    NotInstalled {
        requested: EsVersion,
        installed: Vec<EsVersion>,
    },
}

/// Makes `version` the active version.
///
/// Checks run in a fixed order and the first failing one wins: a live server
/// blocks the switch, re-activating the current version is rejected, and a
/// version that is not installed yields [`Activation::NotInstalled`] instead
/// of an error.
///
/// # Errors
///
/// Returns [`EvmError::ServerRunning`], [`EvmError::AlreadyActive`], or an
/// I/O error if the pointer cannot be replaced.
pub fn activate(
    config: &EvmConfig,
    locator: &dyn ProcessLocator,
    version: &EsVersion,
) -> Result<Activation> {
    if let Some(pid) = locator.find_running_server_pid()? {
        return Err(EvmError::ServerRunning { pid }.into());
    }

    let registry = VersionRegistry::new(config);
    if registry.current_version()?.as_ref() == Some(version) {
        return Err(EvmError::AlreadyActive {
            version: version.to_string(),
        }
        .into());
    }

    if !registry.is_installed(version) {
        debug!(%version, "activation target missing");
        return Ok(Activation::NotInstalled {
            requested: version.clone(),
            installed: registry.list_installed()?,
        });
    }

    registry
        .pointer()
        .replace(&EvmConfig::version_dir_name(version))?;
    info!(%version, "active version switched");
    Ok(Activation::Activated(version.clone()))
}
