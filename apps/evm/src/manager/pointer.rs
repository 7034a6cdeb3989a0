//! The active version pointer.
//!
//! A single symlink inside the installation root names the active version's
//! directory. It is replaced by creating a fresh link next to it and renaming
//! it over the old one, so readers never observe a missing pointer.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::config::{EvmConfig, PRODUCT};
use super::version::EsVersion;

/// What the pointer currently refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerState {
    /// No pointer exists.
    Absent,
    /// The pointer targets an existing version directory.
    Active(EsVersion),
    /// The pointer exists but its target is missing or not a version directory.
    Dangling(PathBuf),
}

/// Handle on the `<root>/elasticsearch` symlink.
#[derive(Debug, Clone)]
pub struct ActiveVersionPointer {
    link: PathBuf,
}

impl ActiveVersionPointer {
    #[must_use]
    pub fn new(config: &EvmConfig) -> Self {
        Self {
            link: config.pointer_path(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.link
    }

    /// Reads the pointer without following it further than one level.
    ///
    /// # Errors
    ///
    /// Returns an error if the pointer exists but cannot be read as a link.
    pub fn read(&self) -> Result<PointerState> {
        if self.link.symlink_metadata().is_err() {
            return Ok(PointerState::Absent);
        }
        let target = std::fs::read_link(&self.link)
            .with_context(|| format!("Failed to read link: {}", self.link.display()))?;

        let version = target
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.strip_prefix(&format!("{PRODUCT}-")))
            .and_then(|raw| EsVersion::parse(raw).ok());

        match version {
            Some(version) if self.link.is_dir() => Ok(PointerState::Active(version)),
            _ => Ok(PointerState::Dangling(target)),
        }
    }

    /// Returns the active version, if the pointer resolves to one.
    ///
    /// # Errors
    ///
    /// Returns an error if the pointer cannot be read.
    pub fn current(&self) -> Result<Option<EsVersion>> {
        match self.read()? {
            PointerState::Active(version) => Ok(Some(version)),
            PointerState::Absent | PointerState::Dangling(_) => Ok(None),
        }
    }

    /// Points the link at `dir_name`, a directory name relative to the root.
    ///
    /// # Errors
    ///
    /// Returns an error if the staging link cannot be created or renamed.
    pub fn replace(&self, dir_name: &str) -> Result<()> {
        let staging = self
            .link
            .with_file_name(format!(".{PRODUCT}.link-{}", std::process::id()));
        if staging.symlink_metadata().is_ok() {
            std::fs::remove_file(&staging).with_context(|| {
                format!("Failed to remove stale link: {}", staging.display())
            })?;
        }

        create_dir_link(Path::new(dir_name), &staging)?;

        if let Err(e) = std::fs::rename(&staging, &self.link) {
            let _ = std::fs::remove_file(&staging);
            return Err(e).with_context(|| {
                format!(
                    "Failed to move {} over {}",
                    staging.display(),
                    self.link.display()
                )
            });
        }
        Ok(())
    }
}

/// Creates a directory symlink at `link` pointing to `target`.
fn create_dir_link(target: &Path, link: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(target, link).with_context(|| {
            format!(
                "Failed to create symlink from {} to {}",
                link.display(),
                target.display()
            )
        })?;
    }

    #[cfg(windows)]
    {
        std::os::windows::fs::symlink_dir(target, link).with_context(|| {
            format!(
                "Failed to create symlink from {} to {}",
                link.display(),
                target.display()
            )
        })?;
    }

    Ok(())
}
