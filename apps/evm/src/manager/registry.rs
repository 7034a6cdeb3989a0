//! Installed version enumeration.
//!
//! The installed set is derived from the filesystem on every call: each
//! directory named `elasticsearch-<version>` under the root is one installed
//! version. Nothing is cached.

use std::path::PathBuf;

use anyhow::{Context, Result};

use super::config::{EvmConfig, PRODUCT};
use super::pointer::{ActiveVersionPointer, PointerState};
use super::version::EsVersion;

/// Read-only view of the versions installed under the root.
#[derive(Debug, Clone)]
pub struct VersionRegistry<'a> {
    config: &'a EvmConfig,
    pointer: ActiveVersionPointer,
}

impl<'a> VersionRegistry<'a> {
    #[must_use]
    pub fn new(config: &'a EvmConfig) -> Self {
        Self {
            config,
            pointer: ActiveVersionPointer::new(config),
        }
    }

    #[must_use]
    pub fn pointer(&self) -> &ActiveVersionPointer {
        &self.pointer
    }

    /// Lists installed versions, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the root exists but cannot be read.
    pub fn list_installed(&self) -> Result<Vec<EsVersion>> {
        if !self.config.root.exists() {
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(&self.config.root).with_context(|| {
            format!(
                "Failed to read installation root: {}",
                self.config.root.display()
            )
        })?;

        let prefix = format!("{PRODUCT}-");
        let mut versions = Vec::new();
        for entry in entries {
            let entry = entry.with_context(|| "Failed to read directory entry")?;
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if !file_type.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str()
                && let Some(raw) = name.strip_prefix(&prefix)
                && let Ok(version) = EsVersion::parse(raw)
            {
                versions.push(version);
            }
        }

        versions.sort_by(|a, b| b.cmp(a));
        Ok(versions)
    }

    /// Returns the active version, if the pointer resolves to one.
    ///
    /// # Errors
    ///
    /// Returns an error if the pointer cannot be read.
    pub fn current_version(&self) -> Result<Option<EsVersion>> {
        self.pointer.current()
    }

    /// Returns the raw pointer state, including dangling pointers.
    ///
    /// # Errors
    ///
    /// Returns an error if the pointer cannot be read.
    pub fn pointer_state(&self) -> Result<PointerState> {
        self.pointer.read()
    }

    /// Returns the install directory of `version`. Existence is not implied.
    #[must_use]
    pub fn version_directory(&self, version: &EsVersion) -> PathBuf {
        self.config.version_dir(version)
    }

    #[must_use]
    pub fn is_installed(&self, version: &EsVersion) -> bool {
        self.version_directory(version).is_dir()
    }
}
