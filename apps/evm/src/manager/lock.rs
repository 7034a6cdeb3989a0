//! Advisory lock serializing mutating commands.
//!
//! `install`, `use`, and `remove` hold `<root>/.evm.lock` for their duration.
//! A second invocation fails fast instead of waiting. The lock is released
//! when the guard is dropped (closing the descriptor releases the flock).

use std::fs::{File, OpenOptions};
use std::path::PathBuf;

use anyhow::{Context, Result};
use fs2::FileExt;
use tracing::debug;

use super::config::EvmConfig;
use crate::errors::EvmError;

/// RAII guard for the operation lock.
#[derive(Debug)]
pub struct OperationLock {
    _file: File,
    path: PathBuf,
}

impl OperationLock {
    /// Takes the lock without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`EvmError::OperationInProgress`] if another process holds the
    /// lock, or an I/O error if the lock file cannot be opened.
    pub fn acquire(config: &EvmConfig) -> Result<Self> {
        config.ensure_root()?;
        let path = config.lock_path();

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .with_context(|| format!("Failed to open lock file: {}", path.display()))?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                debug!(path = %path.display(), "operation lock acquired");
                Ok(Self { _file: file, path })
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock
                || e.kind() == fs2::lock_contended_error().kind() =>
            {
                Err(EvmError::OperationInProgress { path }.into())
            }
            Err(e) => Err(e).with_context(|| format!("Failed to lock {}", path.display())),
        }
    }
}

impl Drop for OperationLock {
    fn drop(&mut self) {
        debug!(path = %self.path.display(), "operation lock released");
    }
}
