//! Server process discovery and signalling.
//!
//! The supervisor never trusts the PID file: every query re-scans the process
//! table for the server's JVM main class. A previous `evm start` may have
//! exited long ago while its server keeps running.

use std::process::Command;

use anyhow::{Context, Result, bail};

use crate::errors::EvmError;

/// Substring identifying a running server in the process table.
pub const SERVER_PROCESS_PATTERN: &str = "org.elasticsearch.bootstrap.Elasticsearch";

/// Finds the running server process, if any.
///
/// Implementations return `None` when no server is running and a single PID
/// otherwise. If several processes match, any one of them may be returned.
pub trait ProcessLocator {
    /// # Errors
    ///
    /// Returns an error if the process table cannot be inspected.
    fn find_running_server_pid(&self) -> Result<Option<u32>>;
}

/// Locates the server by scanning `ps` output.
#[derive(Debug, Clone)]
pub struct PsProcessLocator {
    pattern: String,
}

impl PsProcessLocator {
    #[must_use]
    pub fn new() -> Self {
        Self::with_pattern(SERVER_PROCESS_PATTERN)
    }

    #[must_use]
    pub fn with_pattern(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }
}

impl Default for PsProcessLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessLocator for PsProcessLocator {
    fn find_running_server_pid(&self) -> Result<Option<u32>> {
        let output = Command::new("ps")
            .args(["-A", "-o", "pid=,args="])
            .output()
            .context("Failed to execute ps")?;
        if !output.status.success() {
            bail!("ps exited with {}", output.status);
        }
        let table = String::from_utf8_lossy(&output.stdout);
        Ok(find_pid_in_table(&table, &self.pattern, std::process::id()))
    }
}

/// Returns the first PID in `ps -o pid=,args=` output whose command line
/// contains `pattern`, skipping `own_pid`.
fn find_pid_in_table(table: &str, pattern: &str, own_pid: u32) -> Option<u32> {
    table.lines().find_map(|line| {
        let line = line.trim_start();
        let (pid, args) = line.split_once(char::is_whitespace)?;
        let pid: u32 = pid.parse().ok()?;
        (pid != own_pid && args.contains(pattern)).then_some(pid)
    })
}

/// Sends SIGTERM to `pid`.
///
/// # Errors
///
/// Returns [`EvmError::SignalFailed`] if the signal cannot be delivered.
#[cfg(unix)]
pub fn terminate(pid: u32) -> Result<(), EvmError> {
    let signal_failed = |message: String| EvmError::SignalFailed { pid, message };
    let raw = libc::pid_t::try_from(pid).map_err(|_| signal_failed("pid out of range".into()))?;

    // SAFETY: kill(2) has no memory-safety preconditions.
    let rc = unsafe { libc::kill(raw, libc::SIGTERM) };
    if rc == 0 {
        Ok(())
    } else {
        Err(signal_failed(std::io::Error::last_os_error().to_string()))
    }
}

#[cfg(not(unix))]
pub fn terminate(pid: u32) -> Result<(), EvmError> {
    Err(EvmError::SignalFailed {
        pid,
        message: "signals are not supported on this platform".to_string(),
    })
}
