//! Starting, stopping, and inspecting the server process.
//!
//! ## State Machine
//!
//! ```text
//! Stopped --start--> Starting --ready--> Running --stop--> Stopping --exited--> Stopped
//! ```
//!
//! `Starting` and `Stopping` only exist while a command is blocked polling;
//! between invocations the state is re-derived from the process table.

use std::fmt;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, trace};

use super::config::{EvmConfig, PRODUCT};
use super::process::{ProcessLocator, terminate};
use super::registry::VersionRegistry;
use super::version::EsVersion;
use crate::errors::EvmError;

/// Setting injected for majors above 7 unless the caller overrides it.
pub const SECURITY_SETTING_KEY: &str = "xpack.security.enabled";

/// Timeout for a single readiness request.
const READINESS_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Lifecycle states of the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Stopped => "stopped",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
        };
        f.write_str(name)
    }
}

/// Snapshot returned by [`ProcessSupervisor::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerStatus {
    Stopped,
    Running { pid: u32 },
}

/// A `key=value` server setting passed through to the launcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setting {
    raw: String,
    key_len: usize,
}

impl Setting {
    /// Parses a `key=value` pair. The value may be empty; the key may not.
    ///
    /// # Errors
    ///
    /// Returns a message suitable for clap when `=` or the key is missing.
    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw.split_once('=') {
            Some((key, _)) if !key.trim().is_empty() => Ok(Self {
                raw: raw.to_string(),
                key_len: key.len(),
            }),
            _ => Err(format!("expected key=value, got '{raw}'")),
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        self.raw[..self.key_len].trim()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// Details of a successful start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Started {
    pub version: EsVersion,
    pub pid: Option<u32>,
}

/// Drives the server process of the active version.
pub struct ProcessSupervisor<'a> {
    config: &'a EvmConfig,
    locator: &'a dyn ProcessLocator,
    client: reqwest::Client,
}

impl<'a> ProcessSupervisor<'a> {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &'a EvmConfig, locator: &'a dyn ProcessLocator) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(READINESS_REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            config,
            locator,
            client,
        })
    }

    /// Reports whether a server process is live. Never changes state.
    ///
    /// # Errors
    ///
    /// Returns an error if the process table cannot be inspected.
    pub fn status(&self) -> Result<ServerStatus> {
        Ok(match self.locator.find_running_server_pid()? {
            Some(pid) => ServerStatus::Running { pid },
            None => ServerStatus::Stopped,
        })
    }

    /// Starts the active version in the background and waits for readiness.
    ///
    /// # Errors
    ///
    /// - [`EvmError::ServerRunning`] if a server is already live
    /// - [`EvmError::NoActiveVersion`] if no version is active
    /// - [`EvmError::StartupFailed`] if the launcher fails or the process dies
    /// - [`EvmError::StartupTimeout`] if readiness is never observed
    pub async fn start(&self, settings: &[Setting]) -> Result<Started> {
        if let Some(pid) = self.locator.find_running_server_pid()? {
            return Err(EvmError::ServerRunning { pid }.into());
        }
        let registry = VersionRegistry::new(self.config);
        let version = registry
            .current_version()?
            .ok_or(EvmError::NoActiveVersion)?;

        transition(ServerState::Stopped, ServerState::Starting);
        self.launch(&version, &registry.version_directory(&version), settings)?;
        let pid = self.wait_until_ready(&version).await?;
        transition(ServerState::Starting, ServerState::Running);

        Ok(Started { version, pid })
    }

    /// Terminates the running server and waits until it is gone.
    ///
    /// The wait has no upper bound.
    ///
    /// # Errors
    ///
    /// - [`EvmError::NotRunning`] if no server is live
    /// - [`EvmError::SignalFailed`] if SIGTERM cannot be delivered
    pub async fn stop(&self) -> Result<u32> {
        let pid = self
            .locator
            .find_running_server_pid()?
            .ok_or(EvmError::NotRunning)?;

        transition(ServerState::Running, ServerState::Stopping);
        terminate(pid)?;

        while self.locator.find_running_server_pid()?.is_some() {
            trace!(pid, "waiting for server to exit");
            tokio::time::sleep(self.config.poll_interval).await;
        }
        transition(ServerState::Stopping, ServerState::Stopped);
        Ok(pid)
    }

    fn launch(&self, version: &EsVersion, home: &Path, settings: &[Setting]) -> Result<()> {
        let launcher = home.join("bin").join(PRODUCT);
        let startup_failed = |message: String| EvmError::StartupFailed {
            version: version.to_string(),
            message,
        };
        if !launcher.is_file() {
            return Err(startup_failed(format!("launcher not found: {}", launcher.display())).into());
        }

        let args = launch_args(version, &self.config.pid_file(), settings);
        debug!(launcher = %launcher.display(), ?args, "launching server");

        let status = Command::new(&launcher)
            .args(&args)
            .current_dir(home)
            .stdin(Stdio::null())
            .status()
            .with_context(|| format!("Failed to execute {}", launcher.display()))?;
        if !status.success() {
            return Err(startup_failed(format!("launcher exited with {status}")).into());
        }
        Ok(())
    }

    async fn wait_until_ready(&self, version: &EsVersion) -> Result<Option<u32>> {
        let attempts = self.config.startup_attempts;
        for attempt in 1..=attempts {
            let pid = self.locator.find_running_server_pid()?;
            if self.is_ready(version).await {
                return Ok(pid);
            }
            if pid.is_none() {
                return Err(EvmError::StartupFailed {
                    version: version.to_string(),
                    message: "the server process exited before becoming ready; \
                              check that a compatible Java runtime is available"
                        .to_string(),
                }
                .into());
            }
            trace!(attempt, attempts, "server not ready yet");
            tokio::time::sleep(self.config.poll_interval).await;
        }
        Err(EvmError::StartupTimeout {
            version: version.to_string(),
            attempts,
        }
        .into())
    }

    async fn is_ready(&self, version: &EsVersion) -> bool {
        let Ok(response) = self.client.get(&self.config.status_url).send().await else {
            return false;
        };
        if !response.status().is_success() {
            return false;
        }
        response
            .text()
            .await
            .is_ok_and(|body| body.contains(version.as_str()))
    }
}

/// Builds the launcher argument list: daemonize, PID hint, then settings.
#[must_use]
pub fn launch_args(version: &EsVersion, pid_file: &Path, settings: &[Setting]) -> Vec<String> {
    let mut args = vec![
        "-d".to_string(),
        "-p".to_string(),
        pid_file.display().to_string(),
    ];
    for setting in settings {
        args.push("-E".to_string());
        args.push(setting.as_str().to_string());
    }
    if version.major() > 7 && !settings.iter().any(|s| s.key() == SECURITY_SETTING_KEY) {
        args.push("-E".to_string());
        args.push(format!("{SECURITY_SETTING_KEY}=false"));
    }
    args
}

fn transition(from: ServerState, to: ServerState) {
    info!(%from, %to, "server state");
}
