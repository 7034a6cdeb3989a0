//! Health checks behind `evm doctor`.
//!
//! ## Checks Performed
//!
//! - Platform support
//! - Installation root existence
//! - Active version pointer health
//! - Running server process
//! - Java runtime (only for versions without a bundled JDK)

use std::path::PathBuf;

use super::config::EvmConfig;
use super::platform::Platform;
use super::pointer::PointerState;
use super::process::ProcessLocator;
use super::registry::VersionRegistry;
use super::version::EsVersion;
use crate::errors::EvmError;

/// First major version shipping a bundled JDK.
const BUNDLED_JDK_MAJOR: u64 = 7;

/// Status of a doctor check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoctorCheckStatus {
    Ok,
    Warning,
    Error,
}

/// Result of a single doctor check.
#[derive(Debug, Clone)]
pub struct DoctorCheck {
    pub name: String,
    pub status: DoctorCheckStatus,
    pub message: String,
}

impl DoctorCheck {
    #[must_use]
    pub fn ok(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_status(name, DoctorCheckStatus::Ok, message)
    }

    #[must_use]
    pub fn warning(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_status(name, DoctorCheckStatus::Warning, message)
    }

    #[must_use]
    pub fn error(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_status(name, DoctorCheckStatus::Error, message)
    }

    fn with_status(
        name: impl Into<String>,
        status: DoctorCheckStatus,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            status,
            message: message.into(),
        }
    }

    /// Returns the CLI prefix for this check status.
    #[must_use]
    pub fn prefix(&self) -> &'static str {
        match self.status {
            DoctorCheckStatus::Ok => "[OK]",
            DoctorCheckStatus::Warning => "[WARN]",
            DoctorCheckStatus::Error => "[FAIL]",
        }
    }
}

/// Runs every check. Individual failures are reported, never raised.
#[must_use]
pub fn run_all_checks(config: &EvmConfig, locator: &dyn ProcessLocator) -> Vec<DoctorCheck> {
    let registry = VersionRegistry::new(config);
    let active = registry.current_version().ok().flatten();

    let mut checks = vec![
        check_platform(Platform::detect()),
        check_root(config),
        check_active_version(&registry),
        check_server(locator),
    ];
    if let Some(version) = active.as_ref()
        && version.major() < BUNDLED_JDK_MAJOR
    {
        checks.push(check_java(version, which::which("java").ok()));
    }
    checks
}

fn check_platform(detected: Result<Platform, EvmError>) -> DoctorCheck {
    match detected {
        Ok(platform) => DoctorCheck::ok("Platform", platform.to_string()),
        Err(e) => DoctorCheck::error("Platform", e.to_string()),
    }
}

fn check_root(config: &EvmConfig) -> DoctorCheck {
    if config.root.is_dir() {
        DoctorCheck::ok("Root", config.root.display().to_string())
    } else {
        DoctorCheck::warning(
            "Root",
            format!(
                "{} does not exist yet; it is created on first install",
                config.root.display()
            ),
        )
    }
}

fn check_active_version(registry: &VersionRegistry<'_>) -> DoctorCheck {
    const NAME: &str = "Active version";
    match registry.pointer_state() {
        Ok(PointerState::Active(version)) => DoctorCheck::ok(NAME, version.to_string()),
        Ok(PointerState::Dangling(target)) => DoctorCheck::error(
            NAME,
            format!(
                "{} targets missing directory {}; run 'evm use <version>'",
                registry.pointer().path().display(),
                target.display()
            ),
        ),
        Ok(PointerState::Absent) => match registry.list_installed() {
            Ok(installed) if installed.is_empty() => {
                DoctorCheck::warning(NAME, "none; run 'evm install <version>' first")
            }
            Ok(installed) => DoctorCheck::warning(
                NAME,
                format!("none; run 'evm use {}' to set one", installed[0]),
            ),
            Err(e) => DoctorCheck::error(NAME, format!("{e:#}")),
        },
        Err(e) => DoctorCheck::error(NAME, format!("{e:#}")),
    }
}

fn check_server(locator: &dyn ProcessLocator) -> DoctorCheck {
    match locator.find_running_server_pid() {
        Ok(Some(pid)) => DoctorCheck::ok("Server", format!("running (pid {pid})")),
        Ok(None) => DoctorCheck::ok("Server", "stopped"),
        Err(e) => DoctorCheck::warning("Server", format!("cannot inspect processes: {e:#}")),
    }
}

fn check_java(version: &EsVersion, java: Option<PathBuf>) -> DoctorCheck {
    match java {
        Some(path) => DoctorCheck::ok("Java", format!("found at {}", path.display())),
        None => DoctorCheck::error(
            "Java",
            format!("{version} needs a Java runtime on PATH but none was found"),
        ),
    }
}
