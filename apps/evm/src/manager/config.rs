//! Runtime configuration and installation layout.
//!
//! The installation root defaults to `~/.<program-name>` (so a binary
//! installed as `evm` uses `~/.evm`) and can be overridden with `EVM_HOME`.
//!
//! ## Directory Structure
//!
//! ```text
//! ~/.evm/                         # Root directory (or EVM_HOME)
//!   elasticsearch-7.17.10/        # One directory per installed version
//!   elasticsearch-8.9.0/
//!   elasticsearch -> elasticsearch-8.9.0   # Active version pointer
//!   elasticsearch.pid             # PID hint written by the server
//!   .evm.lock                     # Advisory lock for install/use/remove
//! ```
//!
//! The config is built once in `main` and passed down explicitly.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use super::version::EsVersion;

/// Product name used for directory, pointer, and artifact names.
pub const PRODUCT: &str = "elasticsearch";

/// Environment variable to override the installation root.
pub const EVM_HOME_ENV: &str = "EVM_HOME";

/// Environment variable holding a comma-separated mirror list.
pub const EVM_MIRRORS_ENV: &str = "EVM_MIRRORS";

/// Environment variable overriding the readiness endpoint.
pub const EVM_STATUS_URL_ENV: &str = "EVM_STATUS_URL";

/// Release mirrors, tried in order. `{version}` is substituted.
pub const DEFAULT_MIRRORS: [&str; 3] = [
    "https://artifacts.elastic.co/downloads/elasticsearch",
    "https://download.elastic.co/elasticsearch/release/org/elasticsearch/distribution/tar/elasticsearch/{version}",
    "https://download.elastic.co/elasticsearch/elasticsearch",
];

const DEFAULT_STATUS_URL: &str = "http://localhost:9200";
const DEFAULT_PROGRAM_NAME: &str = "evm";
const LOCK_FILE: &str = ".evm.lock";

const STARTUP_ATTEMPTS: u32 = 300;
const POLL_INTERVAL: Duration = Duration::from_secs(1);
const PROBE_TIMEOUT: Duration = Duration::from_secs(60);
const TRANSFER_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Everything a command needs to know about where and how to operate.
#[derive(Debug, Clone)]
pub struct EvmConfig {
    /// Installation root holding version directories and the active pointer.
    pub root: PathBuf,
    /// Mirror URL templates, in priority order.
    pub mirrors: Vec<String>,
    /// HTTP endpoint polled for readiness after `start`.
    pub status_url: String,
    /// Number of readiness checks before `start` gives up.
    pub startup_attempts: u32,
    /// Delay between readiness checks and between exit checks in `stop`.
    pub poll_interval: Duration,
    /// Timeout for mirror existence probes and checksum fetches.
    pub probe_timeout: Duration,
    /// Timeout for the artifact transfer itself.
    pub transfer_timeout: Duration,
}

impl EvmConfig {
    /// Builds the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if `EVM_HOME` is unset and the home directory cannot
    /// be determined.
    pub fn from_env() -> Result<Self> {
        let program = std::env::args_os()
            .next()
            .and_then(|arg0| {
                Path::new(&arg0)
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| DEFAULT_PROGRAM_NAME.to_string());
        Self::from_lookup(&program, dirs::home_dir(), |key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if no root override is set and `home` is `None`.
    pub fn from_lookup(
        program: &str,
        home: Option<PathBuf>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let root = match non_empty(EVM_HOME_ENV) {
            Some(root) => PathBuf::from(root),
            None => home
                .context("Cannot determine home directory. Set EVM_HOME environment variable.")?
                .join(format!(".{program}")),
        };

        let mut config = Self::with_root(root);
        if let Some(mirrors) = non_empty(EVM_MIRRORS_ENV) {
            config.mirrors = mirrors
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(url) = non_empty(EVM_STATUS_URL_ENV) {
            config.status_url = url;
        }
        Ok(config)
    }

    /// Creates a configuration with default settings rooted at `root`.
    #[must_use = "returns new config without side effects"]
    pub fn with_root(root: PathBuf) -> Self {
        Self {
            root,
            mirrors: DEFAULT_MIRRORS.iter().map(|m| (*m).to_string()).collect(),
            status_url: DEFAULT_STATUS_URL.to_string(),
            startup_attempts: STARTUP_ATTEMPTS,
            poll_interval: POLL_INTERVAL,
            probe_timeout: PROBE_TIMEOUT,
            transfer_timeout: TRANSFER_TIMEOUT,
        }
    }

    /// Creates the installation root if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn ensure_root(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root)
            .with_context(|| format!("Failed to create directory: {}", self.root.display()))
    }

    /// Returns the directory name for `version` (`elasticsearch-<version>`).
    #[must_use]
    pub fn version_dir_name(version: &EsVersion) -> String {
        format!("{PRODUCT}-{version}")
    }

    /// Returns the install directory of `version`. Existence is not implied.
    #[must_use = "returns the path without side effects"]
    pub fn version_dir(&self, version: &EsVersion) -> PathBuf {
        self.root.join(Self::version_dir_name(version))
    }

    /// Returns the path of the active version pointer.
    #[must_use = "returns the path without side effects"]
    pub fn pointer_path(&self) -> PathBuf {
        self.root.join(PRODUCT)
    }

    /// Returns the PID hint file handed to the server on start.
    #[must_use = "returns the path without side effects"]
    pub fn pid_file(&self) -> PathBuf {
        self.root.join(format!("{PRODUCT}.pid"))
    }

    /// Returns the advisory lock file path.
    #[must_use = "returns the path without side effects"]
    pub fn lock_path(&self) -> PathBuf {
        self.root.join(LOCK_FILE)
    }

    /// Returns the path a downloaded artifact is stored at.
    #[must_use = "returns the path without side effects"]
    pub fn artifact_path(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }
}
