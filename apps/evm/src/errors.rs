//! Error types for the evm CLI.
//!
//! `EvmError` names every failure the version manager can report. Command
//! functions still return `anyhow::Result`; typed variants are raised with
//! `bail!` and recovered with `downcast_ref` where the caller needs to react
//! to a specific condition (tests mostly).

use std::path::PathBuf;
use thiserror::Error;

/// Broad classification of an [`EvmError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input: bad version string, missing or extra arguments.
    Validation,
    /// The request conflicts with installation or process state.
    State,
    /// Mirror unreachable or transfer failure.
    Network,
    /// Downloaded artifact failed verification.
    Integrity,
    /// A delegated executable is missing, not executable, or failed.
    ExternalTool,
    /// The server never became ready.
    Timeout,
}

/// Consolidated error type for evm operations.
#[derive(Debug, Error)]
pub enum EvmError {
    /// Version string does not look like `MAJOR.MINOR.PATCH[-suffix]`.
    #[error("invalid version '{version}': expected MAJOR.MINOR.PATCH with an optional -suffix")]
    InvalidVersion {
        /// The rejected input.
        version: String,
    },

    /// Invalid command line arguments.
    #[error("invalid arguments: {message}")]
    InvalidArguments {
        /// Description of what was invalid.
        message: String,
    },

    /// The host OS/architecture has no published artifacts.
    #[error("unsupported platform: {os} on {arch}")]
    UnsupportedPlatform {
        /// Host operating system.
        os: String,
        /// Host architecture.
        arch: String,
    },

    /// No version is currently active.
    #[error("no active version; run 'evm use <version>' first")]
    NoActiveVersion,

    /// The requested version is already the active one.
    #[error("version {version} is already in use")]
    AlreadyActive {
        /// The active version.
        version: String,
    },

    /// The requested version is already installed.
    #[error("version {version} is already installed")]
    AlreadyInstalled {
        /// The installed version.
        version: String,
    },

    /// The requested version is not installed.
    #[error("version {version} is not installed")]
    NotInstalled {
        /// The missing version.
        version: String,
    },

    /// Removing the active version is not allowed.
    #[error("version {version} is in use; switch to another version before removing it")]
    RemoveActive {
        /// The active version.
        version: String,
    },

    /// A server process is live, which blocks the requested operation.
    #[error("Elasticsearch is running (pid {pid}); run 'evm stop' first")]
    ServerRunning {
        /// The discovered process id.
        pid: u32,
    },

    /// `stop` was called with no server process live.
    #[error("Elasticsearch is not running")]
    NotRunning,

    /// Another evm invocation holds the operation lock.
    #[error("another evm operation is in progress (lock held on {path})")]
    OperationInProgress {
        /// The lock file.
        path: PathBuf,
    },

    /// None of the mirrors serves the artifact.
    #[error("{artifact} was not found on any mirror")]
    ArtifactNotFound {
        /// The artifact file name.
        artifact: String,
    },

    /// Network error during download.
    #[error("download error: {message}")]
    Network {
        /// Description of the download error.
        message: String,
        /// The underlying error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Checksum verification failed.
    #[error("checksum mismatch for {artifact}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// The artifact file name.
        artifact: String,
        /// The expected checksum.
        expected: String,
        /// The actual checksum.
        actual: String,
    },

    /// The plugin executable for the active version is missing or not executable.
    #[error("plugin executable not usable: {path}")]
    PluginBinaryMissing {
        /// The resolved executable path.
        path: PathBuf,
    },

    /// Unsupported plugin subcommand.
    #[error("unknown plugin subcommand '{subcommand}'; expected one of: list, install, remove")]
    UnknownSubcommand {
        /// The rejected subcommand.
        subcommand: String,
    },

    /// The termination signal could not be delivered.
    #[error("failed to signal process {pid}: {message}")]
    SignalFailed {
        /// The target process id.
        pid: u32,
        /// The OS error description.
        message: String,
    },

    /// The server process exited before it became ready.
    #[error("Elasticsearch {version} failed to start: {message}")]
    StartupFailed {
        /// The version that was started.
        version: String,
        /// What went wrong.
        message: String,
    },

    /// The server did not answer the readiness endpoint in time.
    #[error("Elasticsearch {version} did not become ready after {attempts} checks")]
    StartupTimeout {
        /// The version that was started.
        version: String,
        /// Number of readiness checks performed.
        attempts: u32,
    },

    /// Delegated subprocess exited with non-zero code.
    #[error("process exited with code {code}")]
    ProcessExitCode {
        /// The exit code from the subprocess.
        code: i32,
    },
}

impl EvmError {
    /// Returns the taxonomy class of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidVersion { .. }
            | Self::InvalidArguments { .. }
            | Self::UnsupportedPlatform { .. }
            | Self::UnknownSubcommand { .. } => ErrorKind::Validation,
            Self::NoActiveVersion
            | Self::AlreadyActive { .. }
            | Self::AlreadyInstalled { .. }
            | Self::NotInstalled { .. }
            | Self::RemoveActive { .. }
            | Self::ServerRunning { .. }
            | Self::NotRunning
            | Self::OperationInProgress { .. } => ErrorKind::State,
            Self::ArtifactNotFound { .. } | Self::Network { .. } => ErrorKind::Network,
            Self::ChecksumMismatch { .. } => ErrorKind::Integrity,
            Self::PluginBinaryMissing { .. }
            | Self::SignalFailed { .. }
            | Self::StartupFailed { .. }
            | Self::ProcessExitCode { .. } => ErrorKind::ExternalTool,
            Self::StartupTimeout { .. } => ErrorKind::Timeout,
        }
    }

    /// Creates a new `InvalidArguments` error.
    #[must_use]
    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            message: message.into(),
        }
    }

    /// Creates a new `Network` error with a source error.
    #[must_use]
    pub fn network(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Network {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new `Network` error without an underlying source.
    #[must_use]
    pub fn network_message(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            source: None,
        }
    }
}

/// Returns the [`ErrorKind`] of an `anyhow` error if it wraps an [`EvmError`].
#[must_use]
pub fn kind_of(err: &anyhow::Error) -> Option<ErrorKind> {
    err.downcast_ref::<EvmError>().map(EvmError::kind)
}
