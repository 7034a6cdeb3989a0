//! Platform detection for Elasticsearch artifacts.
//!
//! Per-platform tarballs exist from 7.0 onwards and are named after the OS
//! (`linux`, `darwin`) and CPU architecture (`x86_64`, `aarch64`).

use std::fmt;

use crate::errors::EvmError;

/// Host operating system families with published tarballs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    Linux,
    Darwin,
}

/// Host CPU architectures with published tarballs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    X86_64,
    Aarch64,
}

/// An OS/architecture pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
    pub os: Os,
    pub arch: Arch,
}

impl Os {
    /// Returns the name used in artifact file names.
    #[must_use = "returns the OS string without side effects"]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Darwin => "darwin",
        }
    }
}

impl Arch {
    /// Returns the name used in artifact file names.
    #[must_use = "returns the architecture string without side effects"]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64",
            Self::Aarch64 => "aarch64",
        }
    }
}

impl Platform {
    #[must_use]
    pub const fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// Detects the platform of the running host.
    ///
    /// # Errors
    ///
    /// Returns [`EvmError::UnsupportedPlatform`] when no tarball is published
    /// for the host OS/architecture combination.
    pub fn detect() -> Result<Self, EvmError> {
        Self::from_parts(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Maps Rust's `std::env::consts` names onto a supported platform.
    ///
    /// # Errors
    ///
    /// Returns [`EvmError::UnsupportedPlatform`] for anything but Linux or macOS
    /// on `x86_64`/`aarch64`.
    pub fn from_parts(os: &str, arch: &str) -> Result<Self, EvmError> {
        let unsupported = || EvmError::UnsupportedPlatform {
            os: os.to_string(),
            arch: arch.to_string(),
        };
        let os = match os {
            "linux" => Os::Linux,
            "macos" => Os::Darwin,
            _ => return Err(unsupported()),
        };
        let arch = match arch {
            "x86_64" => Arch::X86_64,
            "aarch64" => Arch::Aarch64,
            _ => return Err(unsupported()),
        };
        Ok(Self::new(os, arch))
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os.as_str(), self.arch.as_str())
    }
}
