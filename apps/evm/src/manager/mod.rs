//! Version management core.
//!
//! Everything that touches installation state or the server process lives
//! here; the `commands` layer only parses arguments and prints results.
//!
//! ## Modules
//!
//! - [`version`] - Version string validation and ordering
//! - [`platform`] - Host OS/architecture detection
//! - [`config`] - Installation root, mirrors, and timeouts
//! - [`artifact`] - Artifact file names and mirror URLs
//! - [`download`] / [`verify`] - Mirror probing, transfer, and checksums
//! - [`archive`] / [`install`] - Staged extraction into the root
//! - [`pointer`] / [`registry`] - Active version pointer and installed set
//! - [`activation`] - Switching the active version
//! - [`process`] / [`supervisor`] - Server discovery, start, and stop
//! - [`plugin`] - Plugin tool proxy
//! - [`lock`] - Advisory lock for mutating commands
//! - [`doctor`] - Health checks

pub mod activation;
pub mod archive;
pub mod artifact;
pub mod config;
pub mod doctor;
pub mod download;
pub mod install;
pub mod lock;
pub mod platform;
pub mod plugin;
pub mod pointer;
pub mod process;
pub mod registry;
pub mod supervisor;
pub mod verify;
pub mod version;

#[cfg(test)]
mod testing;

pub use config::EvmConfig;
pub use version::EsVersion;
