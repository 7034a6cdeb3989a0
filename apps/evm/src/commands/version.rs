//! Version command for the evm CLI.
//!
//! Prints the active Elasticsearch version. The tool's own version is
//! available through `evm --version`.

use anyhow::Result;

use crate::errors::EvmError;
use crate::manager::EvmConfig;
use crate::manager::pointer::PointerState;
use crate::manager::registry::VersionRegistry;

/// Executes the version command.
///
/// # Errors
///
/// Returns [`EvmError::NoActiveVersion`] if nothing is active, including when
/// the pointer is dangling.
pub fn execute(config: &EvmConfig) -> Result<()> {
    match VersionRegistry::new(config).pointer_state()? {
        PointerState::Active(version) => {
            println!("{version}");
            Ok(())
        }
        PointerState::Dangling(target) => {
            eprintln!(
                "Warning: the active version points to missing {}",
                target.display()
            );
            Err(EvmError::NoActiveVersion.into())
        }
        PointerState::Absent => Err(EvmError::NoActiveVersion.into()),
    }
}
