//! List command for the evm CLI.
//!
//! Displays installed versions and marks the active one.
//!
//! ## Output Format
//!
//! ```text
//! Installed versions:
//!
//! * 8.9.0    (active)
//!   7.17.10
//! ```

use anyhow::Result;

use crate::manager::EvmConfig;
use crate::manager::pointer::PointerState;
use crate::manager::registry::VersionRegistry;

/// Executes the list command.
///
/// # Errors
///
/// Returns an error if the installation root cannot be read.
pub fn execute(config: &EvmConfig) -> Result<()> {
    let registry = VersionRegistry::new(config);
    let versions = registry.list_installed()?;
    let state = registry.pointer_state()?;

    if versions.is_empty() {
        println!("No versions installed.");
        println!();
        println!("Run 'evm install <version>' to install one.");
    } else {
        println!("Installed versions:");
        println!();
        for version in &versions {
            if matches!(&state, PointerState::Active(active) if active == version) {
                println!("* {version}    (active)");
            } else {
                println!("  {version}");
            }
        }
    }

    match state {
        PointerState::Dangling(target) => {
            println!();
            println!(
                "Warning: the active version points to missing {}. Run 'evm use <version>'.",
                target.display()
            );
        }
        PointerState::Absent if !versions.is_empty() => {
            println!();
            println!("No active version. Run 'evm use <version>' to set one.");
        }
        _ => {}
    }

    Ok(())
}
