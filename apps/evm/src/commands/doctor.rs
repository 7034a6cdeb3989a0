//! Doctor command for the evm CLI.
//!
//! Reports installation health with suggested remediation steps. Nothing is
//! repaired and the command always succeeds.
//!
//! ## Usage
//!
//! ```bash
//! evm doctor
//! ```

use anyhow::Result;

use crate::manager::EvmConfig;
use crate::manager::doctor::{DoctorCheckStatus, run_all_checks};
use crate::manager::process::PsProcessLocator;

/// Executes the doctor command.
///
/// # Errors
///
/// Never fails; individual check failures are printed.
#[allow(clippy::unnecessary_wraps)]
pub fn execute(config: &EvmConfig) -> Result<()> {
    println!("evm {} ({})", env!("CARGO_PKG_VERSION"), git_commit());
    println!();
    println!("Checking Elasticsearch installation...");
    println!();

    let checks = run_all_checks(config, &PsProcessLocator::new());

    let mut has_errors = false;
    let mut has_warnings = false;

    for check in &checks {
        println!("  {} {}: {}", check.prefix(), check.name, check.message);
        match check.status {
            DoctorCheckStatus::Ok => {}
            DoctorCheckStatus::Warning => has_warnings = true,
            DoctorCheckStatus::Error => has_errors = true,
        }
    }

    println!();

    if has_errors {
        println!("Some checks failed. See the messages above for how to fix them.");
    } else if has_warnings {
        println!("Some warnings were found.");
    } else {
        println!("All checks passed.");
    }

    Ok(())
}

/// Returns the git commit recorded at build time, or a fallback.
fn git_commit() -> &'static str {
    option_env!("EVM_GIT_COMMIT").unwrap_or("unknown")
}
