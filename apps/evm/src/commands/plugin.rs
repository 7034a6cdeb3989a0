//! Plugin command for the evm CLI.
//!
//! Forwards to the active installation's plugin tool, translating the
//! subcommand into the flag style that version expects.
//!
//! ## Usage
//!
//! ```bash
//! evm plugin list
//! evm plugin install analysis-icu
//! evm plugin remove analysis-icu
//! ```

use anyhow::Result;
use clap::Args;

use crate::manager::EvmConfig;
use crate::manager::plugin::{PluginCommand, run_plugin_command};

/// Arguments for the plugin command.
#[derive(Args)]
pub struct PluginArgs {
    /// One of: list, install, remove.
    pub subcommand: String,

    /// Plugin name for install and remove.
    pub args: Vec<String>,
}

/// Executes the plugin command.
///
/// # Errors
///
/// Returns an error if:
/// - The subcommand or its arguments are invalid
/// - No version is active
/// - The plugin tool is missing, not executable, or exits non-zero
pub fn execute(config: &EvmConfig, args: &PluginArgs) -> Result<()> {
    let command = PluginCommand::parse(&args.subcommand, &args.args)?;
    run_plugin_command(config, &command)
}
