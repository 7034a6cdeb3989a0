//! Plugin management delegated to the active installation.
//!
//! The plugin tool changed name and flag style twice:
//!
//! | Major | Executable                  | Subcommands                           |
//! |-------|-----------------------------|---------------------------------------|
//! | 1     | `bin/plugin`                | `--list`, `--install n`, `--remove n` |
//! | 2     | `bin/plugin`                | `list`, `install n`, `remove n`       |
//! | ≥ 3   | `bin/elasticsearch-plugin`  | `list`, `install n`, `remove n`       |

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use tracing::debug;

use super::config::EvmConfig;
use super::registry::VersionRegistry;
use super::version::EsVersion;
use crate::errors::EvmError;

/// A validated plugin request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginCommand {
    List,
    Install(String),
    Remove(String),
}

impl PluginCommand {
    /// Validates a subcommand and its arguments.
    ///
    /// # Errors
    ///
    /// - [`EvmError::UnknownSubcommand`] for anything but list/install/remove
    /// - [`EvmError::InvalidArguments`] for a missing or extra argument
    pub fn parse(subcommand: &str, args: &[String]) -> Result<Self, EvmError> {
        match subcommand {
            "list" => {
                if args.is_empty() {
                    Ok(Self::List)
                } else {
                    Err(EvmError::invalid_arguments(
                        "'plugin list' takes no arguments",
                    ))
                }
            }
            "install" => single_name(subcommand, args).map(Self::Install),
            "remove" => single_name(subcommand, args).map(Self::Remove),
            other => Err(EvmError::UnknownSubcommand {
                subcommand: other.to_string(),
            }),
        }
    }
}

fn single_name(subcommand: &str, args: &[String]) -> Result<String, EvmError> {
    match args {
        [name] if !name.trim().is_empty() => Ok(name.clone()),
        [] => Err(EvmError::invalid_arguments(format!(
            "'plugin {subcommand}' requires a plugin name"
        ))),
        _ => Err(EvmError::invalid_arguments(format!(
            "'plugin {subcommand}' takes exactly one plugin name"
        ))),
    }
}

/// Flag convention of a plugin executable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginDialect {
    /// 1.x: `bin/plugin --install name`
    LegacyFlags,
    /// 2.x: `bin/plugin install name`
    LegacyWords,
    /// 3.x and later: `bin/elasticsearch-plugin install name`
    Modern,
}

impl PluginDialect {
    #[must_use]
    pub fn for_version(version: &EsVersion) -> Self {
        match version.major() {
            0 | 1 => Self::LegacyFlags,
            2 => Self::LegacyWords,
            _ => Self::Modern,
        }
    }

    #[must_use]
    pub fn executable_name(self) -> &'static str {
        match self {
            Self::LegacyFlags | Self::LegacyWords => "plugin",
            Self::Modern => "elasticsearch-plugin",
        }
    }

    fn verb(self, word: &str) -> String {
        match self {
            Self::LegacyFlags => format!("--{word}"),
            Self::LegacyWords | Self::Modern => word.to_string(),
        }
    }
}

/// Concrete program and arguments for one plugin request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginInvocation {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl PluginInvocation {
    /// Maps `command` onto the dialect of `version` installed at `home`.
    #[must_use]
    pub fn plan(home: &Path, version: &EsVersion, command: &PluginCommand) -> Self {
        let dialect = PluginDialect::for_version(version);
        let program = home.join("bin").join(dialect.executable_name());
        let args = match command {
            PluginCommand::List => vec![dialect.verb("list")],
            PluginCommand::Install(name) => vec![dialect.verb("install"), name.clone()],
            PluginCommand::Remove(name) => vec![dialect.verb("remove"), name.clone()],
        };
        Self { program, args }
    }
}

/// Runs a plugin command against the active version with inherited stdio.
///
/// # Errors
///
/// - [`EvmError::NoActiveVersion`] if no version is active
/// - [`EvmError::PluginBinaryMissing`] if the executable is absent or not executable
/// - [`EvmError::ProcessExitCode`] if the tool exits non-zero
pub fn run_plugin_command(config: &EvmConfig, command: &PluginCommand) -> Result<()> {
    let registry = VersionRegistry::new(config);
    let version = registry
        .current_version()?
        .ok_or(EvmError::NoActiveVersion)?;
    let invocation =
        PluginInvocation::plan(&registry.version_directory(&version), &version, command);

    if !is_executable(&invocation.program) {
        return Err(EvmError::PluginBinaryMissing {
            path: invocation.program,
        }
        .into());
    }

    debug!(program = %invocation.program.display(), args = ?invocation.args, "running plugin tool");
    let status = Command::new(&invocation.program)
        .args(&invocation.args)
        .status()
        .with_context(|| format!("Failed to execute {}", invocation.program.display()))?;

    if status.success() {
        Ok(())
    } else {
        Err(EvmError::ProcessExitCode {
            code: status.code().unwrap_or(-1),
        }
        .into())
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path).is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
