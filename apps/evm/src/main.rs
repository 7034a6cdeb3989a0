#![warn(clippy::pedantic)]

//! # Elasticsearch Version Manager (evm)
//!
//! `evm` installs several Elasticsearch releases side by side, switches the
//! active one through a symlink, runs it in the background, and forwards
//! plugin commands to the active installation's own plugin tool.
//!
//! ## Subcommands
//!
//! - `install` - Download and install a version
//! - `use` - Switch the active version
//! - `start` / `stop` / `status` - Control the active version's server
//! - `remove` - Delete an installed version
//! - `list` - List installed versions
//! - `version` - Print the active version
//! - `which` - Print a version's install directory
//! - `plugin` - Run the active version's plugin tool
//! - `doctor` - Check installation health
//!
//! ## Examples
//!
//! ```bash
//! evm install 8.9.0
//! evm start -E cluster.name=dev
//! evm plugin install analysis-icu
//! ```

mod commands;
mod errors;
mod manager;

use anyhow::Result;
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use commands::{
    doctor, install, list, plugin, remove, start, status, stop, use_cmd, version, which,
};
use manager::EvmConfig;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directive.
const EVM_LOG_ENV: &str = "EVM_LOG";

/// Elasticsearch version manager.
#[derive(Parser)]
#[command(
    name = "evm",
    author,
    version,
    about = "Install, switch, and run Elasticsearch versions",
    after_help = "\
ENVIRONMENT VARIABLES:
    EVM_HOME          Installation root (default: ~/.evm)
    EVM_MIRRORS       Comma-separated mirror URLs; '{version}' is substituted
    EVM_STATUS_URL    Readiness endpoint (default: http://localhost:9200)
    EVM_LOG           Log filter, e.g. 'evm=debug'"
)]
pub struct Cli {
    /// Increase diagnostic output (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for the evm CLI.
#[derive(Subcommand)]
pub enum Commands {
    /// Download and install a version.
    ///
    /// The first installed version becomes active automatically.
    Install(install::InstallArgs),

    /// Switch the active version.
    ///
    /// Refused while a server is running. If the version is not installed,
    /// the installed versions are listed instead.
    Use(use_cmd::UseArgs),

    /// Start the active version in the background.
    Start(start::StartArgs),

    /// Stop the running server and wait for it to exit.
    Stop,

    /// Report whether the server is running.
    Status,

    /// Delete an installed version.
    Remove(remove::RemoveArgs),

    /// List installed versions and mark the active one.
    List,

    /// Print the active version.
    Version,

    /// Print the install directory of a version (default: the active one).
    Which(which::WhichArgs),

    /// Run the active version's plugin tool.
    Plugin(plugin::PluginArgs),

    /// Check installation health.
    Doctor,
}

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => std::process::exit(handle_usage_error(&e)),
    };
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        let exit_code = handle_error(&e);
        std::process::exit(exit_code);
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .with_env_var(EVM_LOG_ENV)
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .try_init();
}

/// Prints clap's help, version, or usage error and returns the exit code.
///
/// Help and version requests succeed; every malformed invocation exits 1 like
/// any other failure.
fn handle_usage_error(e: &clap::Error) -> i32 {
    let _ = e.print();
    match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

/// Prints the error chain on one line and returns the exit code.
fn handle_error(e: &anyhow::Error) -> i32 {
    tracing::debug!(kind = ?errors::kind_of(e), "command failed");
    eprintln!("Error: {e:#}");
    1
}

async fn run(cli: Cli) -> Result<()> {
    let config = EvmConfig::from_env()?;

    match cli.command {
        Commands::Install(args) => install::execute(&config, &args).await,
        Commands::Use(args) => use_cmd::execute(&config, &args),
        Commands::Start(args) => start::execute(&config, &args).await,
        Commands::Stop => stop::execute(&config).await,
        Commands::Status => status::execute(&config),
        Commands::Remove(args) => remove::execute(&config, &args),
        Commands::List => list::execute(&config),
        Commands::Version => version::execute(&config),
        Commands::Which(args) => which::execute(&config, &args),
        Commands::Plugin(args) => plugin::execute(&config, &args),
        Commands::Doctor => doctor::execute(&config),
    }
}
