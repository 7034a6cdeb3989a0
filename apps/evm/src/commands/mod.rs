//! Command modules for the evm CLI.
//!
//! Each module parses its arguments, calls into [`crate::manager`], and
//! prints the outcome. No installation logic lives here.
//!
//! ## Version Management
//!
//! - [`install`] - Download and install a version
//! - [`use_cmd`] - Switch the active version
//! - [`remove`] - Delete an installed version
//! - [`list`] - List installed versions
//! - [`version`] - Print the active version
//! - [`which`] - Print a version's install directory
//!
//! ## Server Control
//!
//! - [`start`] - Start the active version
//! - [`stop`] - Stop the running server
//! - [`status`] - Report whether the server is running
//! - [`plugin`] - Run the active version's plugin tool
//!
//! ## Diagnostics
//!
//! - [`doctor`] - Check installation health

pub mod doctor;
pub mod install;
pub mod list;
pub mod plugin;
pub mod remove;
pub mod start;
pub mod status;
pub mod stop;
pub mod use_cmd;
pub mod version;
pub mod which;
