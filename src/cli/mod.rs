//! CLI command handling module
//!
//! Handles all CLI subcommands and argument parsing.

mod commands;
mod logging;
mod run;
mod version;

pub use commands::{ConfigSubcommand, handle_config_command};
pub use logging::*;
pub use run::{CheckOptions, run_check, run_fetch_tickets, run_sync};
pub use version::display_version;
