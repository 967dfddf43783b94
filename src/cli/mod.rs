//! Command-line interface for longwrite
//!
//! - `args`: clap definitions
//! - `run`: entry point and dispatch
//! - `commands`: one handler per subcommand
//! - `report`: error output and exit code mapping

pub mod args;
mod commands;
mod report;
mod run;

pub use args::{Cli, Commands};
pub use run::run;
