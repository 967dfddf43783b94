//! Subcommand handlers.

mod config;
mod extract;
mod records;
mod stage;

pub use config::execute_config_command;
pub use extract::execute_extract_command;
pub use records::execute_records_command;
pub use stage::{execute_plan_command, execute_write_command};
