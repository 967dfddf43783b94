//! CLI entry point and dispatch
//!
//! `run()` parses arguments, initializes logging, discovers configuration,
//! creates the tokio runtime, and dispatches. It prints all output,
//! including errors, and returns only the exit code.

use clap::Parser;
use tracing::debug;

use longwrite_config::Config;
use longwrite_utils::error::LongwriteError;
use longwrite_utils::exit_codes::ExitCode;
use longwrite_utils::logging::{LogFormat, init_tracing};

use super::args::{Cli, Commands};
use super::commands;
use super::report::{print_error, report_failure};

/// Main CLI execution function.
///
/// On error the message has already been printed; the caller only exits
/// with the returned code.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(LogFormat::from_flags(cli.verbose, cli.log_json)) {
        eprintln!("warning: logging is unavailable: {e}");
    }

    let config = match Config::discover(&cli.cli_args()) {
        Ok(config) => config,
        Err(err) => {
            let err = LongwriteError::from(err);
            print_error(&err, "config");
            return Err(err.to_exit_code());
        }
    };
    debug!(
        workers = config.pipeline.workers,
        max_attempts = config.retry.max_attempts,
        "Configuration loaded"
    );

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("✗ Failed to create async runtime: {e}");
            return Err(ExitCode::INTERNAL);
        }
    };

    let operation = match &cli.command {
        Commands::Plan(_) => "plan",
        Commands::Write(_) => "write",
        Commands::Extract(_) => "extract",
        Commands::Records(_) => "records",
        Commands::Config { .. } => "config",
    };

    let result = rt.block_on(async {
        match cli.command {
            Commands::Plan(args) => commands::execute_plan_command(args, &config).await,
            Commands::Write(args) => commands::execute_write_command(args, &config).await,
            Commands::Extract(args) => commands::execute_extract_command(args, &config).await,
            Commands::Records(args) => commands::execute_records_command(&args),
            Commands::Config { json } => commands::execute_config_command(&config, json),
        }
    });

    if let Err(error) = result {
        return Err(report_failure(&error, operation));
    }
    Ok(())
}
