//! `longwrite plan` and `longwrite write`.

use anyhow::Result;

use longwrite_config::Config;
use longwrite_engine::{PlanJob, StageReport, WriteJob, run_plan_stage, run_write_stage};
use longwrite_llm::GenerationClient;
use longwrite_utils::error::LongwriteError;

use crate::cli::args::{PlanArgs, WriteArgs};

/// Client for a generation stage; fails before any file is touched when
/// endpoint, model, or key is missing.
fn generation_client(config: &Config) -> Result<GenerationClient, LongwriteError> {
    config.validate_for_generation()?;
    Ok(GenerationClient::from_config(config)?)
}

pub async fn execute_plan_command(args: PlanArgs, config: &Config) -> Result<()> {
    let client = generation_client(config)?;
    let job = PlanJob {
        input: args.input,
        output: args.output,
        template: args.template,
    };
    let report = run_plan_stage(config, client, &job).await?;
    print_report(&report, args.json)
}

pub async fn execute_write_command(args: WriteArgs, config: &Config) -> Result<()> {
    let client = generation_client(config)?;
    let job = WriteJob {
        input: args.input,
        output: args.output,
        cache: args.cache,
        template: args.template,
    };
    let report = run_write_stage(config, client, &job).await?;
    print_report(&report, args.json)
}

fn print_report(report: &StageReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("{report}");
    if report.queued == 0 {
        println!("\nNothing to do: every instruction in the input is already complete.");
    } else if !report.is_complete() {
        println!(
            "\n{} item(s) not committed; re-run the same command to retry them.",
            report.remaining()
        );
    }
    Ok(())
}
