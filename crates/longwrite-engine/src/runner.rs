//! Stage runs from queue file to report.
//!
//! A run takes the output's lock, loads the completion set from the output,
//! reads the queue, drops what is already complete, and distributes the rest.
//! Completion is read once at startup and never refreshed mid-run.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{Instrument, info, warn};

use longwrite_config::Config;
use longwrite_llm::GenerationClient;
use longwrite_prompt_template::{PromptTemplate, TemplateKind};
use longwrite_store::{
    CompletionSet, JsonlAppender, PlanItem, RunLock, StepCache, WorkItem, read_jsonl,
};
use longwrite_utils::error::LongwriteError;
use longwrite_utils::logging::stage_span;

use crate::distributor::distribute;
use crate::plan_stage::PlanStage;
use crate::report::{Stage, StageReport, WorkerTally};
use crate::write_stage::WriteStage;

/// Default plan stage queue
pub const DEFAULT_PLAN_INPUT: &str = "instructions.jsonl";
/// Default plan stage output, and write stage queue
pub const DEFAULT_PLAN_OUTPUT: &str = "plan.jsonl";
/// Default write stage output
pub const DEFAULT_WRITE_OUTPUT: &str = "write.jsonl";
/// Default write stage step cache
pub const DEFAULT_WRITE_CACHE: &str = "write_cache.jsonl";

/// Files for one plan stage run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanJob {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Template file; the built-in plan template when `None`
    pub template: Option<PathBuf>,
}

impl Default for PlanJob {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_PLAN_INPUT),
            output: PathBuf::from(DEFAULT_PLAN_OUTPUT),
            template: None,
        }
    }
}

/// Files for one write stage run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub cache: PathBuf,
    /// Template file; the built-in write template when `None`
    pub template: Option<PathBuf>,
}

impl Default for WriteJob {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_PLAN_OUTPUT),
            output: PathBuf::from(DEFAULT_WRITE_OUTPUT),
            cache: PathBuf::from(DEFAULT_WRITE_CACHE),
            template: None,
        }
    }
}

struct Queue<T> {
    pending: Vec<T>,
    input: usize,
    unreadable: usize,
    already_complete: usize,
}

fn load_queue<T: serde::de::DeserializeOwned>(
    input: &Path,
    output: &Path,
    prompt_of: impl Fn(&T) -> &str,
) -> Result<Queue<T>, LongwriteError> {
    let done = CompletionSet::load(output)?;
    let read = read_jsonl::<T>(input)?;
    let unreadable = read.skipped();
    if unreadable > 0 {
        warn!(
            input = %input.display(),
            malformed = read.malformed,
            missing_prompt = read.missing_prompt,
            "Skipped unreadable queue lines"
        );
    }
    let input_count = read.records.len();
    let (pending, already_complete) = done.partition_pending(read.records, prompt_of);
    Ok(Queue {
        pending,
        input: input_count,
        unreadable,
        already_complete,
    })
}

fn join_failure(stage: Stage, e: tokio::task::JoinError) -> LongwriteError {
    LongwriteError::Io(std::io::Error::other(format!(
        "{stage} worker aborted: {e}"
    )))
}

/// Run the plan stage over `job.input`, appending plans to `job.output`.
///
/// # Errors
///
/// Template, lock, and store failures abort the run before any item is
/// processed. Per-item failures never do; they are counted in the report.
pub async fn run_plan_stage(
    config: &Config,
    client: GenerationClient,
    job: &PlanJob,
) -> Result<StageReport, LongwriteError> {
    let started = Instant::now();
    let workers = config.pipeline.workers;
    let template = PromptTemplate::load_or_builtin(job.template.as_deref(), TemplateKind::Plan)?;
    let _lock = RunLock::acquire(&job.output)?;

    let queue = load_queue::<WorkItem>(&job.input, &job.output, |item| item.prompt.as_str())?;
    let mut report = StageReport {
        stage: Stage::Plan,
        output: job.output.clone(),
        input: queue.input,
        unreadable_input: queue.unreadable,
        already_complete: queue.already_complete,
        queued: queue.pending.len(),
        workers,
        tally: WorkerTally::default(),
        elapsed_ms: 0,
    };

    let span = stage_span(Stage::Plan.as_str(), workers);
    info!(
        parent: &span,
        template = template.name(),
        queued = report.queued,
        already_complete = report.already_complete,
        "Starting plan stage"
    );

    if !queue.pending.is_empty() {
        let appender = JsonlAppender::open(&job.output).await?;
        let stage = Arc::new(PlanStage::new(
            client,
            template,
            config.pipeline.max_new_tokens,
            config.llm.temperature,
            appender.handle(),
        ));
        let tally = distribute(stage, queue.pending, workers)
            .instrument(span.clone())
            .await;
        let written = appender.close().await?;
        report.tally = tally.map_err(|e| join_failure(Stage::Plan, e))?;
        info!(parent: &span, written, "Plan output closed");
    }

    report.elapsed_ms = elapsed_ms(started);
    Ok(report)
}

/// Run the write stage over `job.input`, appending documents to `job.output`
/// and generated steps to `job.cache`.
///
/// # Errors
///
/// Template, lock, and store failures abort the run before any item is
/// processed. Per-item failures never do; they are counted in the report.
pub async fn run_write_stage(
    config: &Config,
    client: GenerationClient,
    job: &WriteJob,
) -> Result<StageReport, LongwriteError> {
    let started = Instant::now();
    let workers = config.pipeline.workers;
    let template = PromptTemplate::load_or_builtin(job.template.as_deref(), TemplateKind::Write)?;
    let _lock = RunLock::acquire(&job.output)?;

    let queue = load_queue::<PlanItem>(&job.input, &job.output, PlanItem::prompt)?;
    let mut report = StageReport {
        stage: Stage::Write,
        output: job.output.clone(),
        input: queue.input,
        unreadable_input: queue.unreadable,
        already_complete: queue.already_complete,
        queued: queue.pending.len(),
        workers,
        tally: WorkerTally::default(),
        elapsed_ms: 0,
    };

    let span = stage_span(Stage::Write.as_str(), workers);
    info!(
        parent: &span,
        template = template.name(),
        queued = report.queued,
        already_complete = report.already_complete,
        "Starting write stage"
    );

    if !queue.pending.is_empty() {
        let cache = StepCache::load(&job.cache)?;
        info!(
            parent: &span,
            entries = cache.len(),
            instructions = cache.instructions(),
            "Loaded step cache"
        );

        let output = JsonlAppender::open(&job.output).await?;
        let cache_output = JsonlAppender::open(&job.cache).await?;
        let stage = Arc::new(WriteStage::new(
            client,
            template,
            config.pipeline.max_new_tokens,
            config.llm.temperature,
            config.pipeline.max_steps,
            Arc::new(cache),
            output.handle(),
            cache_output.handle(),
        ));
        let tally = distribute(stage, queue.pending, workers)
            .instrument(span.clone())
            .await;
        let written = output.close().await?;
        let cached = cache_output.close().await?;
        report.tally = tally.map_err(|e| join_failure(Stage::Write, e))?;
        info!(parent: &span, written, cached, "Write outputs closed");
    }

    report.elapsed_ms = elapsed_ms(started);
    Ok(report)
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
