//! End-to-end stage runs against scripted backends and on-disk stores.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use longwrite_config::Config;
use longwrite_engine::{PlanJob, WriteJob, run_plan_stage, run_write_stage};
use longwrite_llm::test_support::ScriptedBackend;
use longwrite_llm::{GenerationClient, LlmError};
use longwrite_store::{RunLock, StoreError};
use longwrite_utils::error::LongwriteError;
use serde_json::{Value, json};

fn config(workers: usize) -> Config {
    let mut config = Config::minimal_for_testing();
    config.pipeline.workers = workers;
    config
}

fn client(backend: &Arc<ScriptedBackend>, config: &Config) -> GenerationClient {
    GenerationClient::with_backend(Arc::<ScriptedBackend>::clone(backend), config)
}

fn write_lines(path: &Path, records: &[Value]) {
    let content: String = records.iter().map(|r| format!("{r}\n")).collect();
    std::fs::write(path, content).unwrap();
}

fn read_lines(path: &Path) -> Vec<Value> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

struct Workspace {
    _dir: tempfile::TempDir,
    root: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        Self { _dir: dir, root }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Write job with a template whose last line names the step
    fn write_job(&self) -> WriteJob {
        let template = self.path("write.txt");
        std::fs::write(
            &template,
            "Instruction: $INST$\nPlan:\n$PLAN$\nSo far:\n$TEXT$\nStep: $STEP$\n",
        )
        .unwrap();
        WriteJob {
            input: self.path("plan.jsonl"),
            output: self.path("write.jsonl"),
            cache: self.path("write_cache.jsonl"),
            template: Some(template),
        }
    }
}

fn step_of(prompt: &str) -> &str {
    prompt
        .lines()
        .last()
        .and_then(|line| line.strip_prefix("Step: "))
        .unwrap_or_default()
}

/// Answers with the step named in the rendered write prompt
fn echo_step_backend() -> Arc<ScriptedBackend> {
    Arc::new(ScriptedBackend::from_fn(|prompt| {
        Ok(format!("text for {}", step_of(prompt)))
    }))
}

#[tokio::test]
async fn plan_stage_skips_completed_instructions() {
    let ws = Workspace::new();
    write_lines(
        &ws.path("instructions.jsonl"),
        &[
            json!({"prompt": "a", "id": 1}),
            json!({"prompt": "b", "id": 2}),
            json!({"prompt": "c", "id": 3}),
        ],
    );
    write_lines(&ws.path("plan.jsonl"), &[json!({"prompt": "b", "plan": "old"})]);

    let config = config(2);
    let backend = Arc::new(ScriptedBackend::from_fn(|_| Ok("s1\ns2".to_string())));
    let job = PlanJob {
        input: ws.path("instructions.jsonl"),
        output: ws.path("plan.jsonl"),
        template: None,
    };

    let report = run_plan_stage(&config, client(&backend, &config), &job)
        .await
        .unwrap();
    assert_eq!(report.input, 3);
    assert_eq!(report.already_complete, 1);
    assert_eq!(report.queued, 2);
    assert_eq!(report.tally.committed, 2);
    assert_eq!(backend.calls(), 2);

    let mut prompts: Vec<String> = read_lines(&ws.path("plan.jsonl"))
        .iter()
        .map(|r| r["prompt"].as_str().unwrap().to_string())
        .collect();
    prompts.sort();
    assert_eq!(prompts, vec!["a", "b", "c"]);

    // Second run has nothing left to do.
    let again = run_plan_stage(&config, client(&backend, &config), &job)
        .await
        .unwrap();
    assert_eq!(again.queued, 0);
    assert_eq!(backend.calls(), 2);
}

#[tokio::test]
async fn write_stage_resume_matches_uninterrupted_run() {
    let plans = [
        json!({"prompt": "one", "plan": "intro\n\nbody\nend"}),
        json!({"prompt": "two", "plan": "only"}),
        json!({"prompt": "three", "plan": "x\ny"}),
    ];

    // Reference: a single uninterrupted run.
    let reference = Workspace::new();
    write_lines(&reference.path("plan.jsonl"), &plans);
    let config = config(3);
    let backend = echo_step_backend();
    let report = run_write_stage(&config, client(&backend, &config), &reference.write_job())
        .await
        .unwrap();
    assert_eq!(report.tally.committed, 3);
    let uninterrupted_calls = backend.calls();
    assert_eq!(uninterrupted_calls, 6);

    // Interrupted: item "one" halts at its second step on the first run.
    let ws = Workspace::new();
    write_lines(&ws.path("plan.jsonl"), &plans);
    let flaky = Arc::new(ScriptedBackend::from_fn(|prompt| {
        let step = step_of(prompt);
        if step == "body" {
            Ok(String::new())
        } else {
            Ok(format!("text for {step}"))
        }
    }));
    let first = run_write_stage(&config, client(&flaky, &config), &ws.write_job())
        .await
        .unwrap();
    assert_eq!(first.tally.committed, 2);
    assert_eq!(first.tally.halted, 1);

    let resumed_backend = echo_step_backend();
    let second = run_write_stage(&config, client(&resumed_backend, &config), &ws.write_job())
        .await
        .unwrap();
    assert_eq!(second.already_complete, 2);
    assert_eq!(second.queued, 1);
    assert_eq!(second.tally.committed, 1);
    // "intro" replays from cache; only "body" and "end" are generated.
    assert_eq!(second.tally.cache_hits, 1);
    assert_eq!(resumed_backend.calls(), 2);

    let by_prompt = |path: &Path| {
        let mut records = read_lines(path);
        records.sort_by(|a, b| a["prompt"].as_str().cmp(&b["prompt"].as_str()));
        records
    };
    assert_eq!(
        by_prompt(&ws.path("write.jsonl")),
        by_prompt(&reference.path("write.jsonl"))
    );
}

#[tokio::test]
async fn write_stage_counts_context_errors_as_failed() {
    let ws = Workspace::new();
    write_lines(
        &ws.path("plan.jsonl"),
        &[
            json!({"prompt": "huge", "plan": "a\nb"}),
            json!({"prompt": "fine", "plan": "a"}),
        ],
    );
    let config = config(1);
    let backend = Arc::new(ScriptedBackend::from_fn(|prompt| {
        if prompt.starts_with("Instruction: huge") {
            Err(LlmError::ContextLengthExceeded(
                "This model's maximum context length is 8192 tokens".to_string(),
            ))
        } else {
            Ok("done".to_string())
        }
    }));

    let report = run_write_stage(&config, client(&backend, &config), &ws.write_job())
        .await
        .unwrap();
    assert_eq!(report.tally.failed, 1);
    assert_eq!(report.tally.committed, 1);
    assert_eq!(backend.calls(), 2);

    let written = read_lines(&ws.path("write.jsonl"));
    assert_eq!(written.len(), 1);
    assert_eq!(written[0]["prompt"], "fine");
}

#[tokio::test]
async fn write_stage_preserves_metadata_and_skips_torn_lines() {
    let ws = Workspace::new();
    std::fs::write(
        ws.path("plan.jsonl"),
        "{\"prompt\":\"p\",\"plan\":\"s\",\"source\":\"deck.pptx\"}\n{\"prompt\":\"q\",\"pl",
    )
    .unwrap();
    let config = config(4);
    let backend = echo_step_backend();

    let report = run_write_stage(&config, client(&backend, &config), &ws.write_job())
        .await
        .unwrap();
    assert_eq!(report.input, 1);
    assert_eq!(report.unreadable_input, 1);
    assert!(report.is_complete());

    let written = read_lines(&ws.path("write.jsonl"));
    assert_eq!(
        written,
        vec![json!({"prompt": "p", "plan": "s", "source": "deck.pptx", "write": ["text for s"]})]
    );
}

#[tokio::test]
async fn concurrent_run_on_same_output_is_refused() {
    let ws = Workspace::new();
    write_lines(&ws.path("plan.jsonl"), &[json!({"prompt": "p", "plan": "s"})]);
    let job = ws.write_job();
    let _held = RunLock::acquire(&job.output).unwrap();

    let config = config(1);
    let backend = echo_step_backend();
    let err = run_write_stage(&config, client(&backend, &config), &job)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LongwriteError::Store(StoreError::LockHeld { .. })
    ));
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn missing_queue_is_a_store_error() {
    let ws = Workspace::new();
    let config = config(1);
    let backend = echo_step_backend();
    let err = run_write_stage(&config, client(&backend, &config), &ws.write_job())
        .await
        .unwrap_err();
    assert!(matches!(err, LongwriteError::Store(StoreError::Io { .. })));
}
