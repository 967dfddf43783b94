//! Write stage: expand a plan into text, one step at a time.
//!
//! For each step the stage first looks in the step cache. A hit is replayed
//! verbatim with no remote call. A miss renders the write template with the
//! instruction, the plan, the text so far, and the step, then generates.
//! Every generated step is durably cached before the next one starts, so an
//! item interrupted at step `k` resumes at step `k` on the next run.
//!
//! An item whose generation yields no usable text is halted and discarded
//! for this run. Its cached steps stay, and the next run replays them.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use longwrite_llm::{GenerationClient, GenerationRequest};
use longwrite_prompt_template::{PromptTemplate, PromptValues};
use longwrite_store::{AppendHandle, CacheEntry, PlanItem, StepCache, WriteItem};
use longwrite_utils::redaction::redact_error_message;

use crate::distributor::ItemProcessor;
use crate::report::{ItemOutcome, ItemResult, Stage};
use crate::steps::split_plan_steps;

/// Separator appended after every step's text in the running context
const STEP_SEPARATOR: &str = "\n\n";

/// Expands plan items into written documents
pub struct WriteStage {
    client: GenerationClient,
    template: PromptTemplate,
    max_new_tokens: u32,
    temperature: f32,
    max_steps: usize,
    cache: Arc<StepCache>,
    output: AppendHandle,
    cache_output: AppendHandle,
}

impl WriteStage {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        client: GenerationClient,
        template: PromptTemplate,
        max_new_tokens: u32,
        temperature: f32,
        max_steps: usize,
        cache: Arc<StepCache>,
        output: AppendHandle,
        cache_output: AppendHandle,
    ) -> Self {
        Self {
            client,
            template,
            max_new_tokens,
            temperature,
            max_steps,
            cache,
            output,
            cache_output,
        }
    }

    async fn write_item(&self, item: PlanItem) -> ItemResult {
        let mut result = ItemResult::default();
        let steps = split_plan_steps(&item.plan);

        if steps.is_empty() {
            warn!("Plan has no steps, skipping item");
            return result.with_outcome(ItemOutcome::Skipped);
        }
        if steps.len() > self.max_steps {
            warn!(
                steps = steps.len(),
                max_steps = self.max_steps,
                "Plan has too many steps, skipping item"
            );
            return result.with_outcome(ItemOutcome::Skipped);
        }

        let instruction = item.prompt();
        // The prompt sees the plan as its retained steps, one per line.
        let plan = steps.join("\n");
        let mut text = String::new();
        let mut responses = Vec::with_capacity(steps.len());

        for (idx, step) in steps.iter().enumerate() {
            let step_no = idx + 1;

            if let Some(cached) = self.cache.get(instruction, step) {
                debug!(step = step_no, "Replaying cached step");
                result.cache_hits += 1;
                text.push_str(cached);
                text.push_str(STEP_SEPARATOR);
                responses.push(cached.to_string());
                continue;
            }

            let prompt = self.template.render(&PromptValues {
                inst: Some(instruction),
                plan: Some(&plan),
                text: Some(text.trim()),
                step: Some(step.trim()),
            });
            let request = GenerationRequest::new(prompt, self.max_new_tokens)
                .with_temperature(self.temperature);

            let generation = match self.client.generate(&request).await {
                Ok(generation) => generation,
                Err(e) => {
                    error!(
                        step = step_no,
                        error = %redact_error_message(&e.to_string()),
                        "Step generation failed"
                    );
                    return result.with_outcome(ItemOutcome::Failed);
                }
            };

            let Some(response) = generation.usable_text() else {
                warn!(
                    step = step_no,
                    steps = steps.len(),
                    outcome = generation.describe(),
                    "Halting item; cached steps are kept for the next run"
                );
                return result.with_outcome(ItemOutcome::Halted);
            };

            let entry = CacheEntry {
                prompt: instruction.to_string(),
                step: (*step).to_string(),
                response: response.to_string(),
            };
            if let Err(e) = self.cache_output.append(&entry).await {
                error!(step = step_no, error = %e, "Could not persist step to cache");
                return result.with_outcome(ItemOutcome::Failed);
            }

            debug!(step = step_no, chars = response.chars().count(), "Step generated");
            result.generated_steps += 1;
            text.push_str(response);
            text.push_str(STEP_SEPARATOR);
            responses.push(entry.response);
        }

        let steps_written = responses.len();
        let record = WriteItem::new(item, responses);
        match self.output.append(&record).await {
            Ok(()) => {
                info!(
                    steps = steps_written,
                    cache_hits = result.cache_hits,
                    "Document committed"
                );
                result.with_outcome(ItemOutcome::Committed)
            }
            Err(e) => {
                error!(error = %e, "Could not persist document");
                result.with_outcome(ItemOutcome::Failed)
            }
        }
    }
}

#[async_trait]
impl ItemProcessor for WriteStage {
    type Item = PlanItem;

    fn stage(&self) -> Stage {
        Stage::Write
    }

    fn instruction<'a>(&self, item: &'a PlanItem) -> &'a str {
        item.prompt()
    }

    async fn process(&self, item: PlanItem) -> ItemResult {
        self.write_item(item).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use longwrite_config::Config;
    use longwrite_llm::LlmError;
    use longwrite_llm::test_support::ScriptedBackend;
    use longwrite_prompt_template::TemplateKind;
    use longwrite_store::{JsonlAppender, WorkItem};

    struct Harness {
        _dir: tempfile::TempDir,
        output: std::path::PathBuf,
        cache: std::path::PathBuf,
    }

    impl Harness {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            Self {
                output: dir.path().join("write.jsonl"),
                cache: dir.path().join("write_cache.jsonl"),
                _dir: dir,
            }
        }

        async fn run(
            &self,
            backend: Arc<ScriptedBackend>,
            cache: StepCache,
            max_steps: usize,
            item: PlanItem,
        ) -> ItemResult {
            let output = JsonlAppender::open(&self.output).await.unwrap();
            let cache_output = JsonlAppender::open(&self.cache).await.unwrap();
            let template = PromptTemplate::parse(
                "t",
                TemplateKind::Write,
                "I=$INST$|P=$PLAN$|T=$TEXT$|S=$STEP$",
            )
            .unwrap();
            let client = GenerationClient::with_backend(backend, &Config::minimal_for_testing());
            let stage = WriteStage::new(
                client,
                template,
                4096,
                1.0,
                max_steps,
                Arc::new(cache),
                output.handle(),
                cache_output.handle(),
            );

            let result = stage.process(item).await;
            drop(stage);
            output.close().await.unwrap();
            cache_output.close().await.unwrap();
            result
        }

        fn lines(path: &std::path::Path) -> Vec<serde_json::Value> {
            std::fs::read_to_string(path)
                .unwrap_or_default()
                .lines()
                .map(|l| serde_json::from_str(l).unwrap())
                .collect()
        }
    }

    fn plan_item(prompt: &str, plan: &str) -> PlanItem {
        PlanItem::new(WorkItem::new(prompt), plan)
    }

    #[tokio::test]
    async fn test_steps_accumulate_context() {
        let harness = Harness::new();
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_text("one");
        backend.push_text("two");

        let result = harness
            .run(
                Arc::clone(&backend),
                StepCache::default(),
                50,
                plan_item("inst", "s1\n\ns2\n"),
            )
            .await;

        assert_eq!(result.outcome, ItemOutcome::Committed);
        assert_eq!(result.generated_steps, 2);
        assert_eq!(
            backend.prompts(),
            vec!["I=inst|P=s1\ns2|T=|S=s1", "I=inst|P=s1\ns2|T=one|S=s2"]
        );

        let written = Harness::lines(&harness.output);
        assert_eq!(written.len(), 1);
        assert_eq!(written[0]["write"], serde_json::json!(["one", "two"]));
        assert_eq!(Harness::lines(&harness.cache).len(), 2);
    }

    #[tokio::test]
    async fn test_prompt_plan_has_blank_lines_collapsed() {
        let harness = Harness::new();
        let backend = Arc::new(ScriptedBackend::new().with_fallback(Ok("text".to_string())));

        let result = harness
            .run(
                Arc::clone(&backend),
                StepCache::default(),
                50,
                plan_item("inst", "\n1. open\r\n\r\n\n\n2. close\n\n"),
            )
            .await;

        assert_eq!(result.outcome, ItemOutcome::Committed);
        let prompts = backend.prompts();
        assert_eq!(prompts[0], "I=inst|P=1. open\n2. close|T=|S=1. open");
        assert_eq!(prompts[1], "I=inst|P=1. open\n2. close|T=text|S=2. close");
    }

    #[tokio::test]
    async fn test_cached_step_skips_the_network() {
        let harness = Harness::new();
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_text("fresh");
        let cache: StepCache = vec![CacheEntry {
            prompt: "X".to_string(),
            step: "s1".to_string(),
            response: "cached text".to_string(),
        }]
        .into_iter()
        .collect();

        let result = harness
            .run(Arc::clone(&backend), cache, 50, plan_item("X", "s1\ns2"))
            .await;

        assert_eq!(result.outcome, ItemOutcome::Committed);
        assert_eq!(result.cache_hits, 1);
        assert_eq!(backend.calls(), 1);
        assert_eq!(backend.prompts(), vec!["I=X|P=s1\ns2|T=cached text|S=s2"]);

        let written = Harness::lines(&harness.output);
        assert_eq!(written[0]["write"], serde_json::json!(["cached text", "fresh"]));
        // Only the generated step is appended to the cache file.
        assert_eq!(Harness::lines(&harness.cache).len(), 1);
    }

    #[tokio::test]
    async fn test_empty_response_halts_and_keeps_cache() {
        let harness = Harness::new();
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_text("first");
        backend.push_text("");

        let result = harness
            .run(
                Arc::clone(&backend),
                StepCache::default(),
                50,
                plan_item("inst", "a\nb\nc"),
            )
            .await;

        assert_eq!(result.outcome, ItemOutcome::Halted);
        assert_eq!(backend.calls(), 2);
        assert!(Harness::lines(&harness.output).is_empty());

        let cached = Harness::lines(&harness.cache);
        assert_eq!(cached.len(), 1);
        assert_eq!(
            cached[0],
            serde_json::json!({"prompt": "inst", "step": "a", "response": "first"})
        );
    }

    #[tokio::test]
    async fn test_exhausted_retries_halt_like_empty_text() {
        let harness = Harness::new();
        let backend = Arc::new(
            ScriptedBackend::new().with_fallback(Err(LlmError::Transport("down".to_string()))),
        );

        let result = harness
            .run(
                Arc::clone(&backend),
                StepCache::default(),
                50,
                plan_item("inst", "a\nb"),
            )
            .await;

        assert_eq!(result.outcome, ItemOutcome::Halted);
        assert_eq!(backend.calls(), 10);
        assert!(Harness::lines(&harness.output).is_empty());
        assert!(Harness::lines(&harness.cache).is_empty());
    }

    #[tokio::test]
    async fn test_step_ceiling() {
        let too_long: String = (1..=51).map(|i| format!("step {i}\n")).collect();
        let at_limit: String = (1..=50).map(|i| format!("step {i}\n")).collect();

        let harness = Harness::new();
        let backend = Arc::new(ScriptedBackend::from_fn(|_| Ok("ok".to_string())));
        let skipped = harness
            .run(
                Arc::clone(&backend),
                StepCache::default(),
                50,
                plan_item("long", &too_long),
            )
            .await;
        assert_eq!(skipped.outcome, ItemOutcome::Skipped);
        assert_eq!(backend.calls(), 0);

        let processed = harness
            .run(
                Arc::clone(&backend),
                StepCache::default(),
                50,
                plan_item("limit", &at_limit),
            )
            .await;
        assert_eq!(processed.outcome, ItemOutcome::Committed);
        assert_eq!(backend.calls(), 50);
    }

    #[tokio::test]
    async fn test_plan_without_steps_is_skipped() {
        let harness = Harness::new();
        let backend = Arc::new(ScriptedBackend::new());
        let result = harness
            .run(backend, StepCache::default(), 50, plan_item("x", "\n \n"))
            .await;
        assert_eq!(result.outcome, ItemOutcome::Skipped);
    }
}
