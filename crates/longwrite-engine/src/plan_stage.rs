//! Plan stage: instruction in, outline out.

use async_trait::async_trait;
use tracing::{error, info, warn};

use longwrite_llm::{GenerationClient, GenerationRequest};
use longwrite_prompt_template::{PromptTemplate, PromptValues};
use longwrite_store::{AppendHandle, PlanItem, WorkItem};
use longwrite_utils::redaction::redact_error_message;

use crate::distributor::ItemProcessor;
use crate::report::{ItemOutcome, ItemResult, Stage};

/// Generates one plan per work item and appends it to the plan store
pub struct PlanStage {
    client: GenerationClient,
    template: PromptTemplate,
    max_new_tokens: u32,
    temperature: f32,
    output: AppendHandle,
}

impl PlanStage {
    #[must_use]
    pub fn new(
        client: GenerationClient,
        template: PromptTemplate,
        max_new_tokens: u32,
        temperature: f32,
        output: AppendHandle,
    ) -> Self {
        Self {
            client,
            template,
            max_new_tokens,
            temperature,
            output,
        }
    }

    async fn plan_item(&self, item: WorkItem) -> ItemResult {
        let prompt = self.template.render(&PromptValues {
            inst: Some(&item.prompt),
            ..PromptValues::default()
        });
        let request =
            GenerationRequest::new(prompt, self.max_new_tokens).with_temperature(self.temperature);

        let generation = match self.client.generate(&request).await {
            Ok(generation) => generation,
            Err(e) => {
                error!(error = %redact_error_message(&e.to_string()), "Planning failed");
                return ItemResult::default().with_outcome(ItemOutcome::Failed);
            }
        };

        let Some(plan) = generation.usable_text() else {
            warn!(outcome = generation.describe(), "No usable plan, leaving item for the next run");
            return ItemResult::default().with_outcome(ItemOutcome::Halted);
        };

        let record = PlanItem::new(item, plan);
        match self.output.append(&record).await {
            Ok(()) => {
                info!(chars = record.plan.chars().count(), "Plan committed");
                ItemResult {
                    outcome: ItemOutcome::Committed,
                    cache_hits: 0,
                    generated_steps: 1,
                }
            }
            Err(e) => {
                error!(error = %e, "Could not persist plan");
                ItemResult::default().with_outcome(ItemOutcome::Failed)
            }
        }
    }
}

#[async_trait]
impl ItemProcessor for PlanStage {
    type Item = WorkItem;

    fn stage(&self) -> Stage {
        Stage::Plan
    }

    fn instruction<'a>(&self, item: &'a WorkItem) -> &'a str {
        &item.prompt
    }

    async fn process(&self, item: WorkItem) -> ItemResult {
        self.plan_item(item).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use longwrite_config::Config;
    use longwrite_llm::test_support::ScriptedBackend;
    use longwrite_llm::LlmError;
    use longwrite_prompt_template::TemplateKind;
    use longwrite_store::JsonlAppender;

    fn template() -> PromptTemplate {
        PromptTemplate::parse("t", TemplateKind::Plan, "Outline: $INST$").unwrap()
    }

    async fn run_one(backend: Arc<ScriptedBackend>, item: WorkItem) -> (ItemResult, String) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.jsonl");
        let appender = JsonlAppender::open(&path).await.unwrap();
        let client = GenerationClient::with_backend(backend, &Config::minimal_for_testing());
        let stage = PlanStage::new(client, template(), 4096, 1.0, appender.handle());

        let result = stage.process(item).await;
        drop(stage);
        appender.close().await.unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        (result, content)
    }

    #[tokio::test]
    async fn test_plan_is_committed_with_metadata() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_text("1. open\n2. close");
        let mut item = WorkItem::new("write about rivers");
        item.extra.insert("id".to_string(), serde_json::json!(3));

        let (result, content) = run_one(Arc::clone(&backend), item).await;
        assert_eq!(result.outcome, ItemOutcome::Committed);
        assert_eq!(backend.prompts(), vec!["Outline: write about rivers"]);

        let record: serde_json::Value = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(
            record,
            serde_json::json!({"prompt": "write about rivers", "id": 3, "plan": "1. open\n2. close"})
        );
    }

    #[tokio::test]
    async fn test_filtered_plan_is_not_committed() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_error(LlmError::ContentFiltered("triggering".to_string()));

        let (result, content) = run_one(backend, WorkItem::new("x")).await;
        assert_eq!(result.outcome, ItemOutcome::Halted);
        assert!(content.is_empty());
    }

    #[tokio::test]
    async fn test_context_length_error_fails_only_the_item() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_error(LlmError::ContextLengthExceeded(
            "maximum context length is 8192 tokens".to_string(),
        ));

        let (result, content) = run_one(Arc::clone(&backend), WorkItem::new("x")).await;
        assert_eq!(result.outcome, ItemOutcome::Failed);
        assert_eq!(backend.calls(), 1);
        assert!(content.is_empty());
    }
}
