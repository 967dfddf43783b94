//! Deterministic backend for tests that must not touch the network.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::LlmError;
use crate::types::{LlmBackend, LlmInvocation, LlmResult};

type Responder = Box<dyn Fn(&str) -> Result<String, LlmError> + Send + Sync>;

/// Backend returning queued results, then a fallback or a prompt-driven
/// responder. Counts calls and records every prompt it was sent.
pub struct ScriptedBackend {
    queue: Mutex<VecDeque<Result<String, LlmError>>>,
    fallback: Option<Result<String, LlmError>>,
    responder: Option<Responder>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedBackend {
    #[must_use]
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            fallback: None,
            responder: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Answer every prompt with `f(prompt)` once the queue is empty
    #[must_use]
    pub fn from_fn(f: impl Fn(&str) -> Result<String, LlmError> + Send + Sync + 'static) -> Self {
        Self {
            responder: Some(Box::new(f)),
            ..Self::new()
        }
    }

    /// Result returned whenever the queue is empty
    #[must_use]
    pub fn with_fallback(mut self, result: Result<String, LlmError>) -> Self {
        self.fallback = Some(result);
        self
    }

    pub fn push_text(&self, text: impl Into<String>) {
        self.lock_queue().push_back(Ok(text.into()));
    }

    pub fn push_error(&self, error: LlmError) {
        self.lock_queue().push_back(Err(error));
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn lock_queue(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<String, LlmError>>> {
        self.queue
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let prompt = inv
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.prompts
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(prompt.clone());

        let queued = self.lock_queue().pop_front();
        let outcome = match (queued, &self.responder, &self.fallback) {
            (Some(result), _, _) => result,
            (None, Some(responder), _) => responder(&prompt),
            (None, None, Some(fallback)) => fallback.clone(),
            (None, None, None) => Err(LlmError::Transport("script exhausted".to_string())),
        };

        outcome.map(|text| LlmResult::new(text, "scripted", inv.model))
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }
}
