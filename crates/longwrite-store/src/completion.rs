use std::collections::HashSet;
use std::path::Path;

use serde_json::Value;

use longwrite_utils::error::StoreError;

use crate::jsonl::read_jsonl_if_exists;

/// Instructions already present in a stage's output store.
///
/// Loaded once at stage startup and never updated during the run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionSet {
    prompts: HashSet<String>,
}

impl CompletionSet {
    /// Collect the `prompt` of every readable record in `output`.
    ///
    /// A missing output file is an empty set.
    pub fn load(output: &Path) -> Result<Self, StoreError> {
        let read = read_jsonl_if_exists::<Value>(output)?;
        let prompts = read
            .records
            .into_iter()
            .filter_map(|record| match record.get("prompt") {
                Some(Value::String(prompt)) => Some(prompt.clone()),
                _ => None,
            })
            .collect();
        Ok(Self { prompts })
    }

    #[must_use]
    pub fn contains(&self, prompt: &str) -> bool {
        self.prompts.contains(prompt)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    /// Split `items` into pending and already-complete, preserving order.
    pub fn partition_pending<T>(
        &self,
        items: Vec<T>,
        prompt_of: impl Fn(&T) -> &str,
    ) -> (Vec<T>, usize) {
        let mut already = 0;
        let pending = items
            .into_iter()
            .filter(|item| {
                let done = self.contains(prompt_of(item));
                if done {
                    already += 1;
                }
                !done
            })
            .collect();
        (pending, already)
    }
}

impl FromIterator<String> for CompletionSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            prompts: iter.into_iter().collect(),
        }
    }
}
