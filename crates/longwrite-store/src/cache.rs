use std::collections::HashMap;
use std::path::Path;

use longwrite_utils::error::StoreError;

use crate::jsonl::read_jsonl_if_exists;
use crate::records::CacheEntry;

/// Responses already generated, keyed by instruction then step.
///
/// Loaded once per run. Entries written during the run go to the cache file
/// only; the step loop of an item never revisits a step it just generated.
#[derive(Debug, Clone, Default)]
pub struct StepCache {
    entries: HashMap<String, HashMap<String, String>>,
    len: usize,
}

impl StepCache {
    /// Load the cache file. Missing file means an empty cache; for a
    /// repeated (instruction, step) pair the later line wins.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let read = read_jsonl_if_exists::<CacheEntry>(path)?;
        if read.skipped() > 0 {
            tracing::warn!(
                path = %path.display(),
                skipped = read.skipped(),
                "Ignored unreadable cache lines"
            );
        }
        Ok(read.records.into_iter().collect())
    }

    pub fn insert(&mut self, entry: CacheEntry) {
        let previous = self
            .entries
            .entry(entry.prompt)
            .or_default()
            .insert(entry.step, entry.response);
        if previous.is_none() {
            self.len += 1;
        }
    }

    /// Cached response for one (instruction, step) pair
    #[must_use]
    pub fn get(&self, prompt: &str, step: &str) -> Option<&str> {
        self.entries
            .get(prompt)
            .and_then(|steps| steps.get(step))
            .map(String::as_str)
    }

    /// Number of distinct (instruction, step) pairs
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of instructions with at least one cached step
    #[must_use]
    pub fn instructions(&self) -> usize {
        self.entries.len()
    }
}

impl FromIterator<CacheEntry> for StepCache {
    fn from_iter<I: IntoIterator<Item = CacheEntry>>(iter: I) -> Self {
        let mut cache = Self::default();
        for entry in iter {
            cache.insert(entry);
        }
        cache
    }
}
