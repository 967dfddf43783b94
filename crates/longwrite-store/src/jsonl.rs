//! Tolerant JSON-lines reading.
//!
//! A crash can leave a torn final line, and hand-edited queues can contain
//! junk. Neither is fatal: such lines are counted, logged, and skipped.

use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use longwrite_utils::error::StoreError;

/// Records read from one file plus what had to be skipped
#[derive(Debug)]
pub struct JsonlRead<T> {
    pub records: Vec<T>,
    /// Lines that were not JSON, or did not fit the record shape
    pub malformed: usize,
    /// JSON objects without a string `prompt`
    pub missing_prompt: usize,
}

impl<T> Default for JsonlRead<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            malformed: 0,
            missing_prompt: 0,
        }
    }
}

impl<T> JsonlRead<T> {
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.malformed + self.missing_prompt
    }
}

/// Read every record of `path`. The file must exist.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<JsonlRead<T>, StoreError> {
    let file = std::fs::File::open(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);
    let mut out = JsonlRead::default();

    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }

        let value: Value = match serde_json::from_str(&line) {
            Ok(value) => value,
            Err(e) => {
                warn!(path = %path.display(), line = line_no, error = %e, "Skipping malformed JSONL line");
                out.malformed += 1;
                continue;
            }
        };

        if !value.get("prompt").is_some_and(Value::is_string) {
            warn!(path = %path.display(), line = line_no, "Skipping record without a string prompt");
            out.missing_prompt += 1;
            continue;
        }

        match serde_json::from_value::<T>(value) {
            Ok(record) => out.records.push(record),
            Err(e) => {
                warn!(path = %path.display(), line = line_no, error = %e, "Skipping record with unexpected shape");
                out.malformed += 1;
            }
        }
    }

    Ok(out)
}

/// Like [`read_jsonl`], but a missing file reads as empty.
pub fn read_jsonl_if_exists<T: DeserializeOwned>(path: &Path) -> Result<JsonlRead<T>, StoreError> {
    if !path.exists() {
        return Ok(JsonlRead::default());
    }
    read_jsonl(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{PlanItem, WorkItem};

    #[test]
    fn test_reads_records_and_skips_junk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.jsonl");
        std::fs::write(
            &path,
            concat!(
                "{\"prompt\":\"a\"}\n",
                "\n",
                "not json\n",
                "{\"id\":1}\n",
                "{\"prompt\":42}\n",
                "{\"prompt\":\"b\",\"k\":true}\n",
                "{\"prompt\":\"c\",\"pl",
            ),
        )
        .unwrap();

        let read: JsonlRead<WorkItem> = read_jsonl(&path).unwrap();
        let prompts: Vec<_> = read.records.iter().map(|r| r.prompt.as_str()).collect();
        assert_eq!(prompts, vec!["a", "b"]);
        assert_eq!(read.malformed, 2);
        assert_eq!(read.missing_prompt, 2);
        assert_eq!(read.skipped(), 4);
    }

    #[test]
    fn test_shape_mismatch_counts_as_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.jsonl");
        std::fs::write(&path, "{\"prompt\":\"a\"}\n{\"prompt\":\"b\",\"plan\":\"x\"}\n").unwrap();

        let read: JsonlRead<PlanItem> = read_jsonl(&path).unwrap();
        assert_eq!(read.records.len(), 1);
        assert_eq!(read.malformed, 1);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.jsonl");
        assert!(matches!(
            read_jsonl::<WorkItem>(&path),
            Err(StoreError::Io { .. })
        ));
        let read: JsonlRead<WorkItem> = read_jsonl_if_exists(&path).unwrap();
        assert!(read.records.is_empty());
    }
}
