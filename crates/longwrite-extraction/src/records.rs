use std::path::{Path, PathBuf};

use tracing::info;

use longwrite_store::WorkItem;
use longwrite_utils::error::ExtractionError;

/// Wrap a text file into a one-record instruction queue.
///
/// The text is trimmed and written as `{"prompt": ...}` to `output`, or next
/// to the input with a `.jsonl` extension. Returns the path written.
///
/// # Errors
///
/// `NotFound` for a missing input, `EmptyText` when the file holds only
/// whitespace, `Io` on read or write failure.
pub fn txt_to_jsonl(input: &Path, output: Option<&Path>) -> Result<PathBuf, ExtractionError> {
    if !input.is_file() {
        return Err(ExtractionError::NotFound(input.to_path_buf()));
    }
    let content = std::fs::read_to_string(input).map_err(|source| ExtractionError::Io {
        path: input.to_path_buf(),
        source,
    })?;
    let text = content.trim();
    if text.is_empty() {
        return Err(ExtractionError::EmptyText(input.to_path_buf()));
    }

    let target = output.map_or_else(|| input.with_extension("jsonl"), Path::to_path_buf);
    let mut line = serde_json::to_string(&WorkItem::new(text)).map_err(|e| ExtractionError::Io {
        path: target.clone(),
        source: std::io::Error::other(e),
    })?;
    line.push('\n');
    std::fs::write(&target, line).map_err(|source| ExtractionError::Io {
        path: target.clone(),
        source,
    })?;

    info!(output = %target.display(), chars = text.chars().count(), "Instruction record written");
    Ok(target)
}
