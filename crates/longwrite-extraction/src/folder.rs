//! Folder extraction and merge.
//!
//! Every supported document under the input folder is extracted to
//! `<output>/<stem>.txt`. The merge step then concatenates those files in
//! stem order, each under a `### <stem> ###` heading.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use longwrite_utils::error::ExtractionError;

use crate::extractor::{DocumentKind, ExtractorSet};

/// Default name of the merged file inside the output folder
pub const MERGED_FILE_NAME: &str = "merged_text.txt";

/// What one folder pass did
#[derive(Debug, Default)]
pub struct FolderReport {
    /// Stems written to the output folder, sorted and unique
    pub extracted: Vec<String>,
    /// Files with no extractor for their type
    pub skipped: Vec<PathBuf>,
    /// Files whose extraction failed, with the error
    pub failed: Vec<(PathBuf, ExtractionError)>,
}

/// Extract every supported document under `input` into `output`.
///
/// A failure on one document is logged and recorded; the pass continues.
/// If `output` lies inside `input` it is not walked.
///
/// # Errors
///
/// `NotFound` if `input` is not a directory; `Io` if the tree cannot be read
/// or a text file cannot be written.
pub async fn process_folder(
    input: &Path,
    output: &Path,
    extractors: &ExtractorSet,
) -> Result<FolderReport, ExtractionError> {
    if !input.is_dir() {
        return Err(ExtractionError::NotFound(input.to_path_buf()));
    }
    tokio::fs::create_dir_all(output)
        .await
        .map_err(|source| io_error(output, source))?;

    let files = collect_files(input, output)?;
    let mut report = FolderReport::default();
    let mut stems = BTreeSet::new();

    for file in files {
        let Some(kind) = DocumentKind::from_path(&file) else {
            info!(file = %file.display(), "Skipping unsupported file");
            report.skipped.push(file);
            continue;
        };
        let Some(stem) = file.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
            warn!(file = %file.display(), "Skipping file with a non-UTF-8 name");
            report.skipped.push(file);
            continue;
        };

        let text = match extractors.for_kind(kind) {
            Ok(extractor) => {
                info!(file = %file.display(), extractor = extractor.name(), "Extracting");
                extractor.extract(&file).await
            }
            Err(e) => Err(e),
        };

        match text {
            Ok(text) => {
                let target = output.join(format!("{stem}.txt"));
                tokio::fs::write(&target, text)
                    .await
                    .map_err(|source| io_error(&target, source))?;
                stems.insert(stem);
            }
            Err(e) => {
                warn!(file = %file.display(), error = %e, "Extraction failed, skipping file");
                report.failed.push((file, e));
            }
        }
    }

    report.extracted = stems.into_iter().collect();
    Ok(report)
}

/// Concatenate `<output>/<stem>.txt` for each stem into `merged`.
///
/// Returns the number of sections written. A missing text file is warned
/// about and left out.
///
/// # Errors
///
/// `Io` if a text file cannot be read or the merged file cannot be written.
pub async fn merge_text_files(
    output: &Path,
    merged: &Path,
    stems: &[String],
) -> Result<usize, ExtractionError> {
    let mut content = String::new();
    let mut sections = 0;

    for stem in stems {
        let path = output.join(format!("{stem}.txt"));
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(file = %path.display(), "Text file not found, leaving it out of the merge");
                continue;
            }
            Err(source) => return Err(io_error(&path, source)),
        };
        content.push_str(&format!("### {stem} ###\n"));
        content.push_str(&text);
        content.push_str("\n\n");
        sections += 1;
    }

    tokio::fs::write(merged, content)
        .await
        .map_err(|source| io_error(merged, source))?;
    Ok(sections)
}

/// All regular files under `root` in a stable order, skipping `exclude`.
fn collect_files(root: &Path, exclude: &Path) -> Result<Vec<PathBuf>, ExtractionError> {
    let exclude = exclude.canonicalize().ok();
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        if let (Some(exclude), Ok(canonical)) = (&exclude, dir.canonicalize())
            && &canonical == exclude
        {
            continue;
        }

        let entries = std::fs::read_dir(&dir).map_err(|source| io_error(&dir, source))?;
        let mut children = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| io_error(&dir, source))?;
            children.push(entry.path());
        }
        children.sort();

        for child in children {
            if child.is_dir() {
                pending.push(child);
            } else if child.is_file() {
                files.push(child);
            }
        }
    }

    files.sort();
    Ok(files)
}

fn io_error(path: &Path, source: std::io::Error) -> ExtractionError {
    ExtractionError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::{PlainTextExtractor, TextExtractor};
    use async_trait::async_trait;

    /// Pretends every document says its own file name
    struct NameExtractor;

    #[async_trait]
    impl TextExtractor for NameExtractor {
        fn name(&self) -> &str {
            "name"
        }

        async fn extract(&self, path: &Path) -> Result<String, ExtractionError> {
            Ok(format!("text of {}", path.file_name().unwrap().to_string_lossy()))
        }
    }

    fn extractors() -> ExtractorSet {
        ExtractorSet::new(
            Some(Box::new(NameExtractor)),
            None,
            Box::new(PlainTextExtractor),
        )
    }

    #[tokio::test]
    async fn test_process_folder_walks_recursively() {
        let dir = tempfile::tempdir().unwrap();
        let refs = dir.path().join("refs");
        std::fs::create_dir_all(refs.join("nested")).unwrap();
        std::fs::write(refs.join("b.pdf"), "").unwrap();
        std::fs::write(refs.join("nested/a.pdf"), "").unwrap();
        std::fs::write(refs.join("notes.md"), "my notes").unwrap();
        std::fs::write(refs.join("deck.pptx"), "").unwrap();
        std::fs::write(refs.join("image.png"), "").unwrap();

        let out = refs.join("text");
        let report = process_folder(&refs, &out, &extractors()).await.unwrap();

        assert_eq!(report.extracted, vec!["a", "b", "notes"]);
        assert_eq!(report.skipped, vec![refs.join("image.png")]);
        assert_eq!(report.failed.len(), 1);
        assert!(matches!(
            report.failed[0].1,
            ExtractionError::Unsupported(_)
        ));
        assert_eq!(
            std::fs::read_to_string(out.join("a.txt")).unwrap(),
            "text of a.pdf"
        );
        assert_eq!(
            std::fs::read_to_string(out.join("notes.txt")).unwrap(),
            "my notes"
        );

        // Re-running does not pick up the output folder's own text files.
        let again = process_folder(&refs, &out, &extractors()).await.unwrap();
        assert_eq!(again.extracted, vec!["a", "b", "notes"]);
    }

    #[tokio::test]
    async fn test_merge_in_stem_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        std::fs::write(dir.path().join("b.txt"), "beta").unwrap();
        let merged = dir.path().join(MERGED_FILE_NAME);

        let stems = vec!["a".to_string(), "missing".to_string(), "b".to_string()];
        let sections = merge_text_files(dir.path(), &merged, &stems).await.unwrap();

        assert_eq!(sections, 2);
        assert_eq!(
            std::fs::read_to_string(&merged).unwrap(),
            "### a ###\nalpha\n\n### b ###\nbeta\n\n"
        );
    }

    #[tokio::test]
    async fn test_missing_input_folder() {
        let dir = tempfile::tempdir().unwrap();
        let err = process_folder(&dir.path().join("nope"), dir.path(), &extractors())
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::NotFound(_)));
    }
}
