//! `longwrite extract`: folder of documents to text files plus a merged file.

use anyhow::Result;
use serde_json::json;

use longwrite_config::Config;
use longwrite_extraction::{ExtractorSet, MERGED_FILE_NAME, merge_text_files, process_folder};
use longwrite_utils::error::LongwriteError;

use crate::cli::args::ExtractArgs;

pub async fn execute_extract_command(args: ExtractArgs, config: &Config) -> Result<()> {
    let output = args.output.unwrap_or_else(|| args.input.join("text"));
    let extractors = ExtractorSet::from_config(&config.extraction);

    let report = process_folder(&args.input, &output, &extractors)
        .await
        .map_err(LongwriteError::from)?;

    let merged = if args.no_merge {
        None
    } else {
        let path = args
            .merged
            .unwrap_or_else(|| output.join(MERGED_FILE_NAME));
        let sections = merge_text_files(&output, &path, &report.extracted)
            .await
            .map_err(LongwriteError::from)?;
        Some((path, sections))
    };

    if args.json {
        let failed: Vec<_> = report
            .failed
            .iter()
            .map(|(file, error)| json!({"file": file, "error": error.to_string()}))
            .collect();
        let value = json!({
            "output": output,
            "extracted": report.extracted,
            "skipped": report.skipped,
            "failed": failed,
            "merged": merged.as_ref().map(|(path, _)| path),
            "sections": merged.as_ref().map(|(_, sections)| sections),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!(
        "Extracted {} document(s) to {}",
        report.extracted.len(),
        output.display()
    );
    if !report.skipped.is_empty() {
        println!("  skipped {} unsupported file(s)", report.skipped.len());
    }
    for (file, error) in &report.failed {
        println!("  failed: {}: {error}", file.display());
    }
    if let Some((path, sections)) = &merged {
        println!("Merged {sections} section(s) into {}", path.display());
    }
    Ok(())
}
