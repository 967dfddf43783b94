use anyhow::Result;

use longwrite_extraction::txt_to_jsonl;
use longwrite_utils::error::LongwriteError;

use crate::cli::args::RecordsArgs;

pub fn execute_records_command(args: &RecordsArgs) -> Result<()> {
    let path = txt_to_jsonl(&args.input, args.output.as_deref()).map_err(LongwriteError::from)?;
    println!("✓ Wrote instruction record to {}", path.display());
    Ok(())
}
