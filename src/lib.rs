//! longwrite: expand long-form writing instructions into documents.
//!
//! The pipeline has two generation stages. `plan` asks the model for an
//! outline per instruction; `write` expands each outline one step at a time,
//! feeding the text written so far back into every request. Both stages are
//! resumable: a record's presence in a stage's output marks it complete, and
//! the write stage caches every generated step.
//!
//! Two helper commands prepare input: `extract` turns a folder of PDFs, slide
//! decks, and text files into plain text, and `records` wraps a text file into
//! an instruction queue.
//!
//! The library crates hold the logic:
//!
//! - `longwrite-config`: configuration discovery and validation
//! - `longwrite-llm`: the retrying generation client
//! - `longwrite-store`: JSONL stores, step cache, run lock
//! - `longwrite-engine`: the stages and the work distributor
//! - `longwrite-extraction`: text extraction and record building

pub mod cli;

pub use longwrite_config::{CliArgs, Config};
pub use longwrite_engine::{
    PlanJob, StageReport, WriteJob, run_plan_stage, run_write_stage, split_plan_steps,
};
pub use longwrite_llm::{Generation, GenerationClient, GenerationRequest};
pub use longwrite_utils::error::{LongwriteError, UserFriendlyError};
pub use longwrite_utils::exit_codes::ExitCode;
