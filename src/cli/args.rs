//! CLI argument definitions
//!
//! Global flags override configuration; subcommand flags name the files a
//! command reads and writes.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use longwrite_config::CliArgs;
use longwrite_engine::runner::{
    DEFAULT_PLAN_INPUT, DEFAULT_PLAN_OUTPUT, DEFAULT_WRITE_CACHE, DEFAULT_WRITE_OUTPUT,
};

/// longwrite - plan-then-write generation of long-form documents
#[derive(Parser, Debug)]
#[command(name = "longwrite")]
#[command(about = "Expand long-form writing instructions into documents, one plan step at a time")]
#[command(long_about = r#"
longwrite turns writing instructions into long documents in two resumable
stages: `plan` asks the model for a step-by-step outline, and `write` expands
each outline step by step, feeding the text written so far into every request.

EXAMPLES:
  # Wrap an instruction text file into a queue
  longwrite records instruction.txt --output instructions.jsonl

  # Generate outlines, then documents
  longwrite plan --input instructions.jsonl --output plan.jsonl
  longwrite write --input plan.jsonl --output write.jsonl --cache write_cache.jsonl

  # Extract reference documents to text and merge them
  longwrite extract refs/ --output refs/text

  # Show the effective configuration and where each value came from
  longwrite config

CONFIGURATION:
  Precedence: CLI flags > environment > env file > longwrite.toml > defaults
  The env file (default ./env) holds KEY = value lines:
    GPT4_API_KEY = '...'
    GPT_MODEL = '...'
    END_POINT = 'https://.../v1/chat/completions'

RESUMING:
  Re-run the same command. Completed instructions are skipped, and the write
  stage replays cached steps instead of regenerating them.
"#)]
#[command(version)]
pub struct Cli {
    /// Path to longwrite.toml (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the KEY = value env file (default: ./env)
    #[arg(long, global = true)]
    pub env_file: Option<PathBuf>,

    /// Chat completions endpoint URL
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Model identifier sent with every request
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Sampling temperature (0.0-2.0)
    #[arg(long, global = true)]
    pub temperature: Option<f32>,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Number of concurrent workers
    #[arg(short = 'j', long, global = true)]
    pub workers: Option<usize>,

    /// Output token budget per request
    #[arg(long, global = true)]
    pub max_new_tokens: Option<u32>,

    /// Plans with more steps than this are skipped
    #[arg(long, global = true)]
    pub max_steps: Option<usize>,

    /// Attempts per request before giving up
    #[arg(long, global = true)]
    pub max_attempts: Option<u32>,

    /// Backoff before the second attempt, in ms; 0 retries immediately
    #[arg(long, global = true)]
    pub base_delay_ms: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Configuration overrides carried by the global flags
    #[must_use]
    pub fn cli_args(&self) -> CliArgs {
        CliArgs {
            config_path: self.config.clone(),
            env_file: self.env_file.clone(),
            endpoint: self.endpoint.clone(),
            model: self.model.clone(),
            temperature: self.temperature,
            timeout_secs: self.timeout,
            workers: self.workers,
            max_new_tokens: self.max_new_tokens,
            max_steps: self.max_steps,
            max_attempts: self.max_attempts,
            base_delay_ms: self.base_delay_ms,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a plan for every instruction not yet planned
    Plan(PlanArgs),

    /// Expand every plan not yet written into a document
    Write(WriteArgs),

    /// Extract text from the PDFs, slide decks, and text files in a folder
    Extract(ExtractArgs),

    /// Wrap a text file into a one-instruction JSONL queue
    Records(RecordsArgs),

    /// Show the effective configuration with value sources
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Instruction queue, one {"prompt": ...} record per line
    #[arg(long, default_value = DEFAULT_PLAN_INPUT)]
    pub input: PathBuf,

    /// Plan store to append to
    #[arg(long, default_value = DEFAULT_PLAN_OUTPUT)]
    pub output: PathBuf,

    /// Plan template file containing $INST$ (default: built-in)
    #[arg(long)]
    pub template: Option<PathBuf>,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct WriteArgs {
    /// Plan store to read
    #[arg(long, default_value = DEFAULT_PLAN_OUTPUT)]
    pub input: PathBuf,

    /// Document store to append to
    #[arg(long, default_value = DEFAULT_WRITE_OUTPUT)]
    pub output: PathBuf,

    /// Step cache to replay from and append to
    #[arg(long, default_value = DEFAULT_WRITE_CACHE)]
    pub cache: PathBuf,

    /// Write template file containing $INST$ $PLAN$ $TEXT$ $STEP$ (default: built-in)
    #[arg(long)]
    pub template: Option<PathBuf>,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Folder to walk for documents
    pub input: PathBuf,

    /// Folder for the extracted .txt files (default: <input>/text)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Merged text file (default: <output>/merged_text.txt)
    #[arg(long)]
    pub merged: Option<PathBuf>,

    /// Skip writing the merged file
    #[arg(long)]
    pub no_merge: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct RecordsArgs {
    /// Text file holding one instruction
    pub input: PathBuf,

    /// Output JSONL path (default: input with a .jsonl extension)
    #[arg(long)]
    pub output: Option<PathBuf>,
}
