//! Persistent state for the longwrite stages
//!
//! Every store is a JSON-lines file that is only ever appended to. A record's
//! presence in a stage's output file is the completion signal read at the
//! next run's startup.

pub mod cache;
pub mod completion;
pub mod jsonl;
pub mod lock;
pub mod records;
pub mod writer;

pub use cache::StepCache;
pub use completion::CompletionSet;
pub use jsonl::{JsonlRead, read_jsonl, read_jsonl_if_exists};
pub use lock::RunLock;
pub use longwrite_utils::error::StoreError;
pub use records::{CacheEntry, PlanItem, WorkItem, WriteItem};
pub use writer::{AppendHandle, JsonlAppender};
