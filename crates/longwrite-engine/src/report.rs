//! Per-item outcomes and the per-run stage report.

use std::fmt;
use std::ops::AddAssign;
use std::path::PathBuf;

use serde::Serialize;

/// Which pipeline stage a run belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Plan,
    Write,
}

impl Stage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plan => "plan",
            Self::Write => "write",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to one work item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemOutcome {
    /// Appended to the stage output
    Committed,
    /// Dropped as malformed input; not retried automatically
    #[default]
    Skipped,
    /// Generation produced no usable text; left for the next run
    Halted,
    /// An error ended the item; logged and left for the next run
    Failed,
}

/// Outcome of one item plus its generation counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ItemResult {
    pub outcome: ItemOutcome,
    pub cache_hits: usize,
    pub generated_steps: usize,
}

impl ItemResult {
    #[must_use]
    pub fn with_outcome(mut self, outcome: ItemOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    #[must_use]
    pub fn skipped() -> Self {
        Self::default().with_outcome(ItemOutcome::Skipped)
    }
}

/// Counters summed over the items one worker processed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct WorkerTally {
    pub committed: usize,
    pub skipped: usize,
    pub halted: usize,
    pub failed: usize,
    pub cache_hits: usize,
    pub generated_steps: usize,
}

impl WorkerTally {
    pub fn record(&mut self, result: &ItemResult) {
        match result.outcome {
            ItemOutcome::Committed => self.committed += 1,
            ItemOutcome::Skipped => self.skipped += 1,
            ItemOutcome::Halted => self.halted += 1,
            ItemOutcome::Failed => self.failed += 1,
        }
        self.cache_hits += result.cache_hits;
        self.generated_steps += result.generated_steps;
    }

    #[must_use]
    pub fn processed(&self) -> usize {
        self.committed + self.skipped + self.halted + self.failed
    }
}

impl AddAssign for WorkerTally {
    fn add_assign(&mut self, other: Self) {
        self.committed += other.committed;
        self.skipped += other.skipped;
        self.halted += other.halted;
        self.failed += other.failed;
        self.cache_hits += other.cache_hits;
        self.generated_steps += other.generated_steps;
    }
}

/// Summary of one stage run, printed by the CLI
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
    pub stage: Stage,
    pub output: PathBuf,
    /// Readable records in the input queue
    pub input: usize,
    /// Input lines skipped as unreadable
    pub unreadable_input: usize,
    /// Input records whose instruction the output already holds
    pub already_complete: usize,
    /// Records handed to the workers
    pub queued: usize,
    pub workers: usize,
    #[serde(flatten)]
    pub tally: WorkerTally,
    pub elapsed_ms: u64,
}

impl StageReport {
    /// True when every queued item was committed
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.tally.committed == self.queued
    }

    /// Items left for a later run
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.queued.saturating_sub(self.tally.committed)
    }
}

impl fmt::Display for StageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} stage -> {}", self.stage, self.output.display())?;
        writeln!(
            f,
            "  input: {} ({} unreadable lines skipped), already complete: {}, queued: {} across {} workers",
            self.input, self.unreadable_input, self.already_complete, self.queued, self.workers
        )?;
        writeln!(
            f,
            "  committed: {}, halted: {}, skipped: {}, failed: {}",
            self.tally.committed, self.tally.halted, self.tally.skipped, self.tally.failed
        )?;
        if self.stage == Stage::Write {
            writeln!(
                f,
                "  steps generated: {}, replayed from cache: {}",
                self.tally.generated_steps, self.tally.cache_hits
            )?;
        }
        write!(f, "  elapsed: {:.1}s", self.elapsed_ms as f64 / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_records_outcomes() {
        let mut tally = WorkerTally::default();
        tally.record(&ItemResult {
            outcome: ItemOutcome::Committed,
            cache_hits: 2,
            generated_steps: 3,
        });
        tally.record(&ItemResult::skipped());
        tally.record(&ItemResult {
            outcome: ItemOutcome::Halted,
            cache_hits: 1,
            generated_steps: 0,
        });

        assert_eq!(tally.committed, 1);
        assert_eq!(tally.skipped, 1);
        assert_eq!(tally.halted, 1);
        assert_eq!(tally.cache_hits, 3);
        assert_eq!(tally.generated_steps, 3);
        assert_eq!(tally.processed(), 3);
    }

    #[test]
    fn test_tallies_sum() {
        let mut total = WorkerTally {
            committed: 1,
            ..WorkerTally::default()
        };
        total += WorkerTally {
            committed: 2,
            failed: 1,
            ..WorkerTally::default()
        };
        assert_eq!(total.committed, 3);
        assert_eq!(total.failed, 1);
    }

    #[test]
    fn test_report_serializes_flat() {
        let report = StageReport {
            stage: Stage::Write,
            output: PathBuf::from("write.jsonl"),
            input: 3,
            unreadable_input: 0,
            already_complete: 1,
            queued: 2,
            workers: 8,
            tally: WorkerTally {
                committed: 1,
                halted: 1,
                ..WorkerTally::default()
            },
            elapsed_ms: 1500,
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["stage"], "write");
        assert_eq!(value["committed"], 1);
        assert_eq!(value["halted"], 1);
        assert!(!report.is_complete());
        assert_eq!(report.remaining(), 1);
        assert!(report.to_string().contains("replayed from cache: 0"));
    }
}
