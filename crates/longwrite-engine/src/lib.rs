//! The plan-then-write pipeline
//!
//! A stage reads a JSONL queue, drops the instructions its output already
//! holds, and hands the rest to a fixed pool of workers. The plan stage turns
//! each instruction into an outline; the write stage expands the outline one
//! step at a time, caching every generated step so an interrupted item is
//! replayed rather than regenerated.

pub mod distributor;
pub mod plan_stage;
pub mod report;
pub mod runner;
pub mod steps;
pub mod write_stage;

pub use distributor::{ItemProcessor, distribute, partition_round_robin};
pub use plan_stage::PlanStage;
pub use report::{ItemOutcome, ItemResult, Stage, StageReport, WorkerTally};
pub use runner::{PlanJob, WriteJob, run_plan_stage, run_write_stage};
pub use steps::split_plan_steps;
pub use write_stage::WriteStage;
