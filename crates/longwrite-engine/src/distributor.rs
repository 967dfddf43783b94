//! Static round-robin work distribution over a fixed pool of tasks.
//!
//! Item `i` goes to worker `i % W`; each worker keeps its items in queue
//! order. There is no work stealing. Workers share nothing but the
//! processor, whose append handles serialize writes to the stage files.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::{JoinError, JoinSet};
use tracing::{Instrument, debug, error};

use longwrite_utils::digest::item_id;
use longwrite_utils::logging::item_span;

use crate::report::{ItemResult, Stage, WorkerTally};

/// One stage's per-item work
#[async_trait]
pub trait ItemProcessor: Send + Sync + 'static {
    type Item: Send + 'static;

    fn stage(&self) -> Stage;

    /// Instruction identifying `item`
    fn instruction<'a>(&self, item: &'a Self::Item) -> &'a str;

    /// Process one item. Never fails: errors are logged and reported as an
    /// outcome so one bad item cannot stop its worker.
    async fn process(&self, item: Self::Item) -> ItemResult;
}

/// Split `items` into `workers` disjoint round-robin partitions.
///
/// A worker count of zero is treated as one.
#[must_use]
pub fn partition_round_robin<T>(items: Vec<T>, workers: usize) -> Vec<Vec<T>> {
    let workers = workers.max(1);
    let mut partitions: Vec<Vec<T>> = (0..workers)
        .map(|_| Vec::with_capacity(items.len() / workers + 1))
        .collect();
    for (idx, item) in items.into_iter().enumerate() {
        partitions[idx % workers].push(item);
    }
    partitions
}

/// Run `processor` over `items` with `workers` concurrent tasks and wait for
/// all of them.
///
/// # Errors
///
/// Returns the first `JoinError` if a worker panicked, after every other
/// worker has finished.
pub async fn distribute<P: ItemProcessor>(
    processor: Arc<P>,
    items: Vec<P::Item>,
    workers: usize,
) -> Result<WorkerTally, JoinError> {
    let stage = processor.stage();
    let mut tasks = JoinSet::new();

    for (worker, partition) in partition_round_robin(items, workers).into_iter().enumerate() {
        if partition.is_empty() {
            continue;
        }
        let processor = Arc::clone(&processor);
        tasks.spawn(async move {
            let total = partition.len();
            let mut tally = WorkerTally::default();
            for (position, item) in partition.into_iter().enumerate() {
                let id = item_id(processor.instruction(&item));
                let span = item_span(stage.as_str(), worker, &id);
                debug!(parent: &span, position = position + 1, total, "Starting item");
                let result = processor.process(item).instrument(span).await;
                tally.record(&result);
            }
            debug!(
                stage = %stage,
                worker,
                committed = tally.committed,
                processed = tally.processed(),
                "Worker finished"
            );
            tally
        });
    }

    let mut total = WorkerTally::default();
    let mut first_failure = None;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(tally) => total += tally,
            Err(e) => {
                error!(stage = %stage, error = %e, "Worker task aborted");
                first_failure.get_or_insert(e);
            }
        }
    }

    match first_failure {
        Some(e) => Err(e),
        None => Ok(total),
    }
}
