use std::fmt::Display;
use std::ops::Range;

use crate::pipeline::progress_tracker::ProgressTracker;

const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Runs one operation per batch item on a fixed pool of scoped threads.
///
/// Items are split into contiguous static chunks, one per worker. Each worker
/// walks its chunk in index order and reports `(index, result)` back to the
/// calling thread over a channel. A failing item is logged and does not stop
/// the rest of its chunk. There is no work stealing and no cancellation.
pub struct BatchCoordinator {
    workers: Option<usize>,
    channel_capacity: usize,
}

impl BatchCoordinator {
    pub fn new() -> Self {
        Self {
            workers: None,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Overrides the detected core count. `None` restores auto-detection.
    pub fn with_workers(mut self, workers: Option<usize>) -> Self {
        self.workers = workers.filter(|&w| w > 0);
        self
    }

    /// Number of threads a pass over `n` items will use.
    pub fn worker_count(&self, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        let available = self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(1)
        });
        available.min(n).max(1)
    }

    /// Applies `operation` to every item exactly once and returns the results
    /// in item order. `progress` is ticked once per item.
    pub fn run_parallel<T, E, F>(
        &self,
        items: &mut [T],
        operation: F,
        progress: &ProgressTracker,
    ) -> Vec<Result<(), E>>
    where
        T: Send,
        E: Send + Display,
        F: Fn(usize, &mut T) -> Result<(), E> + Sync,
    {
        let n = items.len();
        let workers = self.worker_count(n);
        if workers == 0 {
            return Vec::new();
        }

        let ranges = partition(n, workers);
        log::debug!(
            "{}: {n} items on {workers} workers (chunks {:?})",
            progress.stage(),
            ranges.iter().map(|r| r.len()).collect::<Vec<_>>()
        );

        let mut slots: Vec<Option<Result<(), E>>> = (0..n).map(|_| None).collect();
        let (result_tx, result_rx) = crossbeam_channel::bounded(self.channel_capacity);
        let operation = &operation;

        std::thread::scope(|scope| {
            let mut rest = items;
            for range in ranges {
                let (chunk, tail) = std::mem::take(&mut rest).split_at_mut(range.len());
                rest = tail;
                let result_tx = result_tx.clone();
                scope.spawn(move || {
                    for (offset, item) in chunk.iter_mut().enumerate() {
                        let index = range.start + offset;
                        let result = operation(index, item);
                        if let Err(e) = &result {
                            log::warn!("{}: item {index} failed: {e}", progress.stage());
                        }
                        progress.tick();
                        if result_tx.send((index, result)).is_err() {
                            break;
                        }
                    }
                });
            }

            drop(result_tx);
            for (index, result) in result_rx {
                slots[index] = Some(result);
            }
        });

        slots.into_iter().flatten().collect()
    }
}

impl Default for BatchCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Splits `0..n` into `workers` contiguous ranges of `n / workers` items;
/// the last range absorbs the remainder.
pub fn partition(n: usize, workers: usize) -> Vec<Range<usize>> {
    if n == 0 || workers == 0 {
        return Vec::new();
    }
    let workers = workers.min(n);
    let chunk = n / workers;
    (0..workers)
        .map(|w| {
            let start = w * chunk;
            let end = if w + 1 == workers { n } else { start + chunk };
            start..end
        })
        .collect()
}
