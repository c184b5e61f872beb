use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};

use crate::pipeline::batch_executor::{BatchExecutor, BatchJob, ItemResult};
use crate::pipeline::batch_report::ItemStatus;
use crate::pipeline::crop_image_use_case::CropImageUseCase;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::pipeline::skipped::Skipped;

/// Upper bound on the default worker count; each worker holds one decoded
/// image at a time.
const MAX_DEFAULT_WORKERS: usize = 4;

/// Runs batch jobs on a fixed pool of worker threads.
///
/// Layout: `feeder → [bounded job queue] → N workers → collector (caller)`
///
/// The bounded queues cap how many images are decoded at once. The caller's
/// thread collects results, drives the logger, and restores input order.
/// Images left unfinished by a panicked worker are reported as
/// [`Skipped::WorkerPanicked`]; the rest of the batch keeps its results.
pub struct ThreadedBatchExecutor {
    workers: usize,
}

impl ThreadedBatchExecutor {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// `min(available_parallelism, 4)`.
    pub fn default_workers() -> usize {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .min(MAX_DEFAULT_WORKERS)
    }

    pub fn workers(&self) -> usize {
        self.workers
    }
}

impl Default for ThreadedBatchExecutor {
    fn default() -> Self {
        Self::new(Self::default_workers())
    }
}

impl BatchExecutor for ThreadedBatchExecutor {
    fn execute(
        &self,
        jobs: Vec<BatchJob>,
        use_case: Arc<CropImageUseCase>,
        logger: &mut dyn PipelineLogger,
    ) -> Result<Vec<ItemResult>, Box<dyn std::error::Error>> {
        let total = jobs.len();
        if total == 0 {
            return Ok(Vec::new());
        }
        let workers = self.workers.min(total);
        let cap = workers * 2;

        let (job_tx, job_rx) = crossbeam_channel::bounded::<(usize, BatchJob)>(cap);
        let (result_tx, result_rx) = crossbeam_channel::bounded::<(usize, ItemResult)>(cap);

        let feeder = spawn_feeder(jobs, job_tx);
        let handles: Vec<_> = (0..workers)
            .map(|_| spawn_worker(use_case.clone(), job_rx.clone(), result_tx.clone()))
            .collect();
        drop(job_rx);
        drop(result_tx);

        let results = collect(result_rx, total, logger);

        let mut panicked = feeder.join().is_err();
        for handle in handles {
            panicked |= handle.join().is_err();
        }
        if panicked {
            log::error!("Batch worker thread panicked");
        }

        Ok(results
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| {
                    logger.outcome(ItemStatus::Failed.as_str());
                    Err(Skipped::WorkerPanicked)
                })
            })
            .collect())
    }
}

fn spawn_feeder(jobs: Vec<BatchJob>, job_tx: Sender<(usize, BatchJob)>) -> JoinHandle<()> {
    std::thread::spawn(move || {
        for item in jobs.into_iter().enumerate() {
            if job_tx.send(item).is_err() {
                break;
            }
        }
    })
}

fn spawn_worker(
    use_case: Arc<CropImageUseCase>,
    job_rx: Receiver<(usize, BatchJob)>,
    result_tx: Sender<(usize, ItemResult)>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        for (index, job) in job_rx {
            let result = use_case.execute(&job.input, job.output.as_deref());
            if result_tx.send((index, result)).is_err() {
                break;
            }
        }
    })
}

/// Gathers results in completion order and slots them back by index.
fn collect(
    result_rx: Receiver<(usize, ItemResult)>,
    total: usize,
    logger: &mut dyn PipelineLogger,
) -> Vec<Option<ItemResult>> {
    let mut results: Vec<Option<ItemResult>> = (0..total).map(|_| None).collect();
    let mut done = 0;

    for (index, result) in result_rx {
        if let Ok(outcome) = &result {
            logger.timing("decode", outcome.timings.decode_ms);
            logger.timing("crop", outcome.timings.crop_ms);
            if outcome.written.is_some() {
                logger.timing("write", outcome.timings.write_ms);
            }
        }
        logger.outcome(ItemStatus::of(&result).as_str());
        results[index] = Some(result);
        done += 1;
        logger.progress(done, total);
    }
    results
}
