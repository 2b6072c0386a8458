//! Lazy cohort dispatch.
//!
//! A [`CohortStream`] is a pull-based iterator: each call to `next()` spawns
//! one fresh worker, submits every crop of the next cohort to it and hands
//! back the pending results. Nothing happens before the first pull, and a
//! consumer that resolves each cohort before pulling the next one runs the
//! slide strictly cohort by cohort.

use tracing::debug;

use crate::error::CropError;
use crate::grid::{CropCoordinate, TilingParameters};
use crate::slide::SlideBackend;
use crate::tile::Resampler;
use crate::worker::{resolve_all, CropResult, CropTask, Pending, WorkerFactory};

use super::batch::BatchScheduler;

// =============================================================================
// Batch
// =============================================================================

/// Pending crops of one batch, in coordinate order.
#[derive(Debug)]
pub struct Batch {
    index: usize,
    tasks: Vec<Pending<CropResult>>,
}

impl Batch {
    /// Global index of this batch across the whole slide.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of crops in the batch.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Take the pending handles out of the batch.
    pub fn into_pending(self) -> Vec<Pending<CropResult>> {
        self.tasks
    }

    /// Wait for every crop of the batch.
    pub async fn resolve(self) -> Vec<Result<CropResult, CropError>> {
        resolve_all(self.tasks).await
    }
}

// =============================================================================
// Cohort
// =============================================================================

/// Consecutive batches served by a single worker.
#[derive(Debug)]
pub struct Cohort {
    index: usize,
    worker_id: usize,
    batches: Vec<Batch>,
}

impl Cohort {
    /// Position of this cohort in the stream.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Identifier of the worker serving this cohort.
    pub fn worker_id(&self) -> usize {
        self.worker_id
    }

    /// Number of batches in the cohort.
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// The batches, in submission order.
    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    /// Take ownership of the batches.
    pub fn into_batches(self) -> Vec<Batch> {
        self.batches
    }
}

// =============================================================================
// CohortStream
// =============================================================================

/// Pull-based sequence of dispatched cohorts.
pub struct CohortStream<B: SlideBackend, R: Resampler> {
    scheduler: BatchScheduler,
    coordinates: Vec<CropCoordinate>,
    params: TilingParameters,
    factory: WorkerFactory<B, R>,
    next_batch: usize,
    next_cohort: usize,
    total_batches: usize,
}

impl<B: SlideBackend, R: Resampler> CohortStream<B, R> {
    pub(crate) fn new(
        scheduler: BatchScheduler,
        coordinates: Vec<CropCoordinate>,
        params: TilingParameters,
        factory: WorkerFactory<B, R>,
    ) -> Self {
        let total_batches = scheduler.batch_count(coordinates.len());
        Self {
            scheduler,
            coordinates,
            params,
            factory,
            next_batch: 0,
            next_cohort: 0,
            total_batches,
        }
    }

    /// Total number of batches across all cohorts.
    pub fn total_batches(&self) -> usize {
        self.total_batches
    }

    /// Total number of crops across all cohorts.
    pub fn total_crops(&self) -> usize {
        self.coordinates.len()
    }

    /// Batches not yet dispatched.
    pub fn remaining_batches(&self) -> usize {
        self.total_batches - self.next_batch
    }

    fn coordinate_range(&self, batch: usize) -> std::ops::Range<usize> {
        let size = self.scheduler.batch_size();
        let start = batch * size;
        start..(start + size).min(self.coordinates.len())
    }
}

impl<B: SlideBackend, R: Resampler> Iterator for CohortStream<B, R> {
    type Item = Cohort;

    fn next(&mut self) -> Option<Cohort> {
        if self.next_batch >= self.total_batches {
            return None;
        }

        let first = self.next_batch;
        let last = (first + self.scheduler.cohort_size()).min(self.total_batches);

        // One fresh worker per cohort, never reused
        let worker = self.factory.spawn();

        let batches: Vec<Batch> = (first..last)
            .map(|index| {
                let tasks = self.coordinates[self.coordinate_range(index)]
                    .iter()
                    .map(|&coordinate| worker.crop(CropTask::new(coordinate, &self.params)))
                    .collect();
                Batch { index, tasks }
            })
            .collect();

        debug!(
            cohort = self.next_cohort,
            worker = worker.id(),
            batches = batches.len(),
            "Dispatched cohort"
        );

        let cohort = Cohort {
            index: self.next_cohort,
            worker_id: worker.id(),
            batches,
        };

        self.next_batch = last;
        self.next_cohort += 1;

        // `worker` drops here: the actor drains its queue and releases the slide
        Some(cohort)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.scheduler.cohort_count(self.remaining_batches());
        (remaining, Some(remaining))
    }
}

impl<B: SlideBackend, R: Resampler> ExactSizeIterator for CohortStream<B, R> {}
