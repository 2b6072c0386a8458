//! Batch and cohort partitioning arithmetic.

use std::ops::Range;

use crate::error::ConfigError;
use crate::grid::{CropCoordinate, TilingParameters};
use crate::slide::SlideBackend;
use crate::tile::Resampler;
use crate::worker::WorkerFactory;

use super::cohort::CohortStream;

/// Default number of batches served by one worker before it is replaced.
pub const DEFAULT_COHORT_SIZE: usize = 32;

/// Default number of crops per batch.
pub const DEFAULT_BATCH_SIZE: usize = 16;

// =============================================================================
// BatchScheduler
// =============================================================================

/// Partitions crop coordinates into batches and batches into cohorts.
///
/// Every cohort is served by one freshly spawned worker. Larger cohorts
/// amortize the cost of opening the slide over more batches; smaller ones
/// bound how much state a single worker can accumulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchScheduler {
    batch_size: usize,
    cohort_size: usize,
}

impl BatchScheduler {
    /// Create a scheduler.
    ///
    /// # Errors
    ///
    /// Returns an error if either size is zero.
    pub fn new(batch_size: usize, cohort_size: usize) -> Result<Self, ConfigError> {
        if batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize);
        }
        if cohort_size == 0 {
            return Err(ConfigError::InvalidCohortSize);
        }
        Ok(Self {
            batch_size,
            cohort_size,
        })
    }

    /// Crops per batch.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Batches per cohort.
    pub fn cohort_size(&self) -> usize {
        self.cohort_size
    }

    /// Number of batches for `len` coordinates: `ceil(len / batch_size)`.
    pub fn batch_count(&self, len: usize) -> usize {
        len.div_ceil(self.batch_size)
    }

    /// Number of cohorts for `batches` batches: `ceil(batches / cohort_size)`.
    pub fn cohort_count(&self, batches: usize) -> usize {
        batches.div_ceil(self.cohort_size)
    }

    /// Coordinate index range of every batch.
    pub fn batch_ranges(&self, len: usize) -> impl Iterator<Item = Range<usize>> {
        chunk_ranges(len, self.batch_size)
    }

    /// Batch index range of every cohort.
    ///
    /// Cohort `k` covers `[k * cohort_size, min((k + 1) * cohort_size, batches))`.
    pub fn cohort_ranges(&self, batches: usize) -> impl Iterator<Item = Range<usize>> {
        chunk_ranges(batches, self.cohort_size)
    }

    /// Eagerly partition coordinates into cohorts of batches.
    ///
    /// No worker is involved; this is the shape [`BatchScheduler::stream`]
    /// will dispatch.
    pub fn plan(&self, coordinates: &[CropCoordinate]) -> Vec<Vec<Vec<CropCoordinate>>> {
        let batches: Vec<Vec<CropCoordinate>> = coordinates
            .chunks(self.batch_size)
            .map(<[CropCoordinate]>::to_vec)
            .collect();

        batches
            .chunks(self.cohort_size)
            .map(<[Vec<CropCoordinate>]>::to_vec)
            .collect()
    }

    /// Build the lazy cohort sequence for `coordinates`.
    ///
    /// Nothing is spawned or submitted until the returned stream is advanced.
    pub fn stream<B: SlideBackend, R: Resampler>(
        &self,
        coordinates: Vec<CropCoordinate>,
        params: TilingParameters,
        factory: WorkerFactory<B, R>,
    ) -> CohortStream<B, R> {
        CohortStream::new(*self, coordinates, params, factory)
    }
}

/// Split `0..len` into consecutive ranges of at most `size` elements.
fn chunk_ranges(len: usize, size: usize) -> impl Iterator<Item = Range<usize>> {
    let size = size.max(1);
    (0..len.div_ceil(size)).map(move |k| k * size..((k + 1) * size).min(len))
}

// =============================================================================
// Tests
// =============================================================================
