//! Batch scheduling across rotating workers.
//!
//! Coordinates are cut into batches of `batch_size` crops, and batches into
//! cohorts of `cohort_size` batches. Each cohort gets its own worker.
//!
//! ```text
//! coordinates ─┬─ batch 0 ─┐
//!              ├─ batch 1 ─┼─ cohort 0 ──▶ worker 0
//!              ├─ ...     ─┘
//!              ├─ batch C ─┐
//!              ├─ ...     ─┼─ cohort 1 ──▶ worker 1
//!              └─ ...     ─┘
//! ```

mod batch;
mod cohort;

pub use batch::{BatchScheduler, DEFAULT_BATCH_SIZE, DEFAULT_COHORT_SIZE};
pub use cohort::{Batch, Cohort, CohortStream};
