//! Crop workers and their pending results.
//!
//! A worker is a stateful actor bound to one open slide at one pyramid
//! level. Workers are cheap to address but expensive to start (the slide
//! has to be opened), so the scheduler keeps each one for a whole cohort of
//! batches and then lets it go.
//!
//! # Components
//!
//! - [`CropWorker`]: Handle used to submit requests to an actor
//! - [`WorkerFactory`]: Spawns fresh workers for one slide and level
//! - [`Pending`]: Future-like handle to a not yet produced result
//! - [`CropTask`] / [`CropResult`]: Units of work and their output

mod actor;
mod pending;
mod task;

pub use actor::{CropWorker, WorkerFactory};
pub use pending::{resolve_all, Pending};
pub use task::{CropResult, CropTask, MosaicPosition};
