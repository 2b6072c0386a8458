//! Crop worker actor.
//!
//! Each [`CropWorker`] is a tokio task that exclusively owns one open slide
//! handle. Requests arrive over a channel and are served strictly one at a
//! time, in submission order. Dropping the [`CropWorker`] closes the
//! channel; the actor then finishes whatever is queued and releases its
//! handle.
//!
//! ```text
//!   caller                    actor task
//!   ──────                    ──────────
//!   crop(task) ──request──▶   open slide (once, lazily)
//!      │                      read_region ─▶ strip_alpha ─▶ resize
//!      ▼                             │
//!   Pending ◀─────oneshot────────────┘
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::error::CropError;
use crate::grid::SlideDimensions;
use crate::slide::{SlideBackend, SlideHandle};
use crate::tile::{strip_alpha, Resampler};

use super::pending::Pending;
use super::task::{CropResult, CropTask};

type Reply<T> = oneshot::Sender<Result<T, CropError>>;

/// Requests understood by the actor.
enum WorkerRequest {
    Dimensions(Reply<SlideDimensions>),
    Crop(CropTask, Reply<CropResult>),
}

// =============================================================================
// CropWorker
// =============================================================================

/// Handle to a running crop worker.
///
/// The handle is the only sender to its actor. Dropping it closes the queue;
/// the actor then drains what was already submitted and shuts down.
#[derive(Debug)]
pub struct CropWorker {
    id: usize,
    tx: mpsc::UnboundedSender<WorkerRequest>,
}

impl std::fmt::Debug for WorkerRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerRequest::Dimensions(_) => write!(f, "Dimensions"),
            WorkerRequest::Crop(task, _) => write!(f, "Crop({:?})", task.coordinate),
        }
    }
}

impl CropWorker {
    /// Spawn a worker bound to `slide_path` at `level`.
    ///
    /// Returns immediately. The slide is opened by the actor itself; an open
    /// failure is not reported here but through every request the worker
    /// receives.
    pub fn spawn<B, R>(
        runtime: &Handle,
        id: usize,
        backend: Arc<B>,
        resampler: Arc<R>,
        slide_path: Arc<str>,
        level: usize,
    ) -> Self
    where
        B: SlideBackend,
        R: Resampler,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        debug!(worker = id, slide = %slide_path, level, "Spawning crop worker");
        runtime.spawn(run_worker(id, backend, resampler, slide_path, level, rx));
        Self { id, tx }
    }

    /// Identifier assigned at spawn time.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Request the slide dimensions at the bound level.
    pub fn dimensions(&self) -> Pending<SlideDimensions> {
        let (reply, pending) = Pending::channel();
        // A closed channel drops `reply`, which resolves as WorkerLost
        let _ = self.tx.send(WorkerRequest::Dimensions(reply));
        pending
    }

    /// Submit a crop request.
    pub fn crop(&self, task: CropTask) -> Pending<CropResult> {
        let (reply, pending) = Pending::channel();
        let _ = self.tx.send(WorkerRequest::Crop(task, reply));
        pending
    }
}

// =============================================================================
// WorkerFactory
// =============================================================================

/// Everything needed to spawn fresh workers for one slide.
pub struct WorkerFactory<B: SlideBackend, R: Resampler> {
    runtime: Handle,
    backend: Arc<B>,
    resampler: Arc<R>,
    slide_path: Arc<str>,
    level: usize,
    next_id: Arc<AtomicUsize>,
}

impl<B: SlideBackend, R: Resampler> Clone for WorkerFactory<B, R> {
    fn clone(&self) -> Self {
        Self {
            runtime: self.runtime.clone(),
            backend: Arc::clone(&self.backend),
            resampler: Arc::clone(&self.resampler),
            slide_path: Arc::clone(&self.slide_path),
            level: self.level,
            next_id: Arc::clone(&self.next_id),
        }
    }
}

impl<B: SlideBackend, R: Resampler> WorkerFactory<B, R> {
    /// Create a factory spawning workers on `runtime`.
    pub fn new(
        runtime: Handle,
        backend: Arc<B>,
        resampler: Arc<R>,
        slide_path: impl Into<Arc<str>>,
        level: usize,
    ) -> Self {
        Self {
            runtime,
            backend,
            resampler,
            slide_path: slide_path.into(),
            level,
            next_id: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Spawn a fresh worker with its own slide handle.
    pub fn spawn(&self) -> CropWorker {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        CropWorker::spawn(
            &self.runtime,
            id,
            Arc::clone(&self.backend),
            Arc::clone(&self.resampler),
            Arc::clone(&self.slide_path),
            self.level,
        )
    }

    /// Number of workers spawned so far.
    pub fn spawned(&self) -> usize {
        self.next_id.load(Ordering::Relaxed)
    }

    /// The slide every worker opens.
    pub fn slide_path(&self) -> &str {
        &self.slide_path
    }

    /// The pyramid level every worker binds to.
    pub fn level(&self) -> usize {
        self.level
    }
}

// =============================================================================
// Actor
// =============================================================================

/// A slide handle together with the geometry of the bound level.
struct BoundSlide<H> {
    handle: H,
    level: usize,
    dimensions: SlideDimensions,
    downsample: f64,
}

async fn open_bound<B: SlideBackend>(
    backend: &B,
    slide_path: &str,
    level: usize,
) -> Result<BoundSlide<B::Handle>, CropError> {
    let handle = backend.open(slide_path).await?;

    let levels = handle.level_count();
    let (dimensions, downsample) = handle
        .level_dimensions(level)
        .zip(handle.level_downsample(level))
        .ok_or(CropError::LevelOutOfRange { level, levels })?;

    Ok(BoundSlide {
        handle,
        level,
        dimensions: dimensions.into(),
        downsample,
    })
}

async fn run_worker<B: SlideBackend, R: Resampler>(
    id: usize,
    backend: Arc<B>,
    resampler: Arc<R>,
    slide_path: Arc<str>,
    level: usize,
    mut rx: mpsc::UnboundedReceiver<WorkerRequest>,
) {
    let bound = open_bound(backend.as_ref(), &slide_path, level).await;
    if let Err(ref e) = bound {
        warn!(worker = id, slide = %slide_path, "Worker failed to open slide: {}", e);
    }

    let mut served = 0usize;
    while let Some(request) = rx.recv().await {
        match request {
            WorkerRequest::Dimensions(reply) => {
                let result = bound.as_ref().map(|b| b.dimensions).map_err(Clone::clone);
                let _ = reply.send(result);
            }
            WorkerRequest::Crop(task, reply) => {
                let result = match &bound {
                    Ok(slide) => execute_crop(slide, &resampler, &task).await,
                    Err(e) => Err(e.clone()),
                };
                if let Err(ref e) = result {
                    if bound.is_ok() {
                        warn!(
                            worker = id,
                            x = task.coordinate.x,
                            y = task.coordinate.y,
                            "Crop failed: {}",
                            e
                        );
                    }
                }
                // The caller may have dropped its handle; that is not an error
                let _ = reply.send(result);
                served += 1;
            }
        }
    }

    debug!(worker = id, served, "Crop worker retired");
}

async fn execute_crop<H: SlideHandle, R: Resampler>(
    slide: &BoundSlide<H>,
    resampler: &Arc<R>,
    task: &CropTask,
) -> Result<CropResult, CropError> {
    let CropTask {
        coordinate,
        crop_size,
        tile_size,
        ..
    } = *task;

    // Backends address regions in the level-0 frame
    let origin = (
        (coordinate.x as f64 * slide.downsample).round() as u32,
        (coordinate.y as f64 * slide.downsample).round() as u32,
    );

    let region = slide
        .handle
        .read_region(origin, slide.level, (crop_size, crop_size))
        .await?;
    let rgb = strip_alpha(&region);

    let resampler = Arc::clone(resampler);
    let tile = tokio::task::spawn_blocking(move || resampler.resize(&rgb, (tile_size, tile_size)))
        .await
        .map_err(|e| CropError::Resample {
            message: e.to_string(),
        })??;

    Ok(CropResult {
        coordinate,
        tile,
        position: task.mosaic_position(),
    })
}

// =============================================================================
// Tests
// =============================================================================
