//! Pending results of submitted worker requests.
//!
//! Submitting a request never blocks: the caller immediately gets a
//! [`Pending`] handle and decides when (and whether) to resolve it, either by
//! awaiting it or with [`Pending::blocking_resolve`] from synchronous code.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::error::CropError;

/// Handle to a result a worker will produce.
///
/// Resolves to [`CropError::WorkerLost`] if the worker drops the request
/// without answering.
#[derive(Debug)]
#[must_use = "a pending result does nothing unless resolved"]
pub struct Pending<T> {
    rx: oneshot::Receiver<Result<T, CropError>>,
}

impl<T> Pending<T> {
    /// Create a handle together with the sender the worker answers on.
    pub(crate) fn channel() -> (oneshot::Sender<Result<T, CropError>>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx })
    }

    /// Block the current thread until the result is available.
    ///
    /// # Panics
    ///
    /// Panics if called from within an asynchronous execution context, like
    /// tokio's own blocking receive.
    pub fn blocking_resolve(self) -> Result<T, CropError> {
        self.rx.blocking_recv().unwrap_or(Err(CropError::WorkerLost))
    }

    /// Return the result if it is already available.
    ///
    /// Returns `None` while the worker is still busy. A lost worker counts as
    /// available and yields [`CropError::WorkerLost`].
    pub fn try_resolve(&mut self) -> Option<Result<T, CropError>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(CropError::WorkerLost)),
        }
    }
}

impl<T> Future for Pending<T> {
    type Output = Result<T, CropError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(CropError::WorkerLost)),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Resolve every handle, preserving order.
///
/// Failures stay per-entry; one failed handle never hides the others.
pub async fn resolve_all<T>(handles: Vec<Pending<T>>) -> Vec<Result<T, CropError>> {
    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await);
    }
    results
}
