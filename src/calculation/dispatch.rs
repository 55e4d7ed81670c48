//! Calculations on a worker thread.
use crate::error::{LcaError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

/// Handle of a dispatched calculation.
///
/// A running solve is not interrupted by `cancel`; its result is discarded
/// when it arrives.
#[derive(Debug)]
pub struct CalculationHandle<T> {
    receiver: Receiver<Result<T>>,
    cancelled: Arc<AtomicBool>,
}

/// Runs `job` on a new worker thread.
pub fn dispatch<T, F>(job: F) -> CalculationHandle<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let (sender, receiver) = mpsc::channel();
    let cancelled = Arc::new(AtomicBool::new(false));
    let worker_sender = sender.clone();
    let worker_cancelled = cancelled.clone();
    let spawned = thread::Builder::new().name("lca-calculation".into()).spawn(move || {
        if worker_cancelled.load(Ordering::Relaxed) {
            return;
        }
        let _ = worker_sender.send(job());
    });
    if let Err(e) = spawned {
        let _ = sender.send(Err(LcaError::from(e)));
    }
    CalculationHandle { receiver, cancelled }
}

impl<T> CalculationHandle<T> {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// The result if the calculation has finished.
    pub fn try_result(&self) -> Option<Result<T>> {
        if self.is_cancelled() {
            return Some(Err(LcaError::Cancelled));
        }
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(worker_lost())),
        }
    }

    /// Blocks until the calculation has finished.
    pub fn wait(self) -> Result<T> {
        if self.is_cancelled() {
            return Err(LcaError::Cancelled);
        }
        let result = self.receiver.recv().map_err(|_| worker_lost())?;
        if self.is_cancelled() {
            return Err(LcaError::Cancelled);
        }
        result
    }
}

fn worker_lost() -> LcaError {
    LcaError::Numeric("calculation worker stopped without a result".into())
}
