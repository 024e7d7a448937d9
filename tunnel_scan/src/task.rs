//! Background execution of pipeline operations.
//!
//! [`spawn`] runs an operation on a worker thread so an interactive front
//! end stays responsive. Progress arrives over a channel and the task can be
//! cancelled; the operation stops at its next checkpoint and returns
//! [`ScanError::Cancelled`].

use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};

use crate::error::{Result, ScanError};
use crate::progress::{CancelToken, Monitor, Progress};

/// Handle to an operation running on a worker thread.
#[derive(Debug)]
pub struct TaskHandle<T> {
    cancel: CancelToken,
    progress: Receiver<Progress>,
    handle: JoinHandle<Result<T>>,
}

impl<T> TaskHandle<T> {
    /// Requests cancellation.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Receiver of progress updates in the order they were reported.
    pub fn progress(&self) -> &Receiver<Progress> {
        &self.progress
    }

    /// Drains all progress updates received so far without blocking.
    pub fn drain_progress(&self) -> Vec<Progress> {
        self.progress.try_iter().collect()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the operation to finish.
    pub fn join(self) -> Result<T> {
        match self.handle.join() {
            Ok(result) => result,
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(ScanError::WorkerPanicked(message))
            }
        }
    }
}

/// Runs `op` on a new worker thread.
pub fn spawn<T, F>(name: &str, op: F) -> Result<TaskHandle<T>>
where
    T: Send + 'static,
    F: FnOnce(&Monitor) -> Result<T> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let cancel = CancelToken::new();
    let monitor = Monitor::new()
        .with_cancel(cancel.clone())
        .with_observer(move |p: &Progress| {
            // The receiver may already be gone; progress is best effort.
            let _ = tx.send(p.clone());
        });
    let handle = thread::Builder::new()
        .name(name.to_string())
        .spawn(move || op(&monitor))?;
    Ok(TaskHandle {
        cancel,
        progress: rx,
        handle,
    })
}
