//! Progress reporting and cooperative cancellation for long-running
//! pipeline operations.
//!
//! Operations receive a [`Monitor`]; they report progress through it and
//! call [`Monitor::checkpoint`] at safe points, which fails with
//! [`ScanError::Cancelled`] once cancellation has been requested.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Result, ScanError};

/// Progress information passed to observers.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    /// Current step.
    pub current: u64,
    /// Total number of steps.
    pub total: u64,
    /// Human-readable message describing the current step.
    pub message: String,
}

impl Progress {
    pub fn new(current: u64, total: u64, message: impl Into<String>) -> Self {
        Self {
            current,
            total,
            message: message.into(),
        }
    }

    /// Progress as a fraction in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.current.min(self.total) as f64) / (self.total as f64)
        }
    }

    /// Progress as a whole percentage.
    pub fn percent(&self) -> u32 {
        (self.fraction() * 100.0).round() as u32
    }
}

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation; observed at the next checkpoint.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Observer invoked with every progress update.
pub type ProgressObserver = Arc<dyn Fn(&Progress) + Send + Sync>;

/// Progress sink and cancellation source handed to pipeline operations.
#[derive(Clone, Default)]
pub struct Monitor {
    cancel: CancelToken,
    observer: Option<ProgressObserver>,
}

impl fmt::Debug for Monitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monitor")
            .field("cancelled", &self.cancel.is_cancelled())
            .field("observed", &self.observer.is_some())
            .finish()
    }
}

impl Monitor {
    /// A monitor that never cancels and discards progress.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(&Progress) + Send + Sync + 'static,
    {
        self.observer = Some(Arc::new(observer));
        self
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Sends a progress update to the observer, if any.
    pub fn report(&self, current: u64, total: u64, message: impl Into<String>) {
        if let Some(observer) = &self.observer {
            observer(&Progress::new(current, total, message));
        }
    }

    /// Fails with [`ScanError::Cancelled`] once cancellation was requested.
    pub fn checkpoint(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(ScanError::Cancelled)
        } else {
            Ok(())
        }
    }
}
