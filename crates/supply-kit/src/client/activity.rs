//! In-flight request tracking and cancellation.
//!
//! [`ActivityTracker`] refuses to start a logical operation twice and reports
//! whether anything is running. The [`OperationGuard`] it hands out releases
//! the slot when dropped, so a failed or cancelled request never leaves the
//! tracker stuck. Each running operation carries its own [`CancelToken`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use crate::error::Error;

/// Operations currently in flight, with their cancel tokens.
#[derive(Clone, Debug, Default)]
pub struct ActivityTracker {
    running: Arc<Mutex<HashMap<&'static str, CancelToken>>>,
}

impl ActivityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `operation` as running.
    ///
    /// Fails with [`Error::Busy`] if the same operation is already running.
    pub fn begin(&self, operation: &'static str) -> Result<OperationGuard, Error> {
        let mut running = self
            .running
            .lock()
            .map_err(|_| Error::Busy(operation))?;
        if running.contains_key(operation) {
            return Err(Error::Busy(operation));
        }
        let cancel = CancelToken::new();
        running.insert(operation, cancel.clone());
        tracing::debug!(operation, in_flight = running.len(), "operation started");
        Ok(OperationGuard {
            tracker: self.clone(),
            operation,
            cancel,
        })
    }

    /// Cancel every operation in flight. Returns how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        let Ok(running) = self.running.lock() else {
            return 0;
        };
        for (operation, cancel) in running.iter() {
            tracing::debug!(operation, "cancelling operation");
            cancel.cancel();
        }
        running.len()
    }

    /// Whether any operation is running.
    pub fn is_busy(&self) -> bool {
        self.in_flight() > 0
    }

    /// Number of operations running.
    pub fn in_flight(&self) -> usize {
        self.running.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_running(&self, operation: &str) -> bool {
        self.running
            .lock()
            .map(|r| r.contains_key(operation))
            .unwrap_or(false)
    }

    fn end(&self, operation: &'static str) {
        if let Ok(mut running) = self.running.lock() {
            running.remove(operation);
            tracing::debug!(operation, in_flight = running.len(), "operation finished");
        }
    }
}

/// Keeps an operation marked as running until dropped.
#[derive(Debug)]
#[must_use = "the operation is released as soon as the guard is dropped"]
pub struct OperationGuard {
    tracker: ActivityTracker,
    operation: &'static str,
    cancel: CancelToken,
}

impl OperationGuard {
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Token fired by [`ActivityTracker::cancel_all`] while this guard lives.
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }
}

impl Drop for OperationGuard {
    fn drop(&mut self) {
        self.tracker.end(self.operation);
    }
}

// ============================================================================
// CancelToken
// ============================================================================

/// Cancels a transaction wait.
///
/// Cancelling stops the client from waiting; a transaction that was already
/// submitted may still be applied by the network.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

#[derive(Debug, Default)]
struct CancelInner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once [`cancel`](Self::cancel) has been called.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}
