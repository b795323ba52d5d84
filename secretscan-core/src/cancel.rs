//! Cooperative cancellation threaded through detection and validation.
//!
//! Neither the Detection Engine nor the Validation Engine own a thread of
//! their own to interrupt, so cancellation here is advisory: callers check
//! [`CancellationToken::is_cancelled`] at well-defined points (before a read,
//! between detectors in a chunk, before an HTTP call) and bail out promptly
//! rather than being pre-empted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// A clone-cheap, shareable cancellation flag.
///
/// Cloning a token shares the same underlying signal: cancelling any clone
/// cancels all of them. `cancelled()` lets async callers race an in-flight
/// operation (an HTTP request, say) against cancellation instead of polling.
#[derive(Clone, Debug)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        }
    }

    /// A token that reports as never cancelled. Useful for call sites that
    /// don't need cancellation but still go through the cancellable API.
    pub fn none() -> Self {
        Self::new()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once the token is cancelled. Resolves immediately if it
    /// already was.
    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        self.notify.notified().await;
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}
