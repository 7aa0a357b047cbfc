//! Cancellation signal threaded through every suspension point of a generation.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

use super::client::VeoError;

/// Cloneable cancellation flag.
///
/// `cancel()` may be called from any thread, including a signal handler
/// thread; waiters on the async side are woken immediately.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    flag: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Resolves once `cancel()` has been called.
    pub async fn cancelled(&self) {
        let notified = self.notify.notified();
        tokio::pin!(notified);
        // Register before checking the flag so a concurrent cancel is not lost.
        notified.as_mut().enable();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }

    /// Run `fut` unless cancellation wins first.
    pub async fn guard<T, F>(&self, fut: F) -> Result<T, VeoError>
    where
        F: Future<Output = Result<T, VeoError>>,
    {
        if self.is_cancelled() {
            return Err(VeoError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(VeoError::Cancelled),
            result = fut => result,
        }
    }
}
