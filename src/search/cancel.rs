//! Cooperative cancellation for a single search.

use std::sync::Arc;
use tokio::sync::watch;

/// Engine side. Dropping it without calling [`CancelHandle::cancel`] also
/// reads as cancelled on the token side.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

/// Provider side. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
    // Only set for tokens without a handle.
    _detached: Option<Arc<watch::Sender<bool>>>,
}

/// Create a linked handle/token pair.
pub fn pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (
        CancelHandle { tx },
        CancelToken {
            rx,
            _detached: None,
        },
    )
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl CancelToken {
    /// A token that is never cancelled. Handy for driving a provider outside
    /// the engine.
    pub fn never() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            rx,
            _detached: Some(Arc::new(tx)),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Resolves once cancellation has been requested.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        // Err means the handle is gone, which counts as cancelled.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}
