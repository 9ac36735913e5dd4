//! Cooperative cancellation for long paginated fetches.
//!
//! A [`CancellationToken`] is a cloneable flag shared between the caller
//! and the paging loop. The loop checks it once per page, so cancellation
//! takes effect between pages rather than mid-request.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A shared flag for abandoning an in-progress paginated query.
///
/// Clones share the same underlying flag; cancelling any clone cancels
/// them all.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token in the not-cancelled state.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Signal cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been signalled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}
