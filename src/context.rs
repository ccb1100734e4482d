//! Cancellation token threaded into loader invocations.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation token handed to loaders.
///
/// The cache never cancels a load on its own and always waits for the
/// loader to return; a loader that observes [`Context::is_cancelled`] and
/// returns an error delivers that error to every waiter of the call.
/// Clones share the same cancellation state.
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancelled: Arc<AtomicBool>,
}

impl Context {
    /// A context that is never cancelled; used by the non-`_with_context`
    /// entry points.
    pub fn background() -> Self {
        Self::default()
    }

    /// Flags the context as cancelled.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
