//! Cooperative cancellation for a single capture-to-write run.
//!
//! The flag is set from outside the pipeline (a cancel button, Ctrl-C) and
//! polled between stages and around the provider call. It is never locked.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared "run cancelled" flag.
///
/// Clones observe the same underlying flag, so the handle returned by
/// [`crate::pipeline::Pipeline::cancellation`] can be moved to whatever
/// owns the cancel action.
///
/// # Example
///
/// ```rust
/// use dessert::cancel::CancellationFlag;
///
/// let flag = CancellationFlag::new();
/// let handle = flag.clone();
/// assert!(!flag.is_cancelled());
///
/// handle.cancel();
/// assert!(flag.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancellationFlag {
    /// Create a flag in the "not cancelled" state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Check whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
