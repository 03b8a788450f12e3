//! Cooperative cancellation shared between a running solve and its caller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Stop flag polled by the solvers at step boundaries (each candidate
/// profile, each phase, each per-player update).
///
/// Clones share the same flag, so a clone can be handed to another thread
/// (or a signal handler) while the solve holds the original.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that every solve observing this token stops at its next
    /// step boundary.
    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        !self.is_cancelled()
    }
}
