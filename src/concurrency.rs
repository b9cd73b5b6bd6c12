//! Last-started-wins guard for overlapping resolutions
//!
//! Every guarded task takes a generation token when it starts. Starting
//! another task, or calling [`ConcurrencyGuard::cancel_all`], moves the
//! generation on; a task whose token is no longer current when it settles is
//! dropped. Nothing is aborted: the stale task's future still runs to
//! completion, its result is just never handed out.

use crate::trace_log;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

/// Token identifying one guarded start
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

/// Generation counter shared by every resolution of a router
#[derive(Debug, Default)]
pub struct ConcurrencyGuard {
    current: AtomicU64,
}

impl ConcurrencyGuard {
    /// Create a guard at generation 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new generation, invalidating every token issued before
    pub fn begin(&self) -> Generation {
        Generation(self.current.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Check if `token` is still the latest
    pub fn is_current(&self, token: Generation) -> bool {
        self.current.load(Ordering::SeqCst) == token.0
    }

    /// Invalidate every outstanding token
    pub fn cancel_all(&self) {
        let previous = self.current.fetch_add(1, Ordering::SeqCst);
        trace_log!("Cancelled resolutions up to generation {}", previous);
    }

    /// Run `task` under a fresh token.
    ///
    /// Yields `Some(output)` if no other task started (and no cancel happened)
    /// before `task` settled, `None` otherwise.
    pub async fn guard<F>(&self, task: F) -> Option<F::Output>
    where
        F: Future,
    {
        let token = self.begin();
        let output = task.await;
        if self.is_current(token) {
            Some(output)
        } else {
            trace_log!("Dropping stale result of generation {}", token.0);
            None
        }
    }
}
