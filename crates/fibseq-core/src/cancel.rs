//! Level-triggered cancellation with an absolute deadline.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cooperative cancellation token combining a revocable signal with a
/// wall-clock deadline.
///
/// The token is considered cancelled once `cancel()` was called or the
/// deadline has passed; both are observed by polling at checkpoints, so a
/// clone handed to another thread cancels the whole invocation.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use fibseq_core::cancel::DeadlineToken;
///
/// let token = DeadlineToken::new(Duration::from_secs(60));
/// assert!(!token.is_cancelled());
///
/// token.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Clone)]
pub struct DeadlineToken {
    cancelled: Arc<AtomicBool>,
    deadline: Instant,
}

impl DeadlineToken {
    /// Create a token whose deadline is `timeout` from now.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: Instant::now() + timeout,
        }
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Check whether cancellation was requested or the deadline passed.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed) || Instant::now() >= self.deadline
    }

    /// Time left before the deadline; zero once expired.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}
