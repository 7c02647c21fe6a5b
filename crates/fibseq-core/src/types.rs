//! Request, result, and status types shared between the engine and its callers.

use std::time::Duration;

use num_traits::{One, WrappingAdd, Zero};
use serde::{Deserialize, Serialize};

/// Numeric type the engine can generate.
///
/// Fixed-width integers only: addition wraps silently on overflow, which is an
/// accepted limitation of the sequence, not an error.
pub trait SequenceValue: Copy + WrappingAdd + Zero + One + Send + Sync + 'static {}

impl<T> SequenceValue for T where T: Copy + WrappingAdd + Zero + One + Send + Sync + 'static {}

/// Default value type used at the boundary.
pub type FibValue = u64;

/// A validated request for a closed range `[begin, end]` of the sequence.
///
/// Validation (begin <= end, begin != end, non-negative limits) is the
/// caller's responsibility; the engine does not re-check it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceRequest {
    /// First index retained in the output.
    pub begin: u64,
    /// Last index generated, inclusive.
    pub end: u64,
    /// Consult and populate the shared term cache.
    pub use_cache: bool,
    /// Process memory ceiling in bytes; only enforced while caching.
    pub memory_limit_bytes: u64,
    /// Wall-clock budget for the whole calculation.
    pub timeout: Duration,
}

/// Why a calculation stopped.
///
/// Aborts are expected outcomes reported in-band, never errors: a
/// non-`Completed` status means "here is a usable prefix", not "discard
/// everything".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusCode {
    /// The full range was generated.
    Completed,
    /// The deadline elapsed or cancellation was requested.
    TimedOut,
    /// Process memory crossed the configured ceiling while caching.
    MemoryLimitExceeded,
}

impl StatusCode {
    /// Human-readable message for abort statuses, `None` on success.
    #[must_use]
    pub fn message(self) -> Option<&'static str> {
        match self {
            Self::Completed => None,
            Self::TimedOut => Some("Timeout"),
            Self::MemoryLimitExceeded => Some("Memory Limit Exceeded"),
        }
    }
}

/// Outcome of one `calculate` invocation: the terms produced before stopping,
/// in strictly increasing index order, plus the stop reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceResult<V> {
    /// Values for indices `[begin, idx)` where `idx` is the first index not
    /// reached; equals the full requested range when `Completed`.
    pub terms: Vec<V>,
    /// Why generation stopped.
    pub status: StatusCode,
}

impl<V> SequenceResult<V> {
    /// A successfully completed result.
    #[must_use]
    pub fn completed(terms: Vec<V>) -> Self {
        Self {
            terms,
            status: StatusCode::Completed,
        }
    }

    /// A partial result carrying everything produced before the abort.
    #[must_use]
    pub fn stopped(terms: Vec<V>, status: StatusCode) -> Self {
        debug_assert!(status != StatusCode::Completed);
        Self { terms, status }
    }

    /// Whether the full range was generated.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status == StatusCode::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_messages() {
        assert_eq!(StatusCode::Completed.message(), None);
        assert_eq!(StatusCode::TimedOut.message(), Some("Timeout"));
        assert_eq!(
            StatusCode::MemoryLimitExceeded.message(),
            Some("Memory Limit Exceeded")
        );
    }

    #[test]
    fn result_constructors() {
        let ok = SequenceResult::completed(vec![0u64, 1, 1, 2]);
        assert!(ok.is_complete());
        assert_eq!(ok.terms.len(), 4);

        let partial = SequenceResult::stopped(vec![0u64], StatusCode::TimedOut);
        assert!(!partial.is_complete());
        assert_eq!(partial.terms, [0]);
    }

    #[test]
    fn result_serializes() {
        let result = SequenceResult::completed(vec![0u64, 1, 1]);
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"Completed\""));
        assert!(json.contains("[0,1,1]"));
    }

    #[test]
    fn wrapping_is_silent() {
        let near_max = u64::MAX - 1;
        let wrapped = near_max.wrapping_add(3);
        assert_eq!(wrapped, 1);
    }
}
