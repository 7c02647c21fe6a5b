//! # fibseq-core
//!
//! Bounded Fibonacci range generation with partial-result semantics: a
//! calculation that hits its deadline or the process memory ceiling still
//! returns everything produced so far, tagged with the stop reason. Terms can
//! be memoized in a concurrent cache that wipes itself after an idle period.

pub mod cache;
pub mod cancel;
pub mod engine;
pub mod memory;
pub mod types;

// Re-exports
pub use cache::{NullStore, TermCache, TermStore};
pub use cancel::DeadlineToken;
pub use engine::{EngineError, SequenceEngine, SequenceHandle, DEFAULT_STEP_DELAY};
pub use memory::{parse_memory_limit, FixedMemoryProbe, MemoryProbe, SystemMemoryProbe};
pub use types::{FibValue, SequenceRequest, SequenceResult, SequenceValue, StatusCode};

use std::sync::Arc;
use std::time::Duration;

/// Compute the terms for `[begin, end]` without caching or simulated work.
///
/// Convenience for simple use cases; for deadlines, memory ceilings, caching,
/// or off-thread execution, use [`SequenceEngine`] directly.
///
/// # Example
/// ```
/// assert_eq!(fibseq_core::fibonacci_range(0, 6), [0, 1, 1, 2, 3, 5, 8]);
/// assert_eq!(fibseq_core::fibonacci_range(10, 12), [55, 89, 144]);
/// ```
#[must_use]
pub fn fibonacci_range(begin: u64, end: u64) -> Vec<FibValue> {
    let engine = SequenceEngine::new(Arc::new(NullStore) as Arc<dyn TermStore<FibValue>>)
        .with_step_delay(Duration::ZERO);
    let request = SequenceRequest {
        begin,
        end,
        use_cache: false,
        memory_limit_bytes: u64::MAX,
        timeout: Duration::from_secs(60),
    };
    let cancel = DeadlineToken::new(request.timeout);
    engine.calculate(&request, &cancel).terms
}
