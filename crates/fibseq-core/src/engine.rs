//! Sequence generation loop with deadline and memory-ceiling abort checks.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};

use crate::cache::TermStore;
use crate::cancel::DeadlineToken;
use crate::memory::{MemoryProbe, SystemMemoryProbe};
use crate::types::{SequenceRequest, SequenceResult, SequenceValue, StatusCode};

/// Per-term simulated work, matching the original service. Overridable via
/// `with_step_delay` (tests use zero or a few milliseconds).
pub const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(500);

/// Granularity at which the simulated work observes cancellation, so a
/// near-expiry deadline aborts promptly instead of after a full step delay.
const DELAY_SLICE: Duration = Duration::from_millis(5);

/// Defect-level failure of the worker machinery. Abort conditions are never
/// errors; this only surfaces when a worker dies without reporting a result.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The worker thread terminated without sending a result.
    #[error("calculation worker terminated without reporting a result")]
    WorkerLost,
}

/// Drives the step-by-step generation loop, consulting the term store when
/// caching is enabled and enforcing the deadline and memory-ceiling aborts.
///
/// The engine is stateless between calls: rolling predecessors and the
/// accumulated output are local to one invocation. The store is the only
/// shared component.
pub struct SequenceEngine<V> {
    store: Arc<dyn TermStore<V>>,
    step_delay: Duration,
    memory: Arc<dyn MemoryProbe>,
}

impl<V: SequenceValue> SequenceEngine<V> {
    /// Create an engine over the given term store, with the default step
    /// delay and the system memory probe.
    #[must_use]
    pub fn new(store: Arc<dyn TermStore<V>>) -> Self {
        Self {
            store,
            step_delay: DEFAULT_STEP_DELAY,
            memory: Arc::new(SystemMemoryProbe::new()),
        }
    }

    /// Override the per-term simulated work delay.
    #[must_use]
    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    /// Override the memory probe (tests inject simulated pressure).
    #[must_use]
    pub fn with_memory_probe(mut self, probe: Arc<dyn MemoryProbe>) -> Self {
        self.memory = probe;
        self
    }

    /// Generate terms for `[request.begin, request.end]` in one forward pass.
    ///
    /// Generation always starts at index 0 because each term depends on its
    /// two predecessors; `begin` only filters which terms are retained in the
    /// output. Returns everything produced up to the stopping point: aborts
    /// are reported through the status, never by discarding terms.
    ///
    /// Abort checks run before any work for an index, timeout first. The
    /// memory ceiling is only enforced while caching is enabled, preserving
    /// the behavior of the original service.
    pub fn calculate(
        &self,
        request: &SequenceRequest,
        cancel: &DeadlineToken,
    ) -> SequenceResult<V> {
        let capacity =
            usize::try_from(request.end.saturating_sub(request.begin) + 1).unwrap_or(0);
        let mut terms = Vec::with_capacity(capacity);
        let mut prev2 = V::zero();
        let mut prev1 = V::one();

        for idx in 0..=request.end {
            if cancel.is_cancelled() {
                tracing::info!(idx, "calculation stopped: deadline elapsed");
                return SequenceResult::stopped(terms, StatusCode::TimedOut);
            }
            if request.use_cache
                && self.memory.current_usage_bytes() > request.memory_limit_bytes
            {
                tracing::info!(idx, "calculation stopped: memory ceiling exceeded");
                return SequenceResult::stopped(terms, StatusCode::MemoryLimitExceeded);
            }

            let cached = if request.use_cache {
                self.store.get(idx)
            } else {
                None
            };
            let value = if let Some(value) = cached {
                value
            } else {
                let value = match idx {
                    0 => V::zero(),
                    1 => V::one(),
                    _ => prev1.wrapping_add(&prev2),
                };
                if !self.simulate_work(cancel) {
                    // Interrupted mid-delay: do not finish the current term.
                    tracing::info!(idx, "calculation stopped: cancelled during step");
                    return SequenceResult::stopped(terms, StatusCode::TimedOut);
                }
                value
            };

            if request.use_cache {
                self.store.put(idx, value);
            }
            if idx >= request.begin {
                terms.push(value);
            }
            prev2 = std::mem::replace(&mut prev1, value);
        }

        SequenceResult::completed(terms)
    }

    /// Run `calculate` on a dedicated worker thread so the caller's control
    /// flow is never blocked for the full duration.
    ///
    /// The deadline starts counting when the worker is spawned. The returned
    /// handle can cancel the invocation and impose its own outer timeout
    /// independent of the request deadline.
    #[must_use]
    pub fn spawn(self: &Arc<Self>, request: SequenceRequest) -> SequenceHandle<V> {
        let cancel = DeadlineToken::new(request.timeout);
        let (tx, rx) = bounded(1);

        let engine = Arc::clone(self);
        let token = cancel.clone();
        // If the OS refuses the thread, tx is dropped and wait() reports
        // WorkerLost.
        let _ = std::thread::Builder::new()
            .name("fibseq-worker".into())
            .spawn(move || {
                let result = engine.calculate(&request, &token);
                let _ = tx.send(result);
            });

        SequenceHandle { rx, cancel }
    }

    /// Sleep for the configured step delay in short slices, checking for
    /// cancellation between slices. Returns `false` if interrupted.
    fn simulate_work(&self, cancel: &DeadlineToken) -> bool {
        let mut remaining = self.step_delay;
        while remaining > Duration::ZERO {
            if cancel.is_cancelled() {
                return false;
            }
            let slice = remaining.min(DELAY_SLICE);
            std::thread::sleep(slice);
            remaining = remaining.saturating_sub(slice);
        }
        !cancel.is_cancelled()
    }
}

/// Handle to an in-flight calculation running on a worker thread.
pub struct SequenceHandle<V> {
    rx: Receiver<SequenceResult<V>>,
    cancel: DeadlineToken,
}

impl<V> SequenceHandle<V> {
    /// Clone of the invocation's cancellation token, e.g. for a Ctrl+C
    /// handler.
    #[must_use]
    pub fn token(&self) -> DeadlineToken {
        self.cancel.clone()
    }

    /// Request cancellation; the worker still reports its partial result.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Block until the worker reports.
    pub fn wait(self) -> Result<SequenceResult<V>, EngineError> {
        self.rx.recv().map_err(|_| EngineError::WorkerLost)
    }

    /// Block up to `outer`; on expiry, cancel the worker and still collect
    /// whatever it produced. The outer timeout is honored independently of
    /// the request's own deadline.
    pub fn wait_timeout(self, outer: Duration) -> Result<SequenceResult<V>, EngineError> {
        match self.rx.recv_timeout(outer) {
            Ok(result) => Ok(result),
            Err(RecvTimeoutError::Timeout) => {
                self.cancel.cancel();
                self.rx.recv().map_err(|_| EngineError::WorkerLost)
            }
            Err(RecvTimeoutError::Disconnected) => Err(EngineError::WorkerLost),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{NullStore, TermCache};
    use crate::memory::FixedMemoryProbe;
    use std::time::Instant;

    const CANONICAL: [u64; 21] = [
        0, 1, 1, 2, 3, 5, 8, 13, 21, 34, 55, 89, 144, 233, 377, 610, 987, 1597, 2584, 4181, 6765,
    ];

    fn request(begin: u64, end: u64, use_cache: bool) -> SequenceRequest {
        SequenceRequest {
            begin,
            end,
            use_cache,
            memory_limit_bytes: u64::MAX,
            timeout: Duration::from_secs(60),
        }
    }

    fn instant_engine() -> SequenceEngine<u64> {
        SequenceEngine::new(Arc::new(NullStore) as Arc<dyn TermStore<u64>>)
            .with_step_delay(Duration::ZERO)
    }

    fn cached_engine(delay: Duration) -> (SequenceEngine<u64>, Arc<TermCache<u64>>) {
        let cache = Arc::new(TermCache::new(Duration::from_secs(60)));
        let engine = SequenceEngine::new(cache.clone() as Arc<dyn TermStore<u64>>)
            .with_step_delay(delay)
            .with_memory_probe(Arc::new(FixedMemoryProbe(0)));
        (engine, cache)
    }

    #[test]
    fn completes_full_range() {
        let engine = instant_engine();
        let req = request(0, 20, false);
        let result = engine.calculate(&req, &DeadlineToken::new(req.timeout));
        assert!(result.is_complete());
        assert_eq!(result.terms, CANONICAL);
    }

    #[test]
    fn begin_filters_output_only() {
        let engine = instant_engine();
        let req = request(10, 20, false);
        let result = engine.calculate(&req, &DeadlineToken::new(req.timeout));
        assert!(result.is_complete());
        assert_eq!(result.terms, CANONICAL[10..]);
    }

    #[test]
    fn single_term_range() {
        let engine = instant_engine();
        let req = request(7, 7, false);
        let result = engine.calculate(&req, &DeadlineToken::new(req.timeout));
        assert!(result.is_complete());
        assert_eq!(result.terms, [13]);
    }

    #[test]
    fn short_deadline_yields_strict_prefix() {
        let engine = SequenceEngine::new(Arc::new(NullStore) as Arc<dyn TermStore<u64>>)
            .with_step_delay(Duration::from_millis(20));
        let mut req = request(0, 20, false);
        req.timeout = Duration::from_millis(70);
        let result = engine.calculate(&req, &DeadlineToken::new(req.timeout));
        assert_eq!(result.status, StatusCode::TimedOut);
        assert!(result.terms.len() < CANONICAL.len());
        assert_eq!(result.terms, CANONICAL[..result.terms.len()]);
    }

    #[test]
    fn cancelled_before_start_returns_empty() {
        let engine = instant_engine();
        let req = request(0, 20, false);
        let cancel = DeadlineToken::new(req.timeout);
        cancel.cancel();
        let result = engine.calculate(&req, &cancel);
        assert_eq!(result.status, StatusCode::TimedOut);
        assert!(result.terms.is_empty());
    }

    #[test]
    fn memory_ceiling_aborts_first_check_when_caching() {
        let (engine, _cache) = cached_engine(Duration::ZERO);
        let engine = engine.with_memory_probe(Arc::new(FixedMemoryProbe(1 << 30)));
        let mut req = request(0, 20, true);
        req.memory_limit_bytes = 0;
        let result = engine.calculate(&req, &DeadlineToken::new(req.timeout));
        assert_eq!(result.status, StatusCode::MemoryLimitExceeded);
        assert!(result.terms.is_empty());
    }

    #[test]
    fn memory_ceiling_ignored_without_cache() {
        let engine = instant_engine().with_memory_probe(Arc::new(FixedMemoryProbe(1 << 30)));
        let mut req = request(0, 20, false);
        req.memory_limit_bytes = 0;
        let result = engine.calculate(&req, &DeadlineToken::new(req.timeout));
        assert!(result.is_complete());
        assert_eq!(result.terms, CANONICAL);
    }

    #[test]
    fn populates_cache_during_run() {
        let (engine, cache) = cached_engine(Duration::ZERO);
        let req = request(0, 10, true);
        let result = engine.calculate(&req, &DeadlineToken::new(req.timeout));
        assert!(result.is_complete());
        for (idx, expected) in CANONICAL[..11].iter().enumerate() {
            assert_eq!(cache.get(idx as u64), Some(*expected));
        }
    }

    #[test]
    fn seeded_cache_skips_step_delay() {
        let (engine, cache) = cached_engine(Duration::from_millis(50));
        for (idx, value) in CANONICAL.iter().enumerate() {
            cache.put(idx as u64, *value);
        }

        let req = request(0, 20, true);
        let start = Instant::now();
        let result = engine.calculate(&req, &DeadlineToken::new(req.timeout));
        let elapsed = start.elapsed();

        assert!(result.is_complete());
        assert_eq!(result.terms, CANONICAL);
        // Unseeded this would take 21 * 50ms; hits skip the delay entirely.
        assert!(elapsed < Duration::from_millis(500), "took {elapsed:?}");
    }

    #[test]
    fn identical_inputs_identical_outputs() {
        let engine = instant_engine();
        let req = request(3, 17, false);
        let first = engine.calculate(&req, &DeadlineToken::new(req.timeout));
        let second = engine.calculate(&req, &DeadlineToken::new(req.timeout));
        assert_eq!(first.terms, second.terms);
        assert_eq!(first.status, second.status);
    }

    #[test]
    fn spawn_runs_off_thread() {
        let engine = Arc::new(instant_engine());
        let handle = engine.spawn(request(0, 20, false));
        let result = handle.wait().unwrap();
        assert!(result.is_complete());
        assert_eq!(result.terms, CANONICAL);
    }

    #[test]
    fn outer_timeout_cancels_and_returns_partial() {
        let engine = Arc::new(
            SequenceEngine::new(Arc::new(NullStore) as Arc<dyn TermStore<u64>>)
                .with_step_delay(Duration::from_millis(20)),
        );
        // Request deadline is generous; only the caller's outer budget trips.
        let handle = engine.spawn(request(0, 100, false));
        let result = handle.wait_timeout(Duration::from_millis(70)).unwrap();
        assert_eq!(result.status, StatusCode::TimedOut);
        assert!(result.terms.len() < 101);
        assert_eq!(result.terms, CANONICAL[..result.terms.len().min(21)]);
    }

    #[test]
    fn handle_token_cancels_invocation() {
        let engine = Arc::new(
            SequenceEngine::new(Arc::new(NullStore) as Arc<dyn TermStore<u64>>)
                .with_step_delay(Duration::from_millis(20)),
        );
        let handle = engine.spawn(request(0, 1000, false));
        let token = handle.token();
        std::thread::sleep(Duration::from_millis(50));
        token.cancel();
        let result = handle.wait().unwrap();
        assert_eq!(result.status, StatusCode::TimedOut);
        assert!(result.terms.len() < 1001);
    }
}
