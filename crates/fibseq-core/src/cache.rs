//! Concurrent term store with a single idle-expiry clock.
//!
//! `TermStore` is the capability the engine depends on; `TermCache` is the
//! in-process implementation. A networked or sharded store would implement
//! the same trait and drop in without touching the engine.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::types::SequenceValue;

/// Capability interface over the memoized term store.
///
/// A miss is a valid `None`, never an error. `put` overwrites silently
/// (last-writer-wins); values for a given index are deterministic, so
/// concurrent writers racing on one key are benign.
pub trait TermStore<V>: Send + Sync {
    /// Look up the term at `index`.
    fn get(&self, index: u64) -> Option<V>;

    /// Insert or overwrite the term at `index`.
    fn put(&self, index: u64, value: V);

    /// Whether the store currently holds no terms. Observational only; does
    /// not count as an access for expiry purposes.
    fn is_empty(&self) -> bool;
}

struct CacheState<V> {
    entries: HashMap<u64, V>,
    last_access: Instant,
    shutdown: bool,
}

struct Shared<V> {
    state: Mutex<CacheState<V>>,
    rearm: Condvar,
    idle_after: Duration,
}

/// In-memory `TermStore` that wipes itself after a configured quiet period.
///
/// Every `get`/`put` resets the idle clock. The clearing janitor runs on its
/// own thread and takes the same lock as accesses, so a wipe can only happen
/// after a true idle gap, never racing an in-flight read or write. Expiry is
/// a full wipe on one global clock, not a per-entry TTL.
pub struct TermCache<V> {
    shared: Arc<Shared<V>>,
    janitor: Option<JoinHandle<()>>,
}

impl<V: SequenceValue> TermCache<V> {
    /// Create a cache that clears itself after `idle_after` without accesses.
    #[must_use]
    pub fn new(idle_after: Duration) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                last_access: Instant::now(),
                shutdown: false,
            }),
            rearm: Condvar::new(),
            idle_after,
        });

        let janitor_shared = Arc::clone(&shared);
        let janitor = std::thread::Builder::new()
            .name("termcache-janitor".into())
            .spawn(move || janitor_loop(&janitor_shared))
            .ok();

        Self { shared, janitor }
    }

    fn touch(state: &mut CacheState<V>) {
        state.last_access = Instant::now();
    }
}

impl<V: SequenceValue> TermStore<V> for TermCache<V> {
    fn get(&self, index: u64) -> Option<V> {
        let mut state = self.shared.state.lock();
        Self::touch(&mut state);
        self.shared.rearm.notify_one();
        state.entries.get(&index).copied()
    }

    fn put(&self, index: u64, value: V) {
        let mut state = self.shared.state.lock();
        Self::touch(&mut state);
        self.shared.rearm.notify_one();
        state.entries.insert(index, value);
    }

    fn is_empty(&self) -> bool {
        self.shared.state.lock().entries.is_empty()
    }
}

impl<V> Drop for TermCache<V> {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state.lock();
            state.shutdown = true;
        }
        self.shared.rearm.notify_all();
        if let Some(handle) = self.janitor.take() {
            let _ = handle.join();
        }
    }
}

/// Store that remembers nothing, for callers that disable caching.
pub struct NullStore;

impl<V: SequenceValue> TermStore<V> for NullStore {
    fn get(&self, _index: u64) -> Option<V> {
        None
    }

    fn put(&self, _index: u64, _value: V) {}

    fn is_empty(&self) -> bool {
        true
    }
}

fn janitor_loop<V>(shared: &Shared<V>) {
    let mut state = shared.state.lock();
    loop {
        if state.shutdown {
            return;
        }
        let idle_for = state.last_access.elapsed();
        if idle_for >= shared.idle_after {
            if !state.entries.is_empty() {
                let dropped = state.entries.len();
                state.entries.clear();
                tracing::debug!(dropped, "term cache cleared after idle period");
            }
            // Nothing to watch until the next access rearms the clock.
            shared.rearm.wait(&mut state);
        } else {
            let _ = shared
                .rearm
                .wait_for(&mut state, shared.idle_after - idle_for);
        }
    }
}
