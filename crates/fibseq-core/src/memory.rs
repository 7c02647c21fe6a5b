//! Process memory measurement behind an injectable probe.

use parking_lot::Mutex;
use sysinfo::{Pid, ProcessesToUpdate, System};

/// Source of the "current process memory usage" reading the engine compares
/// against the configured ceiling. A trait seam so tests can simulate
/// pressure without actually allocating.
pub trait MemoryProbe: Send + Sync {
    /// Current resident memory of the process, in bytes.
    fn current_usage_bytes(&self) -> u64;
}

/// Probe backed by `sysinfo`, refreshing only the current process.
pub struct SystemMemoryProbe {
    system: Mutex<System>,
    pid: Option<Pid>,
}

impl SystemMemoryProbe {
    #[must_use]
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
            // Pid lookup only fails on unsupported platforms; report zero
            // usage there rather than tripping every limit.
            pid: sysinfo::get_current_pid().ok(),
        }
    }
}

impl Default for SystemMemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProbe for SystemMemoryProbe {
    fn current_usage_bytes(&self) -> u64 {
        let Some(pid) = self.pid else {
            return 0;
        };
        let mut system = self.system.lock();
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        system.process(pid).map_or(0, sysinfo::Process::memory)
    }
}

/// Probe reporting a fixed reading, for tests.
pub struct FixedMemoryProbe(pub u64);

impl MemoryProbe for FixedMemoryProbe {
    fn current_usage_bytes(&self) -> u64 {
        self.0
    }
}

/// Parse a memory limit string (e.g., "8G", "512M", "1024K") into bytes.
///
/// # Errors
///
/// Returns an error string if the format is invalid or the number cannot be
/// parsed.
pub fn parse_memory_limit(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(0);
    }

    let (num_str, multiplier) = if let Some(n) = s.strip_suffix('G') {
        (n, 1024 * 1024 * 1024)
    } else if let Some(n) = s.strip_suffix('M') {
        (n, 1024 * 1024)
    } else if let Some(n) = s.strip_suffix('K') {
        (n, 1024)
    } else if let Some(n) = s.strip_suffix('B') {
        (n, 1)
    } else {
        (s, 1)
    };

    let value: u64 = num_str
        .trim()
        .parse()
        .map_err(|e| format!("invalid memory limit: {e}"))?;
    Ok(value * multiplier)
}
