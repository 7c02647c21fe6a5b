//! Application configuration from CLI flags and environment.

use clap::Parser;

/// fibseq — bounded Fibonacci range generator with caching and abort limits.
#[derive(Parser, Debug)]
#[command(name = "fibseq", version, about)]
pub struct AppConfig {
    /// First index of the requested range (inclusive).
    #[arg(short, long)]
    pub begin: u64,

    /// Last index of the requested range (inclusive).
    #[arg(short, long)]
    pub end: u64,

    /// Consult and populate the shared term cache.
    #[arg(long)]
    pub use_cache: bool,

    /// Deadline for the calculation (e.g., "30s", "500ms").
    #[arg(long, default_value = "30s")]
    pub timeout: String,

    /// Process memory ceiling while caching (e.g., "512M", "8G").
    #[arg(long, default_value = "512M")]
    pub memory_limit: String,

    /// Simulated per-term work; overridable for testing.
    #[arg(long, default_value = "500ms", env = "FIBSEQ_STEP_DELAY")]
    pub step_delay: String,

    /// Quiet period after which the term cache clears itself.
    #[arg(long, default_value = "30s", env = "FIBSEQ_CACHE_IDLE")]
    pub cache_idle: String,

    /// Emit the result as JSON instead of one value per line.
    #[arg(long)]
    pub json: bool,

    /// Quiet mode (values only, no status line).
    #[arg(short, long)]
    pub quiet: bool,
}

impl AppConfig {
    /// Parse CLI arguments.
    #[must_use]
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse the timeout string into a Duration.
    #[must_use]
    pub fn timeout_duration(&self) -> std::time::Duration {
        parse_duration(&self.timeout).unwrap_or(std::time::Duration::from_secs(30))
    }

    /// Parse the step-delay string into a Duration.
    #[must_use]
    pub fn step_delay_duration(&self) -> std::time::Duration {
        parse_duration(&self.step_delay).unwrap_or(fibseq_core::DEFAULT_STEP_DELAY)
    }

    /// Parse the cache idle-expiry string into a Duration.
    #[must_use]
    pub fn cache_idle_duration(&self) -> std::time::Duration {
        parse_duration(&self.cache_idle).unwrap_or(std::time::Duration::from_secs(30))
    }
}

/// Parse a duration string like "5m", "1h", "30s", "500ms".
fn parse_duration(s: &str) -> Option<std::time::Duration> {
    let s = s.trim();
    if let Some(mins) = s.strip_suffix('m') {
        let n: u64 = mins.parse().ok()?;
        Some(std::time::Duration::from_secs(n * 60))
    } else if let Some(hours) = s.strip_suffix('h') {
        let n: u64 = hours.parse().ok()?;
        Some(std::time::Duration::from_secs(n * 3600))
    } else if let Some(ms) = s.strip_suffix("ms") {
        let n: u64 = ms.parse().ok()?;
        Some(std::time::Duration::from_millis(n))
    } else if let Some(secs) = s.strip_suffix('s') {
        let n: u64 = secs.parse().ok()?;
        Some(std::time::Duration::from_secs(n))
    } else {
        let n: u64 = s.parse().ok()?;
        Some(std::time::Duration::from_secs(n))
    }
}
