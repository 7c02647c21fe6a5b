//! Application entry point: build the request, run the engine off-thread,
//! present the outcome.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use fibseq_core::{
    parse_memory_limit, DeadlineToken, FibValue, NullStore, SequenceEngine, SequenceRequest,
    SequenceResult, TermCache, TermStore,
};

use crate::config::AppConfig;
use crate::errors::{exit_codes, status_exit_code};
use crate::validate::validate_range;

/// Run the application; returns the process exit code.
pub fn run(config: &AppConfig) -> Result<i32> {
    if let Err(problems) = validate_range(config.begin, config.end) {
        for problem in &problems {
            eprintln!("{problem}");
        }
        return Ok(exit_codes::ERROR_VALIDATION);
    }

    let memory_limit_bytes =
        parse_memory_limit(&config.memory_limit).map_err(|e| anyhow::anyhow!(e))?;
    let request = SequenceRequest {
        begin: config.begin,
        end: config.end,
        use_cache: config.use_cache,
        memory_limit_bytes,
        timeout: config.timeout_duration(),
    };

    let store: Arc<dyn TermStore<FibValue>> = if config.use_cache {
        Arc::new(TermCache::new(config.cache_idle_duration()))
    } else {
        Arc::new(NullStore)
    };
    let engine = Arc::new(
        SequenceEngine::new(store).with_step_delay(config.step_delay_duration()),
    );

    let outer_budget = request.timeout.saturating_add(Duration::from_secs(1));
    let handle = engine.spawn(request);
    ctrlc_handler(handle.token());

    // The outer budget backstops the engine's own deadline; either way the
    // partial result is collected and presented.
    let result = handle.wait_timeout(outer_budget)?;
    present(config, &result)?;

    Ok(status_exit_code(result.status))
}

fn present(config: &AppConfig, result: &SequenceResult<FibValue>) -> Result<()> {
    if config.json {
        println!("{}", serde_json::to_string(result)?);
        return Ok(());
    }

    for term in &result.terms {
        println!("{term}");
    }
    if !config.quiet {
        if let Some(message) = result.status.message() {
            eprintln!("{message}");
        }
    }
    Ok(())
}

fn ctrlc_handler(token: DeadlineToken) {
    ctrlc::set_handler(move || {
        token.cancel();
    })
    .expect("Error setting Ctrl+C handler");
}
