//! fibseq — bounded Fibonacci range generator.

use anyhow::Result;
use fibseq_lib::{app, config};

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    // Parse CLI args and run
    let config = config::AppConfig::parse();
    let code = app::run(&config)?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
