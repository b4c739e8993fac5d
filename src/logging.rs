use anyhow::{Context, Result, anyhow};
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins over the command-line level when it is set.
fn build_filter(level: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(f) => Ok(f),
        Err(_) => EnvFilter::try_new(level).with_context(|| format!("log level {level:?}")),
    }
}

/// Logs go to stderr; stdout is reserved for the status line the scheduler
/// captures.
pub fn init(level: &str) -> Result<()> {
    let filter = build_filter(level)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("init logging: {e}"))
}
