use crate::config::Config;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "schoold=info";

/// Installs the stderr subscriber. Stdout carries the IPC stream, so nothing
/// may log there. `RUST_LOG` wins over the configured filter.
pub fn init(config: &Config) -> anyhow::Result<()> {
    let fallback = config.log_filter.as_deref().unwrap_or(DEFAULT_FILTER);
    let filter = match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => EnvFilter::try_new(fallback)?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("tracing init failed: {e}"))
}
