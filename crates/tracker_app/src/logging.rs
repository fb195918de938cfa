use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, DEFAULT_LOG_DIRECTIVE};

/// Installs the fmt subscriber. `RUST_LOG` wins over the configured
/// directive. Returns `false` when a global subscriber was already set.
pub fn init_tracing(config: &AppConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_directive))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVE));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}
