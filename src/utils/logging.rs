//! Structured logging setup.
//!
//! Installs a `tracing_subscriber` formatter honouring `RUST_LOG` when set and
//! falling back to the configured level otherwise.

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Install the global subscriber described by `config`.
///
/// Returns `false` when a subscriber was already installed (by an earlier
/// call or by the host application); the existing one is left in place.
pub fn init_logging(config: &LoggingConfig) -> bool {
    if !config.log_to_console {
        return false;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(config)));

    let installed = if config.json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
            .is_ok()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init()
            .is_ok()
    };

    if installed {
        info!(app = %config.app_name, level = %config.log_level, "Logging initialized");
    }
    installed
}

fn default_directive(config: &LoggingConfig) -> String {
    config.log_level.to_string().to_lowercase()
}
