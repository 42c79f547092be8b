//! Global tracing subscriber setup from config.

use crate::config::LogConfig;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` wins over the configured level
/// when set. Call once at startup.
pub fn init(cfg: &LogConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.level.clone()));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let to_stderr = cfg.output == "stderr";
    if cfg.format == "json" {
        let builder = builder.json();
        if to_stderr {
            builder.with_writer(std::io::stderr).init();
        } else {
            builder.init();
        }
    } else if to_stderr {
        builder.with_writer(std::io::stderr).init();
    } else {
        builder.init();
    }
}
