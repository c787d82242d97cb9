//! Logging setup for the binaries.
//!
//! The library only emits `tracing` events; whoever runs it installs a
//! subscriber. Output goes to stderr so command results on stdout stay
//! clean. `RUST_LOG` overrides the default filter.

use std::io;

use tracing_subscriber::EnvFilter;

use crate::config::DEFAULT_LOG_FILTER;

/// Install the global subscriber. `verbose` raises the default level to
/// debug when `RUST_LOG` is not set.
pub fn init_logging(verbose: bool) -> Result<(), String> {
    let default = if verbose { "debug" } else { DEFAULT_LOG_FILTER };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| e.to_string())
}
