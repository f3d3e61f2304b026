//! Tracing setup for the persons CLI
//!
//! Logs go to stderr so command output on stdout stays clean.
//!
//! Usage:
//!   persons --debug list            # Debug logging to stderr
//!   RUST_LOG=person_store=debug persons list
//!
//! Environment variables:
//!   RUST_LOG                        # Log filter (default: warn)

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Initialize console tracing
///
/// `debug` raises the default level to `debug` unless `RUST_LOG` is set.
pub fn init(debug: bool) -> Result<()> {
    let default_level = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(debug)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}
