//! Shared helper functions used across CLI subcommands.

use std::path::Path;

use anyhow::{Context, Result};
use chatrelay_client::ClientConfig;
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

/// Initialize the tracing subscriber.  Logs go to stderr so chat output on
/// stdout stays clean.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Load configuration (file, then environment), then apply a `--session`
/// override from the command line.
pub fn load_config(path: Option<&Path>, session: Option<String>) -> Result<ClientConfig> {
    let mut config = ClientConfig::load(path).context("failed to load configuration")?;
    if let Some(session) = session.filter(|s| !s.trim().is_empty()) {
        config.session_id = Some(session.trim().to_owned());
    }
    Ok(config)
}
