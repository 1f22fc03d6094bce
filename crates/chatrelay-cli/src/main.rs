//! CLI entry point for chatrelay.
//!
//! This binary provides the `chatrelay` command: an interactive chat against
//! the configured automation webhook, one-shot sends, offline normalization
//! of captured responses, and a configuration report.

mod cli;
mod commands;
mod helpers;
mod render;
mod repl;

use anyhow::Result;
use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::helpers::init_tracing;

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // A local .env may carry the webhook URL.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Chat { session } => repl::cmd_chat(config_path, session).await,
        Commands::Send {
            message,
            session,
            json,
        } => commands::cmd_send(config_path, &message, session, json).await,
        Commands::Normalize { file, json } => commands::cmd_normalize(file.as_deref(), json),
        Commands::Config => commands::cmd_config(config_path),
    }
}
