//! CLI argument definitions for chatrelay.
//!
//! All `clap` structures live here so that `main.rs` stays focused on
//! dispatching subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// chatrelay -- terminal chat client for an automation webhook.
#[derive(Parser)]
#[command(
    name = "chatrelay",
    version,
    about = "chatrelay -- terminal chat client for an automation webhook",
    long_about = "Sends each message, with a session identifier, to one configured webhook \
                  and shows the reply as a short message plus an optional details panel."
)]
pub struct Cli {
    /// Path to a TOML config file (default: config/chatrelay.toml).
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level (RUST_LOG overrides).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat.
    Chat {
        /// Session identifier to send to the webhook.
        #[arg(long, short)]
        session: Option<String>,
    },

    /// Send a single message and print the reply.
    Send {
        /// The message text.
        message: String,

        /// Session identifier to send to the webhook.
        #[arg(long, short)]
        session: Option<String>,

        /// Print the normalized reply as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Normalize a captured webhook response without sending anything.
    Normalize {
        /// File holding the response body (reads stdin when omitted).
        file: Option<PathBuf>,

        /// Print the normalized reply as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the resolved configuration.
    Config,
}
