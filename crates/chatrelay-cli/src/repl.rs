//! Subcommand: `chatrelay chat` -- interactive REPL.
//!
//! Each line is one chat turn against the configured webhook.  Lines starting
//! with `/` are local commands and never leave the machine.

use std::io::{self, Write as _};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use chatrelay_client::{ChatSession, WebhookClient};

use crate::helpers::load_config;
use crate::render;

const HELP: &str = "\
  Commands:
    /history    Show this session's messages
    /result     Show the details panel of the last reply
    /debug      Show what the last turn sent and received
    /clear      Forget the messages of this session
    /help       Show this help
    quit, exit  Leave
";

/// Run the interactive REPL.
pub async fn cmd_chat(config_path: Option<&Path>, session: Option<String>) -> Result<()> {
    // 1. Resolve configuration.  A missing webhook URL stops here.
    let config = load_config(config_path, session)?;
    let client = WebhookClient::new(&config).context("cannot start chat")?;
    let mut session = ChatSession::from_config(&config);
    info!(
        session_id = session.session_id(),
        timeout_secs = config.timeout_secs,
        "chat session ready"
    );

    // 2. Print startup banner.
    println!();
    println!("  chatrelay v{}", env!("CARGO_PKG_VERSION"));
    println!("  Webhook: {}", client.url().host_str().unwrap_or("?"));
    println!("  Session: {}", session.session_id());
    println!("  Type a message, /help for commands, or 'quit' to exit.");
    println!();

    // 3. Set up Ctrl+C handler.
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n  Interrupted. Goodbye!");
            std::process::exit(0);
        }
    });

    // 4. REPL loop.
    let stdin = io::stdin();
    let mut line_buf = String::new();

    loop {
        print!("> ");
        io::stdout().flush().ok();

        line_buf.clear();
        match stdin.read_line(&mut line_buf) {
            Ok(0) => {
                println!();
                info!("EOF received, exiting");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("  Error reading input: {e}");
                continue;
            }
        }

        let trimmed = line_buf.trim();
        if trimmed.is_empty() {
            continue;
        }

        match trimmed {
            "quit" | "exit" => {
                info!("user requested exit");
                break;
            }
            "/help" => {
                print!("{HELP}");
                continue;
            }
            "/history" => {
                print!("{}", render::history(session.history()));
                continue;
            }
            "/result" => {
                match session.last_result() {
                    Some(result) => print!("{}", render::panel(result)),
                    None => println!("  (the last reply had no details)"),
                }
                continue;
            }
            "/debug" => {
                match session.last_debug() {
                    Some(snapshot) => println!("{}", render::debug(snapshot)),
                    None => println!("  (nothing sent yet)"),
                }
                continue;
            }
            "/clear" => {
                session.clear();
                println!("  Cleared.");
                continue;
            }
            command if command.starts_with('/') => {
                println!("  Unknown command `{command}`. Try /help.");
                continue;
            }
            _ => {}
        }

        eprint!("  thinking...");
        io::stderr().flush().ok();
        let outcome = session.send_turn(&client, trimmed).await;
        eprint!("\r              \r");

        match outcome {
            Ok(outcome) => {
                println!();
                print!("{}", render::reply(&outcome.reply, outcome.result.as_ref()));
                println!();
            }
            Err(e) => {
                eprintln!("  Error: {e}");
                eprintln!();
            }
        }
    }

    info!("shutting down");
    Ok(())
}
