//! One-shot subcommands: `send`, `normalize` and `config`.

use std::io::Read as _;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use chatrelay_client::{ChatSession, ClientConfig, WebhookClient, decode_body};
use chatrelay_reply::normalize;

use crate::helpers::load_config;
use crate::render;

/// `chatrelay send`: one turn against the webhook.
pub async fn cmd_send(
    config_path: Option<&Path>,
    message: &str,
    session: Option<String>,
    json: bool,
) -> Result<()> {
    let config = load_config(config_path, session)?;
    let client = WebhookClient::new(&config).context("cannot send message")?;
    let mut session = ChatSession::from_config(&config);

    let outcome = session
        .send_turn(&client, message)
        .await
        .context("chat turn failed")?;

    if json {
        println!("{}", render::reply_json(&outcome.reply, outcome.result.as_ref()));
    } else {
        print!("{}", render::reply(&outcome.reply, outcome.result.as_ref()));
    }
    Ok(())
}

/// `chatrelay normalize`: interpret a captured response body offline.
pub fn cmd_normalize(file: Option<&Path>, json: bool) -> Result<()> {
    let body = match file {
        Some(path) => std::fs::read(path)
            .with_context(|| format!("failed to read `{}`", path.display()))?,
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };
    debug!(bytes = body.len(), "normalizing captured body");

    print!("{}", normalize_body(&body, json));
    Ok(())
}

/// Decode and normalize a body exactly as a live turn would.
pub fn normalize_body(body: &[u8], json: bool) -> String {
    let reply = normalize(decode_body(body));
    let result = reply.structured();
    if json {
        format!("{}\n", render::reply_json(&reply, result.as_ref()))
    } else {
        render::reply(&reply, result.as_ref())
    }
}

/// `chatrelay config`: show what the other subcommands would use.
pub fn cmd_config(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path, None)?;
    print!("{}", describe_config(&config));
    Ok(())
}

/// Human-readable summary.  Only the webhook host is shown; the path of an
/// automation webhook usually embeds its secret.
pub fn describe_config(config: &ClientConfig) -> String {
    let webhook = match config.webhook_url() {
        Ok(url) => format!("{}://{} (set)", url.scheme(), url.host_str().unwrap_or("?")),
        Err(e) => format!("not usable: {e}"),
    };
    let session = config
        .session_id
        .as_deref()
        .unwrap_or("(generated per run)");

    format!(
        "  Webhook:  {webhook}\n  Timeout:  {}s\n  User:     {}\n  Session:  {session}\n",
        config.timeout_secs, config.user_id
    )
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    #[test]
    fn normalize_body_handles_json() {
        let text = normalize_body(br#"[{"reply":{"output":"All done"}}]"#, false);
        assert_eq!(text, "All done\n");
    }

    #[test]
    fn normalize_body_handles_plain_text() {
        assert_eq!(normalize_body(b"just words", false), "just words\n");
    }

    #[test]
    fn normalize_body_json_mode() {
        let text = normalize_body(br#"{"message":"hi"}"#, true);
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["message"], "hi");
        assert!(value["result"].is_null());
    }

    #[test]
    fn normalize_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"output":"from file"}"#).unwrap();
        cmd_normalize(Some(file.path()), false).unwrap();
    }

    #[test]
    fn normalize_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(cmd_normalize(Some(dir.path().join("nope.json").as_path()), false).is_err());
    }

    #[test]
    fn describe_config_hides_webhook_path() {
        let config = ClientConfig {
            webhook_url: Some("https://hooks.example.com/webhook/secret-token".into()),
            ..ClientConfig::default()
        };
        let text = describe_config(&config);
        assert!(text.contains("https://hooks.example.com (set)"));
        assert!(!text.contains("secret-token"));
        assert!(text.contains("(generated per run)"));
    }

    #[test]
    fn describe_config_reports_missing_url() {
        let text = describe_config(&ClientConfig::default());
        assert!(text.contains("not usable"));
        assert!(text.contains("120s"));
    }
}
