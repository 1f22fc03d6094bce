//! Terminal rendering of replies, the details panel, history and debug data.

use std::fmt::Write as _;

use chatrelay_client::{ChatEntry, DebugSnapshot, Role};
use chatrelay_reply::{NormalizedReply, StructuredResult};
use serde_json::json;

/// The reply line followed, when present, by the indented details panel.
pub fn reply(reply: &NormalizedReply, result: Option<&StructuredResult>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", reply.message);
    if let Some(result) = result {
        out.push('\n');
        out.push_str(&panel(result));
    }
    out
}

/// A details panel framed by rules.
pub fn panel(result: &StructuredResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  ── {} ──", result.title);
    for line in result.to_string().lines().skip(1) {
        let _ = writeln!(out, "  {line}");
    }
    out
}

/// The session log, one entry per line.
pub fn history(entries: &[ChatEntry]) -> String {
    if entries.is_empty() {
        return "  (no messages yet)\n".to_owned();
    }
    let mut out = String::new();
    for entry in entries {
        let who = match entry.role {
            Role::User => "you",
            Role::Assistant => "bot",
        };
        let _ = writeln!(out, "  [{}] {who}: {}", entry.at.format("%H:%M:%S"), entry.content);
    }
    out
}

/// The last turn's debug slot as pretty JSON.
pub fn debug(snapshot: &DebugSnapshot) -> String {
    serde_json::to_string_pretty(snapshot).unwrap_or_else(|e| format!("<unprintable: {e}>"))
}

/// JSON form used by `--json`.
pub fn reply_json(reply: &NormalizedReply, result: Option<&StructuredResult>) -> String {
    serde_json::to_string_pretty(&json!({
        "message": reply.message,
        "rule": reply.rule,
        "data": reply.data,
        "result": result,
    }))
    .unwrap_or_default()
}
