//! Reply normalization -- the entry point of the crate.
//!
//! [`normalize`] walks a [`RemotePayload`] in a fixed order:
//!
//! 1. Arrays are unwrapped to their first element (or `{}` when empty).
//! 2. Objects are offered to the rule table in [`crate::rules`]; the first
//!    rule whose predicate accepts the object produces the reply.
//! 3. Strings are parsed as JSON and re-interpreted; text that does not
//!    parse is shown verbatim.
//! 4. Everything else yields [`FALLBACK_MESSAGE`] with the original payload
//!    kept in `data` under [`RAW_KEY`].
//!
//! Normalization never fails.  Every shape mismatch falls through to the next
//! step and, at worst, to the fallback.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::payload::RemotePayload;
use crate::rules;
use crate::structured::StructuredResult;

/// Shown when no rule recognises the payload.
pub const FALLBACK_MESSAGE: &str = "Sorry, I couldn't format the assistant's response.";

/// Shown when a rule matched but carried no human-readable text.
pub const DONE_MESSAGE: &str = "Done.";

/// Key under which the fallback keeps the unrecognised payload.
pub const RAW_KEY: &str = "raw";

/// Maximum number of array unwraps and string re-parses before giving up.
pub const MAX_DEPTH: usize = 16;

/// Which step of the interpreter produced a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyRule {
    /// Top-level `message` string.
    Message,
    /// `reply` string or object.
    Reply,
    /// `output` string with an optional embedded JSON tail.
    Output,
    /// Plain text that was not JSON.
    Text,
    /// Nothing matched.
    Fallback,
}

impl ReplyRule {
    /// Stable lowercase name, used in log fields and debug output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::Reply => "reply",
            Self::Output => "output",
            Self::Text => "text",
            Self::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for ReplyRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The display-ready form of a webhook reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedReply {
    /// Human-readable status line.  Never absent.
    pub message: String,
    /// Residual mapping used for structured rendering.  Empty for simple
    /// replies.
    #[serde(default)]
    pub data: Map<String, Value>,
    /// The rule that produced this reply.
    pub rule: ReplyRule,
}

impl NormalizedReply {
    /// Build a reply with no residual data.
    pub fn text(message: impl Into<String>, rule: ReplyRule) -> Self {
        Self {
            message: message.into(),
            data: Map::new(),
            rule,
        }
    }

    /// Build a reply carrying residual data.
    pub fn with_data(message: impl Into<String>, data: Map<String, Value>, rule: ReplyRule) -> Self {
        Self {
            message: message.into(),
            data,
            rule,
        }
    }

    /// The fallback reply, keeping `raw` for inspection.
    pub fn fallback(raw: Value) -> Self {
        let mut data = Map::new();
        data.insert(RAW_KEY.to_owned(), raw);
        Self::with_data(FALLBACK_MESSAGE, data, ReplyRule::Fallback)
    }

    /// Whether no rule recognised the payload.
    pub fn is_fallback(&self) -> bool {
        self.rule == ReplyRule::Fallback
    }

    /// Derive the side-panel record from [`Self::data`], if any.
    pub fn structured(&self) -> Option<StructuredResult> {
        StructuredResult::from_data(&self.data)
    }
}

/// Normalize a webhook reply.
///
/// Accepts anything convertible into a [`RemotePayload`]: a
/// `serde_json::Value`, a JSON object map, or a string.
pub fn normalize(raw: impl Into<RemotePayload>) -> NormalizedReply {
    let raw = raw.into();
    let kind = raw.kind();
    let original = raw.clone().into_value();

    let mut reply = normalize_at(raw, 0);
    if reply.is_fallback() {
        reply.data.insert(RAW_KEY.to_owned(), original);
    }

    debug!(
        kind,
        rule = reply.rule.as_str(),
        data_keys = reply.data.len(),
        "normalized webhook reply"
    );
    reply
}

fn normalize_at(raw: RemotePayload, depth: usize) -> NormalizedReply {
    if depth > MAX_DEPTH {
        warn!(depth, "reply nesting exceeds limit, using fallback");
        return NormalizedReply::fallback(raw.into_value());
    }

    match raw {
        RemotePayload::Array(items) => {
            let first = items
                .into_iter()
                .next()
                .unwrap_or_else(|| Value::Object(Map::new()));
            normalize_at(first.into(), depth + 1)
        }
        RemotePayload::Object(map) => {
            rules::apply(&map).unwrap_or_else(|| NormalizedReply::fallback(Value::Object(map)))
        }
        RemotePayload::Text(text) => normalize_text(text, depth),
        RemotePayload::Scalar(value) => NormalizedReply::fallback(value),
    }
}

fn normalize_text(text: String, depth: usize) -> NormalizedReply {
    match serde_json::from_str::<Value>(text.trim()) {
        // A JSON scalar ends in the fallback one level down.
        Ok(parsed) => normalize_at(parsed.into(), depth + 1),
        Err(_) => NormalizedReply::text(text, ReplyRule::Text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_key_wins() {
        let reply = normalize(json!({"message": "hi"}));
        assert_eq!(reply.message, "hi");
        assert!(reply.data.is_empty());
        assert_eq!(reply.rule, ReplyRule::Message);
    }

    #[test]
    fn empty_array_falls_back() {
        let reply = normalize(json!([]));
        assert!(reply.is_fallback());
        assert_eq!(reply.message, FALLBACK_MESSAGE);
        assert_eq!(reply.data[RAW_KEY], json!([]));
    }

    #[test]
    fn array_with_empty_object_falls_back() {
        let reply = normalize(json!([{}]));
        assert!(reply.is_fallback());
        assert_eq!(reply.data[RAW_KEY], json!([{}]));
    }

    #[test]
    fn array_uses_first_element_only() {
        let reply = normalize(json!([{"message": "first"}, {"message": "second"}]));
        assert_eq!(reply.message, "first");
    }

    #[test]
    fn string_with_json_recurses() {
        let reply = normalize("{\"message\":\"nested\"}");
        assert_eq!(reply.message, "nested");
        assert_eq!(reply.rule, ReplyRule::Message);
    }

    #[test]
    fn plain_string_is_verbatim() {
        let reply = normalize("  just text  ");
        assert_eq!(reply.message, "  just text  ");
        assert_eq!(reply.rule, ReplyRule::Text);
    }

    #[test]
    fn string_holding_json_scalar_falls_back() {
        for text in ["42", "true", "null", " -3.5 "] {
            let reply = normalize(text);
            assert!(reply.is_fallback(), "{text:?} gave {:?}", reply.rule);
            assert_eq!(reply.data[RAW_KEY], json!(text));
        }
    }

    #[test]
    fn blank_string_is_shown_as_written() {
        let reply = normalize("   ");
        assert_eq!(reply.message, "   ");
        assert_eq!(reply.rule, ReplyRule::Text);
        assert_eq!(normalize("").rule, ReplyRule::Text);
    }

    #[test]
    fn scalars_fall_back() {
        assert!(normalize(json!(7)).is_fallback());
        assert!(normalize(Value::Null).is_fallback());
        assert!(normalize(json!(false)).is_fallback());
    }

    #[test]
    fn doubly_encoded_string_unwraps() {
        let once = serde_json::to_string(&json!({"reply": "deep"})).unwrap();
        let twice = serde_json::to_string(&once).unwrap();
        let reply = normalize(twice);
        assert_eq!(reply.message, "deep");
    }

    #[test]
    fn deep_array_nesting_hits_limit() {
        let mut value = json!({"message": "bottom"});
        for _ in 0..(MAX_DEPTH + 4) {
            value = json!([value]);
        }
        let reply = normalize(value);
        assert!(reply.is_fallback());
    }

    #[test]
    fn nesting_within_limit_is_unwrapped() {
        let mut value = json!({"message": "bottom"});
        for _ in 0..4 {
            value = json!([value]);
        }
        assert_eq!(normalize(value).message, "bottom");
    }

    #[test]
    fn unrecognised_object_keeps_raw() {
        let raw = json!({"status": "ok", "count": 3});
        let reply = normalize(raw.clone());
        assert!(reply.is_fallback());
        assert_eq!(reply.data[RAW_KEY], raw);
    }

    #[test]
    fn reply_serializes_rule_in_snake_case() {
        let reply = normalize(json!({"output": "hello"}));
        let value = serde_json::to_value(&reply).unwrap();
        assert_eq!(value["rule"], "output");
        assert_eq!(value["message"], "hello");
    }
}
