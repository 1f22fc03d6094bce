//! The ordered rule table applied to object payloads.
//!
//! Each [`Rule`] pairs a predicate with an extraction function.  Rules are
//! evaluated in table order and the first accepting rule produces the reply;
//! an object that no rule accepts is handed back to the interpreter's
//! fallback.

use serde_json::{Map, Value};
use tracing::trace;

use crate::interpreter::{DONE_MESSAGE, NormalizedReply, ReplyRule};

/// Substrings that mark the start of a JSON blob appended to prose in an
/// `output` string.  The earliest occurrence of any of them wins.
pub const EMBEDDED_JSON_MARKERS: &[&str] = &["{\"entityType\"", "\"chosen\"", "{\"chosen\""];

const OUTPUT_LABEL: &str = "output";

type Object = Map<String, Value>;

/// One entry of the rule table.
pub(crate) struct Rule {
    pub rule: ReplyRule,
    pub applies: fn(&Object) -> bool,
    pub extract: fn(&Object) -> NormalizedReply,
}

/// Rules in priority order.
pub(crate) const RULES: &[Rule] = &[
    Rule {
        rule: ReplyRule::Message,
        applies: has_message,
        extract: extract_message,
    },
    Rule {
        rule: ReplyRule::Reply,
        applies: has_reply,
        extract: extract_reply,
    },
    Rule {
        rule: ReplyRule::Output,
        applies: has_output,
        extract: extract_output,
    },
];

/// Run the table against `object`, returning the first match.
pub(crate) fn apply(object: &Object) -> Option<NormalizedReply> {
    let rule = RULES.iter().find(|rule| (rule.applies)(object))?;
    trace!(rule = rule.rule.as_str(), "reply rule matched");
    Some((rule.extract)(object))
}

// ---------------------------------------------------------------------------
// message
// ---------------------------------------------------------------------------

fn has_message(object: &Object) -> bool {
    non_blank_str(object, "message").is_some()
}

fn extract_message(object: &Object) -> NormalizedReply {
    let message = non_blank_str(object, "message").unwrap_or(DONE_MESSAGE);
    let data = match object.get("data") {
        Some(Value::Object(data)) => data.clone(),
        None | Some(Value::Null) => Map::new(),
        Some(other) => {
            let mut wrapped = Map::new();
            wrapped.insert("data".to_owned(), other.clone());
            wrapped
        }
    };
    NormalizedReply::with_data(message, data, ReplyRule::Message)
}

// ---------------------------------------------------------------------------
// reply
// ---------------------------------------------------------------------------

fn has_reply(object: &Object) -> bool {
    match object.get("reply") {
        Some(Value::String(text)) => !text.trim().is_empty(),
        Some(Value::Object(_)) => true,
        _ => false,
    }
}

fn extract_reply(object: &Object) -> NormalizedReply {
    match object.get("reply") {
        Some(Value::String(text)) => NormalizedReply::text(text.trim(), ReplyRule::Reply),
        Some(Value::Object(reply)) => {
            // A reply wrapping nothing but `output` is unwrapped to its text.
            if reply.len() == 1
                && let Some(output) = reply.get("output").and_then(Value::as_str)
            {
                let output = output.trim();
                let message = if output.is_empty() { DONE_MESSAGE } else { output };
                return NormalizedReply::text(message, ReplyRule::Reply);
            }

            let message = non_blank_str(reply, "message")
                .or_else(|| non_blank_str(reply, "output"))
                .unwrap_or(DONE_MESSAGE);
            NormalizedReply::with_data(message, reply.clone(), ReplyRule::Reply)
        }
        _ => NormalizedReply::text(DONE_MESSAGE, ReplyRule::Reply),
    }
}

// ---------------------------------------------------------------------------
// output
// ---------------------------------------------------------------------------

fn has_output(object: &Object) -> bool {
    matches!(object.get("output"), Some(Value::String(_)))
}

fn extract_output(object: &Object) -> NormalizedReply {
    let output = object
        .get("output")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let (prose, tail) = split_embedded_json(strip_output_label(output));
    let prose = prose.trim();
    let message = if prose.is_empty() { DONE_MESSAGE } else { prose };
    let data = tail.and_then(leading_object).unwrap_or_default();

    NormalizedReply::with_data(message, data, ReplyRule::Output)
}

/// Remove a leading `output:` label (any case, optional spaces before the
/// colon).
pub fn strip_output_label(text: &str) -> &str {
    let text = text.trim_start();
    let Some(head) = text.get(..OUTPUT_LABEL.len()) else {
        return text;
    };
    if !head.eq_ignore_ascii_case(OUTPUT_LABEL) {
        return text;
    }
    match text[OUTPUT_LABEL.len()..].trim_start().strip_prefix(':') {
        Some(rest) => rest.trim_start(),
        None => text,
    }
}

/// Split `text` at the earliest [`EMBEDDED_JSON_MARKERS`] occurrence.
///
/// Returns the prose before the cut and, when a marker was found, the tail
/// starting at the marker.
pub fn split_embedded_json(text: &str) -> (&str, Option<&str>) {
    let cut = EMBEDDED_JSON_MARKERS
        .iter()
        .filter_map(|marker| text.find(marker))
        .min();
    match cut {
        Some(index) => (&text[..index], Some(&text[index..])),
        None => (text, None),
    }
}

/// Parse the first JSON value at the start of `tail`, keeping it only if it
/// is an object.  Trailing text after the value is ignored.
fn leading_object(tail: &str) -> Option<Object> {
    let mut values = serde_json::Deserializer::from_str(tail).into_iter::<Value>();
    match values.next() {
        Some(Ok(Value::Object(object))) => Some(object),
        _ => None,
    }
}

fn non_blank_str<'a>(object: &'a Object, key: &str) -> Option<&'a str> {
    object
        .get(key)
        .and_then(Value::as_str)
        .filter(|text| !text.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Object {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn rule_order_is_message_reply_output() {
        let names: Vec<_> = RULES.iter().map(|rule| rule.rule).collect();
        assert_eq!(
            names,
            vec![ReplyRule::Message, ReplyRule::Reply, ReplyRule::Output]
        );
    }

    #[test]
    fn message_beats_reply_and_output() {
        let reply = apply(&object(json!({
            "message": "from message",
            "reply": "from reply",
            "output": "from output"
        })))
        .unwrap();
        assert_eq!(reply.message, "from message");
    }

    #[test]
    fn message_keeps_data_object() {
        let reply = apply(&object(json!({
            "message": "saved",
            "data": {"fields": {"Owner": "Ada"}}
        })))
        .unwrap();
        assert_eq!(reply.data["fields"]["Owner"], "Ada");
    }

    #[test]
    fn message_wraps_non_object_data() {
        let reply = apply(&object(json!({"message": "list", "data": [1, 2]}))).unwrap();
        assert_eq!(reply.data["data"], json!([1, 2]));
    }

    #[test]
    fn blank_message_defers_to_reply() {
        let reply = apply(&object(json!({"message": "  ", "reply": "next"}))).unwrap();
        assert_eq!(reply.message, "next");
        assert_eq!(reply.rule, ReplyRule::Reply);
    }

    #[test]
    fn reply_string_is_trimmed() {
        let reply = apply(&object(json!({"reply": "  hello \n"}))).unwrap();
        assert_eq!(reply.message, "hello");
        assert!(reply.data.is_empty());
    }

    #[test]
    fn reply_single_output_unwraps() {
        let reply = apply(&object(json!({"reply": {"output": "x"}}))).unwrap();
        assert_eq!(reply.message, "x");
        assert!(reply.data.is_empty());
    }

    #[test]
    fn reply_object_keeps_data_and_prefers_message() {
        let reply = apply(&object(json!({
            "reply": {"message": "m", "output": "o", "fields": {"a": 1}}
        })))
        .unwrap();
        assert_eq!(reply.message, "m");
        assert_eq!(reply.data["fields"]["a"], 1);
    }

    #[test]
    fn reply_object_uses_output_when_no_message() {
        let reply = apply(&object(json!({"reply": {"output": "o", "extra": true}}))).unwrap();
        assert_eq!(reply.message, "o");
        assert_eq!(reply.data["extra"], true);
    }

    #[test]
    fn reply_object_without_text_uses_placeholder() {
        let reply = apply(&object(json!({"reply": {"status": "queued"}}))).unwrap();
        assert_eq!(reply.message, DONE_MESSAGE);
        assert_eq!(reply.data["status"], "queued");
    }

    #[test]
    fn empty_reply_string_falls_through_to_output() {
        let reply = apply(&object(json!({"reply": "", "output": "from output"}))).unwrap();
        assert_eq!(reply.message, "from output");
        assert_eq!(reply.rule, ReplyRule::Output);
    }

    #[test]
    fn blank_output_uses_placeholder() {
        let reply = apply(&object(json!({"output": "  "}))).unwrap();
        assert_eq!(reply.message, DONE_MESSAGE);
        assert_eq!(reply.rule, ReplyRule::Output);
    }

    #[test]
    fn numeric_reply_does_not_match() {
        assert!(apply(&object(json!({"reply": 5}))).is_none());
    }

    #[test]
    fn output_cuts_before_embedded_entity() {
        let reply = apply(&object(json!({
            "output": "Hello there {\"entityType\":\"Property\",\"attributes\":{\"city\":\"Oslo\"}}"
        })))
        .unwrap();
        assert_eq!(reply.message, "Hello there");
        assert_eq!(reply.data["entityType"], "Property");
        assert_eq!(reply.data["attributes"]["city"], "Oslo");
    }

    #[test]
    fn output_with_invalid_tail_keeps_prose_only() {
        let reply = apply(&object(json!({
            "output": "Hello there {\"entityType\":\"Property\",..."
        })))
        .unwrap();
        assert_eq!(reply.message, "Hello there");
        assert!(reply.data.is_empty());
    }

    #[test]
    fn output_label_is_stripped() {
        let reply = apply(&object(json!({"output": "Output : All set."}))).unwrap();
        assert_eq!(reply.message, "All set.");
    }

    #[test]
    fn output_that_is_only_json_uses_placeholder() {
        let reply = apply(&object(json!({
            "output": "{\"chosen\":{\"name\":\"Lot 4\",\"attributes\":{\"size\":\"2 acres\"}}}"
        })))
        .unwrap();
        assert_eq!(reply.message, DONE_MESSAGE);
        assert_eq!(reply.data["chosen"]["name"], "Lot 4");
    }

    #[test]
    fn split_uses_earliest_marker() {
        let text = "Pick one \"chosen\": 1 then {\"entityType\":\"X\"}";
        let (prose, tail) = split_embedded_json(text);
        assert_eq!(prose, "Pick one ");
        assert!(tail.unwrap().starts_with("\"chosen\""));
    }

    #[test]
    fn split_prefers_brace_before_chosen() {
        let (prose, tail) = split_embedded_json("ok {\"chosen\":{}}");
        assert_eq!(prose, "ok ");
        assert_eq!(tail, Some("{\"chosen\":{}}"));
    }

    #[test]
    fn split_without_marker_returns_whole_text() {
        assert_eq!(split_embedded_json("plain"), ("plain", None));
    }

    #[test]
    fn label_strip_leaves_other_text_alone() {
        assert_eq!(strip_output_label("outputs are ready"), "outputs are ready");
        assert_eq!(strip_output_label("  OUTPUT:done"), "done");
        assert_eq!(strip_output_label("ok"), "ok");
        assert_eq!(strip_output_label("Ølput: x"), "Ølput: x");
    }
}
