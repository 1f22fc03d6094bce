//! Side-panel extraction from a normalized reply's residual data.
//!
//! Only recognisable shapes are parsed structurally:
//!
//! - an explicit `fields` object,
//! - `chosen.attributes` (an entity picked by the backend),
//! - a top-level `entityType` and/or `attributes`.
//!
//! Any other object gets a compact view: at most [`MAX_COMPACT_FIELDS`]
//! values, each no longer than [`MAX_VALUE_CHARS`] characters.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::interpreter::RAW_KEY;

/// Cap on fields copied from an unrecognised object.
pub const MAX_COMPACT_FIELDS: usize = 10;

/// Values whose rendering exceeds this many characters are omitted.
pub const MAX_VALUE_CHARS: usize = 300;

const LINK_KEYS: &[&str] = &["link", "url", "href"];
const TITLE_KEYS: &[&str] = &["title", "name"];
/// Keys already shown as the status line.
const MESSAGE_KEYS: &[&str] = &["message", "output"];

type Object = Map<String, Value>;

/// How a [`StructuredResult`] was recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    /// The data carried an explicit `fields` object.
    ExplicitFields,
    /// An entity shape (`chosen.attributes`, `entityType`, `attributes`).
    Entity,
    /// Bounded view of an otherwise unrecognised object.
    Compact,
}

/// Title, key/value fields and an optional link for the side panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredResult {
    pub title: String,
    pub fields: BTreeMap<String, String>,
    pub link: Option<String>,
    pub source: ResultSource,
}

impl StructuredResult {
    /// Extract a side-panel record from reply data.
    ///
    /// Returns `None` for empty data (simple replies), for a fallback that
    /// wrapped a non-object, and whenever no field survives the size limits.
    pub fn from_data(data: &Object) -> Option<Self> {
        if data.is_empty() {
            return None;
        }
        let target = inspection_target(data)?;

        explicit_fields(target)
            .or_else(|| chosen_entity(target))
            .or_else(|| entity(target))
            .or_else(|| compact(target))
    }
}

impl fmt::Display for StructuredResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        let width = self.fields.keys().map(|k| k.chars().count()).max().unwrap_or(0);
        for (key, value) in &self.fields {
            writeln!(f, "  {key:<width$}  {value}")?;
        }
        if let Some(link) = &self.link {
            writeln!(f, "  -> {link}")?;
        }
        Ok(())
    }
}

/// Look through the fallback's `{"raw": ...}` wrapper.
fn inspection_target(data: &Object) -> Option<&Object> {
    if data.len() == 1
        && let Some(raw) = data.get(RAW_KEY)
    {
        return match raw {
            Value::Object(object) => Some(object),
            Value::Array(items) => items.first().and_then(Value::as_object),
            _ => None,
        };
    }
    Some(data)
}

fn explicit_fields(data: &Object) -> Option<StructuredResult> {
    let fields_object = data.get("fields")?.as_object()?;
    let fields = render_fields(fields_object, &[], false, usize::MAX);
    if fields.is_empty() {
        return None;
    }
    Some(StructuredResult {
        title: first_str(data, TITLE_KEYS).unwrap_or("Result").to_owned(),
        fields,
        link: first_str(data, LINK_KEYS)
            .or_else(|| first_str(fields_object, LINK_KEYS))
            .map(str::to_owned),
        source: ResultSource::ExplicitFields,
    })
}

fn chosen_entity(data: &Object) -> Option<StructuredResult> {
    let chosen = data.get("chosen")?.as_object()?;
    let attributes = chosen.get("attributes")?.as_object()?;
    let fields = render_fields(attributes, LINK_KEYS, false, usize::MAX);
    if fields.is_empty() {
        return None;
    }
    Some(StructuredResult {
        title: first_str(chosen, &["name", "title", "entityType"])
            .unwrap_or("Result")
            .to_owned(),
        fields,
        link: first_str(attributes, LINK_KEYS)
            .or_else(|| first_str(chosen, LINK_KEYS))
            .map(str::to_owned),
        source: ResultSource::Entity,
    })
}

fn entity(data: &Object) -> Option<StructuredResult> {
    let entity_type = data.get("entityType").and_then(Value::as_str);
    let attributes = data.get("attributes").and_then(Value::as_object);

    let (fields, link) = match (attributes, entity_type) {
        (Some(attributes), _) => (
            render_fields(attributes, LINK_KEYS, false, usize::MAX),
            first_str(attributes, LINK_KEYS).or_else(|| first_str(data, LINK_KEYS)),
        ),
        (None, Some(_)) => {
            let mut skip = vec!["entityType"];
            skip.extend_from_slice(TITLE_KEYS);
            skip.extend_from_slice(LINK_KEYS);
            (
                render_fields(data, &skip, false, usize::MAX),
                first_str(data, LINK_KEYS),
            )
        }
        (None, None) => return None,
    };
    if fields.is_empty() {
        return None;
    }

    let title = first_str(data, TITLE_KEYS)
        .or(entity_type)
        .or_else(|| attributes.and_then(|a| first_str(a, TITLE_KEYS)))
        .unwrap_or("Details");

    Some(StructuredResult {
        title: title.to_owned(),
        fields,
        link: link.map(str::to_owned),
        source: ResultSource::Entity,
    })
}

fn compact(data: &Object) -> Option<StructuredResult> {
    let mut skip = LINK_KEYS.to_vec();
    skip.extend_from_slice(MESSAGE_KEYS);
    let fields = render_fields(data, &skip, true, MAX_COMPACT_FIELDS);
    if fields.is_empty() {
        return None;
    }
    Some(StructuredResult {
        title: first_str(data, TITLE_KEYS).unwrap_or("Details").to_owned(),
        fields,
        link: first_str(data, LINK_KEYS).map(str::to_owned),
        source: ResultSource::Compact,
    })
}

fn render_fields(
    object: &Object,
    skip: &[&str],
    bound_strings: bool,
    limit: usize,
) -> BTreeMap<String, String> {
    object
        .iter()
        .filter(|(key, _)| !skip.contains(&key.as_str()))
        .filter_map(|(key, value)| Some((key.clone(), render_value(value, bound_strings)?)))
        .take(limit)
        .collect()
}

/// Render one value as panel text.  Nested values become compact JSON and are
/// dropped past [`MAX_VALUE_CHARS`]; strings are bounded only when asked.
fn render_value(value: &Value, bound_strings: bool) -> Option<String> {
    let rendered = match value {
        Value::Null => return None,
        Value::String(text) => {
            if bound_strings && text.chars().count() > MAX_VALUE_CHARS {
                return None;
            }
            return Some(text.clone());
        }
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::Array(items) if items.is_empty() => return None,
        Value::Object(object) if object.is_empty() => return None,
        nested => serde_json::to_string(nested).ok()?,
    };
    (rendered.chars().count() <= MAX_VALUE_CHARS).then_some(rendered)
}

fn first_str<'a>(object: &'a Object, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| object.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|text| !text.is_empty())
}
