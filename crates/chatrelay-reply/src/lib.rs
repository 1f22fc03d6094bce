//! Reply normalization for chatrelay.
//!
//! The automation webhook behind chatrelay answers with whatever its workflow
//! happened to produce: an object with `message`, `reply` or `output`, an
//! array wrapping such an object, or a string that may itself be JSON.  This
//! crate turns any of those into a [`NormalizedReply`] (a status line plus
//! residual data) and, when the data has a recognisable shape, a
//! [`StructuredResult`] for a side panel.
//!
//! ## Modules
//!
//! - [`payload`] -- the [`RemotePayload`] tagged union.
//! - [`interpreter`] -- [`normalize`] and the reply types.
//! - [`rules`] -- the ordered rule table for object payloads.
//! - [`structured`] -- side-panel extraction.
//!
//! Nothing here performs I/O and nothing here can fail.

pub mod interpreter;
pub mod payload;
pub mod rules;
pub mod structured;

pub use interpreter::{
    DONE_MESSAGE, FALLBACK_MESSAGE, MAX_DEPTH, NormalizedReply, RAW_KEY, ReplyRule, normalize,
};
pub use payload::RemotePayload;
pub use rules::{EMBEDDED_JSON_MARKERS, split_embedded_json, strip_output_label};
pub use structured::{MAX_COMPACT_FIELDS, MAX_VALUE_CHARS, ResultSource, StructuredResult};
