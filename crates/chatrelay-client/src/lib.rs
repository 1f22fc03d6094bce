//! Webhook client, configuration and session state for chatrelay.
//!
//! A chat turn flows through three pieces:
//!
//! ```text
//! ┌─────────────┐  TurnRequest   ┌───────────────┐   POST   ┌─────────┐
//! │ ChatSession │──────────────> │ WebhookClient │────────> │ webhook │
//! │ (log/debug) │ <──────────────│  (reqwest)    │<──────── │         │
//! └──────┬──────┘ WebhookResponse└───────────────┘   JSON   └─────────┘
//!        │
//!        └──> chatrelay_reply::normalize ──> NormalizedReply + StructuredResult
//! ```
//!
//! ## Modules
//!
//! - [`config`] -- TOML + environment configuration.
//! - [`webhook`] -- the [`WebhookTransport`] seam and its HTTP implementation.
//! - [`session`] -- [`ChatSession`], the per-conversation context.
//! - [`error`] -- client error types.

pub mod config;
pub mod error;
pub mod session;
pub mod webhook;

pub use config::{ClientConfig, DEFAULT_CONFIG_PATH, DEFAULT_TIMEOUT_SECS};
pub use error::{ClientError, Result};
pub use session::{ChatEntry, ChatSession, DebugSnapshot, Role, TurnOutcome};
pub use webhook::{TurnRequest, WebhookClient, WebhookResponse, WebhookTransport, decode_body};
