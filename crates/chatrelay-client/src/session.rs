//! Chat session state.
//!
//! A [`ChatSession`] is the explicit context a front end threads through its
//! chat turns: the session and user identifiers sent to the backend, the
//! append-only message log, and a single "last debug" slot that every turn
//! overwrites.  Turns on one session are strictly sequential (`send_turn`
//! takes `&mut self`), so none of this needs locking.

use chatrelay_reply::{NormalizedReply, ReplyRule, StructuredResult, normalize};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::webhook::{TurnRequest, WebhookResponse, WebhookTransport};

// ═══════════════════════════════════════════════════════════════════════
//  Types
// ═══════════════════════════════════════════════════════════════════════

/// Who wrote a [`ChatEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Assistant => f.write_str("assistant"),
        }
    }
}

/// One line of the session log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub role: Role,
    pub content: String,
    /// Side-panel record, for assistant entries that had one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<StructuredResult>,
    pub at: DateTime<Utc>,
}

/// What the last turn sent and received, for troubleshooting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugSnapshot {
    pub request: TurnRequest,
    pub status: Option<u16>,
    pub elapsed_ms: Option<u64>,
    /// The decoded body before normalization.
    pub raw: Option<Value>,
    /// The interpreter rule that produced the reply.
    pub rule: Option<ReplyRule>,
    /// Set when the turn failed.
    pub error: Option<String>,
    pub at: DateTime<Utc>,
}

/// Result of a successful turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub reply: NormalizedReply,
    pub result: Option<StructuredResult>,
    pub response: WebhookResponse,
}

// ═══════════════════════════════════════════════════════════════════════
//  ChatSession
// ═══════════════════════════════════════════════════════════════════════

/// Conversation context for one backend session.
#[derive(Debug, Clone)]
pub struct ChatSession {
    session_id: String,
    user_id: String,
    history: Vec<ChatEntry>,
    last_debug: Option<DebugSnapshot>,
}

impl ChatSession {
    /// Start an empty session.
    pub fn new(session_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            user_id: user_id.into(),
            history: Vec::new(),
            last_debug: None,
        }
    }

    /// Start a session using the configured identifiers, generating a UUID v7
    /// session id when none is configured.
    pub fn from_config(config: &ClientConfig) -> Self {
        let session_id = config
            .session_id
            .clone()
            .unwrap_or_else(|| Uuid::now_v7().to_string());
        Self::new(session_id, config.user_id.clone())
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// The message log, oldest first.
    pub fn history(&self) -> &[ChatEntry] {
        &self.history
    }

    pub fn last_debug(&self) -> Option<&DebugSnapshot> {
        self.last_debug.as_ref()
    }

    /// The side-panel record of the latest assistant reply, if it had one.
    pub fn last_result(&self) -> Option<&StructuredResult> {
        self.history
            .iter()
            .rev()
            .find(|entry| entry.role == Role::Assistant)
            .and_then(|entry| entry.result.as_ref())
    }

    /// Forget the log and debug slot.  Identifiers are kept.
    pub fn clear(&mut self) {
        self.history.clear();
        self.last_debug = None;
    }

    /// Run one chat turn.
    ///
    /// The user message is logged before the call.  On success the
    /// normalized reply is logged too; on failure only the debug slot records
    /// what happened and the error is returned.  Either way the session stays
    /// usable.
    ///
    /// # Errors
    ///
    /// [`ClientError::EmptyMessage`] for blank input (nothing is logged), or
    /// whatever the transport reports.
    #[instrument(skip_all, fields(session_id = %self.session_id))]
    pub async fn send_turn<T>(&mut self, transport: &T, text: &str) -> Result<TurnOutcome>
    where
        T: WebhookTransport + ?Sized,
    {
        let text = text.trim();
        if text.is_empty() {
            return Err(ClientError::EmptyMessage);
        }

        self.push(Role::User, text, None);
        let request = TurnRequest {
            message: text.to_owned(),
            session_id: self.session_id.clone(),
            user_id: self.user_id.clone(),
        };

        let response = match transport.send(&request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "chat turn failed");
                self.last_debug = Some(DebugSnapshot {
                    request,
                    status: match &e {
                        ClientError::Status { status, .. } => Some(*status),
                        _ => None,
                    },
                    elapsed_ms: None,
                    raw: None,
                    rule: None,
                    error: Some(e.to_string()),
                    at: Utc::now(),
                });
                return Err(e);
            }
        };

        let reply = normalize(response.payload.clone());
        let result = reply.structured();
        info!(
            rule = reply.rule.as_str(),
            elapsed_ms = response.elapsed_ms,
            has_result = result.is_some(),
            "chat turn completed"
        );

        self.push(Role::Assistant, &reply.message, result.clone());
        self.last_debug = Some(DebugSnapshot {
            request,
            status: Some(response.status),
            elapsed_ms: Some(response.elapsed_ms),
            raw: Some(response.payload.clone()),
            rule: Some(reply.rule),
            error: None,
            at: Utc::now(),
        });

        Ok(TurnOutcome {
            reply,
            result,
            response,
        })
    }

    fn push(&mut self, role: Role, content: &str, result: Option<StructuredResult>) {
        self.history.push(ChatEntry {
            role,
            content: content.to_owned(),
            result,
            at: Utc::now(),
        });
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
