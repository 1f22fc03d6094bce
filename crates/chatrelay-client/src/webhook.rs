//! The outbound webhook call.
//!
//! One chat turn is one HTTP POST of a [`TurnRequest`] to the configured
//! webhook, bounded by the configured timeout.  The response body is decoded
//! leniently: JSON when it parses, the raw text otherwise.  Shape problems are
//! left to the reply interpreter; only transport failures become errors.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// Largest non-JSON body text kept for display, in bytes (1 MB).
pub const MAX_BODY_BYTES: usize = 1_024 * 1_024;

/// Characters of an error body kept in [`ClientError::Status`].
const ERROR_BODY_CHARS: usize = 500;

/// JSON body of one chat turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRequest {
    pub message: String,
    pub session_id: String,
    pub user_id: String,
}

/// A successful (2xx) webhook answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookResponse {
    /// HTTP status code.
    pub status: u16,
    /// Wall-clock time of the request, in milliseconds.
    pub elapsed_ms: u64,
    /// Decoded body; see [`decode_body`].
    pub payload: Value,
}

/// Anything that can carry a chat turn to the backend.
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    /// Deliver `request` and return the backend's answer.
    async fn send(&self, request: &TurnRequest) -> Result<WebhookResponse>;
}

/// `reqwest`-backed [`WebhookTransport`].
#[derive(Debug, Clone)]
pub struct WebhookClient {
    url: Url,
    timeout: Duration,
    client: reqwest::Client,
}

impl WebhookClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// [`ClientError::Config`] when the webhook URL is missing or invalid.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let url = config.webhook_url()?;
        let client = reqwest::Client::builder()
            .user_agent(concat!("chatrelay/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Config {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            url,
            timeout: config.timeout(),
            client,
        })
    }

    /// The webhook this client posts to.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn map_reqwest_error(&self, err: reqwest::Error, stage: &str) -> ClientError {
        if err.is_timeout() {
            ClientError::Timeout {
                seconds: self.timeout.as_secs(),
            }
        } else {
            ClientError::Transport {
                reason: format!("{stage}: {err}"),
            }
        }
    }
}

#[async_trait]
impl WebhookTransport for WebhookClient {
    async fn send(&self, request: &TurnRequest) -> Result<WebhookResponse> {
        debug!(
            url = %self.url,
            session_id = %request.session_id,
            timeout_secs = self.timeout.as_secs(),
            "posting chat turn to webhook"
        );

        let start = Instant::now();
        let response = self
            .client
            .post(self.url.clone())
            .timeout(self.timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e, "request failed"))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.map_reqwest_error(e, "failed to read response body"))?;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        if !status.is_success() {
            let text = String::from_utf8_lossy(&body);
            warn!(status = status.as_u16(), elapsed_ms, "webhook returned an error status");
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: snippet(text.trim(), ERROR_BODY_CHARS),
            });
        }

        debug!(
            status = status.as_u16(),
            elapsed_ms,
            body_length = body.len(),
            "webhook answered"
        );

        Ok(WebhookResponse {
            status: status.as_u16(),
            elapsed_ms,
            payload: decode_body(&body),
        })
    }
}

/// Decode a response body without failing.
///
/// Blank bodies become `null`, JSON bodies their value, anything else a JSON
/// string holding the (lossily decoded) text.  JSON is parsed at full size;
/// only non-JSON text is cut to [`MAX_BODY_BYTES`].
pub fn decode_body(bytes: &[u8]) -> Value {
    let text = String::from_utf8_lossy(bytes);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(value) = serde_json::from_str(trimmed) {
        return value;
    }

    if text.len() <= MAX_BODY_BYTES {
        return Value::String(text.into_owned());
    }
    warn!(length = text.len(), "non-JSON response body truncated at 1 MB");
    let mut cut = MAX_BODY_BYTES;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    Value::String(text[..cut].to_owned())
}

fn snippet(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn turn_request_uses_camel_case() {
        let request = TurnRequest {
            message: "hi".into(),
            session_id: "s-1".into(),
            user_id: "u@example.com".into(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({"message": "hi", "sessionId": "s-1", "userId": "u@example.com"})
        );
    }

    #[test]
    fn decode_json_body() {
        assert_eq!(decode_body(br#"{"reply":"ok"}"#), json!({"reply": "ok"}));
        assert_eq!(decode_body(b" [1,2] \n"), json!([1, 2]));
    }

    #[test]
    fn decode_text_body() {
        assert_eq!(decode_body(b"Workflow was started"), json!("Workflow was started"));
    }

    #[test]
    fn decode_blank_body() {
        assert_eq!(decode_body(b""), Value::Null);
        assert_eq!(decode_body(b"  \n"), Value::Null);
    }

    #[test]
    fn decode_invalid_utf8_is_lossy_text() {
        let value = decode_body(&[0x66, 0x6f, 0xff, 0x6f]);
        assert!(value.as_str().unwrap().starts_with("fo"));
    }

    #[test]
    fn large_json_body_is_parsed_whole() {
        let filler = "x".repeat(MAX_BODY_BYTES);
        let body = serde_json::to_vec(&json!({
            "message": "Saved.",
            "data": {"notes": filler}
        }))
        .unwrap();
        assert!(body.len() > MAX_BODY_BYTES);

        let payload = decode_body(&body);
        assert_eq!(payload["message"], "Saved.");
        let reply = chatrelay_reply::normalize(payload);
        assert_eq!(reply.message, "Saved.");
        assert_eq!(reply.rule, chatrelay_reply::ReplyRule::Message);
    }

    #[test]
    fn large_text_body_is_cut_on_char_boundary() {
        let mut body = "a".repeat(MAX_BODY_BYTES - 1);
        body.push_str("ééé not json");
        let value = decode_body(body.as_bytes());
        let text = value.as_str().unwrap();
        assert_eq!(text.len(), MAX_BODY_BYTES - 1);
        assert!(text.chars().all(|c| c == 'a'));
    }

    #[test]
    fn snippet_cuts_on_char_boundary() {
        assert_eq!(snippet("héllo", 2), "hé...");
        assert_eq!(snippet("short", 50), "short");
    }

    #[test]
    fn client_requires_url() {
        let err = WebhookClient::new(&ClientConfig::default()).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn client_keeps_url_and_timeout() {
        let config = ClientConfig {
            webhook_url: Some("https://hooks.example.com/webhook/abc".into()),
            timeout_secs: 60,
            ..ClientConfig::default()
        };
        let client = WebhookClient::new(&config).unwrap();
        assert_eq!(client.url().as_str(), "https://hooks.example.com/webhook/abc");
        assert_eq!(client.timeout(), Duration::from_secs(60));
    }
}
