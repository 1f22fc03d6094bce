//! Client error types.
//!
//! Every failure of a chat turn surfaces as a [`ClientError`].  Variants fall
//! into two groups: configuration problems, which stop the client from being
//! used at all, and transport problems, which fail one turn and leave the
//! session usable.  Malformed reply bodies are never errors; the reply
//! interpreter absorbs them.

/// Unified error type for the chatrelay client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    // -- Configuration -------------------------------------------------------
    /// A required setting is missing or invalid.
    #[error("configuration error: {reason}")]
    Config { reason: String },

    /// The configuration file is not valid TOML for [`crate::ClientConfig`].
    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The configuration file exists but could not be read.
    #[error("failed to read `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // -- Transport -----------------------------------------------------------
    /// The webhook answered with a non-2xx status.
    #[error("webhook returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The webhook did not answer in time.
    #[error("webhook did not answer within {seconds}s")]
    Timeout { seconds: u64 },

    /// Connecting, sending or reading the body failed.
    #[error("webhook request failed: {reason}")]
    Transport { reason: String },

    // -- Input ---------------------------------------------------------------
    /// The user message was empty after trimming.
    #[error("message is empty")]
    EmptyMessage,
}

impl ClientError {
    /// Whether this is a configuration problem that no retry of the same
    /// turn can fix.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::Toml(_) | Self::Io { .. })
    }

    /// Whether this failed a single turn on the wire.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Status { .. } | Self::Timeout { .. } | Self::Transport { .. }
        )
    }
}

/// Convenience alias used throughout the client crate.
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        let config = ClientError::Config {
            reason: "missing".into(),
        };
        assert!(config.is_config());
        assert!(!config.is_transport());

        let status = ClientError::Status {
            status: 502,
            body: "bad gateway".into(),
        };
        assert!(status.is_transport());
        assert!(!status.is_config());

        assert!(ClientError::Timeout { seconds: 120 }.is_transport());
        assert!(!ClientError::EmptyMessage.is_transport());
        assert!(!ClientError::EmptyMessage.is_config());
    }

    #[test]
    fn unreadable_file_is_config_problem() {
        let err = ClientError::Io {
            path: "config/chatrelay.toml".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.is_config());
        assert!(!err.is_transport());
        assert_eq!(err.to_string(), "failed to read `config/chatrelay.toml`: denied");
    }

    #[test]
    fn display_includes_context() {
        let err = ClientError::Status {
            status: 404,
            body: "no such webhook".into(),
        };
        assert_eq!(err.to_string(), "webhook returned HTTP 404: no such webhook");
        assert_eq!(
            ClientError::Timeout { seconds: 60 }.to_string(),
            "webhook did not answer within 60s"
        );
    }
}
