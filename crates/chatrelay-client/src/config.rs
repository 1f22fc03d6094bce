//! Client configuration.
//!
//! Settings come from three layers, later ones winning:
//!
//! 1. Built-in defaults ([`ClientConfig::default`]).
//! 2. A TOML file, `config/chatrelay.toml` unless a path is given.
//! 3. Environment variables (`CHATRELAY_*`, plus the legacy
//!    `N8N_WEBHOOK_URL` for the webhook address).
//!
//! The webhook URL is the only required setting.  Its absence is reported as
//! [`ClientError::Config`] when a client is built, not when the file loads,
//! so tools that never hit the network still work without it.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::error::{ClientError, Result};

/// Config file read when no explicit path is given.
pub const DEFAULT_CONFIG_PATH: &str = "config/chatrelay.toml";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Largest accepted timeout in seconds.
pub const MAX_TIMEOUT_SECS: u64 = 600;

/// User identifier sent when none is configured.
pub const DEFAULT_USER_ID: &str = "anonymous";

pub const ENV_WEBHOOK_URL: &str = "CHATRELAY_WEBHOOK_URL";
pub const ENV_LEGACY_WEBHOOK_URL: &str = "N8N_WEBHOOK_URL";
pub const ENV_TIMEOUT_SECS: &str = "CHATRELAY_TIMEOUT_SECS";
pub const ENV_USER_ID: &str = "CHATRELAY_USER_ID";
pub const ENV_SESSION_ID: &str = "CHATRELAY_SESSION_ID";

/// Resolved client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// The automation webhook to POST chat turns to.
    pub webhook_url: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Sent as `userId` with every turn.
    pub user_id: String,
    /// Fixed session identifier.  A fresh one is generated when absent.
    pub session_id: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_id: DEFAULT_USER_ID.to_owned(),
            session_id: None,
        }
    }
}

impl ClientConfig {
    /// Parse a TOML document.  Missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or from [`DEFAULT_CONFIG_PATH`] when `None`.
    ///
    /// An explicit path must exist.  A missing default file yields the
    /// defaults.
    pub fn load_file(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(path) => (path, true),
            None => (Path::new(DEFAULT_CONFIG_PATH), false),
        };

        if !path.exists() {
            if explicit {
                return Err(ClientError::Config {
                    reason: format!("config file `{}` does not exist", path.display()),
                });
            }
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ClientError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        info!(path = %path.display(), "configuration loaded from file");
        Ok(config)
    }

    /// Load the file layer, then apply the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::load_file(path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from `lookup`, which maps a variable name to its
    /// value.  Blank values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(url) = get(ENV_WEBHOOK_URL).or_else(|| get(ENV_LEGACY_WEBHOOK_URL)) {
            self.webhook_url = Some(url.trim().to_owned());
        }
        if let Some(raw) = get(ENV_TIMEOUT_SECS) {
            self.timeout_secs = raw.trim().parse().map_err(|_| ClientError::Config {
                reason: format!("{ENV_TIMEOUT_SECS} must be a whole number of seconds, got `{raw}`"),
            })?;
        }
        if let Some(user_id) = get(ENV_USER_ID) {
            self.user_id = user_id.trim().to_owned();
        }
        if let Some(session_id) = get(ENV_SESSION_ID) {
            self.session_id = Some(session_id.trim().to_owned());
        }

        self.validate()
    }

    /// Check the settings that have a valid range.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 || self.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(ClientError::Config {
                reason: format!(
                    "timeout_secs must be between 1 and {MAX_TIMEOUT_SECS}, got {}",
                    self.timeout_secs
                ),
            });
        }
        if self.user_id.trim().is_empty() {
            return Err(ClientError::Config {
                reason: "user_id must not be empty".into(),
            });
        }
        Ok(())
    }

    /// The webhook URL, parsed.
    ///
    /// # Errors
    ///
    /// [`ClientError::Config`] when the URL is missing, unparseable, or not
    /// `http`/`https`.
    pub fn webhook_url(&self) -> Result<Url> {
        let raw = self
            .webhook_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ClientError::Config {
                reason: format!(
                    "no webhook URL configured; set {ENV_WEBHOOK_URL} or `webhook_url` in {DEFAULT_CONFIG_PATH}"
                ),
            })?;

        let url = Url::parse(raw).map_err(|e| ClientError::Config {
            reason: format!("invalid webhook URL `{raw}`: {e}"),
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ClientError::Config {
                reason: format!("webhook URL must be http or https, got `{other}`"),
            }),
        }
    }

    /// The request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
