//! Chat client configuration.
//!
//! Resolved in layers: built-in defaults, then `.jag/settings.json` in the
//! working directory, then environment variables. The CLI applies its own
//! flags on top.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ChatError, ChatResult};

/// Local development backend.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Path of the chat endpoint relative to the base URL.
pub const CHAT_PATH: &str = "/api/chat";

/// Environment variable overriding the backend base URL.
pub const ENV_API_URL: &str = "JAG_API_URL";

/// Environment variable overriding the request timeout (seconds).
pub const ENV_REQUEST_TIMEOUT: &str = "JAG_REQUEST_TIMEOUT_SECS";

/// Chat client configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatConfig {
    /// Backend base URL
    #[serde(rename = "apiBaseUrl", default = "default_base_url")]
    pub api_base_url: String,
    /// Request timeout in seconds; 0 disables the timeout
    #[serde(rename = "requestTimeoutSecs", default = "default_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_base_url(),
            request_timeout_secs: default_timeout(),
        }
    }
}

impl ChatConfig {
    /// Load from workspace settings, then apply environment overrides.
    ///
    /// A missing settings file is not an error.
    pub fn from_settings(workspace_root: &Path) -> ChatResult<Self> {
        Self::load(workspace_root, |key| std::env::var(key).ok())
    }

    fn load(workspace_root: &Path, env: impl Fn(&str) -> Option<String>) -> ChatResult<Self> {
        let settings_path = workspace_root.join(".jag").join("settings.json");

        let mut config = if settings_path.exists() {
            debug!("Loading chat settings from {}", settings_path.display());
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str::<Self>(&content)?
        } else {
            Self::default()
        };
        config.api_base_url = config.api_base_url.trim().to_string();

        if let Some(url) = env(ENV_API_URL).filter(|url| !url.trim().is_empty()) {
            config = config.with_base_url(url);
        }

        if let Some(raw) = env(ENV_REQUEST_TIMEOUT) {
            config.request_timeout_secs = raw.trim().parse().map_err(|_| {
                ChatError::Config(format!(
                    "{} must be a number of seconds, got '{}'",
                    ENV_REQUEST_TIMEOUT, raw
                ))
            })?;
        }

        Ok(config)
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim().to_string();
        self
    }

    /// Set the request timeout in seconds.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// Full URL of the chat endpoint.
    pub fn chat_endpoint(&self) -> String {
        format!("{}{}", self.api_base_url.trim_end_matches('/'), CHAT_PATH)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        match self.request_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> ChatResult<()> {
        let url = &self.api_base_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ChatError::Config(format!(
                "API base URL must start with http:// or https://, got '{}'",
                url
            )));
        }
        Ok(())
    }
}
