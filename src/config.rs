//! Configuration file parser for ~/.config/newsgram/config.toml.
//!
//! The config file is optional and a missing file yields `Config::default()`.
//! Unknown keys are accepted by serde, but we log a warning for each so
//! typos do not go unnoticed.
use crate::api::DEFAULT_TIMEOUT;
use crate::feed::DEFAULT_CATEGORY_LIMIT;
use crate::location::DEFAULT_LINK_BASE;
use crate::selection::DEFAULT_LANGUAGE;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Backend used when neither the command line, the environment nor the
/// config file names one.
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend base URL. `NEWSGRAM_API_URL` and `--api-url` take precedence.
    pub api_url: String,

    /// Base that feed links are built on and relative links resolve against.
    pub link_base: String,

    /// Language selected at startup.
    pub default_language: String,

    /// Number of items requested for a category feed.
    pub category_limit: usize,

    /// Per-request deadline in seconds.
    pub request_timeout_secs: u64,

    /// How long a notice stays in the status bar, in seconds.
    pub notice_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            link_base: DEFAULT_LINK_BASE.to_string(),
            default_language: DEFAULT_LANGUAGE.to_string(),
            category_limit: DEFAULT_CATEGORY_LIMIT,
            request_timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            notice_timeout_secs: 4,
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 6] = [
        "api_url",
        "link_base",
        "default_language",
        "category_limit",
        "request_timeout_secs",
        "notice_timeout_secs",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), api_url = %config.api_url, "Loaded configuration");
        Ok(config)
    }

    /// Request deadline, never shorter than one second.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn notice_timeout(&self) -> Duration {
        Duration::from_secs(self.notice_timeout_secs)
    }

    /// Pick the backend URL: command line, then environment, then file.
    /// Blank values count as unset.
    pub fn resolve_api_url(&self, cli: Option<&str>, env: Option<&str>) -> String {
        [cli, env]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|v| !v.is_empty())
            .unwrap_or(self.api_url.as_str())
            .to_string()
    }

    /// Category limit, with 0 treated as the default.
    pub fn effective_category_limit(&self) -> usize {
        if self.category_limit == 0 {
            DEFAULT_CATEGORY_LIMIT
        } else {
            self.category_limit
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
