//! Configuration file parser for ~/.config/tagfeed/config.toml.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are ignored by serde, though we log a warning when the file
//! contains potential typos.
use crate::feed::{DEFAULT_BASE_URL, DEFAULT_PER_PAGE, DEFAULT_TAG};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use url::Url;

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

    #[error("Insecure base URL '{0}': HTTPS required (except localhost)")]
    InsecureBaseUrl(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Host serving `/api/v2/tags/{tag}/items`.
    pub base_url: String,

    /// Tag loaded on start.
    pub default_tag: String,

    /// Page size on start and after every tag change.
    pub per_page: u32,

    /// Tags offered in the tag bar, in display order.
    pub tags: Vec<String>,

    /// Pages reachable with the jump keys (1, 2, 3, ...).
    pub page_jumps: Vec<u32>,

    /// Page size used by the jump keys.
    pub jump_page_size: u32,

    /// Page sizes cycled by the page-size key.
    pub page_sizes: Vec<u32>,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Minimum spacing between two automatic page advances.
    pub scroll_throttle_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            default_tag: DEFAULT_TAG.to_string(),
            per_page: DEFAULT_PER_PAGE,
            tags: [
                "React",
                "Next.js",
                "Vue.js",
                "Nuxt.js",
                "JavaScript",
                "Swift",
                "Vim",
                "Azure",
                "Aws",
                ".NET",
                "Flutter",
            ]
            .iter()
            .map(|t| t.to_string())
            .collect(),
            page_jumps: vec![1, 20, 50, 90],
            jump_page_size: 100,
            page_sizes: vec![20, 50, 100],
            request_timeout_secs: 20,
            scroll_throttle_ms: 500,
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 9] = [
        "base_url",
        "default_tag",
        "per_page",
        "tags",
        "page_jumps",
        "jump_page_size",
        "page_sizes",
        "request_timeout_secs",
        "scroll_throttle_ms",
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
        config.validate()?;
        tracing::info!(
            path = %path.display(),
            base_url = %config.base_url,
            default_tag = %config.default_tag,
            "Loaded configuration"
        );
        Ok(config.normalized())
    }

    /// Reject plain-HTTP hosts other than localhost.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let insecure = || ConfigError::InsecureBaseUrl(self.base_url.clone());
        let url = Url::parse(&self.base_url).map_err(|_| insecure())?;
        if url.scheme() == "https" {
            return Ok(());
        }
        let is_localhost = url.scheme() == "http"
            && matches!(url.host_str(), Some("localhost" | "127.0.0.1"));
        if is_localhost {
            tracing::warn!(base_url = %self.base_url, "Using non-HTTPS base URL (localhost only)");
            return Ok(());
        }
        Err(insecure())
    }

    /// Clamp sizes to at least 1 and drop empty tag names.
    pub fn normalized(mut self) -> Self {
        self.per_page = self.per_page.max(1);
        self.jump_page_size = self.jump_page_size.max(1);
        self.page_jumps.retain(|p| *p > 0);
        self.page_sizes.retain(|n| *n > 0);
        self.tags.retain(|t| !t.trim().is_empty());
        if self.default_tag.trim().is_empty() {
            self.default_tag = DEFAULT_TAG.to_string();
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn scroll_throttle(&self) -> Duration {
        Duration::from_millis(self.scroll_throttle_ms)
    }
}

// ============================================================================
// Tests
// ============================================================================
