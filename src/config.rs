//! Configuration file parser for ~/.config/sift/config.toml.
//!
//! The config file is optional — a missing file yields `Config::default()`.
//! Unknown keys are silently ignored by serde (with `deny_unknown_fields`
//! off), though we log a warning when the file contains potential typos.
//!
//! Configuration is an explicit value threaded into `normalize` and the
//! transformers; there is no process-global mutable state. Callers build
//! one `Config` at startup and treat it as read-only from then on.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be
/// specified. Missing keys fall back to `Default::default()`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Normalization behavior.
    pub reader: ReaderConfig,

    /// XML-to-tree conversion behavior.
    pub parser: ParserConfig,

    /// HTTP fetching behavior.
    pub fetch: FetchConfig,
}

/// Options controlling how a parsed tree is normalized.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReaderConfig {
    /// Maximum character length of entry descriptions.
    pub description_max_len: usize,

    /// Include unabridged bodies and non-standard fields in the output.
    pub include_full_content: bool,

    /// Convert entry publish dates to ISO-8601 instead of keeping the
    /// source text verbatim.
    pub convert_pubdate_to_iso: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            description_max_len: 210,
            include_full_content: false,
            convert_pubdate_to_iso: true,
        }
    }
}

/// Options controlling XML-to-tree conversion.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ParserConfig {
    /// Strip namespace prefixes from element names, so `content:encoded`
    /// is addressable as `encoded`.
    pub strip_ns_prefix: bool,

    /// Maximum element nesting depth accepted from a source document.
    pub max_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            strip_ns_prefix: true,
            max_depth: 100,
        }
    }
}

/// Options controlling the HTTP fetch collaborator.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Retry budget for rate limiting, server errors, and incomplete
    /// downloads.
    pub max_retries: u32,

    /// Maximum accepted response body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 3,
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → silently accepted (serde default behavior), logged
    ///   as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // Check file size before reading to avoid slurping a corrupted or
        // runaway file into memory.
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
                // Race condition: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        // Parse the TOML content first as a raw table to detect unknown keys
        if let Ok(raw) = content.parse::<toml::Table>() {
            let known_keys = ["reader", "parser", "fetch"];
            for key in raw.keys() {
                if !known_keys.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown section in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(
            path = %path.display(),
            description_max_len = config.reader.description_max_len,
            "Loaded configuration"
        );
        Ok(config)
    }
}

// ============================================================================
// Tests
// ============================================================================
