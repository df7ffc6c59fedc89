//! Runtime configuration for the feedback pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::analysis::{SentimentBackend, DEFAULT_TOPIC_THRESHOLD};
use crate::error::ConfigError;

/// Default number of posts analyzed concurrently in a batch.
pub const DEFAULT_WORKERS: usize = 4;

/// Default limit on post length, in characters.
pub const DEFAULT_MAX_TEXT_CHARS: usize = 10_000;

/// What a batch does with items that fail analysis.
///
/// Neither policy stops the batch; they differ only in whether failed items
/// keep their slot in the batch output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchFailurePolicy {
    /// Failed items stay in place as failure outcomes.
    #[default]
    Surface,
    /// Failed items are removed from the outcomes and reported separately.
    Drop,
}

impl BatchFailurePolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "surface" | "keep" => Some(BatchFailurePolicy::Surface),
            "drop" | "skip" => Some(BatchFailurePolicy::Drop),
            _ => None,
        }
    }
}

/// Pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PulseConfig {
    /// Sentiment backend to run first.
    pub sentiment_backend: SentimentBackend,
    /// Labelled corpus for the learned sentiment backend.
    pub sentiment_corpus: Option<PathBuf>,
    /// Labelled corpus for the topic model; no corpus means keywords only.
    pub topic_corpus: Option<PathBuf>,
    /// Model candidates must score strictly above this.
    pub topic_threshold: f64,
    /// Translate non-English text.
    pub translation: bool,
    /// Extra glossary entries (JSON).
    pub glossary: Option<PathBuf>,
    /// Vocabulary override (TOML).
    pub vocabulary: Option<PathBuf>,
    pub batch_failure_policy: BatchFailurePolicy,
    /// Concurrent analyses in a parallel batch.
    pub workers: usize,
    /// Posts longer than this skip translation and are classified as is.
    pub max_text_chars: usize,
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            sentiment_backend: SentimentBackend::default(),
            sentiment_corpus: None,
            topic_corpus: None,
            topic_threshold: DEFAULT_TOPIC_THRESHOLD,
            translation: true,
            glossary: None,
            vocabulary: None,
            batch_failure_policy: BatchFailurePolicy::default(),
            workers: DEFAULT_WORKERS,
            max_text_chars: DEFAULT_MAX_TEXT_CHARS,
        }
    }
}

impl PulseConfig {
    /// Create configuration from environment variables.
    ///
    /// # Optional Environment Variables
    /// - `CIVIC_SENTIMENT_BACKEND`: `lexicon` or `learned` (default: lexicon)
    /// - `CIVIC_SENTIMENT_CORPUS`: JSON corpus for the learned backend
    /// - `CIVIC_TOPIC_CORPUS`: JSON corpus for the topic model
    /// - `CIVIC_TOPIC_THRESHOLD`: model confidence threshold (default: 0.2)
    /// - `CIVIC_TRANSLATION`: `true`/`false` (default: true)
    /// - `CIVIC_GLOSSARY`: extra glossary JSON
    /// - `CIVIC_VOCABULARY`: vocabulary TOML
    /// - `CIVIC_BATCH_FAILURE_POLICY`: `surface` or `drop` (default: surface)
    /// - `CIVIC_WORKERS`: parallel workers (default: 4)
    /// - `CIVIC_MAX_TEXT_CHARS`: post length limit (default: 10000)
    ///
    /// Unparseable values are logged and replaced by the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            sentiment_backend: env_with("CIVIC_SENTIMENT_BACKEND", SentimentBackend::parse)
                .unwrap_or(defaults.sentiment_backend),
            sentiment_corpus: env_path("CIVIC_SENTIMENT_CORPUS"),
            topic_corpus: env_path("CIVIC_TOPIC_CORPUS"),
            topic_threshold: env_parse("CIVIC_TOPIC_THRESHOLD").unwrap_or(defaults.topic_threshold),
            translation: env_parse("CIVIC_TRANSLATION").unwrap_or(defaults.translation),
            glossary: env_path("CIVIC_GLOSSARY"),
            vocabulary: env_path("CIVIC_VOCABULARY"),
            batch_failure_policy: env_with("CIVIC_BATCH_FAILURE_POLICY", BatchFailurePolicy::parse)
                .unwrap_or(defaults.batch_failure_policy),
            workers: env_parse("CIVIC_WORKERS").unwrap_or(defaults.workers),
            max_text_chars: env_parse("CIVIC_MAX_TEXT_CHARS").unwrap_or(defaults.max_text_chars),
        }
    }

    /// Load configuration from a TOML file. Missing keys take defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::FileParse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..1.0).contains(&self.topic_threshold) {
            return Err(invalid(
                "topic_threshold",
                format!("{} is outside [0, 1)", self.topic_threshold),
            ));
        }
        if self.workers == 0 {
            return Err(invalid("workers", "must be at least 1".to_string()));
        }
        if self.max_text_chars == 0 {
            return Err(invalid("max_text_chars", "must be at least 1".to_string()));
        }
        Ok(())
    }
}

fn invalid(key: &str, reason: String) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason,
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env_with(key, |v| v.trim().parse().ok())
}

fn env_with<T>(key: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    let value = std::env::var(key).ok()?;
    let parsed = parse(&value);
    if parsed.is_none() {
        tracing::warn!(key, value = %value, "Ignoring unparseable environment value");
    }
    parsed
}
