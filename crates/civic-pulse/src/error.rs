//! Error types for the feedback pipeline.

use thiserror::Error;

/// Startup-time configuration errors.
///
/// These are the only hard failures the analysis context can produce; once a
/// context is built, analysis never fails on configuration grounds.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid vocabulary: {reason}")]
    InvalidVocabulary { reason: String },

    #[error("Invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Failed to read file '{path}': {reason}")]
    FileRead { path: String, reason: String },

    #[error("Failed to parse file '{path}': {reason}")]
    FileParse { path: String, reason: String },
}

/// A learned model could not be built or could not score an input.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Failed to read corpus '{path}': {reason}")]
    CorpusRead { path: String, reason: String },

    #[error("Failed to parse corpus '{path}': {reason}")]
    CorpusParse { path: String, reason: String },

    #[error("Corpus has no usable examples")]
    EmptyCorpus,

    #[error("Corpus needs at least two labels, found {found}")]
    TooFewLabels { found: usize },

    #[error("Unknown label '{label}' in corpus")]
    UnknownLabel { label: String },

    #[error("Text has no tokens known to the model")]
    NoSignal,
}

/// Language detection or translation failed. Always recovered from by
/// falling back to the original text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("No alphabetic characters to detect a language from")]
    NoAlphabetic,

    #[error("Translation disabled")]
    TranslationDisabled,

    #[error("No glossary for language '{language}'")]
    UnsupportedLanguage { language: String },

    #[error("No words could be translated from '{language}'")]
    NoCoverage { language: String },

    #[error("Text has {chars} characters, translation limit is {max}")]
    TooLong { chars: usize, max: usize },

    #[error("{0}")]
    Other(String),
}

/// Per-item failure while analyzing a single post.
///
/// Every input string yields a record; this only covers a stage that
/// panicked or a worker that could not be joined.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("Analysis worker failed: {reason}")]
    Worker { reason: String },
}
