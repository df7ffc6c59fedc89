//! Civic-issue feedback analysis.
//!
//! This crate provides:
//! - Language normalization of posts to English (script detection, glossary translation)
//! - Sentiment, urgency and topic classification with rule-based fallbacks
//! - Priority scoring for triage
//! - Sequential and parallel batch analysis
//! - Hashtag dump parsing, a JSON feedback store and an access log

pub mod analysis;
pub mod analyzer;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod posts;
pub mod storage;

// Re-export main types
pub use analysis::{AnalysisContext, Normalization, Sentiment, TopicTier, Urgency};
pub use analyzer::{BatchOutcome, BatchReport, FeedbackAnalyzer, FeedbackRecord, FeedbackSummary};
pub use config::{BatchFailurePolicy, PulseConfig};
pub use error::{AnalysisError, ConfigError, ModelError, NormalizeError};
pub use pipeline::{IngestConfig, IngestPipeline, IngestResult};
pub use posts::{Post, PostParser};
pub use storage::{FeedbackStore, StoredFeedback};
