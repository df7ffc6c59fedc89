//! Ingest pipeline - orchestrates the load-analyze-store flow for a post dump.

use anyhow::Result;
use std::path::PathBuf;

use crate::analyzer::{BatchOutcome, FeedbackAnalyzer};
use crate::config::DEFAULT_WORKERS;
use crate::posts::{normalize_hashtag, Post, PostParser};
use crate::storage::{AccessEvent, AccessLog, FeedbackStore, StoredFeedback};

/// Configuration for an ingest run.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Hashtag dump to read.
    pub input: PathBuf,
    /// Feedback store file.
    pub store_path: PathBuf,
    /// Optional access log to record the run in.
    pub access_log: Option<PathBuf>,
    /// Concurrent analyses.
    pub workers: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("all_social_issue_tweets.json"),
            store_path: PathBuf::from("data/feedback.json"),
            access_log: None,
            workers: DEFAULT_WORKERS,
        }
    }
}

/// Result of a single ingest run.
#[derive(Debug, Default)]
pub struct IngestResult {
    /// Number of posts in the dump.
    pub fetched: usize,
    /// Number analyzed successfully.
    pub analyzed: usize,
    /// Number of posts that produced at least one new store entry.
    pub saved: usize,
    /// Number skipped (already stored or duplicated in the dump).
    pub skipped: usize,
    /// Errors encountered.
    pub errors: Vec<String>,
}

/// Ingest pipeline orchestrator.
pub struct IngestPipeline {
    config: IngestConfig,
    analyzer: FeedbackAnalyzer,
}

impl IngestPipeline {
    /// Create a new pipeline.
    #[must_use]
    pub fn new(config: IngestConfig, analyzer: FeedbackAnalyzer) -> Self {
        Self { config, analyzer }
    }

    /// Run one ingest cycle.
    pub async fn run(&self) -> Result<IngestResult> {
        let mut result = IngestResult::default();

        tracing::info!(input = %self.config.input.display(), "Starting ingest");

        let dump = PostParser::load_dump(&self.config.input)?;
        let mut store = FeedbackStore::load(&self.config.store_path)?;
        tracing::debug!(stored = store.len(), "Loaded store");

        // Posts still to analyze, paired with the dump key they came under.
        let mut pending: Vec<(String, Post)> = Vec::new();
        for (key, posts) in dump {
            let key = normalize_hashtag(&key);
            for post in posts {
                result.fetched += 1;
                let duplicate = store.contains(&key, &post.id)
                    || pending.iter().any(|(k, p)| *k == key && p.id == post.id);
                if duplicate {
                    tracing::debug!(id = %post.id, hashtag = %key, "Already stored, skipping");
                    result.skipped += 1;
                    continue;
                }
                pending.push((key.clone(), post));
            }
        }

        if pending.is_empty() {
            tracing::info!("No new posts to process");
            return Ok(result);
        }

        let texts: Vec<String> = pending.iter().map(|(_, p)| p.text.clone()).collect();
        let report = self
            .analyzer
            .analyze_batch_parallel(texts, self.config.workers)
            .await;

        for (index, error) in report.failures() {
            let (_, post) = &pending[index];
            tracing::warn!(id = %post.id, error = %error, "Analysis failed");
            result.errors.push(format!("{}: {error}", post.id));
        }

        let mut touched: Vec<String> = Vec::new();
        for outcome in &report.outcomes {
            let BatchOutcome::Ok { index, record } = outcome else {
                continue;
            };
            let (key, post) = &pending[*index];
            result.analyzed += 1;

            let mut hashtags = vec![key.clone()];
            hashtags.extend(post.hashtags().into_iter().filter(|h| h != key));

            let author = post.user.as_ref().and_then(|u| u.screen_name.clone());
            let posted_at = post.posted_at();
            let mut added = 0;
            for hashtag in &hashtags {
                let entry = StoredFeedback::new(post.id.clone(), hashtag, record.clone(), posted_at)
                    .with_author(author.clone());
                if store.add(entry) {
                    added += 1;
                    if !touched.contains(hashtag) {
                        touched.push(hashtag.clone());
                    }
                }
            }

            if added > 0 {
                result.saved += 1;
                tracing::info!(
                    id = %post.id,
                    priority = record.priority_score,
                    topic = %record.topic,
                    hashtags = ?hashtags,
                    "Stored feedback"
                );
            } else {
                result.skipped += 1;
            }
        }

        store.save(&self.config.store_path)?;

        if let Some(path) = &self.config.access_log {
            let log = AccessLog::new(path);
            for hashtag in &touched {
                if let Err(e) = log.append(&AccessEvent::ingest(hashtag)) {
                    tracing::warn!(error = %e, "Failed to append access log");
                }
            }
        }

        tracing::info!(
            fetched = result.fetched,
            analyzed = result.analyzed,
            saved = result.saved,
            skipped = result.skipped,
            errors = result.errors.len(),
            "Ingest complete"
        );

        Ok(result)
    }
}
