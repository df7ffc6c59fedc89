//! Feedback store keyed by hashtag.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::analyzer::FeedbackRecord;
use crate::posts::normalize_hashtag;

/// An analyzed post filed under one hashtag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredFeedback {
    /// Source post ID.
    pub post_id: String,
    /// Normalized hashtag this entry is filed under.
    pub hashtag: String,
    /// Author handle, if known.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub author: Option<String>,
    pub record: FeedbackRecord,
    /// When the post was made.
    pub posted_at: DateTime<Utc>,
    /// When it was stored.
    pub stored_at: DateTime<Utc>,
}

impl StoredFeedback {
    #[must_use]
    pub fn new(
        post_id: impl Into<String>,
        hashtag: &str,
        record: FeedbackRecord,
        posted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            post_id: post_id.into(),
            hashtag: normalize_hashtag(hashtag),
            author: None,
            record,
            posted_at,
            stored_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_author(mut self, author: Option<String>) -> Self {
        self.author = author;
        self
    }
}

/// JSON-file store of analyzed feedback, grouped by normalized hashtag.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FeedbackStore {
    /// Map of normalized hashtag to entries.
    pub entries: BTreeMap<String, Vec<StoredFeedback>>,
    /// Last updated timestamp.
    pub updated_at: Option<DateTime<Utc>>,
}

impl FeedbackStore {
    /// Load the store from a JSON file; a missing file is an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read store {}", path.display()))?;
            let store: Self = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse store {}", path.display()))?;
            Ok(store)
        } else {
            Ok(Self::default())
        }
    }

    /// Save the store to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write store {}", path.display()))?;
        Ok(())
    }

    /// Add an entry. Returns `false` if the post is already filed under
    /// that hashtag.
    pub fn add(&mut self, entry: StoredFeedback) -> bool {
        let hashtag = normalize_hashtag(&entry.hashtag);
        if hashtag.is_empty() || self.contains(&hashtag, &entry.post_id) {
            return false;
        }
        let entry = StoredFeedback { hashtag: hashtag.clone(), ..entry };
        self.entries.entry(hashtag).or_default().push(entry);
        self.updated_at = Some(Utc::now());
        true
    }

    /// Check whether a post is filed under a hashtag.
    pub fn contains(&self, hashtag: &str, post_id: &str) -> bool {
        self.entries
            .get(&normalize_hashtag(hashtag))
            .is_some_and(|entries| entries.iter().any(|e| e.post_id == post_id))
    }

    /// Entries for a hashtag with priority at least `min_priority`, highest
    /// priority first, newest first within a priority.
    pub fn query(&self, hashtag: &str, min_priority: u8) -> Vec<&StoredFeedback> {
        let mut entries: Vec<&StoredFeedback> = self
            .entries
            .get(&normalize_hashtag(hashtag))
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| e.record.priority_score >= min_priority)
                    .collect()
            })
            .unwrap_or_default();
        entries.sort_by(|a, b| {
            b.record
                .priority_score
                .cmp(&a.record.priority_score)
                .then_with(|| b.posted_at.cmp(&a.posted_at))
        });
        entries
    }

    /// Known hashtags, sorted.
    pub fn hashtags(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Total entries across all hashtags.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Normalization, Sentiment, TopicScores, TopicTier, Urgency};
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn record(priority: u8) -> FeedbackRecord {
        FeedbackRecord {
            original_text: format!("post with priority {priority}"),
            normalized_text: format!("post with priority {priority}"),
            normalization: Normalization::English,
            sentiment: Sentiment::Neutral,
            urgency: Urgency::NotUrgent,
            urgency_reason: "No urgent keyword found".to_string(),
            topic: "infrastructure".to_string(),
            topic_scores: TopicScores::KeywordHits(vec![("infrastructure".to_string(), 0)]),
            topic_tier: TopicTier::Keyword,
            priority_score: priority,
        }
    }

    fn entry(id: &str, hashtag: &str, priority: u8, day: u32) -> StoredFeedback {
        let posted = Utc.with_ymd_and_hms(2025, 4, day, 12, 0, 0).unwrap();
        StoredFeedback::new(id, hashtag, record(priority), posted)
    }

    #[test]
    fn test_add_dedups_per_hashtag() {
        let mut store = FeedbackStore::default();
        assert!(store.add(entry("1", "#Pune", 30, 1)));
        assert!(!store.add(entry("1", "pune", 80, 2)));
        assert!(store.add(entry("1", "roads", 30, 1)));
        assert_eq!(store.len(), 2);
        assert!(store.contains("PUNE", "1"));
        assert!(!store.add(entry("2", "#", 30, 1)));
    }

    #[test]
    fn test_query_filters_and_orders() {
        let mut store = FeedbackStore::default();
        store.add(entry("a", "pune", 30, 1));
        store.add(entry("b", "pune", 100, 1));
        store.add(entry("c", "pune", 30, 3));
        store.add(entry("d", "pune", 10, 5));

        let ids: Vec<&str> = store
            .query("#Pune", 30)
            .iter()
            .map(|e| e.post_id.as_str())
            .collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
        assert_eq!(store.query("pune", 0).len(), 4);
        assert!(store.query("mumbai", 0).is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let mut store = FeedbackStore::default();
        store.add(entry("1", "Pune", 50, 1).with_author(Some("resident".to_string())));
        store.add(entry("2", "roads", 100, 2));
        store.save(&path).unwrap();

        let loaded = FeedbackStore::load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.hashtags(), vec!["pune", "roads"]);
        assert_eq!(loaded.query("pune", 0)[0], store.query("pune", 0)[0]);
        assert!(loaded.updated_at.is_some());
    }

    #[test]
    fn test_load_missing_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = FeedbackStore::load(&dir.path().join("none.json")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_corrupt_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(FeedbackStore::load(&path).is_err());
    }
}
