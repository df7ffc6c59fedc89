//! Feedback analyzer - runs every stage over a post and assembles the record.

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize, Serializer};
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::analysis::{
    priority_score, AnalysisContext, Normalization, NormalizedText, Sentiment, TopicScores,
    TopicTier, Urgency,
};
use crate::config::{BatchFailurePolicy, PulseConfig};
use crate::error::{AnalysisError, ConfigError, NormalizeError};

/// Analysis result for one post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub original_text: String,
    /// English-equivalent text all classifiers ran on.
    pub normalized_text: String,
    pub normalization: Normalization,
    pub sentiment: Sentiment,
    pub urgency: Urgency,
    pub urgency_reason: String,
    pub topic: String,
    pub topic_scores: TopicScores,
    pub topic_tier: TopicTier,
    pub priority_score: u8,
}

/// One slot of a batch, tagged with its input position.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BatchOutcome {
    Ok {
        index: usize,
        record: FeedbackRecord,
    },
    Failed {
        index: usize,
        #[serde(serialize_with = "serialize_display")]
        error: AnalysisError,
    },
}

impl BatchOutcome {
    fn from_result(index: usize, result: Result<FeedbackRecord, AnalysisError>) -> Self {
        match result {
            Ok(record) => BatchOutcome::Ok { index, record },
            Err(error) => BatchOutcome::Failed { index, error },
        }
    }

    pub fn index(&self) -> usize {
        match self {
            BatchOutcome::Ok { index, .. } | BatchOutcome::Failed { index, .. } => *index,
        }
    }

    pub fn record(&self) -> Option<&FeedbackRecord> {
        match self {
            BatchOutcome::Ok { record, .. } => Some(record),
            BatchOutcome::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, BatchOutcome::Failed { .. })
    }
}

fn serialize_display<S: Serializer>(error: &AnalysisError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// Batch output in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    /// Outcomes in input order. Under the drop policy, failures are moved
    /// out to `dropped`.
    pub outcomes: Vec<BatchOutcome>,
    pub dropped: Vec<BatchOutcome>,
}

impl BatchReport {
    fn assemble(outcomes: Vec<BatchOutcome>, policy: BatchFailurePolicy) -> Self {
        for outcome in &outcomes {
            if let BatchOutcome::Failed { index, error } = outcome {
                tracing::warn!(index, error = %error, "Batch item failed");
            }
        }

        match policy {
            BatchFailurePolicy::Surface => Self {
                outcomes,
                dropped: Vec::new(),
            },
            BatchFailurePolicy::Drop => {
                let (dropped, outcomes): (Vec<_>, Vec<_>) =
                    outcomes.into_iter().partition(BatchOutcome::is_failed);
                Self { outcomes, dropped }
            }
        }
    }

    /// Successful records in input order.
    pub fn records(&self) -> impl Iterator<Item = &FeedbackRecord> {
        self.outcomes.iter().filter_map(BatchOutcome::record)
    }

    /// Every failure, kept or dropped, as `(index, error)` in input order.
    pub fn failures(&self) -> Vec<(usize, &AnalysisError)> {
        let mut failures: Vec<(usize, &AnalysisError)> = self
            .outcomes
            .iter()
            .chain(&self.dropped)
            .filter_map(|outcome| match outcome {
                BatchOutcome::Failed { index, error } => Some((*index, error)),
                BatchOutcome::Ok { .. } => None,
            })
            .collect();
        failures.sort_by_key(|(index, _)| *index);
        failures
    }

    pub fn summary(&self) -> FeedbackSummary {
        let mut summary = FeedbackSummary::from_records(self.records());
        summary.failed = self.failures().len();
        summary
    }
}

/// Counts by sentiment, urgency and topic.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeedbackSummary {
    pub total: usize,
    pub failed: usize,
    pub by_sentiment: BTreeMap<String, usize>,
    pub by_urgency: BTreeMap<String, usize>,
    pub by_topic: BTreeMap<String, usize>,
    pub mean_priority: f64,
}

impl FeedbackSummary {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a FeedbackRecord>) -> Self {
        let mut summary = Self::default();
        let mut priority_sum = 0u64;
        for record in records {
            summary.total += 1;
            priority_sum += u64::from(record.priority_score);
            *summary
                .by_sentiment
                .entry(record.sentiment.to_string())
                .or_default() += 1;
            *summary.by_urgency.entry(record.urgency.to_string()).or_default() += 1;
            *summary.by_topic.entry(record.topic.clone()).or_default() += 1;
        }
        if summary.total > 0 {
            summary.mean_priority = priority_sum as f64 / summary.total as f64;
        }
        summary
    }

    /// Share of records that are urgent, 0.0 when empty.
    pub fn urgent_share(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let urgent = self
            .by_urgency
            .get(&Urgency::Urgent.to_string())
            .copied()
            .unwrap_or(0);
        urgent as f64 / self.total as f64
    }
}

/// The single analysis entry point.
#[derive(Debug, Clone)]
pub struct FeedbackAnalyzer {
    context: Arc<AnalysisContext>,
    policy: BatchFailurePolicy,
}

impl FeedbackAnalyzer {
    pub fn new(context: Arc<AnalysisContext>, policy: BatchFailurePolicy) -> Self {
        Self { context, policy }
    }

    /// Build the context from configuration and wrap it.
    pub fn from_config(config: &PulseConfig) -> Result<Self, ConfigError> {
        let context = AnalysisContext::from_config(config)?;
        Ok(Self::new(Arc::new(context), config.batch_failure_policy))
    }

    pub fn context(&self) -> &AnalysisContext {
        &self.context
    }

    pub fn policy(&self) -> BatchFailurePolicy {
        self.policy
    }

    /// Analyze one post.
    ///
    /// Any string, empty or oversized included, yields a record. The only
    /// error is a pluggable stage panicking, which is caught and reported
    /// as `Worker`.
    pub fn analyze(&self, text: &str) -> Result<FeedbackRecord, AnalysisError> {
        analyze_isolated(&self.context, text)
    }

    /// Analyze posts one after another, preserving input order. A panic
    /// inside one item becomes a `Worker` failure for that item only.
    pub fn analyze_batch<S: AsRef<str>>(&self, texts: &[S]) -> BatchReport {
        let outcomes = texts
            .iter()
            .enumerate()
            .map(|(index, text)| BatchOutcome::from_result(index, self.analyze(text.as_ref())))
            .collect();
        BatchReport::assemble(outcomes, self.policy)
    }

    /// Analyze posts on the blocking pool with at most `workers` in flight.
    ///
    /// Output order matches input order. A panic inside one item becomes a
    /// `Worker` failure for that item only.
    pub async fn analyze_batch_parallel(&self, texts: Vec<String>, workers: usize) -> BatchReport {
        let workers = workers.max(1);
        tracing::debug!(items = texts.len(), workers, "Starting parallel batch");

        let outcomes: Vec<BatchOutcome> = stream::iter(texts.into_iter().enumerate())
            .map(|(index, text)| {
                let context = Arc::clone(&self.context);
                async move {
                    let result = tokio::task::spawn_blocking(move || analyze_isolated(&context, &text))
                        .await
                        .unwrap_or_else(|e| {
                            Err(AnalysisError::Worker {
                                reason: e.to_string(),
                            })
                        });
                    BatchOutcome::from_result(index, result)
                }
            })
            .buffered(workers)
            .collect()
            .await;

        BatchReport::assemble(outcomes, self.policy)
    }
}

fn analyze_isolated(context: &AnalysisContext, text: &str) -> Result<FeedbackRecord, AnalysisError> {
    panic::catch_unwind(AssertUnwindSafe(|| analyze_with(context, text))).map_err(|payload| {
        let reason = panic_message(payload.as_ref());
        tracing::error!(reason = %reason, "Analysis stage panicked");
        AnalysisError::Worker { reason }
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic in analysis stage".to_string()
    }
}

fn analyze_with(context: &AnalysisContext, text: &str) -> FeedbackRecord {
    // Oversized text skips translation; classification still runs on it.
    let chars = text.chars().count();
    let normalized = if chars > context.max_text_chars() {
        tracing::debug!(chars, max = context.max_text_chars(), "Text over translation limit");
        NormalizedText::degraded(
            text,
            None,
            &NormalizeError::TooLong {
                chars,
                max: context.max_text_chars(),
            },
        )
    } else {
        context.normalizer().normalize(text)
    };
    let sentiment = context.sentiment().classify(&normalized.text);
    let urgency = context.urgency().detect(&normalized.text);
    let topic = context.topic().classify(&normalized.text);
    let priority = priority_score(sentiment, urgency.urgency);

    tracing::debug!(
        sentiment = %sentiment,
        urgency = %urgency.urgency,
        topic = %topic.topic,
        priority,
        "Analyzed post"
    );

    FeedbackRecord {
        original_text: text.to_string(),
        normalized_text: normalized.text,
        normalization: normalized.outcome,
        sentiment,
        urgency: urgency.urgency,
        urgency_reason: urgency.reason,
        topic: topic.topic,
        topic_scores: topic.scores,
        topic_tier: topic.tier,
        priority_score: priority,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{
        LanguageNormalizer, SentimentClassifier, SentimentModel, TopicClassifier, Vocabulary,
    };
    use crate::error::ModelError;

    const FIRE: &str = "There was a fire near the bus stand. Immediate help needed.";
    const FOOTPATH: &str = "The new footpath construction is amazing!";

    fn analyzer(policy: BatchFailurePolicy) -> FeedbackAnalyzer {
        FeedbackAnalyzer::new(Arc::new(AnalysisContext::civic_default()), policy)
    }

    /// Panics on any text containing "boom".
    struct PanickyModel;

    impl SentimentModel for PanickyModel {
        fn name(&self) -> &'static str {
            "panicky"
        }

        fn classify(&self, text: &str) -> Result<Sentiment, ModelError> {
            assert!(!text.contains("boom"), "model blew up");
            Ok(Sentiment::Neutral)
        }
    }

    fn panicky_analyzer(policy: BatchFailurePolicy) -> FeedbackAnalyzer {
        let vocabulary = Arc::new(Vocabulary::civic_default());
        let context = AnalysisContext::new(
            vocabulary.clone(),
            LanguageNormalizer::builtin(),
            SentimentClassifier::with_model(Arc::new(PanickyModel)),
            TopicClassifier::keyword_only(vocabulary),
            100,
        );
        FeedbackAnalyzer::new(Arc::new(context), policy)
    }

    #[test]
    fn test_fire_report() {
        let record = analyzer(BatchFailurePolicy::Surface).analyze(FIRE).unwrap();
        assert_eq!(record.urgency, Urgency::Urgent);
        assert_eq!(record.sentiment, Sentiment::Negative);
        assert!(["public safety", "transport"].contains(&record.topic.as_str()));
        assert_eq!(record.priority_score, 100);
        assert_eq!(record.normalization, Normalization::English);
        assert_eq!(record.normalized_text, FIRE);
    }

    #[test]
    fn test_footpath_praise() {
        let record = analyzer(BatchFailurePolicy::Surface).analyze(FOOTPATH).unwrap();
        assert_eq!(record.urgency, Urgency::NotUrgent);
        assert_eq!(record.urgency_reason, "No urgent keyword found");
        assert_eq!(record.sentiment, Sentiment::Positive);
        assert_eq!(record.topic, "infrastructure");
        assert_eq!(record.topic_tier, TopicTier::Keyword);
        assert_eq!(record.priority_score, 10);
    }

    #[test]
    fn test_blank_text_still_yields_record() {
        let analyzer = analyzer(BatchFailurePolicy::Surface);
        for text in ["", "   \n"] {
            let record = analyzer.analyze(text).unwrap();
            assert_eq!(record.original_text, text);
            assert_eq!(record.sentiment, Sentiment::Neutral);
            assert_eq!(record.urgency, Urgency::NotUrgent);
            assert_eq!(record.topic, "infrastructure");
            assert_eq!(record.priority_score, 30);
            assert!(record.normalization.is_degraded());
        }
    }

    #[test]
    fn test_oversized_text_skips_translation() {
        let long = "road ".repeat(2001);
        let record = analyzer(BatchFailurePolicy::Surface).analyze(&long).unwrap();
        assert_eq!(
            record.normalization,
            Normalization::Degraded {
                language: None,
                reason: "Text has 10005 characters, translation limit is 10000".into()
            }
        );
        assert_eq!(record.normalized_text, long);
        assert_eq!(record.topic, "infrastructure");
        assert_eq!(record.sentiment, Sentiment::Neutral);
        assert_eq!(record.priority_score, 30);
    }

    #[test]
    fn test_oversized_text_is_still_classified() {
        let long = format!("{} fire", "x".repeat(200));
        let analyzer = panicky_analyzer(BatchFailurePolicy::Surface);
        let record = analyzer.analyze(&long).unwrap();
        assert!(record.normalization.is_degraded());
        assert_eq!(record.urgency, Urgency::Urgent);
        assert_eq!(record.urgency_reason, "Detected keyword: 'fire'");
    }

    #[test]
    fn test_single_item_panic_is_caught() {
        let analyzer = panicky_analyzer(BatchFailurePolicy::Surface);
        assert_eq!(
            analyzer.analyze("boom"),
            Err(AnalysisError::Worker {
                reason: "model blew up".into()
            })
        );
    }

    #[test]
    fn test_batch_matches_single_items() {
        let analyzer = analyzer(BatchFailurePolicy::Surface);
        let texts = [FIRE, FOOTPATH, FIRE];
        let report = analyzer.analyze_batch(&texts);

        assert_eq!(report.outcomes.len(), 3);
        for (outcome, text) in report.outcomes.iter().zip(texts) {
            assert_eq!(outcome.record(), Some(&analyzer.analyze(text).unwrap()));
        }
        assert_eq!(
            report.outcomes.iter().map(BatchOutcome::index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn test_sequential_panic_is_isolated() {
        let report = panicky_analyzer(BatchFailurePolicy::Surface).analyze_batch(&[
            "road ok", "boom", "bus late",
        ]);
        assert_eq!(report.outcomes.len(), 3);
        assert!(report.outcomes[0].record().is_some());
        assert!(report.outcomes[1].is_failed());
        assert!(report.outcomes[2].record().is_some());
        assert_eq!(report.records().count(), 2);
        assert_eq!(
            report.failures(),
            vec![(
                1,
                &AnalysisError::Worker {
                    reason: "model blew up".into()
                }
            )]
        );
        assert!(report.dropped.is_empty());
    }

    #[test]
    fn test_batch_drop_moves_failure_out() {
        let report =
            panicky_analyzer(BatchFailurePolicy::Drop).analyze_batch(&["road ok", "boom", "bus late"]);
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.outcomes[1].index(), 2);
        assert_eq!(report.dropped.len(), 1);
        assert_eq!(report.failures()[0].0, 1);
    }

    #[test]
    fn test_batch_blank_items_are_records() {
        let report = analyzer(BatchFailurePolicy::Drop).analyze_batch(&[FIRE, "", FOOTPATH]);
        assert_eq!(report.outcomes.len(), 3);
        assert!(report.failures().is_empty());
        assert_eq!(report.outcomes[1].record().map(|r| r.priority_score), Some(30));
    }

    #[test]
    fn test_empty_batch() {
        let report = analyzer(BatchFailurePolicy::Surface).analyze_batch::<&str>(&[]);
        assert!(report.outcomes.is_empty());
        assert_eq!(report.summary().total, 0);
        assert!(report.summary().mean_priority.abs() < f64::EPSILON);
    }

    #[test]
    fn test_summary() {
        let report = analyzer(BatchFailurePolicy::Surface).analyze_batch(&[FIRE, FOOTPATH, " ", FOOTPATH]);
        let summary = report.summary();
        assert_eq!(summary.total, 4);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.by_sentiment.get("Negative"), Some(&1));
        assert_eq!(summary.by_sentiment.get("Positive"), Some(&2));
        assert_eq!(summary.by_sentiment.get("Neutral"), Some(&1));
        assert_eq!(summary.by_urgency.get("Not Urgent"), Some(&3));
        assert_eq!(summary.by_topic.get("infrastructure"), Some(&3));
        assert!((summary.mean_priority - 37.5).abs() < f64::EPSILON);
        assert!((summary.urgent_share() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_outcome_serialization() {
        let report = panicky_analyzer(BatchFailurePolicy::Surface).analyze_batch(&["boom", FOOTPATH]);
        let json = serde_json::to_value(&report.outcomes).unwrap();
        assert_eq!(json[0]["status"], "failed");
        assert_eq!(json[0]["error"], "Analysis worker failed: model blew up");
        assert_eq!(json[1]["status"], "ok");
        assert_eq!(json[1]["record"]["urgency"], "Not Urgent");
        assert_eq!(json[1]["record"]["topic_tier"], "keyword");
        assert_eq!(json[1]["record"]["normalization"]["status"], "english");
    }

    #[test]
    fn test_record_roundtrip() {
        let record = analyzer(BatchFailurePolicy::Surface).analyze(FIRE).unwrap();
        let json = serde_json::to_string(&record).unwrap();
        let back: FeedbackRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[tokio::test]
    async fn test_parallel_matches_sequential() {
        let analyzer = analyzer(BatchFailurePolicy::Surface);
        let texts: Vec<String> = [FIRE, FOOTPATH, "", "Power cut since morning", FIRE]
            .iter()
            .map(|t| (*t).to_string())
            .collect();

        let sequential = analyzer.analyze_batch(&texts);
        let parallel = analyzer.analyze_batch_parallel(texts, 2).await;
        assert_eq!(parallel, sequential);
    }

    #[tokio::test]
    async fn test_parallel_panic_is_isolated() {
        let analyzer = panicky_analyzer(BatchFailurePolicy::Surface);
        let texts = vec![
            "road is fine".to_string(),
            "boom".to_string(),
            "bus is late".to_string(),
        ];
        let report = analyzer.analyze_batch_parallel(texts.clone(), 3).await;
        assert_eq!(report, analyzer.analyze_batch(&texts));

        assert_eq!(report.outcomes.len(), 3);
        assert!(report.outcomes[0].record().is_some());
        assert!(report.outcomes[2].record().is_some());
        let failures = report.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, 1);
        assert!(matches!(failures[0].1, AnalysisError::Worker { .. }));
    }

    #[tokio::test]
    async fn test_parallel_zero_workers_still_runs() {
        let analyzer = analyzer(BatchFailurePolicy::Drop);
        let report = analyzer
            .analyze_batch_parallel(vec![FOOTPATH.to_string()], 0)
            .await;
        assert_eq!(report.records().count(), 1);
    }
}
