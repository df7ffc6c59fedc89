//! Topic classification over the fixed civic topic set.
//!
//! A learned model proposes a distribution over topics; if nothing clears the
//! confidence threshold (or no model is loaded) the keyword counter decides.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

use super::bayes::{LabelledExample, NaiveBayes};
use super::vocabulary::Vocabulary;
use crate::error::{ConfigError, ModelError};

/// Model candidates must score strictly above this.
pub const DEFAULT_TOPIC_THRESHOLD: f64 = 0.2;

/// Which tier produced a topic decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopicTier {
    Model,
    Keyword,
}

/// Per-topic scores, ordered by descending score (ties keep topic-set order).
#[derive(Debug, Clone, PartialEq)]
pub enum TopicScores {
    /// Model probabilities, 0.0 to 1.0.
    Confidence(Vec<(String, f64)>),
    /// Keyword hit counts.
    KeywordHits(Vec<(String, u32)>),
}

impl TopicScores {
    /// Score for one topic as a float.
    pub fn get(&self, topic: &str) -> Option<f64> {
        match self {
            TopicScores::Confidence(v) => v.iter().find(|(t, _)| t == topic).map(|(_, s)| *s),
            TopicScores::KeywordHits(v) => v
                .iter()
                .find(|(t, _)| t == topic)
                .map(|(_, n)| f64::from(*n)),
        }
    }

    /// Topics in score order.
    pub fn topics(&self) -> Vec<&str> {
        match self {
            TopicScores::Confidence(v) => v.iter().map(|(t, _)| t.as_str()).collect(),
            TopicScores::KeywordHits(v) => v.iter().map(|(t, _)| t.as_str()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            TopicScores::Confidence(v) => v.len(),
            TopicScores::KeywordHits(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Serialize for TopicScores {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        match self {
            TopicScores::Confidence(v) => {
                for (topic, score) in v {
                    map.serialize_entry(topic, score)?;
                }
            }
            TopicScores::KeywordHits(v) => {
                for (topic, hits) in v {
                    map.serialize_entry(topic, hits)?;
                }
            }
        }
        map.end()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScoreValue {
    Hits(u32),
    Confidence(f64),
}

struct TopicScoresVisitor;

impl<'de> Visitor<'de> for TopicScoresVisitor {
    type Value = TopicScores;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of topic to score")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut entries: Vec<(String, ScoreValue)> = Vec::new();
        while let Some((topic, value)) = access.next_entry::<String, ScoreValue>()? {
            entries.push((topic, value));
        }

        // Integers throughout means keyword counts.
        if entries.iter().all(|(_, v)| matches!(v, ScoreValue::Hits(_))) {
            let hits = entries
                .into_iter()
                .map(|(t, v)| match v {
                    ScoreValue::Hits(n) => (t, n),
                    ScoreValue::Confidence(_) => unreachable!(),
                })
                .collect();
            return Ok(TopicScores::KeywordHits(hits));
        }

        let confidences = entries
            .into_iter()
            .map(|(t, v)| match v {
                ScoreValue::Hits(n) => (t, f64::from(n)),
                ScoreValue::Confidence(s) => (t, s),
            })
            .collect();
        Ok(TopicScores::Confidence(confidences))
    }
}

impl<'de> Deserialize<'de> for TopicScores {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(TopicScoresVisitor)
    }
}

/// A single-topic decision with its full score map.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicDecision {
    pub topic: String,
    pub scores: TopicScores,
    pub tier: TopicTier,
}

/// A learned scorer that returns a probability for each topic.
pub trait TopicModel: Send + Sync {
    fn name(&self) -> &'static str;

    /// Score every topic in `topics`, in the same order.
    fn score(&self, text: &str, topics: &[String]) -> Result<Vec<(String, f64)>, ModelError>;
}

/// Naive Bayes topic model trained on examples labelled with topic names.
#[derive(Debug, Clone)]
pub struct LearnedTopicModel {
    model: NaiveBayes,
}

impl LearnedTopicModel {
    /// Train, requiring every label to be a vocabulary topic.
    pub fn train(examples: &[LabelledExample], vocabulary: &Vocabulary) -> Result<Self, ModelError> {
        let normalized: Vec<LabelledExample> = examples
            .iter()
            .map(|e| LabelledExample::new(e.text.clone(), e.label.trim().to_lowercase()))
            .collect();
        if let Some(bad) = normalized.iter().find(|e| !vocabulary.contains_topic(&e.label)) {
            return Err(ModelError::UnknownLabel {
                label: bad.label.clone(),
            });
        }
        Ok(Self {
            model: NaiveBayes::train(&normalized)?,
        })
    }
}

impl TopicModel for LearnedTopicModel {
    fn name(&self) -> &'static str {
        "naive-bayes"
    }

    fn score(&self, text: &str, topics: &[String]) -> Result<Vec<(String, f64)>, ModelError> {
        let probs = self.model.predict(text)?;
        // Topics absent from the corpus get zero.
        Ok(topics
            .iter()
            .map(|topic| {
                let p = probs
                    .iter()
                    .find(|(label, _)| label == topic)
                    .map_or(0.0, |(_, p)| *p);
                (topic.clone(), p)
            })
            .collect())
    }
}

/// Two-tier topic classifier.
#[derive(Clone)]
pub struct TopicClassifier {
    vocabulary: Arc<Vocabulary>,
    model: Option<Arc<dyn TopicModel>>,
    threshold: f64,
}

impl TopicClassifier {
    /// Keyword fallback only.
    pub fn keyword_only(vocabulary: Arc<Vocabulary>) -> Self {
        Self {
            vocabulary,
            model: None,
            threshold: DEFAULT_TOPIC_THRESHOLD,
        }
    }

    /// Model first, keyword fallback second.
    pub fn with_model(
        vocabulary: Arc<Vocabulary>,
        model: Arc<dyn TopicModel>,
        threshold: f64,
    ) -> Result<Self, ConfigError> {
        if !(0.0..1.0).contains(&threshold) {
            return Err(ConfigError::InvalidValue {
                key: "topic_threshold".to_string(),
                reason: format!("{threshold} is outside [0, 1)"),
            });
        }
        Ok(Self {
            vocabulary,
            model: Some(model),
            threshold,
        })
    }

    /// Whether a learned model is attached.
    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Pick the single best topic for the text.
    pub fn classify(&self, text: &str) -> TopicDecision {
        if let Some(model) = &self.model {
            match model.score(text, self.vocabulary.topics()) {
                Ok(scores) => {
                    if let Some(decision) = self.decide_from_model(scores) {
                        return decision;
                    }
                    tracing::debug!(
                        threshold = self.threshold,
                        "No topic cleared the model threshold, using keywords"
                    );
                }
                Err(e) => {
                    tracing::debug!(model = model.name(), error = %e, "Topic model could not score text, using keywords");
                }
            }
        }
        keyword_topic(&self.vocabulary, text)
    }

    fn decide_from_model(&self, scores: Vec<(String, f64)>) -> Option<TopicDecision> {
        // Candidates in topic-set order; first maximum wins ties.
        let mut best: Option<(&str, f64)> = None;
        for (topic, score) in &scores {
            if *score > self.threshold && best.is_none_or(|(_, s)| *score > s) {
                best = Some((topic.as_str(), *score));
            }
        }
        let topic = best?.0.to_string();

        let mut ordered = scores;
        ordered.sort_by(|a, b| b.1.total_cmp(&a.1));
        Some(TopicDecision {
            topic,
            scores: TopicScores::Confidence(ordered),
            tier: TopicTier::Model,
        })
    }
}

impl fmt::Debug for TopicClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TopicClassifier")
            .field("model", &self.model.as_ref().map(|m| m.name()))
            .field("threshold", &self.threshold)
            .finish()
    }
}

/// Keyword-count topic: for each topic, how many of its keywords occur as
/// case-insensitive substrings. The first topic reaching the maximum wins,
/// so text with no hits at all lands on the first topic.
pub fn keyword_topic(vocabulary: &Vocabulary, text: &str) -> TopicDecision {
    let lower = text.to_lowercase();
    let counts: Vec<(String, u32)> = vocabulary
        .topic_keywords()
        .iter()
        .map(|entry| {
            let hits = entry
                .keywords
                .iter()
                .filter(|kw| lower.contains(kw.as_str()))
                .count() as u32;
            (entry.topic.clone(), hits)
        })
        .collect();

    let mut best = 0;
    for (i, (_, hits)) in counts.iter().enumerate() {
        if *hits > counts[best].1 {
            best = i;
        }
    }
    let topic = counts[best].0.clone();

    let mut ordered = counts;
    ordered.sort_by(|a, b| b.1.cmp(&a.1));
    TopicDecision {
        topic,
        scores: TopicScores::KeywordHits(ordered),
        tier: TopicTier::Keyword,
    }
}
