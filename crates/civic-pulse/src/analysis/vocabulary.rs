//! Fixed civic vocabularies: topic set, urgency cues, fallback keywords.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// The twelve civic topics, in tie-break order.
pub const CIVIC_TOPICS: [&str; 12] = [
    "infrastructure",
    "water supply",
    "electricity",
    "sanitation",
    "public safety",
    "health",
    "transport",
    "garbage collection",
    "road maintenance",
    "education",
    "pollution",
    "government services",
];

/// Urgency cues. Order is a priority ranking: the first match is reported.
pub const URGENT_KEYWORDS: [&str; 15] = [
    "urgent",
    "immediately",
    "emergency",
    "accident",
    "fire",
    "flood",
    "collapsed",
    "danger",
    "ambulance",
    "police",
    "dead",
    "injured",
    "asap",
    "violence",
    "attack",
];

/// Keywords counted by the topic fallback.
pub const TOPIC_KEYWORDS: [(&str, &[&str]); 12] = [
    ("infrastructure", &["road", "footpath", "building", "bridge"]),
    ("water supply", &["water", "tap", "pipeline", "leak"]),
    ("electricity", &["electric", "light", "power", "wire"]),
    ("sanitation", &["toilet", "drain", "sewage", "cleaning"]),
    ("public safety", &["crime", "police", "violence", "unsafe"]),
    ("health", &["hospital", "clinic", "medicine", "doctor"]),
    ("transport", &["bus", "metro", "train", "transport"]),
    ("garbage collection", &["garbage", "trash", "waste", "bin"]),
    ("road maintenance", &["pothole", "road", "repair", "construction"]),
    ("education", &["school", "teacher", "education"]),
    ("pollution", &["pollution", "smoke", "air", "noise"]),
    (
        "government services",
        &["ration", "subsidy", "aadhar", "passport", "government"],
    ),
];

/// Keywords for one topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicKeywords {
    pub topic: String,
    pub keywords: Vec<String>,
}

/// On-disk shape of a vocabulary override file (TOML).
#[derive(Debug, Deserialize)]
struct VocabularyFile {
    topics: Vec<String>,
    urgency_keywords: Vec<String>,
    topic_keywords: Vec<TopicKeywords>,
}

/// Validated, read-only vocabulary shared by every pipeline stage.
///
/// All entries are trimmed and lowercased. `topic_keywords` is stored in
/// topic-set order, one entry per topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Vocabulary {
    topics: Vec<String>,
    urgency_keywords: Vec<String>,
    topic_keywords: Vec<TopicKeywords>,
}

impl Vocabulary {
    /// Build and validate a vocabulary.
    pub fn new(
        topics: Vec<String>,
        urgency_keywords: Vec<String>,
        topic_keywords: Vec<TopicKeywords>,
    ) -> Result<Self, ConfigError> {
        let topics = normalize_list("topics", topics)?;
        let urgency_keywords = normalize_list("urgency_keywords", urgency_keywords)?;

        for (i, topic) in topics.iter().enumerate() {
            if topics[..i].contains(topic) {
                return Err(invalid(format!("duplicate topic '{topic}'")));
            }
        }

        let mut normalized: Vec<TopicKeywords> = Vec::with_capacity(topic_keywords.len());
        for entry in topic_keywords {
            let topic = entry.topic.trim().to_lowercase();
            if !topics.contains(&topic) {
                return Err(invalid(format!(
                    "keywords given for unknown topic '{topic}'"
                )));
            }
            if normalized.iter().any(|e| e.topic == topic) {
                return Err(invalid(format!("keywords for '{topic}' given twice")));
            }
            let keywords = normalize_list(&format!("keywords for '{topic}'"), entry.keywords)?;
            normalized.push(TopicKeywords { topic, keywords });
        }

        // Re-order into topic-set order and require full coverage.
        let mut ordered = Vec::with_capacity(topics.len());
        for topic in &topics {
            let Some(pos) = normalized.iter().position(|e| &e.topic == topic) else {
                return Err(invalid(format!("topic '{topic}' has no fallback keywords")));
            };
            ordered.push(normalized.swap_remove(pos));
        }

        Ok(Self {
            topics,
            urgency_keywords,
            topic_keywords: ordered,
        })
    }

    /// The built-in civic vocabulary.
    #[must_use]
    pub fn civic_default() -> Self {
        let topic_keywords = TOPIC_KEYWORDS
            .iter()
            .map(|(topic, kws)| TopicKeywords {
                topic: (*topic).to_string(),
                keywords: kws.iter().map(|k| (*k).to_string()).collect(),
            })
            .collect();

        // The constants above are known-valid; validation cannot fail.
        Self {
            topics: CIVIC_TOPICS.iter().map(|t| (*t).to_string()).collect(),
            urgency_keywords: URGENT_KEYWORDS.iter().map(|k| (*k).to_string()).collect(),
            topic_keywords,
        }
    }

    /// Load a vocabulary override from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let raw: VocabularyFile = toml::from_str(&content).map_err(|e| ConfigError::FileParse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::new(raw.topics, raw.urgency_keywords, raw.topic_keywords)
    }

    /// Topics in tie-break order.
    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    /// Urgency keywords in priority order.
    pub fn urgency_keywords(&self) -> &[String] {
        &self.urgency_keywords
    }

    /// Fallback keywords, one entry per topic in topic-set order.
    pub fn topic_keywords(&self) -> &[TopicKeywords] {
        &self.topic_keywords
    }

    /// Check whether a topic is part of the fixed set.
    pub fn contains_topic(&self, topic: &str) -> bool {
        self.topics.iter().any(|t| t == topic)
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::civic_default()
    }
}

fn invalid(reason: String) -> ConfigError {
    ConfigError::InvalidVocabulary { reason }
}

fn normalize_list(name: &str, items: Vec<String>) -> Result<Vec<String>, ConfigError> {
    if items.is_empty() {
        return Err(invalid(format!("{name} must not be empty")));
    }
    items
        .into_iter()
        .map(|item| {
            let item = item.trim().to_lowercase();
            if item.is_empty() {
                Err(invalid(format!("{name} contains a blank entry")))
            } else {
                Ok(item)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn kws(topic: &str, words: &[&str]) -> TopicKeywords {
        TopicKeywords {
            topic: topic.to_string(),
            keywords: words.iter().map(|w| (*w).to_string()).collect(),
        }
    }

    #[test]
    fn test_default_is_valid() {
        let default = Vocabulary::civic_default();
        let rebuilt = Vocabulary::new(
            default.topics().to_vec(),
            default.urgency_keywords().to_vec(),
            default.topic_keywords().to_vec(),
        )
        .unwrap();
        assert_eq!(default, rebuilt);
        assert_eq!(default.topics().len(), 12);
        assert_eq!(default.urgency_keywords()[0], "urgent");
    }

    #[test]
    fn test_rejects_empty_lists() {
        let err = Vocabulary::new(vec![], vec!["fire".into()], vec![]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidVocabulary { .. }));

        let err = Vocabulary::new(vec!["health".into()], vec![], vec![kws("health", &["doctor"])])
            .unwrap_err();
        assert!(err.to_string().contains("urgency_keywords"));
    }

    #[test]
    fn test_rejects_missing_and_unknown_topics() {
        let err = Vocabulary::new(
            vec!["health".into(), "education".into()],
            vec!["fire".into()],
            vec![kws("health", &["doctor"])],
        )
        .unwrap_err();
        assert!(err.to_string().contains("education"));

        let err = Vocabulary::new(
            vec!["health".into()],
            vec!["fire".into()],
            vec![kws("health", &["doctor"]), kws("sports", &["cricket"])],
        )
        .unwrap_err();
        assert!(err.to_string().contains("sports"));
    }

    #[test]
    fn test_normalizes_and_orders() {
        let vocab = Vocabulary::new(
            vec![" Health ".into(), "Education".into()],
            vec!["FIRE".into()],
            vec![kws("education", &["School"]), kws("HEALTH", &["Doctor"])],
        )
        .unwrap();
        assert_eq!(vocab.topics(), ["health", "education"]);
        assert_eq!(vocab.urgency_keywords(), ["fire"]);
        assert_eq!(vocab.topic_keywords()[0].topic, "health");
        assert_eq!(vocab.topic_keywords()[1].keywords, ["school"]);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
topics = ["water supply", "health"]
urgency_keywords = ["flood"]

[[topic_keywords]]
topic = "water supply"
keywords = ["water"]

[[topic_keywords]]
topic = "health"
keywords = ["doctor"]
"#
        )
        .unwrap();

        let vocab = Vocabulary::from_file(file.path()).unwrap();
        assert!(vocab.contains_topic("health"));
        assert!(!vocab.contains_topic("transport"));
    }
}
