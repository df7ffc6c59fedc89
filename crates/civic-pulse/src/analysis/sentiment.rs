//! Sentiment classification.
//!
//! Two backends sit behind [`SentimentModel`]: a naive Bayes model trained
//! from a labelled corpus, and the rule-based lexicon. The lexicon also
//! catches any input the learned model cannot score.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::bayes::{LabelledExample, NaiveBayes};
use super::lexicon::Lexicon;
use crate::error::ModelError;

/// Compound score at or above which text is positive.
pub const POSITIVE_THRESHOLD: f64 = 0.05;

/// Compound score at or below which text is negative.
pub const NEGATIVE_THRESHOLD: f64 = -0.05;

/// For a binary learned model, a winning probability below this is neutral.
pub const DEFAULT_NEUTRAL_MARGIN: f64 = 0.6;

/// Three-way sentiment label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    /// Parse a label case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "positive" | "pos" => Some(Sentiment::Positive),
            "neutral" | "neu" => Some(Sentiment::Neutral),
            "negative" | "neg" => Some(Sentiment::Negative),
            _ => None,
        }
    }

    /// Map a compound polarity score onto a label.
    #[must_use]
    pub fn from_compound(compound: f64) -> Self {
        if compound >= POSITIVE_THRESHOLD {
            Sentiment::Positive
        } else if compound <= NEGATIVE_THRESHOLD {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Sentiment::Positive => "Positive",
            Sentiment::Neutral => "Neutral",
            Sentiment::Negative => "Negative",
        };
        write!(f, "{s}")
    }
}

/// Which sentiment backend to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentBackend {
    #[default]
    Lexicon,
    Learned,
}

impl SentimentBackend {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "lexicon" | "rules" => Some(SentimentBackend::Lexicon),
            "learned" | "model" | "bayes" => Some(SentimentBackend::Learned),
            _ => None,
        }
    }
}

/// A sentiment scorer over normalized English text.
pub trait SentimentModel: Send + Sync {
    /// Short backend name for logs and records.
    fn name(&self) -> &'static str;

    /// Classify one text.
    fn classify(&self, text: &str) -> Result<Sentiment, ModelError>;
}

/// Lexicon backend. Never fails.
#[derive(Debug, Clone, Default)]
pub struct LexiconSentiment {
    lexicon: Lexicon,
}

impl LexiconSentiment {
    pub fn new() -> Self {
        Self::default()
    }

    /// The underlying compound score.
    pub fn compound(&self, text: &str) -> f64 {
        self.lexicon.compound(text)
    }
}

impl SentimentModel for LexiconSentiment {
    fn name(&self) -> &'static str {
        "lexicon"
    }

    fn classify(&self, text: &str) -> Result<Sentiment, ModelError> {
        Ok(Sentiment::from_compound(self.compound(text)))
    }
}

/// Learned backend: naive Bayes over a binary or ternary labelled corpus.
#[derive(Debug, Clone)]
pub struct LearnedSentiment {
    model: NaiveBayes,
    /// Parsed label for each of the model's labels, in model order.
    label_map: Vec<Sentiment>,
    has_neutral: bool,
    neutral_margin: f64,
}

impl LearnedSentiment {
    /// Train from examples labelled Positive/Negative (and optionally Neutral).
    pub fn train(examples: &[LabelledExample]) -> Result<Self, ModelError> {
        let model = NaiveBayes::train(examples)?;
        let label_map = model
            .labels()
            .iter()
            .map(|label| {
                Sentiment::parse(label).ok_or_else(|| ModelError::UnknownLabel {
                    label: label.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let has_neutral = label_map.contains(&Sentiment::Neutral);

        Ok(Self {
            model,
            label_map,
            has_neutral,
            neutral_margin: DEFAULT_NEUTRAL_MARGIN,
        })
    }

    /// Override the neutral margin used with binary corpora.
    #[must_use]
    pub fn with_neutral_margin(mut self, margin: f64) -> Self {
        self.neutral_margin = margin;
        self
    }
}

impl SentimentModel for LearnedSentiment {
    fn name(&self) -> &'static str {
        "learned"
    }

    fn classify(&self, text: &str) -> Result<Sentiment, ModelError> {
        let probs = self.model.predict(text)?;
        let (best, prob) = probs
            .iter()
            .enumerate()
            .map(|(i, (_, p))| (i, *p))
            .fold((0, f64::NEG_INFINITY), |acc, cur| if cur.1 > acc.1 { cur } else { acc });

        let label = self.label_map[best];
        if !self.has_neutral && prob < self.neutral_margin {
            return Ok(Sentiment::Neutral);
        }
        Ok(label)
    }
}

/// Runs the configured backend, dropping to the lexicon when it cannot score.
#[derive(Clone)]
pub struct SentimentClassifier {
    primary: Option<Arc<dyn SentimentModel>>,
    fallback: LexiconSentiment,
}

impl SentimentClassifier {
    /// Lexicon only.
    pub fn lexicon() -> Self {
        Self {
            primary: None,
            fallback: LexiconSentiment::new(),
        }
    }

    /// Primary model with lexicon fallback.
    pub fn with_model(model: Arc<dyn SentimentModel>) -> Self {
        Self {
            primary: Some(model),
            fallback: LexiconSentiment::new(),
        }
    }

    /// Name of the backend that runs first.
    pub fn backend_name(&self) -> &'static str {
        self.primary
            .as_ref()
            .map_or_else(|| self.fallback.name(), |m| m.name())
    }

    /// Classify text. Never fails.
    pub fn classify(&self, text: &str) -> Sentiment {
        if let Some(model) = &self.primary {
            match model.classify(text) {
                Ok(sentiment) => return sentiment,
                Err(e) => {
                    tracing::debug!(model = model.name(), error = %e, "Sentiment model could not score text, using lexicon");
                }
            }
        }
        Sentiment::from_compound(self.fallback.compound(text))
    }
}

impl fmt::Debug for SentimentClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SentimentClassifier")
            .field("backend", &self.backend_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binary_corpus() -> Vec<LabelledExample> {
        vec![
            LabelledExample::new("great work on the new park", "POSITIVE"),
            LabelledExample::new("thank you for fixing the streetlight", "POSITIVE"),
            LabelledExample::new("drain overflowing for a week disgusting", "NEGATIVE"),
            LabelledExample::new("no water again this is unacceptable", "NEGATIVE"),
        ]
    }

    #[test]
    fn test_compound_thresholds() {
        assert_eq!(Sentiment::from_compound(0.05), Sentiment::Positive);
        assert_eq!(Sentiment::from_compound(0.049), Sentiment::Neutral);
        assert_eq!(Sentiment::from_compound(-0.049), Sentiment::Neutral);
        assert_eq!(Sentiment::from_compound(-0.05), Sentiment::Negative);
    }

    #[test]
    fn test_lexicon_backend() {
        let model = LexiconSentiment::new();
        assert_eq!(
            model.classify("The new footpath construction is amazing!").unwrap(),
            Sentiment::Positive
        );
        assert_eq!(
            model
                .classify("There was a fire near the bus stand. Immediate help needed.")
                .unwrap(),
            Sentiment::Negative
        );
        assert_eq!(model.classify("Ward office opens at 10").unwrap(), Sentiment::Neutral);
    }

    #[test]
    fn test_learned_backend() {
        let model = LearnedSentiment::train(&binary_corpus()).unwrap();
        assert_eq!(
            model.classify("the drain is overflowing, unacceptable").unwrap(),
            Sentiment::Negative
        );
        assert_eq!(
            model.classify("thank you, great park").unwrap(),
            Sentiment::Positive
        );
    }

    #[test]
    fn test_learned_binary_maps_low_confidence_to_neutral() {
        let model = LearnedSentiment::train(&binary_corpus())
            .unwrap()
            .with_neutral_margin(1.1);
        assert_eq!(model.classify("the park drain").unwrap(), Sentiment::Neutral);
    }

    #[test]
    fn test_learned_rejects_unknown_labels() {
        let corpus = vec![
            LabelledExample::new("good", "Positive"),
            LabelledExample::new("meh", "Mixed"),
        ];
        assert!(matches!(
            LearnedSentiment::train(&corpus),
            Err(ModelError::UnknownLabel { label }) if label == "Mixed"
        ));
    }

    #[test]
    fn test_classifier_falls_back_to_lexicon() {
        let learned = LearnedSentiment::train(&binary_corpus()).unwrap();
        let classifier = SentimentClassifier::with_model(Arc::new(learned));
        assert_eq!(classifier.backend_name(), "learned");
        // No token of this text is in the corpus; the lexicon decides.
        assert_eq!(classifier.classify("horrible smell"), Sentiment::Negative);

        let lexicon = SentimentClassifier::lexicon();
        assert_eq!(lexicon.backend_name(), "lexicon");
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!(SentimentBackend::parse("Learned"), Some(SentimentBackend::Learned));
        assert_eq!(SentimentBackend::parse("lexicon"), Some(SentimentBackend::Lexicon));
        assert_eq!(SentimentBackend::parse("gpt"), None);
    }
}
