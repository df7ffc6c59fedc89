//! Immutable analysis context, built once at startup and shared by reference.

use std::sync::Arc;

use super::bayes::load_corpus;
use super::language::{GlossaryTranslator, LanguageNormalizer, ScriptDetector, Translator};
use super::sentiment::{LearnedSentiment, SentimentBackend, SentimentClassifier};
use super::topic::{LearnedTopicModel, TopicClassifier};
use super::urgency::UrgencyDetector;
use super::vocabulary::Vocabulary;
use crate::config::{PulseConfig, DEFAULT_MAX_TEXT_CHARS};
use crate::error::{ConfigError, ModelError};

/// Everything the pipeline stages read: vocabulary, loaded models, limits.
///
/// Models that fail to load are replaced by their rule-based fallback here,
/// once, and stay that way for the life of the context.
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    vocabulary: Arc<Vocabulary>,
    normalizer: LanguageNormalizer,
    sentiment: SentimentClassifier,
    urgency: UrgencyDetector,
    topic: TopicClassifier,
    max_text_chars: usize,
}

impl AnalysisContext {
    /// Assemble a context from already-built parts.
    pub fn new(
        vocabulary: Arc<Vocabulary>,
        normalizer: LanguageNormalizer,
        sentiment: SentimentClassifier,
        topic: TopicClassifier,
        max_text_chars: usize,
    ) -> Self {
        let urgency = UrgencyDetector::new(&vocabulary);
        Self {
            vocabulary,
            normalizer,
            sentiment,
            urgency,
            topic,
            max_text_chars,
        }
    }

    /// Built-in vocabulary, glossary translation, lexicon sentiment,
    /// keyword topics.
    pub fn civic_default() -> Self {
        let vocabulary = Arc::new(Vocabulary::civic_default());
        Self::new(
            vocabulary.clone(),
            LanguageNormalizer::builtin(),
            SentimentClassifier::lexicon(),
            TopicClassifier::keyword_only(vocabulary),
            DEFAULT_MAX_TEXT_CHARS,
        )
    }

    /// Build from configuration.
    ///
    /// Invalid configuration or vocabulary is an error. Unloadable models
    /// are not: they are logged and their fallback is used.
    pub fn from_config(config: &PulseConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let vocabulary = Arc::new(match &config.vocabulary {
            Some(path) => {
                tracing::info!(path = %path.display(), "Loading vocabulary override");
                Vocabulary::from_file(path)?
            }
            None => Vocabulary::civic_default(),
        });

        let translator: Option<Arc<dyn Translator>> = if config.translation {
            let mut glossary = GlossaryTranslator::builtin();
            if let Some(path) = &config.glossary {
                if let Err(e) = glossary.merge_file(path) {
                    tracing::warn!(error = %e, "Glossary unavailable - using built-in entries only");
                }
            }
            Some(Arc::new(glossary))
        } else {
            tracing::info!("Translation disabled");
            None
        };
        let normalizer = LanguageNormalizer::new(Arc::new(ScriptDetector::new()), translator);

        let sentiment = match config.sentiment_backend {
            SentimentBackend::Lexicon => SentimentClassifier::lexicon(),
            SentimentBackend::Learned => match load_sentiment(config) {
                Ok(model) => SentimentClassifier::with_model(Arc::new(model)),
                Err(e) => {
                    tracing::warn!(error = %e, "Sentiment model unavailable - using lexicon");
                    SentimentClassifier::lexicon()
                }
            },
        };

        let topic = match &config.topic_corpus {
            None => TopicClassifier::keyword_only(vocabulary.clone()),
            Some(path) => match load_corpus(path)
                .and_then(|examples| LearnedTopicModel::train(&examples, &vocabulary))
            {
                Ok(model) => {
                    TopicClassifier::with_model(vocabulary.clone(), Arc::new(model), config.topic_threshold)?
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Topic model unavailable - using keyword fallback");
                    TopicClassifier::keyword_only(vocabulary.clone())
                }
            },
        };

        tracing::info!(
            sentiment = sentiment.backend_name(),
            topic_model = topic.has_model(),
            translation = normalizer.translation_enabled(),
            topics = vocabulary.topics().len(),
            "Analysis context ready"
        );

        Ok(Self::new(
            vocabulary,
            normalizer,
            sentiment,
            topic,
            config.max_text_chars,
        ))
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn normalizer(&self) -> &LanguageNormalizer {
        &self.normalizer
    }

    pub fn sentiment(&self) -> &SentimentClassifier {
        &self.sentiment
    }

    pub fn urgency(&self) -> &UrgencyDetector {
        &self.urgency
    }

    pub fn topic(&self) -> &TopicClassifier {
        &self.topic
    }

    pub fn max_text_chars(&self) -> usize {
        self.max_text_chars
    }
}

fn load_sentiment(config: &PulseConfig) -> Result<LearnedSentiment, ModelError> {
    let Some(path) = &config.sentiment_corpus else {
        return Err(ModelError::CorpusRead {
            path: "<unset>".to_string(),
            reason: "CIVIC_SENTIMENT_CORPUS not set".to_string(),
        });
    };
    LearnedSentiment::train(&load_corpus(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_context() {
        let context = AnalysisContext::from_config(&PulseConfig::default()).unwrap();
        assert_eq!(context.sentiment().backend_name(), "lexicon");
        assert!(!context.topic().has_model());
        assert!(context.normalizer().translation_enabled());
        assert_eq!(context.vocabulary().topics().len(), 12);
    }

    #[test]
    fn test_missing_models_fall_back() {
        let config = PulseConfig {
            sentiment_backend: SentimentBackend::Learned,
            sentiment_corpus: Some(PathBuf::from("/nonexistent/sentiment.json")),
            topic_corpus: Some(PathBuf::from("/nonexistent/topics.json")),
            ..Default::default()
        };
        let context = AnalysisContext::from_config(&config).unwrap();
        assert_eq!(context.sentiment().backend_name(), "lexicon");
        assert!(!context.topic().has_model());
    }

    #[test]
    fn test_learned_models_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let sentiment = dir.path().join("sentiment.json");
        let topics = dir.path().join("topics.json");
        std::fs::write(
            &sentiment,
            r#"[{"text": "great clean park", "label": "Positive"},
                {"text": "broken dirty drain", "label": "Negative"}]"#,
        )
        .unwrap();
        std::fs::write(
            &topics,
            r#"[{"text": "no water in taps", "label": "water supply"},
                {"text": "bus late again", "label": "transport"}]"#,
        )
        .unwrap();

        let config = PulseConfig {
            sentiment_backend: SentimentBackend::Learned,
            sentiment_corpus: Some(sentiment),
            topic_corpus: Some(topics),
            ..Default::default()
        };
        let context = AnalysisContext::from_config(&config).unwrap();
        assert_eq!(context.sentiment().backend_name(), "learned");
        assert!(context.topic().has_model());
    }

    #[test]
    fn test_bundled_corpora_load() {
        let data = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data");
        let mut config = PulseConfig::from_file(&data.join("civic-pulse.toml")).unwrap();
        config.sentiment_corpus = Some(data.join("sentiment_corpus.json"));
        config.topic_corpus = Some(data.join("topic_corpus.json"));

        let context = AnalysisContext::from_config(&config).unwrap();
        assert_eq!(context.sentiment().backend_name(), "learned");
        assert!(context.topic().has_model());
    }

    #[test]
    fn test_invalid_vocabulary_is_a_config_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("vocab.toml");
        std::fs::write(&path, "topics = []\nurgency_keywords = []\ntopic_keywords = []\n").unwrap();

        let config = PulseConfig {
            vocabulary: Some(path),
            ..Default::default()
        };
        assert!(matches!(
            AnalysisContext::from_config(&config),
            Err(ConfigError::InvalidVocabulary { .. })
        ));
    }

    #[test]
    fn test_translation_disabled() {
        let config = PulseConfig {
            translation: false,
            ..Default::default()
        };
        let context = AnalysisContext::from_config(&config).unwrap();
        assert!(!context.normalizer().translation_enabled());
    }
}
