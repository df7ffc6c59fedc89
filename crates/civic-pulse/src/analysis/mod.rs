//! Feedback analysis stages.
//!
//! Each stage is a pure function of its input text and the read-only
//! [`AnalysisContext`] built once at startup.

mod bayes;
mod context;
mod language;
mod lexicon;
mod priority;
mod sentiment;
mod tokens;
mod topic;
mod urgency;
mod vocabulary;

pub use bayes::{load_corpus, LabelledExample, NaiveBayes};
pub use context::AnalysisContext;
pub use language::{
    Detection, GlossaryTranslator, LanguageDetector, LanguageNormalizer, Normalization,
    NormalizedText, Script, ScriptDetector, Translation, Translator, ENGLISH, ROMANIZED_HINDI,
    UNDETERMINED,
};
pub use lexicon::Lexicon;
pub use priority::{
    priority_score, priority_score_for_label, sentiment_weight, urgency_weight, MAX_PRIORITY,
    MIN_PRIORITY,
};
pub use sentiment::{
    LearnedSentiment, LexiconSentiment, Sentiment, SentimentBackend, SentimentClassifier,
    SentimentModel,
};
pub use topic::{
    keyword_topic, LearnedTopicModel, TopicClassifier, TopicDecision, TopicModel, TopicScores,
    TopicTier, DEFAULT_TOPIC_THRESHOLD,
};
pub use urgency::{Urgency, UrgencyAssessment, UrgencyDetector, NO_URGENT_KEYWORD};
pub use vocabulary::{TopicKeywords, Vocabulary, CIVIC_TOPICS, TOPIC_KEYWORDS, URGENT_KEYWORDS};
