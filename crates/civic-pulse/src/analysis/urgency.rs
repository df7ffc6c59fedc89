//! Keyword-driven urgency detection.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::vocabulary::Vocabulary;

/// Reason reported when no urgency cue is present.
pub const NO_URGENT_KEYWORD: &str = "No urgent keyword found";

/// Urgency label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Urgency {
    Urgent,
    #[serde(rename = "Not Urgent")]
    NotUrgent,
}

impl Urgency {
    /// Parse a label, accepting the spaced and unspaced spellings.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "urgent" => Some(Urgency::Urgent),
            "not urgent" | "noturgent" | "not_urgent" => Some(Urgency::NotUrgent),
            _ => None,
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Urgency::Urgent => write!(f, "Urgent"),
            Urgency::NotUrgent => write!(f, "Not Urgent"),
        }
    }
}

/// Urgency label with the cue that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrgencyAssessment {
    pub urgency: Urgency,
    pub reason: String,
}

/// Scans text for the first urgency keyword, in vocabulary order.
#[derive(Debug, Clone)]
pub struct UrgencyDetector {
    patterns: Vec<(String, Regex)>,
}

impl UrgencyDetector {
    /// Compile one whole-word, case-insensitive pattern per keyword.
    ///
    /// The keyword must sit between non-word characters or the text ends,
    /// so keywords that begin or end with punctuation still match.
    pub fn new(vocabulary: &Vocabulary) -> Self {
        let patterns = vocabulary
            .urgency_keywords()
            .iter()
            .map(|kw| {
                let pattern = format!(r"(?i)(?:^|\W){}(?:\W|$)", regex::escape(kw));
                let re = Regex::new(&pattern).expect("escaped keyword is a valid pattern");
                (kw.clone(), re)
            })
            .collect();
        Self { patterns }
    }

    /// Report the first keyword in list order that occurs as a whole word.
    pub fn detect(&self, text: &str) -> UrgencyAssessment {
        for (keyword, re) in &self.patterns {
            if re.is_match(text) {
                tracing::trace!(keyword = %keyword, "Urgency keyword matched");
                return UrgencyAssessment {
                    urgency: Urgency::Urgent,
                    reason: format!("Detected keyword: '{keyword}'"),
                };
            }
        }
        UrgencyAssessment {
            urgency: Urgency::NotUrgent,
            reason: NO_URGENT_KEYWORD.to_string(),
        }
    }
}
