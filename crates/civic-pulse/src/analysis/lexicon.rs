//! Valence lexicon and compound polarity scoring.
//!
//! Scores follow the usual rule-based scheme: word valences on a -4..4 scale,
//! negation flips within a short window, intensifiers nudge the magnitude,
//! exclamation marks add emphasis, and the sum is squashed into [-1, 1].

use std::collections::HashMap;

use super::tokens;

/// Normalization constant for the compound squash.
const ALPHA: f64 = 15.0;

/// Multiplier applied to a valence under negation.
const NEGATION_SCALAR: f64 = -0.74;

/// Boost (or damping) added by an intensifier.
const BOOSTER_INCREMENT: f64 = 0.293;

/// Emphasis per exclamation mark, capped at four marks.
const EXCLAMATION_INCREMENT: f64 = 0.292;
const MAX_EXCLAMATIONS: usize = 4;

/// How many preceding tokens a negator reaches.
const NEGATION_WINDOW: usize = 3;

const VALENCES: &[(&str, f64)] = &[
    // positive
    ("amazing", 2.8),
    ("appreciate", 1.7),
    ("appreciated", 2.3),
    ("awesome", 3.1),
    ("beautiful", 2.9),
    ("best", 3.2),
    ("better", 1.9),
    ("clean", 1.7),
    ("commendable", 2.0),
    ("efficient", 1.8),
    ("excellent", 3.2),
    ("fantastic", 2.6),
    ("fixed", 1.3),
    ("glad", 2.0),
    ("good", 1.9),
    ("grateful", 2.0),
    ("great", 3.1),
    ("happy", 2.7),
    ("helpful", 1.8),
    ("impressive", 2.3),
    ("improved", 2.1),
    ("improvement", 2.0),
    ("love", 3.2),
    ("loved", 2.9),
    ("nice", 1.8),
    ("pleased", 1.9),
    ("proud", 2.1),
    ("quick", 1.1),
    ("resolved", 1.5),
    ("safe", 1.9),
    ("satisfied", 1.8),
    ("smooth", 1.6),
    ("superb", 3.1),
    ("thank", 1.5),
    ("thankful", 2.7),
    ("thanks", 1.9),
    ("wonderful", 2.7),
    // negative
    ("accident", -2.1),
    ("afraid", -2.0),
    ("angry", -2.3),
    ("attack", -2.1),
    ("awful", -2.0),
    ("bad", -2.5),
    ("blocked", -1.2),
    ("broken", -2.0),
    ("chaos", -2.0),
    ("collapsed", -2.2),
    ("complain", -1.9),
    ("complaint", -1.5),
    ("corrupt", -3.0),
    ("corruption", -3.1),
    ("crime", -2.5),
    ("damaged", -1.9),
    ("danger", -2.4),
    ("dangerous", -2.1),
    ("dead", -3.3),
    ("death", -2.9),
    ("delay", -1.3),
    ("delayed", -0.9),
    ("dirty", -1.9),
    ("disappointed", -1.9),
    ("emergency", -1.6),
    ("fail", -2.5),
    ("failed", -2.3),
    ("failure", -2.3),
    ("filthy", -2.4),
    ("fire", -2.2),
    ("flood", -1.8),
    ("frustrated", -2.0),
    ("hate", -2.7),
    ("hazard", -2.0),
    ("hazardous", -2.1),
    ("horrible", -2.5),
    ("ignored", -1.3),
    ("injured", -2.2),
    ("injury", -2.3),
    ("killed", -3.5),
    ("lack", -1.3),
    ("leak", -1.4),
    ("leaking", -1.3),
    ("mess", -1.5),
    ("neglect", -2.0),
    ("neglected", -2.4),
    ("outage", -1.5),
    ("overflowing", -1.3),
    ("pain", -2.3),
    ("pathetic", -2.4),
    ("pollution", -1.6),
    ("poor", -2.1),
    ("problem", -1.7),
    ("problems", -1.7),
    ("sad", -2.1),
    ("scared", -2.2),
    ("shame", -2.1),
    ("shameful", -2.2),
    ("shortage", -1.4),
    ("sick", -2.3),
    ("stink", -1.7),
    ("stopped", -1.2),
    ("stuck", -1.0),
    ("suffer", -2.5),
    ("suffering", -2.1),
    ("terrible", -2.1),
    ("unbearable", -2.2),
    ("unsafe", -2.0),
    ("useless", -1.8),
    ("violence", -3.1),
    ("worried", -1.8),
    ("worse", -2.1),
    ("worst", -3.1),
];

const BOOSTERS: &[(&str, f64)] = &[
    ("absolutely", BOOSTER_INCREMENT),
    ("completely", BOOSTER_INCREMENT),
    ("extremely", BOOSTER_INCREMENT),
    ("highly", BOOSTER_INCREMENT),
    ("really", BOOSTER_INCREMENT),
    ("seriously", BOOSTER_INCREMENT),
    ("so", BOOSTER_INCREMENT),
    ("too", BOOSTER_INCREMENT),
    ("totally", BOOSTER_INCREMENT),
    ("very", BOOSTER_INCREMENT),
    ("barely", -BOOSTER_INCREMENT),
    ("slightly", -BOOSTER_INCREMENT),
    ("somewhat", -BOOSTER_INCREMENT),
];

const NEGATORS: &[&str] = &[
    "cannot", "neither", "never", "no", "nobody", "none", "nor", "not", "nothing", "without",
];

/// Rule-based polarity scorer over a fixed valence lexicon.
#[derive(Debug, Clone)]
pub struct Lexicon {
    valences: HashMap<&'static str, f64>,
    boosters: HashMap<&'static str, f64>,
}

impl Lexicon {
    /// Build the built-in lexicon.
    pub fn new() -> Self {
        Self {
            valences: VALENCES.iter().copied().collect(),
            boosters: BOOSTERS.iter().copied().collect(),
        }
    }

    /// Valence of a single lowercase word, if it carries one.
    pub fn valence(&self, word: &str) -> Option<f64> {
        self.valences.get(word).copied()
    }

    /// Compound polarity in [-1, 1].
    pub fn compound(&self, text: &str) -> f64 {
        let words = tokens::words(text);
        let mut sum = 0.0;

        for (i, word) in words.iter().enumerate() {
            let Some(mut valence) = self.valence(word) else {
                continue;
            };

            // Intensifiers: the word right before counts fully, the one
            // before that slightly less.
            for (distance, scale) in [(1, 1.0), (2, 0.95)] {
                if let Some(prev) = i.checked_sub(distance).map(|j| words[j].as_str()) {
                    if let Some(boost) = self.boosters.get(prev) {
                        valence += boost * valence.signum() * scale;
                    }
                }
            }

            let window_start = i.saturating_sub(NEGATION_WINDOW);
            if words[window_start..i].iter().any(|w| is_negator(w)) {
                valence *= NEGATION_SCALAR;
            }

            sum += valence;
        }

        if sum != 0.0 {
            let marks = text.matches('!').count().min(MAX_EXCLAMATIONS);
            sum += marks as f64 * EXCLAMATION_INCREMENT * sum.signum();
        }

        normalize(sum)
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::new()
    }
}

fn is_negator(word: &str) -> bool {
    NEGATORS.contains(&word) || word.ends_with("n't")
}

fn normalize(score: f64) -> f64 {
    (score / (score * score + ALPHA).sqrt()).clamp(-1.0, 1.0)
}
