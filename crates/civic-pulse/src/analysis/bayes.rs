//! Multinomial naive Bayes text classifier trained from a labelled corpus.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use super::tokens;
use crate::error::ModelError;

/// Laplace smoothing constant.
const SMOOTHING: f64 = 1.0;

/// One training example.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelledExample {
    pub text: String,
    pub label: String,
}

impl LabelledExample {
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
        }
    }
}

/// Load a JSON array of `{ "text": ..., "label": ... }` examples.
pub fn load_corpus(path: &Path) -> Result<Vec<LabelledExample>, ModelError> {
    let content = std::fs::read_to_string(path).map_err(|e| ModelError::CorpusRead {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&content).map_err(|e| ModelError::CorpusParse {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Trained classifier. Immutable after training.
#[derive(Debug, Clone)]
pub struct NaiveBayes {
    /// Labels in order of first appearance in the corpus.
    labels: Vec<String>,
    log_priors: Vec<f64>,
    token_counts: Vec<HashMap<String, u32>>,
    token_totals: Vec<u32>,
    vocabulary: HashSet<String>,
}

impl NaiveBayes {
    /// Train on the given examples. Labels are kept verbatim.
    pub fn train(examples: &[LabelledExample]) -> Result<Self, ModelError> {
        let mut labels: Vec<String> = Vec::new();
        let mut doc_counts: Vec<u32> = Vec::new();
        let mut token_counts: Vec<HashMap<String, u32>> = Vec::new();
        let mut token_totals: Vec<u32> = Vec::new();
        let mut vocabulary = HashSet::new();
        let mut used = 0u32;

        for example in examples {
            let words = tokens::words(&example.text);
            if words.is_empty() {
                continue;
            }
            let label = example.label.trim();
            let idx = if let Some(idx) = labels.iter().position(|l| l == label) {
                idx
            } else {
                labels.push(label.to_string());
                doc_counts.push(0);
                token_counts.push(HashMap::new());
                token_totals.push(0);
                labels.len() - 1
            };

            doc_counts[idx] += 1;
            for word in words {
                *token_counts[idx].entry(word.clone()).or_default() += 1;
                token_totals[idx] += 1;
                vocabulary.insert(word);
            }
            used += 1;
        }

        if used == 0 {
            return Err(ModelError::EmptyCorpus);
        }
        if labels.len() < 2 {
            return Err(ModelError::TooFewLabels {
                found: labels.len(),
            });
        }

        let log_priors = doc_counts
            .iter()
            .map(|&n| (f64::from(n) / f64::from(used)).ln())
            .collect();

        tracing::debug!(
            examples = used,
            labels = labels.len(),
            vocabulary = vocabulary.len(),
            "Trained naive Bayes model"
        );

        Ok(Self {
            labels,
            log_priors,
            token_counts,
            token_totals,
            vocabulary,
        })
    }

    /// Labels the model can emit.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Posterior probability per label, in label order. Sums to 1.
    ///
    /// Fails with [`ModelError::NoSignal`] when none of the text's tokens
    /// were seen in training; the prior alone is not a prediction.
    pub fn predict(&self, text: &str) -> Result<Vec<(String, f64)>, ModelError> {
        let words: Vec<String> = tokens::words(text)
            .into_iter()
            .filter(|w| self.vocabulary.contains(w))
            .collect();
        if words.is_empty() {
            return Err(ModelError::NoSignal);
        }

        let vocab_size = self.vocabulary.len() as f64;
        let log_posteriors: Vec<f64> = (0..self.labels.len())
            .map(|idx| {
                let denom = f64::from(self.token_totals[idx]) + SMOOTHING * vocab_size;
                words.iter().fold(self.log_priors[idx], |acc, word| {
                    let count = self.token_counts[idx].get(word).copied().unwrap_or(0);
                    acc + ((f64::from(count) + SMOOTHING) / denom).ln()
                })
            })
            .collect();

        // Softmax with max subtraction for stability.
        let max = log_posteriors
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = log_posteriors.iter().map(|lp| (lp - max).exp()).collect();
        let total: f64 = exps.iter().sum();

        Ok(self
            .labels
            .iter()
            .cloned()
            .zip(exps.into_iter().map(|e| e / total))
            .collect())
    }
}
