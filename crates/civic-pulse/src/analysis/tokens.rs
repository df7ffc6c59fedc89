//! Word tokenization shared by the classifiers.

use regex::Regex;
use std::sync::LazyLock;

// Letters with their combining marks (Indic vowel signs), digits, apostrophes.
static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{L}\p{M}\p{N}]+(?:'[\p{L}]+)?").expect("valid regex"));

/// Split text into lowercase word tokens.
pub fn words(text: &str) -> Vec<String> {
    WORD.find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}
