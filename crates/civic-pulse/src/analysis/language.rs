//! Language detection and normalization to English.
//!
//! Detection is script-based; translation is a word-level glossary lookup.
//! Neither is meant to be high quality. What matters downstream is that
//! civic and urgency vocabulary survives into English, and that every
//! failure degrades to the original text instead of aborting analysis.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use regex::Regex;

use super::tokens;
use crate::error::{ConfigError, NormalizeError};

/// ISO 639-1 code for English.
pub const ENGLISH: &str = "en";

/// Tag used for Hindi written in Latin script.
pub const ROMANIZED_HINDI: &str = "hi-Latn";

/// Tag for Latin-script text that matches neither marker set.
pub const UNDETERMINED: &str = "und";

// Below this many words, marker-free Latin text is still taken as English.
const MIN_WORDS_TO_REJECT_ENGLISH: usize = 3;

/// Writing systems the detector distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Script {
    Latin,
    Devanagari,
    Bengali,
    Gurmukhi,
    Gujarati,
    Oriya,
    Tamil,
    Telugu,
    Kannada,
    Malayalam,
    Arabic,
    Cyrillic,
    Han,
    Kana,
    Hangul,
}

impl Script {
    /// Tie-break order when two scripts have equal letter counts.
    const ALL: [Script; 15] = [
        Script::Latin,
        Script::Devanagari,
        Script::Bengali,
        Script::Gurmukhi,
        Script::Gujarati,
        Script::Oriya,
        Script::Tamil,
        Script::Telugu,
        Script::Kannada,
        Script::Malayalam,
        Script::Arabic,
        Script::Cyrillic,
        Script::Han,
        Script::Kana,
        Script::Hangul,
    ];

    /// Script of an alphabetic character, if it is one we track.
    fn of(c: char) -> Option<Self> {
        if !c.is_alphabetic() {
            return None;
        }
        let script = match u32::from(c) {
            0x0041..=0x005A | 0x0061..=0x007A | 0x00C0..=0x024F => Script::Latin,
            0x0400..=0x04FF => Script::Cyrillic,
            0x0600..=0x06FF => Script::Arabic,
            0x0900..=0x097F => Script::Devanagari,
            0x0980..=0x09FF => Script::Bengali,
            0x0A00..=0x0A7F => Script::Gurmukhi,
            0x0A80..=0x0AFF => Script::Gujarati,
            0x0B00..=0x0B7F => Script::Oriya,
            0x0B80..=0x0BFF => Script::Tamil,
            0x0C00..=0x0C7F => Script::Telugu,
            0x0C80..=0x0CFF => Script::Kannada,
            0x0D00..=0x0D7F => Script::Malayalam,
            0x3040..=0x30FF => Script::Kana,
            0x4E00..=0x9FFF => Script::Han,
            0xAC00..=0xD7AF => Script::Hangul,
            _ => return None,
        };
        Some(script)
    }

    /// Most likely language for a non-Latin script.
    fn default_language(self) -> &'static str {
        match self {
            Script::Latin => ENGLISH,
            Script::Devanagari => "hi",
            Script::Bengali => "bn",
            Script::Gurmukhi => "pa",
            Script::Gujarati => "gu",
            Script::Oriya => "or",
            Script::Tamil => "ta",
            Script::Telugu => "te",
            Script::Kannada => "kn",
            Script::Malayalam => "ml",
            Script::Arabic => "ur",
            Script::Cyrillic => "ru",
            Script::Han => "zh",
            Script::Kana => "ja",
            Script::Hangul => "ko",
        }
    }
}

/// Result of language detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Language tag, e.g. `en`, `hi`, `hi-Latn`.
    pub language: String,
    pub script: Script,
    /// Share of letters in the dominant script, 0.0 to 1.0.
    pub confidence: f64,
}

impl Detection {
    pub fn is_english(&self) -> bool {
        self.language == ENGLISH
    }
}

/// Detects the language of a text.
#[cfg_attr(test, mockall::automock)]
pub trait LanguageDetector: Send + Sync {
    fn detect(&self, text: &str) -> Result<Detection, NormalizeError>;
}

// Function words that mark Latin-script text as English or romanized Hindi.
const ENGLISH_MARKERS: &[&str] = &[
    "a", "after", "again", "all", "an", "and", "any", "are", "at", "be", "been", "but", "by",
    "can", "for", "from", "has", "have", "here", "i", "in", "is", "isn't", "it", "its", "my",
    "near", "no", "not", "of", "on", "or", "our", "please", "since", "still", "the", "their",
    "there", "they", "this", "to", "very", "was", "we", "were", "will", "with",
];

const ROMANIZED_HINDI_MARKERS: &[&str] = &[
    "aur", "bahut", "bhi", "hai", "hain", "ho", "kab", "kar", "karo", "kripya", "kya", "mein",
    "nahi", "nahin", "paani", "raha", "rahi", "tha", "thi", "turant",
];

/// Script-counting detector.
#[derive(Debug, Clone, Default)]
pub struct ScriptDetector;

impl ScriptDetector {
    pub fn new() -> Self {
        Self
    }

    fn latin_language(text: &str) -> &'static str {
        let words = tokens::words(text);
        let english = words
            .iter()
            .filter(|w| ENGLISH_MARKERS.contains(&w.as_str()))
            .count();
        let hindi = words
            .iter()
            .filter(|w| ROMANIZED_HINDI_MARKERS.contains(&w.as_str()))
            .count();
        if hindi > english {
            ROMANIZED_HINDI
        } else if english == 0 && words.len() >= MIN_WORDS_TO_REJECT_ENGLISH {
            UNDETERMINED
        } else {
            ENGLISH
        }
    }
}

impl LanguageDetector for ScriptDetector {
    fn detect(&self, text: &str) -> Result<Detection, NormalizeError> {
        let mut counts: HashMap<Script, usize> = HashMap::new();
        for script in text.chars().filter_map(Script::of) {
            *counts.entry(script).or_default() += 1;
        }
        let total: usize = counts.values().sum();
        if total == 0 {
            return Err(NormalizeError::NoAlphabetic);
        }

        let mut dominant = Script::Latin;
        let mut best = 0;
        for script in Script::ALL {
            let n = counts.get(&script).copied().unwrap_or(0);
            if n > best {
                dominant = script;
                best = n;
            }
        }

        let language = if dominant == Script::Latin {
            Self::latin_language(text)
        } else {
            dominant.default_language()
        };

        Ok(Detection {
            language: language.to_string(),
            script: dominant,
            confidence: best as f64 / total as f64,
        })
    }
}

/// Output of a successful translation.
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    pub text: String,
    /// Share of source words that were translated, 0.0 to 1.0.
    pub coverage: f64,
}

/// Translates text into English.
#[cfg_attr(test, mockall::automock)]
pub trait Translator: Send + Sync {
    fn translate(&self, text: &str, source: &Detection) -> Result<Translation, NormalizeError>;
}

static WORD_OR_GAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{L}\p{M}\p{N}]+|[^\p{L}\p{M}\p{N}]+").expect("valid regex"));

static SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").expect("valid regex"));

const HINDI_GLOSSARY: &[(&str, &str)] = &[
    ("अच्छा", "good"),
    ("अपराध", "crime"),
    ("अस्पताल", "hospital"),
    ("आग", "fire"),
    ("आधार", "aadhar"),
    ("आपातकाल", "emergency"),
    ("आपातकालीन", "emergency"),
    ("आपूर्ति", "supply"),
    ("इमारत", "building"),
    ("एम्बुलेंस", "ambulance"),
    ("और", "and"),
    ("का", "of"),
    ("की", "of"),
    ("के", "of"),
    ("कृपया", "please"),
    ("कोई", "any"),
    ("कचरा", "garbage"),
    ("कूड़ा", "garbage"),
    ("खतरनाक", "dangerous"),
    ("खतरा", "danger"),
    ("खराब", "bad"),
    ("गंदगी", "filth"),
    ("गंदा", "dirty"),
    ("गड्ढा", "pothole"),
    ("गड्ढे", "potholes"),
    ("घायल", "injured"),
    ("जल्दी", "quickly"),
    ("टूटा", "broken"),
    ("टूटी", "broken"),
    ("ट्रेन", "train"),
    ("डॉक्टर", "doctor"),
    ("ढह", "collapsed"),
    ("तार", "wire"),
    ("तुरंत", "immediately"),
    ("था", "was"),
    ("थी", "was"),
    ("दवा", "medicine"),
    ("दिन", "day"),
    ("दिनों", "days"),
    ("दीजिए", "give"),
    ("दुर्घटना", "accident"),
    ("दें", "give"),
    ("धन्यवाद", "thanks"),
    ("धुआं", "smoke"),
    ("ध्यान", "attention"),
    ("नल", "tap"),
    ("नहीं", "not"),
    ("नाला", "drain"),
    ("नाली", "drain"),
    ("निर्माण", "construction"),
    ("पर", "on"),
    ("पाइपलाइन", "pipeline"),
    ("पानी", "water"),
    ("पासपोर्ट", "passport"),
    ("पिछले", "last"),
    ("पुल", "bridge"),
    ("पुलिस", "police"),
    ("प्रदूषण", "pollution"),
    ("परेशानी", "problem"),
    ("फुटपाथ", "footpath"),
    ("बंद", "stopped"),
    ("बढ़िया", "great"),
    ("बत्ती", "light"),
    ("बस", "bus"),
    ("बहुत", "very"),
    ("बाढ़", "flood"),
    ("बिजली", "electricity"),
    ("मदद", "help"),
    ("मरम्मत", "repair"),
    ("मृत", "dead"),
    ("मेट्रो", "metro"),
    ("में", "in"),
    ("मौत", "death"),
    ("राशन", "ration"),
    ("रिसाव", "leak"),
    ("रोशनी", "light"),
    ("लीक", "leak"),
    ("लोग", "people"),
    ("शिकायत", "complaint"),
    ("शिक्षक", "teacher"),
    ("शोर", "noise"),
    ("शौचालय", "toilet"),
    ("समस्या", "problem"),
    ("सड़क", "road"),
    ("सड़कें", "roads"),
    ("सप्लाई", "supply"),
    ("सब्सिडी", "subsidy"),
    ("सरकार", "government"),
    ("सरकारी", "government"),
    ("से", "since"),
    ("सीवर", "sewage"),
    ("स्कूल", "school"),
    ("हमला", "attack"),
    ("हवा", "air"),
    ("हिंसा", "violence"),
    ("है", "is"),
    ("हैं", "are"),
];

const ROMANIZED_HINDI_GLOSSARY: &[(&str, &str)] = &[
    ("aag", "fire"),
    ("aur", "and"),
    ("bahut", "very"),
    ("bijli", "electricity"),
    ("din", "day"),
    ("dino", "days"),
    ("gaddha", "pothole"),
    ("gaddhe", "potholes"),
    ("ganda", "dirty"),
    ("hai", "is"),
    ("hain", "are"),
    ("jaldi", "quickly"),
    ("ka", "of"),
    ("kachra", "garbage"),
    ("ke", "of"),
    ("kharab", "bad"),
    ("ki", "of"),
    ("kripya", "please"),
    ("log", "people"),
    ("madad", "help"),
    ("mein", "in"),
    ("nahi", "not"),
    ("nahin", "not"),
    ("nali", "drain"),
    ("paani", "water"),
    ("pul", "bridge"),
    ("sadak", "road"),
    ("se", "since"),
    ("turant", "immediately"),
];

/// Word-by-word glossary translator, keyed by language tag.
#[derive(Debug, Clone, Default)]
pub struct GlossaryTranslator {
    glossaries: HashMap<String, HashMap<String, String>>,
}

impl GlossaryTranslator {
    /// An empty translator; every language is unsupported.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in Hindi glossaries.
    pub fn builtin() -> Self {
        let mut translator = Self::empty();
        translator.extend("hi", HINDI_GLOSSARY.iter().map(|(k, v)| (*k, *v)));
        translator.extend(
            ROMANIZED_HINDI,
            ROMANIZED_HINDI_GLOSSARY.iter().map(|(k, v)| (*k, *v)),
        );
        translator
    }

    /// Add entries for a language; later entries override earlier ones.
    pub fn extend<'a>(&mut self, language: &str, entries: impl IntoIterator<Item = (&'a str, &'a str)>) {
        let glossary = self.glossaries.entry(language.to_string()).or_default();
        for (source, english) in entries {
            glossary.insert(source.to_lowercase(), english.to_string());
        }
    }

    /// Merge a JSON file of `{ "<lang>": { "<word>": "<english>" } }`.
    pub fn merge_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let file: HashMap<String, HashMap<String, String>> = serde_json::from_str(&content)
            .map_err(|e| ConfigError::FileParse {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        for (language, entries) in &file {
            self.extend(language, entries.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        tracing::debug!(path = %path.display(), languages = file.len(), "Merged glossary file");
        Ok(())
    }

    /// Languages with a glossary.
    pub fn languages(&self) -> Vec<&str> {
        let mut langs: Vec<&str> = self.glossaries.keys().map(String::as_str).collect();
        langs.sort_unstable();
        langs
    }
}

impl Translator for GlossaryTranslator {
    fn translate(&self, text: &str, source: &Detection) -> Result<Translation, NormalizeError> {
        let glossary = self.glossaries.get(&source.language).ok_or_else(|| {
            NormalizeError::UnsupportedLanguage {
                language: source.language.clone(),
            }
        })?;

        let mut out = String::with_capacity(text.len());
        let mut words = 0usize;
        let mut translated = 0usize;

        for piece in WORD_OR_GAP.find_iter(text) {
            let piece = piece.as_str();
            let is_word = piece.chars().any(char::is_alphabetic);
            if !is_word {
                // Devanagari danda ends a sentence.
                out.push_str(&piece.replace(['\u{0964}', '\u{0965}'], "."));
                continue;
            }
            words += 1;
            if let Some(english) = glossary.get(&piece.to_lowercase()) {
                translated += 1;
                out.push_str(english);
            } else {
                out.push_str(piece);
            }
        }

        if translated == 0 {
            return Err(NormalizeError::NoCoverage {
                language: source.language.clone(),
            });
        }

        let text = SPACES.replace_all(out.trim(), " ").into_owned();
        Ok(Translation {
            text,
            coverage: translated as f64 / words as f64,
        })
    }
}

/// How the normalized text was obtained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Normalization {
    /// Already English; text unchanged.
    English,
    /// Translated from `language`.
    Translated { language: String, coverage: f64 },
    /// Detection or translation failed; original text kept.
    Degraded {
        #[serde(skip_serializing_if = "Option::is_none", default)]
        language: Option<String>,
        reason: String,
    },
}

impl Normalization {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Normalization::Degraded { .. })
    }
}

/// English-equivalent text plus how it was produced.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedText {
    pub text: String,
    pub outcome: Normalization,
}

impl NormalizedText {
    /// The original text, kept because normalization failed.
    pub fn degraded(text: &str, language: Option<String>, error: &NormalizeError) -> Self {
        Self {
            text: text.to_string(),
            outcome: Normalization::Degraded {
                language,
                reason: error.to_string(),
            },
        }
    }
}

/// Detects language and translates to English, never failing.
#[derive(Clone)]
pub struct LanguageNormalizer {
    detector: Arc<dyn LanguageDetector>,
    /// `None` when translation is disabled.
    translator: Option<Arc<dyn Translator>>,
}

impl LanguageNormalizer {
    pub fn new(detector: Arc<dyn LanguageDetector>, translator: Option<Arc<dyn Translator>>) -> Self {
        Self {
            detector,
            translator,
        }
    }

    /// Script detector and built-in glossary.
    pub fn builtin() -> Self {
        Self::new(
            Arc::new(ScriptDetector::new()),
            Some(Arc::new(GlossaryTranslator::builtin())),
        )
    }

    pub fn translation_enabled(&self) -> bool {
        self.translator.is_some()
    }

    /// Produce an English-equivalent string.
    pub fn normalize(&self, text: &str) -> NormalizedText {
        let detection = match self.detector.detect(text) {
            Ok(d) => d,
            Err(e) => {
                tracing::debug!(error = %e, "Language detection failed, keeping original text");
                return NormalizedText::degraded(text, None, &e);
            }
        };

        if detection.is_english() {
            return NormalizedText {
                text: text.to_string(),
                outcome: Normalization::English,
            };
        }

        let Some(translator) = &self.translator else {
            return NormalizedText::degraded(
                text,
                Some(detection.language),
                &NormalizeError::TranslationDisabled,
            );
        };

        match translator.translate(text, &detection) {
            Ok(translation) => {
                tracing::debug!(
                    language = %detection.language,
                    coverage = translation.coverage,
                    "Translated text"
                );
                NormalizedText {
                    text: translation.text,
                    outcome: Normalization::Translated {
                        language: detection.language,
                        coverage: translation.coverage,
                    },
                }
            }
            Err(e) => {
                tracing::warn!(language = %detection.language, error = %e, "Translation failed, keeping original text");
                NormalizedText::degraded(text, Some(detection.language), &e)
            }
        }
    }
}

impl fmt::Debug for LanguageNormalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanguageNormalizer")
            .field("translation_enabled", &self.translation_enabled())
            .finish_non_exhaustive()
    }
}
