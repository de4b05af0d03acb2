/*!
 * Heuristic target-language classification.
 *
 * `LanguageClassifier::is_target_language` answers "is this span already in
 * the target language?" without ever failing. A statistical detector is
 * consulted first; when it has no confident answer the classifier falls back
 * to script and common-word heuristics whose thresholds are configurable.
 */

use std::collections::HashSet;
use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::language_utils;

/// Punctuation accepted alongside `a`-`z` by the short-text character ratio
const SHORT_TEXT_EXTRA_CHARS: &str = ",.!? ";

const STANDARD_COMMON_WORDS: &[&str] = &[
    "the", "and", "is", "in", "to", "of", "that", "for", "it", "with",
];

const EXTENDED_COMMON_WORDS: &[&str] = &[
    "the", "and", "is", "in", "to", "of", "that", "for", "it", "with", "this", "on", "are", "as",
    "was", "by", "be", "have", "you", "not",
];

/// Named preset of classifier thresholds
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdProfile {
    #[default]
    Standard,
    Conservative,
}

/// Thresholds used by the heuristic fallback
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierThresholds {
    /// Texts shorter than this (in characters) use the character ratio only
    pub min_length: usize,
    /// Required share of `a`-`z` and light punctuation for short texts
    pub short_text_ratio: f64,
    /// Texts with fewer whitespace tokens use the character ratio; 0 disables
    pub min_words: usize,
    /// Required share of common target-language words
    pub word_ratio: f64,
    /// Above this share of non-target-script characters the text is foreign
    pub non_target_script_ratio: f64,
    /// Lowercase common words of the target language
    pub common_words: Vec<String>,
}

impl ClassifierThresholds {
    pub fn standard() -> Self {
        Self {
            min_length: 15,
            short_text_ratio: 0.7,
            min_words: 0,
            word_ratio: 0.15,
            non_target_script_ratio: 0.3,
            common_words: STANDARD_COMMON_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }

    pub fn conservative() -> Self {
        Self {
            min_length: 15,
            short_text_ratio: 0.6,
            min_words: 5,
            word_ratio: 0.15,
            non_target_script_ratio: 0.2,
            common_words: EXTENDED_COMMON_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }

    pub fn for_profile(profile: ThresholdProfile) -> Self {
        match profile {
            ThresholdProfile::Standard => Self::standard(),
            ThresholdProfile::Conservative => Self::conservative(),
        }
    }
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self::standard()
    }
}

/// A statistical language detector.
///
/// Returns the ISO 639-3 code of the detected language, or `None` when the
/// detector has no confident answer.
pub trait LanguageDetector: Send + Sync + Debug {
    fn detect(&self, text: &str) -> Option<String>;
}

/// Detector backed by `whatlang`, accepting only reliable detections
#[derive(Debug, Default, Clone, Copy)]
pub struct WhatlangDetector;

impl LanguageDetector for WhatlangDetector {
    fn detect(&self, text: &str) -> Option<String> {
        whatlang::detect(text)
            .filter(|info| info.is_reliable())
            .map(|info| info.lang().code().to_string())
    }
}

/// Detector that never answers, leaving every decision to the heuristics
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicOnly;

impl LanguageDetector for HeuristicOnly {
    fn detect(&self, _text: &str) -> Option<String> {
        None
    }
}

/// Decides whether text is already in the target language
#[derive(Debug)]
pub struct LanguageClassifier {
    target_language: String,
    thresholds: ClassifierThresholds,
    common_words: HashSet<String>,
    detector: Box<dyn LanguageDetector>,
}

impl LanguageClassifier {
    pub fn new(
        target_language: impl Into<String>,
        thresholds: ClassifierThresholds,
        detector: Box<dyn LanguageDetector>,
    ) -> Self {
        let common_words = thresholds
            .common_words
            .iter()
            .map(|w| w.to_lowercase())
            .collect();
        Self {
            target_language: target_language.into(),
            thresholds,
            common_words,
            detector,
        }
    }

    /// Classifier using only the heuristics, handy for deterministic callers
    pub fn heuristic(target_language: impl Into<String>, thresholds: ClassifierThresholds) -> Self {
        Self::new(target_language, thresholds, Box::new(HeuristicOnly))
    }

    pub fn target_language(&self) -> &str {
        &self.target_language
    }

    pub fn thresholds(&self) -> &ClassifierThresholds {
        &self.thresholds
    }

    pub fn is_target_language(&self, text: &str) -> bool {
        if text.trim().is_empty() {
            return true;
        }

        let char_count = text.chars().count();
        if char_count < self.thresholds.min_length {
            return self.short_text_ratio(text, char_count) > self.thresholds.short_text_ratio;
        }

        if let Some(code) = self.detector.detect(text) {
            return language_utils::language_codes_match(&code, &self.target_language);
        }

        self.heuristic_decision(text, char_count)
    }

    /// True when any character lies outside the target script (ASCII)
    pub fn contains_non_target_script(&self, text: &str) -> bool {
        !text.is_ascii()
    }

    fn heuristic_decision(&self, text: &str, char_count: usize) -> bool {
        let foreign = text.chars().filter(|c| !c.is_ascii()).count();
        if foreign as f64 / char_count as f64 > self.thresholds.non_target_script_ratio {
            return false;
        }

        let lowered = text.to_lowercase();
        let words: Vec<&str> = lowered.split_whitespace().collect();
        if words.is_empty() {
            return true;
        }

        if words.len() < self.thresholds.min_words {
            return self.short_text_ratio(text, char_count) > self.thresholds.short_text_ratio;
        }

        let known = words
            .iter()
            .filter(|w| self.common_words.contains(**w))
            .count();
        known as f64 / words.len() as f64 > self.thresholds.word_ratio
    }

    fn short_text_ratio(&self, text: &str, char_count: usize) -> f64 {
        let matching = text
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_lowercase() || SHORT_TEXT_EXTRA_CHARS.contains(*c))
            .count();
        matching as f64 / char_count.max(1) as f64
    }
}
