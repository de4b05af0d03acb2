/*!
 * Sensitive-term masking.
 *
 * Content filters of hosted translators reject whole requests because of a
 * single word. Masking swaps each configured term for an opaque `TERM_<n>`
 * placeholder before the request and puts the original spellings back
 * afterwards, in their original order of appearance.
 */

use log::warn;
use regex::{Captures, Regex};
use std::collections::HashSet;
use thiserror::Error;

/// Masks and restores a fixed list of terms
#[derive(Debug, Clone)]
pub struct TermMasker {
    /// (placeholder, term matcher, placeholder matcher)
    patterns: Vec<(String, Regex, Regex)>,
}

/// Text with terms replaced, plus what is needed to undo it
#[derive(Debug, Clone, PartialEq)]
pub struct MaskedText {
    pub text: String,
    /// Originals per placeholder, in order of appearance
    replacements: Vec<(String, Vec<String>)>,
}

/// Restoration failed because the backend altered placeholders
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("placeholder {placeholder} expected {expected} time(s), found {found}")]
pub struct PlaceholderMismatch {
    pub placeholder: String,
    pub expected: usize,
    pub found: usize,
}

impl TermMasker {
    /// Build a masker; terms are matched whole-word and case-insensitively,
    /// duplicates (ignoring case) and blank entries are dropped.
    pub fn new<S: AsRef<str>>(terms: &[S]) -> Self {
        let mut seen = HashSet::new();
        let mut patterns = Vec::new();

        for term in terms {
            let term = term.as_ref().trim();
            if term.is_empty() || !seen.insert(term.to_lowercase()) {
                continue;
            }
            let placeholder = format!("TERM_{}", patterns.len());
            let term_re = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(term)));
            let placeholder_re = Regex::new(&format!(r"\b{}\b", placeholder));
            match (term_re, placeholder_re) {
                (Ok(term_re), Ok(placeholder_re)) => {
                    patterns.push((placeholder, term_re, placeholder_re))
                }
                (Err(e), _) | (_, Err(e)) => warn!("Skipping unmaskable term '{}': {}", term, e),
            }
        }

        Self { patterns }
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn mask(&self, text: &str) -> MaskedText {
        let mut masked = text.to_string();
        let mut replacements = Vec::new();

        for (placeholder, term_re, _) in &self.patterns {
            let originals: Vec<String> = term_re
                .find_iter(&masked)
                .map(|m| m.as_str().to_string())
                .collect();
            if originals.is_empty() {
                continue;
            }
            masked = term_re.replace_all(&masked, placeholder.as_str()).into_owned();
            replacements.push((placeholder.clone(), originals));
        }

        MaskedText {
            text: masked,
            replacements,
        }
    }

    /// Put the originals back into a translated masked text
    pub fn restore(&self, masked: &MaskedText, translated: &str) -> Result<String, PlaceholderMismatch> {
        let mut restored = translated.to_string();

        for (placeholder, originals) in &masked.replacements {
            let Some((_, _, placeholder_re)) = self.patterns.iter().find(|(p, _, _)| p == placeholder) else {
                continue;
            };

            let found = placeholder_re.find_iter(&restored).count();
            if found != originals.len() {
                return Err(PlaceholderMismatch {
                    placeholder: placeholder.clone(),
                    expected: originals.len(),
                    found,
                });
            }

            let mut next = originals.iter();
            restored = placeholder_re
                .replace_all(&restored, |caps: &Captures<'_>| {
                    next.next()
                        .cloned()
                        .unwrap_or_else(|| caps[0].to_string())
                })
                .into_owned();
        }

        Ok(restored)
    }
}

impl MaskedText {
    /// Whether any term was replaced
    pub fn is_masked(&self) -> bool {
        !self.replacements.is_empty()
    }

    pub fn masked_count(&self) -> usize {
        self.replacements.iter().map(|(_, o)| o.len()).sum()
    }
}
