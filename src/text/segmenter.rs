/*!
 * Language-boundary segmentation.
 *
 * A field's text is split into sentences (terminal punctuation, including
 * CJK full-width marks, and newlines stay attached to the sentence they end),
 * each sentence is classified, and consecutive sentences with the same
 * classification are merged into runs. Runs borrow from the input, and
 * concatenating them in order gives back the input byte for byte.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use super::classifier::LanguageClassifier;

static SENTENCE_END: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[.!?。！？\n]+\s*").unwrap_or_else(|e| panic!("invalid sentence regex: {}", e))
});

/// One maximal same-language span of a field's text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run<'a> {
    pub text: &'a str,
    pub is_target_language: bool,
}

/// Splits text into same-language runs
#[derive(Debug, Clone)]
pub struct Segmenter {
    /// Texts shorter than this are classified as a single run
    pub single_run_below: usize,
    /// A run that already exceeds this many characters is closed early
    pub max_run_chars: usize,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self {
            single_run_below: 100,
            max_run_chars: 4000,
        }
    }
}

impl Segmenter {
    pub fn new(single_run_below: usize, max_run_chars: usize) -> Self {
        Self {
            single_run_below,
            max_run_chars,
        }
    }

    pub fn segment<'a>(&self, text: &'a str, classifier: &LanguageClassifier) -> Vec<Run<'a>> {
        if text.is_empty() {
            return Vec::new();
        }

        if text.chars().count() < self.single_run_below {
            return vec![Run {
                text,
                is_target_language: classifier.is_target_language(text),
            }];
        }

        let mut runs = Vec::new();
        // (start byte, end byte, char count, classification)
        let mut current: Option<(usize, usize, usize, bool)> = None;

        for (start, end) in sentence_spans(text) {
            let sentence = &text[start..end];
            let is_target = classifier.is_target_language(sentence);
            let sentence_chars = sentence.chars().count();

            current = match current {
                None => Some((start, end, sentence_chars, is_target)),
                Some((run_start, run_end, run_chars, run_target))
                    if run_target != is_target || run_chars > self.max_run_chars =>
                {
                    runs.push(Run {
                        text: &text[run_start..run_end],
                        is_target_language: run_target,
                    });
                    Some((start, end, sentence_chars, is_target))
                }
                Some((run_start, _, run_chars, run_target)) => {
                    Some((run_start, end, run_chars + sentence_chars, run_target))
                }
            };
        }

        if let Some((run_start, run_end, _, run_target)) = current {
            runs.push(Run {
                text: &text[run_start..run_end],
                is_target_language: run_target,
            });
        }

        runs
    }
}

/// Byte ranges of sentences, delimiters attached, trailing remainder included
fn sentence_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut last = 0;
    for m in SENTENCE_END.find_iter(text) {
        if m.end() > last {
            spans.push((last, m.end()));
            last = m.end();
        }
    }
    if last < text.len() {
        spans.push((last, text.len()));
    }
    spans
}
