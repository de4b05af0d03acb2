/*!
 * Properties of segmentation and chunking over varied inputs
 */

use polytrans::text::{ClassifierThresholds, LanguageClassifier, Segmenter, chunk};

fn samples() -> Vec<String> {
    vec![
        String::new(),
        "short".to_string(),
        "This is the first sentence. Ceci est la deuxième phrase! And the third one is here?".repeat(3),
        "日本語の文章です。これは二番目の文です。\nThe end of the text is in English, and it is the end.".to_string(),
        "no punctuation at all ".repeat(40),
        "Trailing partial sentence without a stop. and then some more words".repeat(5),
        "Line one\nLine two\n\nLine four with é and ü\n".repeat(10),
    ]
}

#[test]
fn test_segment_shouldConcatenateToInput() {
    let classifier = LanguageClassifier::heuristic("en", ClassifierThresholds::standard());
    let segmenter = Segmenter::default();
    for text in samples() {
        let runs = segmenter.segment(&text, &classifier);
        let joined: String = runs.iter().map(|r| r.text).collect();
        assert_eq!(joined, text);
    }
}

#[test]
fn test_segment_adjacentRunsShouldDifferInClassification() {
    let classifier = LanguageClassifier::heuristic("en", ClassifierThresholds::standard());
    let segmenter = Segmenter::new(100, usize::MAX);
    for text in samples() {
        let runs = segmenter.segment(&text, &classifier);
        for pair in runs.windows(2) {
            assert_ne!(pair[0].is_target_language, pair[1].is_target_language);
        }
    }
}

#[test]
fn test_chunk_shouldConcatenateAndRespectLimit() {
    for text in samples() {
        for max in [1, 7, 30, 100, 4500] {
            let chunks = chunk(&text, max);
            assert_eq!(chunks.concat(), text);
            assert!(chunks.iter().all(|c| c.chars().count() <= max));
        }
    }
}

#[test]
fn test_chunk_withSentenceInWindow_shouldCutAfterSpace() {
    let chunks = chunk("Short one. Another sentence follows here.", 20);
    assert_eq!(chunks[0], "Short one. ");
}
