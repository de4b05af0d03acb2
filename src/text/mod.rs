/*!
 * Text analysis used ahead of translation.
 *
 * - `classifier`: is a span already in the target language?
 * - `segmenter`: split a field into same-language runs
 * - `chunker`: split a run into backend-sized pieces
 */

pub mod chunker;
pub mod classifier;
pub mod segmenter;

pub use self::chunker::chunk;
pub use self::classifier::{
    ClassifierThresholds, HeuristicOnly, LanguageClassifier, LanguageDetector, ThresholdProfile,
    WhatlangDetector,
};
pub use self::segmenter::{Run, Segmenter};
