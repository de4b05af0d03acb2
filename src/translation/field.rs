/*!
 * Per-field translation pipeline.
 *
 * A field that is already target-language and script-pure is left alone.
 * Anything else is segmented into same-language runs; target-language runs
 * are copied, the others are chunked and each chunk goes through the
 * fallback cascade. Pieces are rejoined in their original order.
 */

use log::debug;

use crate::text::{LanguageClassifier, Segmenter, chunk};
use crate::translation::fallback::{FallbackOrchestrator, split_padding};

/// Counters for one translated field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldStats {
    pub runs: usize,
    pub foreign_runs: usize,
    pub chunks: usize,
    /// Chunks that came back unchanged because every strategy failed
    pub untranslated_chunks: usize,
}

impl FieldStats {
    pub fn absorb(&mut self, other: FieldStats) {
        self.runs += other.runs;
        self.foreign_runs += other.foreign_runs;
        self.chunks += other.chunks;
        self.untranslated_chunks += other.untranslated_chunks;
    }
}

/// Translates the text of a single field
#[derive(Debug)]
pub struct FieldTranslator {
    classifier: LanguageClassifier,
    segmenter: Segmenter,
    chunk_size: usize,
    orchestrator: FallbackOrchestrator,
}

impl FieldTranslator {
    pub fn new(
        classifier: LanguageClassifier,
        segmenter: Segmenter,
        chunk_size: usize,
        orchestrator: FallbackOrchestrator,
    ) -> Self {
        Self {
            classifier,
            segmenter,
            chunk_size: chunk_size.max(1),
            orchestrator,
        }
    }

    pub fn classifier(&self) -> &LanguageClassifier {
        &self.classifier
    }

    pub fn orchestrator(&self) -> &FallbackOrchestrator {
        &self.orchestrator
    }

    /// False only for text that is target-language and script-pure
    pub fn needs_translation(&self, text: &str) -> bool {
        !(self.classifier.is_target_language(text) && !self.classifier.contains_non_target_script(text))
    }

    pub async fn translate_field(&self, text: &str) -> (String, FieldStats) {
        let mut stats = FieldStats::default();
        if !self.needs_translation(text) {
            return (text.to_string(), stats);
        }

        let runs = self.segmenter.segment(text, &self.classifier);
        stats.runs = runs.len();
        let mut out = String::with_capacity(text.len());

        for run in runs {
            if run.is_target_language {
                out.push_str(run.text);
                continue;
            }
            stats.foreign_runs += 1;

            for piece in chunk(run.text, self.chunk_size) {
                let (lead, core, trail) = split_padding(piece);
                if core.is_empty() {
                    out.push_str(piece);
                    continue;
                }
                stats.chunks += 1;

                let outcome = self.orchestrator.translate_with_outcome(core).await;
                if !outcome.is_translated() {
                    stats.untranslated_chunks += 1;
                }
                out.push_str(lead);
                out.push_str(outcome.text.trim());
                out.push_str(trail);
            }
        }

        debug!(
            "Field translated: {} run(s), {} foreign, {} chunk(s)",
            stats.runs, stats.foreign_runs, stats.chunks
        );
        (out, stats)
    }
}
