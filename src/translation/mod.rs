/*!
 * Record translation pipeline.
 *
 * - `fallback`: ordered strategies wrapped around the backends
 * - `masking`: sensitive-term placeholders used by the last strategy
 * - `cache`: in-memory cache of successful translations
 * - `field`: classify, segment, chunk and translate one field
 * - `checkpoint`: persisted progress for resumable runs
 * - `journal`: per-run event sink
 * - `runner`: drives everything over a record collection
 */

pub use self::cache::{CacheStats, TranslationCache};
pub use self::checkpoint::{CheckpointState, CheckpointStore};
pub use self::fallback::{FallbackOrchestrator, FallbackOutcome, Strategy};
pub use self::field::{FieldStats, FieldTranslator};
pub use self::journal::{FileJournal, LogEntry, MemoryJournal, RunJournal};
pub use self::masking::TermMasker;
pub use self::runner::{CheckpointedBatchRunner, RunOutput, RunSummary};

pub mod cache;
pub mod checkpoint;
pub mod fallback;
pub mod field;
pub mod journal;
pub mod masking;
pub mod runner;
