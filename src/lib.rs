/*!
 * # polytrans - resumable multilingual record translation
 *
 * A Rust library for translating the text fields of record collections
 * (datasets of prompts, responses, tagged text blocks) into one target
 * language with LLM backends.
 *
 * ## Features
 *
 * - Skips text that is already in the target language
 * - Splits mixed-language text into same-language runs and translates only
 *   the foreign ones
 * - Chunks long runs at sentence boundaries to fit backend limits
 * - Falls back through an alternate backend, micro-chunks and sensitive-term
 *   masking before giving up on a piece of text
 * - Checkpoints after every record and resumes where a previous run stopped
 * - Backends:
 *   - Ollama (local LLM)
 *   - Anthropic API
 *
 * ## Architecture
 *
 * - `app_config`: Configuration management
 * - `record_io`: Input parsing and output rendering
 * - `text`: Language classification, segmentation and chunking
 * - `translation`: Fallback cascade, field pipeline, checkpoints and the
 *   batch runner
 * - `providers`: Translation backends
 * - `app_controller`: Wiring of a complete run
 * - `file_utils`: File system operations
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod providers;
pub mod record_io;
pub mod text;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::Controller;
pub use errors::{AppError, CheckpointError, CheckpointLoadError, InputError, ProviderError};
pub use language_utils::{get_language_name, language_codes_match, normalize_to_part2t};
pub use providers::{BackendSet, TranslationBackend};
pub use record_io::{InputFormat, RecordSet, TagPair};
pub use translation::{CheckpointedBatchRunner, FallbackOrchestrator, FieldTranslator};
