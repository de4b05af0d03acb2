use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::Path;
use std::time::Instant;

use crate::app_config::{Config, DetectorKind};
use crate::errors::AppError;
use crate::file_utils::FileManager;
use crate::providers::BackendSet;
use crate::record_io::{self, InputFormat, RecordSet, TAGGED_TEXT_FIELD, TagPair};
use crate::text::{HeuristicOnly, LanguageClassifier, LanguageDetector, Segmenter, WhatlangDetector};
use crate::translation::{
    CheckpointStore, CheckpointedBatchRunner, FallbackOrchestrator, FieldTranslator, FileJournal,
    RunJournal, RunSummary, TranslationCache,
};

// @module: Application controller wiring input, backends and the batch runner

/// Main application controller for record translation
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Invalid configuration")?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Translate `input` into `output`, resuming a previous attempt if one
    /// left a checkpoint next to `output`
    pub async fn run(&self, input: &Path, output: &Path, tags: Option<TagPair>) -> Result<RunSummary, AppError> {
        let set = record_io::read_records(input, tags.as_ref())?;

        let backends = BackendSet::from_config(&self.config.translation, &self.config.target_language)?;

        let journal = FileJournal::open(&self.config.journal_path).map_err(|e| {
            AppError::File(format!("cannot open journal {}: {}", self.config.journal_path, e))
        })?;
        info!("Run {} journaled to {}", journal.run_id(), self.config.journal_path);

        self.run_with_backends(set, output, backends, &journal).await
    }

    /// Run the pipeline over already parsed records with the given backends
    pub async fn run_with_backends(
        &self,
        set: RecordSet,
        output: &Path,
        backends: BackendSet,
        journal: &dyn RunJournal,
    ) -> Result<RunSummary, AppError> {
        let start_time = Instant::now();
        let RecordSet { records, format } = set;

        let fields = match &format {
            InputFormat::TaggedBlocks(_) => vec![TAGGED_TEXT_FIELD.to_string()],
            _ => self.config.batch.unique_fields(),
        };

        info!(
            "Translating {} records into {} with {}{} (fields: {})",
            records.len(),
            self.config.target_language,
            backends.main.name(),
            backends
                .alternate
                .as_ref()
                .map(|a| format!(", alternate {}", a.name()))
                .unwrap_or_default(),
            fields.join(", ")
        );

        let cache = TranslationCache::new(self.config.translation.common.cache_enabled);
        let runner = self.build_runner(backends, cache.clone(), fields);
        let store = CheckpointStore::for_output(output, &records);

        let progress_bar = ProgressBar::new(records.len() as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} records ({percent}%) {eta}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));

        let result = runner
            .run(
                &records,
                &store,
                journal,
                |done, _total| progress_bar.set_position(done as u64),
                |translated| write_output(output, translated, &format),
            )
            .await;

        match result {
            Ok(run) => {
                progress_bar.finish_and_clear();
                let stats = cache.stats();
                if cache.is_enabled() {
                    info!(
                        "Cache: {} hits, {} misses ({:.1}% hit rate, {} entries)",
                        stats.hits,
                        stats.misses,
                        stats.hit_rate() * 100.0,
                        stats.entries
                    );
                }
                if run.summary.failed_records > 0 {
                    warn!("{} record(s) were kept untranslated after errors", run.summary.failed_records);
                }
                info!(
                    "Wrote {:?} in {}",
                    output,
                    Self::format_duration(start_time.elapsed())
                );
                Ok(run.summary)
            }
            Err(e) => {
                progress_bar.abandon();
                error!("Run stopped: {}", e);
                Err(e)
            }
        }
    }

    /// Test connectivity of the configured backends
    pub async fn check_connection(&self) -> Result<(), AppError> {
        let backends = BackendSet::from_config(&self.config.translation, &self.config.target_language)?;

        match backends.main.test_connection().await {
            Ok(()) => info!("{} is reachable", backends.main.name()),
            Err(e) => {
                error!("{} is not reachable: {}", backends.main.name(), e);
                return Err(e.into());
            }
        }

        if let Some(alternate) = &backends.alternate {
            match alternate.test_connection().await {
                Ok(()) => info!("{} (alternate) is reachable", alternate.name()),
                Err(e) => warn!("{} (alternate) is not reachable: {}", alternate.name(), e),
            }
        }
        Ok(())
    }

    fn build_runner(&self, backends: BackendSet, cache: TranslationCache, fields: Vec<String>) -> CheckpointedBatchRunner {
        let config = &self.config;

        let detector: Box<dyn LanguageDetector> = match config.classifier.detector {
            DetectorKind::Whatlang => Box::new(WhatlangDetector),
            DetectorKind::Heuristic => Box::new(HeuristicOnly),
        };
        let classifier = LanguageClassifier::new(&config.target_language, config.classifier.thresholds(), detector);

        let segmenter = Segmenter::new(config.segmenter.single_run_below, config.segmenter.max_run_chars);

        let orchestrator = FallbackOrchestrator::new(backends, &config.target_language)
            .with_delay(config.delay())
            .with_micro_chunk_chars(config.fallback.micro_chunk_chars)
            .with_sensitive_terms(&config.fallback.sensitive_terms)
            .with_cache(cache);

        let translator = FieldTranslator::new(classifier, segmenter, config.batch.chunk_size, orchestrator);
        CheckpointedBatchRunner::new(translator, fields)
    }

    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}

fn write_output(output: &Path, records: &[serde_json::Value], format: &InputFormat) -> Result<()> {
    let rendered = record_io::render_records(records, format).context("Failed to render output records")?;
    FileManager::write_atomic(output, rendered.as_bytes())
        .with_context(|| format!("Failed to write output file: {:?}", output))
}
