/*!
 * Resumable batch driver.
 *
 * Records are processed strictly in order. After each record the output so
 * far is checkpointed, so an interrupted run resumes right after the last
 * completed record and produces the same output an uninterrupted run would.
 * A record that cannot be processed is kept as it was received.
 */

use anyhow::{Context, Result, bail};
use log::{error, info};
use serde_json::Value;

use crate::errors::AppError;
use crate::translation::checkpoint::CheckpointStore;
use crate::translation::field::{FieldStats, FieldTranslator};
use crate::translation::journal::RunJournal;

/// Totals of one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub total_records: usize,
    /// Records restored from the checkpoint instead of processed
    pub resumed_records: usize,
    pub processed_records: usize,
    pub failed_records: usize,
    pub translated_fields: usize,
    pub skipped_fields: usize,
    pub field_stats: FieldStats,
}

/// Final records plus totals
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub records: Vec<Value>,
    pub summary: RunSummary,
}

/// Drives the field pipeline over a record collection
#[derive(Debug)]
pub struct CheckpointedBatchRunner {
    translator: FieldTranslator,
    fields: Vec<String>,
}

impl CheckpointedBatchRunner {
    pub fn new(translator: FieldTranslator, fields: Vec<String>) -> Self {
        Self { translator, fields }
    }

    pub fn translator(&self) -> &FieldTranslator {
        &self.translator
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Process `records`, resuming from `store`.
    ///
    /// `finalize` receives the complete output; the checkpoint artifacts are
    /// deleted only after it succeeds.
    pub async fn run<P, F>(
        &self,
        records: &[Value],
        store: &CheckpointStore,
        journal: &dyn RunJournal,
        progress: P,
        finalize: F,
    ) -> Result<RunOutput, AppError>
    where
        P: Fn(usize, usize),
        F: FnOnce(&[Value]) -> Result<()>,
    {
        let total = records.len();
        let state = store.load(total);
        let mut output = state.accumulated;
        let mut summary = RunSummary {
            total_records: total,
            resumed_records: output.len(),
            ..RunSummary::default()
        };

        if summary.resumed_records > 0 {
            journal.info(&format!(
                "Resuming after record {} of {}",
                summary.resumed_records, total
            ));
        } else {
            journal.info(&format!("Starting run over {} records", total));
        }
        progress(output.len(), total);

        for (index, record) in records.iter().enumerate().skip(output.len()) {
            match self.translate_record(record, &mut summary).await {
                Ok(translated) => {
                    journal.info(&format!("Record {} done", index));
                    output.push(translated);
                }
                Err(e) => {
                    summary.failed_records += 1;
                    error!("Record {} failed, keeping original: {:#}", index, e);
                    journal.error(&format!("Record {} failed, keeping original: {:#}", index, e));
                    output.push(record.clone());
                }
            }
            summary.processed_records += 1;

            if let Err(e) = store.save(&output) {
                return Err(stop(journal, AppError::Checkpoint(e), index));
            }
            progress(output.len(), total);
        }

        if let Err(e) = finalize(&output).context("Failed to write final output") {
            return Err(stop(journal, e.into(), total));
        }
        if let Err(e) = store.clear() {
            return Err(stop(journal, AppError::Checkpoint(e), total));
        }

        journal.info(&format!(
            "Run complete: {} processed, {} resumed, {} failed",
            summary.processed_records, summary.resumed_records, summary.failed_records
        ));
        journal.finish();
        info!(
            "Processed {} records ({} from checkpoint, {} kept after failure)",
            total, summary.resumed_records, summary.failed_records
        );

        Ok(RunOutput {
            records: output,
            summary,
        })
    }

    async fn translate_record(&self, record: &Value, summary: &mut RunSummary) -> Result<Value> {
        let Some(original) = record.as_object() else {
            bail!("record is not a JSON object");
        };
        let mut copy = original.clone();

        for field in &self.fields {
            let text = match copy.get(field) {
                None | Some(Value::Null) => continue,
                Some(Value::String(text)) => text.clone(),
                Some(other) => bail!("field '{}' holds {} instead of text", field, kind_of(other)),
            };
            if text.trim().is_empty() || !self.translator.needs_translation(&text) {
                summary.skipped_fields += 1;
                continue;
            }

            let (translated, stats) = self.translator.translate_field(&text).await;
            summary.translated_fields += 1;
            summary.field_stats.absorb(stats);
            copy.insert(field.clone(), Value::String(translated));
        }

        Ok(Value::Object(copy))
    }
}

/// Record a fatal error in the journal and close it
fn stop(journal: &dyn RunJournal, err: AppError, completed: usize) -> AppError {
    journal.error(&format!("Run stopped after {} record(s): {}", completed, err));
    journal.finish();
    err
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
