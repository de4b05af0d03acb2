/*!
 * Batch runner tests: resume, per-record failures and mixed-language fields
 */

use polytrans::errors::AppError;
use polytrans::translation::{CheckpointStore, MemoryJournal};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

use crate::common::{self, MockProvider, StallingBackend};

fn french_records(n: usize) -> Vec<Value> {
    (0..n)
        .map(|i| json!({"id": i, "response": format!("Bonjour le monde numero {}", i)}))
        .collect()
}

#[tokio::test]
async fn test_run_shouldTranslateForeignAndKeepTargetLanguage() {
    let dir = common::create_temp_dir().unwrap();
    let records = vec![json!({"response": "Bonjour le monde"}), json!({"response": "Hello there"})];
    let store = CheckpointStore::for_output(&dir.path().join("out.json"), &records);
    let runner = common::heuristic_runner(Arc::new(common::tagging_backend()), &["response"]);

    let output = runner
        .run(&records, &store, &MemoryJournal::new(), |_, _| {}, |_| Ok(()))
        .await
        .unwrap();

    assert_eq!(output.records[0]["response"], "Bonjour le monde [en]");
    assert_eq!(output.records[1]["response"], "Hello there");
    assert_eq!(output.summary.translated_fields, 1);
    assert_eq!(output.summary.skipped_fields, 1);
}

#[tokio::test]
async fn test_run_shouldOnlyTouchConfiguredFields() {
    let dir = common::create_temp_dir().unwrap();
    let records = vec![json!({"prompt": "Salut", "response": "Bonjour le monde", "meta": {"k": 1}})];
    let store = CheckpointStore::for_output(&dir.path().join("out.json"), &records);
    let runner = common::heuristic_runner(Arc::new(common::tagging_backend()), &["response", "missing"]);

    let output = runner
        .run(&records, &store, &MemoryJournal::new(), |_, _| {}, |_| Ok(()))
        .await
        .unwrap();

    assert_eq!(
        output.records[0],
        json!({"prompt": "Salut", "response": "Bonjour le monde [en]", "meta": {"k": 1}})
    );
}

#[tokio::test]
async fn test_run_withBadRecords_shouldKeepOriginalsAndContinue() {
    common::init_test_logging();
    let dir = common::create_temp_dir().unwrap();
    let records = vec![
        json!({"response": "Bonjour le monde"}),
        json!({"response": 42}),
        json!("not an object"),
        json!({"response": null}),
        json!({"response": "Salut tout le monde"}),
    ];
    let store = CheckpointStore::for_output(&dir.path().join("out.json"), &records);
    let runner = common::heuristic_runner(Arc::new(common::tagging_backend()), &["response"]);
    let journal = MemoryJournal::new();

    let output = runner.run(&records, &store, &journal, |_, _| {}, |_| Ok(())).await.unwrap();

    assert_eq!(output.records.len(), 5);
    assert_eq!(output.records[1], records[1]);
    assert_eq!(output.records[2], records[2]);
    assert_eq!(output.records[3], records[3]);
    assert_eq!(output.records[4]["response"], "Salut tout le monde [en]");
    assert_eq!(output.summary.failed_records, 2);
    assert_eq!(journal.count(log::Level::Error), 2);
}

#[tokio::test]
async fn test_run_withMixedLanguageField_shouldTranslateOnlyForeignRun() {
    let dir = common::create_temp_dir().unwrap();
    let english = "This is the story of the city and the people in it. ";
    let french = "Ceci est une phrase en français avec des accents.";
    let records = vec![json!({"response": format!("{}{}", english, french)})];
    let store = CheckpointStore::for_output(&dir.path().join("out.json"), &records);
    let backend = common::tagging_backend();
    let runner = common::heuristic_runner(Arc::new(backend.clone()), &["response"]);

    let output = runner
        .run(&records, &store, &MemoryJournal::new(), |_, _| {}, |_| Ok(()))
        .await
        .unwrap();

    assert_eq!(backend.calls(), vec![french.to_string()]);
    assert_eq!(output.records[0]["response"], format!("{}{} [en]", english, french));
}

#[tokio::test]
async fn test_run_withEveryStrategyFailing_shouldKeepText() {
    let dir = common::create_temp_dir().unwrap();
    let records = vec![json!({"response": "Bonjour le monde"})];
    let store = CheckpointStore::for_output(&dir.path().join("out.json"), &records);
    let runner = common::heuristic_runner(Arc::new(MockProvider::failing()), &["response"]);

    let output = runner
        .run(&records, &store, &MemoryJournal::new(), |_, _| {}, |_| Ok(()))
        .await
        .unwrap();

    assert_eq!(output.records, records);
    assert_eq!(output.summary.field_stats.untranslated_chunks, 1);
    assert_eq!(output.summary.failed_records, 0);
}

#[tokio::test]
async fn test_run_interruptedThenResumed_shouldMatchUninterruptedRun() {
    common::init_test_logging();
    let records = french_records(6);

    let reference_dir = common::create_temp_dir().unwrap();
    let reference_store = CheckpointStore::for_output(&reference_dir.path().join("out.json"), &records);
    let reference = common::heuristic_runner(Arc::new(common::tagging_backend()), &["response"])
        .run(&records, &reference_store, &MemoryJournal::new(), |_, _| {}, |_| Ok(()))
        .await
        .unwrap();

    let dir = common::create_temp_dir().unwrap();
    let output_path = dir.path().join("out.json");
    let store = CheckpointStore::for_output(&output_path, &records);

    // Third backend call never returns; the run is abandoned like a killed process
    let stalling = common::heuristic_runner(Arc::new(StallingBackend::new(2)), &["response"]);
    let interrupted = tokio::time::timeout(
        Duration::from_millis(300),
        stalling.run(&records, &store, &MemoryJournal::new(), |_, _| {}, |_| Ok(())),
    )
    .await;
    assert!(interrupted.is_err());
    assert!(store.exists());
    assert_eq!(store.load(records.len()).last_completed_index(), Some(1));

    let backend = common::tagging_backend();
    let resumed = common::heuristic_runner(Arc::new(backend.clone()), &["response"])
        .run(&records, &store, &MemoryJournal::new(), |_, _| {}, |_| Ok(()))
        .await
        .unwrap();

    assert_eq!(resumed.records, reference.records);
    assert_eq!(resumed.summary.resumed_records, 2);
    assert_eq!(backend.request_count(), 4);
    assert!(!store.exists());
}

#[tokio::test]
async fn test_run_shouldReportProgressAfterEachRecord() {
    let dir = common::create_temp_dir().unwrap();
    let records = french_records(3);
    let store = CheckpointStore::for_output(&dir.path().join("out.json"), &records);
    let runner = common::heuristic_runner(Arc::new(common::tagging_backend()), &["response"]);
    let seen = parking_lot::Mutex::new(Vec::new());

    runner
        .run(&records, &store, &MemoryJournal::new(), |done, total| seen.lock().push((done, total)), |_| Ok(()))
        .await
        .unwrap();

    assert_eq!(seen.into_inner(), vec![(0, 3), (1, 3), (2, 3), (3, 3)]);
}

#[tokio::test]
async fn test_run_withFailingFinalize_shouldKeepCheckpoint() {
    let dir = common::create_temp_dir().unwrap();
    let records = french_records(2);
    let store = CheckpointStore::for_output(&dir.path().join("out.json"), &records);
    let runner = common::heuristic_runner(Arc::new(common::tagging_backend()), &["response"]);

    let journal = MemoryJournal::new();

    let result = runner
        .run(&records, &store, &journal, |_, _| {}, |_| Err(anyhow::anyhow!("disk full")))
        .await;

    assert!(result.is_err());
    assert!(journal.is_finished());
    assert_eq!(store.load(2).accumulated.len(), 2);
}

#[tokio::test]
async fn test_run_withUnwritableCheckpoint_shouldStopAfterFirstRecord() {
    let dir = common::create_temp_dir().unwrap();
    let output_path = dir.path().join("out.json");
    let records = french_records(3);
    let store = CheckpointStore::for_output(&output_path, &records);
    // A directory where the snapshot file should go makes every save fail
    std::fs::create_dir(store.snapshot_path()).unwrap();

    let backend = common::tagging_backend();
    let runner = common::heuristic_runner(Arc::new(backend.clone()), &["response"]);
    let journal = MemoryJournal::new();
    let finalized = std::cell::Cell::new(false);

    let result = runner
        .run(&records, &store, &journal, |_, _| {}, |translated| {
            finalized.set(true);
            std::fs::write(&output_path, serde_json::to_vec(translated)?)?;
            Ok(())
        })
        .await;

    assert!(matches!(result, Err(AppError::Checkpoint(_))));
    assert_eq!(backend.request_count(), 1);
    assert!(!finalized.get());
    assert!(!output_path.exists());
    assert!(!store.marker_path().exists());
}

#[tokio::test]
async fn test_run_withFatalError_shouldJournalReasonAndFinish() {
    let dir = common::create_temp_dir().unwrap();
    let records = french_records(2);
    let store = CheckpointStore::for_output(&dir.path().join("out.json"), &records);
    std::fs::create_dir(store.snapshot_path()).unwrap();
    let runner = common::heuristic_runner(Arc::new(common::tagging_backend()), &["response"]);
    let journal = MemoryJournal::new();

    let result = runner.run(&records, &store, &journal, |_, _| {}, |_| Ok(())).await;

    assert!(result.is_err());
    assert!(journal.is_finished());
    let last = journal.entries().pop().unwrap();
    assert_eq!(last.level, log::Level::Error);
    assert!(last.message.starts_with("Run stopped after 0 record(s): Checkpoint error"));
}
