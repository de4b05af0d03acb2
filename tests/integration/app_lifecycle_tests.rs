/*!
 * Full controller runs: file in, file out
 */

use polytrans::app_controller::Controller;
use polytrans::errors::AppError;
use polytrans::providers::BackendSet;
use polytrans::record_io::{self, BLOCK_SEPARATOR, TagPair};
use polytrans::translation::MemoryJournal;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::common;

#[tokio::test]
async fn test_controller_withJsonArray_shouldWriteArrayAndRemoveCheckpoint() {
    let dir = common::create_temp_dir().unwrap();
    let input = common::create_test_file(
        dir.path(),
        "in.json",
        r#"[{"response": "Bonjour le monde"}, {"response": "Hello there"}]"#,
    )
    .unwrap();
    let output = dir.path().join("out.json");

    let controller = Controller::with_config(common::test_config(dir.path())).unwrap();
    let set = record_io::read_records(&input, None).unwrap();
    let backends = BackendSet::new(Arc::new(common::tagging_backend()));
    let summary = controller
        .run_with_backends(set, &output, backends, &MemoryJournal::new())
        .await
        .unwrap();

    assert_eq!(summary.total_records, 2);
    let written: Value = serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(
        written,
        json!([{"response": "Bonjour le monde [en]"}, {"response": "Hello there"}])
    );
    assert!(!dir.path().join("out.json.progress").exists());
    assert!(!dir.path().join("out.json.temp").exists());
}

#[tokio::test]
async fn test_controller_withJsonLines_shouldWriteJsonLines() {
    let dir = common::create_temp_dir().unwrap();
    let input = common::create_test_file(
        dir.path(),
        "in.jsonl",
        "{\"prompt\": \"Hola\", \"response\": \"Buenos dias a todos\"},\n{\"prompt\": \"x\", \"response\": \"\"}\n",
    )
    .unwrap();
    let output = dir.path().join("out.jsonl");

    let mut config = common::test_config(dir.path());
    config.batch.fields_to_translate = vec!["response".into(), "response".into()];
    let controller = Controller::with_config(config).unwrap();
    let set = record_io::read_records(&input, None).unwrap();
    let backends = BackendSet::new(Arc::new(common::tagging_backend()));
    controller
        .run_with_backends(set, &output, backends, &MemoryJournal::new())
        .await
        .unwrap();

    let content = std::fs::read_to_string(&output).unwrap();
    let lines: Vec<Value> = content.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["response"], "Buenos dias a todos [en]");
    assert_eq!(lines[0]["prompt"], "Hola");
    assert_eq!(lines[1]["response"], "");
}

#[tokio::test]
async fn test_controller_withTaggedBlocks_shouldRewrapBlocks() {
    let dir = common::create_temp_dir().unwrap();
    let input = common::create_test_file(
        dir.path(),
        "in.txt",
        "###START###\nGuten Morgen zusammen\n###END###\nnoise\n###START###\nHello there\n###END###",
    )
    .unwrap();
    let output = dir.path().join("out.txt");
    let tags = TagPair::new("###START###", "###END###");

    let mut config = common::test_config(dir.path());
    config.batch.fields_to_translate = vec!["ignored".into()];
    let controller = Controller::with_config(config).unwrap();
    let set = record_io::read_records(&input, Some(&tags)).unwrap();
    let backends = BackendSet::new(Arc::new(common::tagging_backend()));
    controller
        .run_with_backends(set, &output, backends, &MemoryJournal::new())
        .await
        .unwrap();

    let content = std::fs::read_to_string(&output).unwrap();
    assert_eq!(
        content,
        format!(
            "###START###\nGuten Morgen zusammen [en]\n###END###{}###START###\nHello there\n###END###",
            BLOCK_SEPARATOR
        )
    );
}

#[tokio::test]
async fn test_controller_withExistingCheckpoint_shouldResume() {
    let dir = common::create_temp_dir().unwrap();
    let input = common::create_test_file(
        dir.path(),
        "in.json",
        r#"[{"response": "Bonjour le monde"}, {"response": "Salut tout le monde"}]"#,
    )
    .unwrap();
    let output = dir.path().join("out.json");
    let set = record_io::read_records(&input, None).unwrap();

    // A previous attempt finished the first record
    let store = polytrans::translation::CheckpointStore::for_output(&output, &set.records);
    store.save(&[json!({"response": "already done"})]).unwrap();

    let backend = common::tagging_backend();
    let controller = Controller::with_config(common::test_config(dir.path())).unwrap();
    let summary = controller
        .run_with_backends(set, &output, BackendSet::new(Arc::new(backend.clone())), &MemoryJournal::new())
        .await
        .unwrap();

    assert_eq!(summary.resumed_records, 1);
    assert_eq!(backend.request_count(), 1);
    let written: Value = serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(written[0]["response"], "already done");
    assert_eq!(written[1]["response"], "Salut tout le monde [en]");
}

#[test]
fn test_controller_withUnparseableInput_shouldFailBeforeProcessing() {
    let dir = common::create_temp_dir().unwrap();
    let input = common::create_test_file(dir.path(), "in.json", "this is not json").unwrap();
    let output = dir.path().join("out.json");

    let controller = Controller::with_config(common::test_config(dir.path())).unwrap();
    let result = tokio_test::block_on(controller.run(&input, &output, None));

    assert!(matches!(result, Err(AppError::InputParseFailure(_))));
    assert!(!output.exists());
}

#[test]
fn test_controller_withInvalidConfig_shouldRefuseToBuild() {
    let dir = common::create_temp_dir().unwrap();
    let mut config = common::test_config(dir.path());
    config.batch.chunk_size = 0;
    assert!(Controller::with_config(config).is_err());
}
