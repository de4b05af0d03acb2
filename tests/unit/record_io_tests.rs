/*!
 * Tests for reading input files and rendering output
 */

use polytrans::errors::InputError;
use polytrans::record_io::{self, InputFormat, TagPair};
use serde_json::json;

use crate::common;

#[test]
fn test_readRecords_withArrayFile_shouldParse() {
    let dir = common::create_temp_dir().unwrap();
    let path = common::create_test_file(dir.path(), "in.json", r#"[{"response": "Bonjour"}]"#).unwrap();
    let set = record_io::read_records(&path, None).unwrap();
    assert_eq!(set.records, vec![json!({"response": "Bonjour"})]);
    assert_eq!(set.format, InputFormat::JsonArray);
}

#[test]
fn test_readRecords_withLatin1File_shouldDecode() {
    let dir = common::create_temp_dir().unwrap();
    let path = dir.path().join("latin1.jsonl");
    // "caf\xe9" is "café" in Latin-1 and invalid UTF-8
    std::fs::write(&path, b"{\"response\": \"caf\xe9\"}\n").unwrap();

    let set = record_io::read_records(&path, None).unwrap();
    assert_eq!(set.records[0]["response"], "café");
    assert_eq!(set.format, InputFormat::JsonLines);
}

#[test]
fn test_readRecords_withMissingFile_shouldReturnIoError() {
    let dir = common::create_temp_dir().unwrap();
    let result = record_io::read_records(&dir.path().join("absent.json"), None);
    assert!(matches!(result, Err(InputError::Io { .. })));
}

#[test]
fn test_readRecords_withTagsButNoBlocks_shouldFail() {
    let dir = common::create_temp_dir().unwrap();
    let path = common::create_test_file(dir.path(), "in.txt", "just some text").unwrap();
    let tags = TagPair::new("<<", ">>");
    assert!(matches!(
        record_io::read_records(&path, Some(&tags)),
        Err(InputError::NoTaggedBlocks { .. })
    ));
}

#[test]
fn test_parseRecords_withNonObjectLinesOnly_shouldFallBackToWrapping() {
    let set = record_io::parse_records("1,\n2,\n3", None).unwrap();
    assert_eq!(set.records, vec![json!(1), json!(2), json!(3)]);
}

#[test]
fn test_render_withArrayFormat_shouldBeParseableAgain() {
    let records = vec![json!({"response": "é"}), json!({"response": null})];
    let out = record_io::render_records(&records, &InputFormat::JsonArray).unwrap();
    let reparsed = record_io::parse_records(&out, None).unwrap();
    assert_eq!(reparsed.records, records);
}
