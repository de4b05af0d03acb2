/*!
 * Reading and writing record collections.
 *
 * Three input shapes are accepted:
 * - a JSON array of objects
 * - one JSON object per line (trailing commas tolerated, bad lines skipped)
 * - plain text with blocks delimited by a start and an end tag
 *
 * Output is written in the shape the input had.
 */

use log::{info, warn};
use serde_json::Value;
use std::path::Path;

use crate::errors::InputError;
use crate::file_utils::FileManager;

/// Field that holds a block's text in tagged-block mode
pub const TAGGED_TEXT_FIELD: &str = "text";

/// Field holding the untouched source of a block with an empty body
pub const TAGGED_RAW_FIELD: &str = "raw_block";

/// Separator between blocks in tagged-block output
pub const BLOCK_SEPARATOR: &str = "\n\n--- NEW BLOCK ---\n\n";

/// Start and end markers of a tagged block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPair {
    pub start: String,
    pub end: String,
}

impl TagPair {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

/// Shape of the input, reused for the output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputFormat {
    JsonArray,
    JsonLines,
    TaggedBlocks(TagPair),
}

/// Parsed records together with the shape they came in
#[derive(Debug, Clone)]
pub struct RecordSet {
    pub records: Vec<Value>,
    pub format: InputFormat,
}

/// Read and parse an input file
pub fn read_records(path: &Path, tags: Option<&TagPair>) -> Result<RecordSet, InputError> {
    let content = FileManager::read_to_string(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let set = parse_records(&content, tags)?;
    info!("Loaded {} records from {:?}", set.records.len(), path);
    Ok(set)
}

/// Parse input content into records.
///
/// With `tags` the content is read as tagged blocks. Otherwise content that
/// starts with `[` must be a JSON array; anything else is read as JSON lines,
/// and if no line yields an object the whole content is parsed once more as
/// the body of an array.
pub fn parse_records(content: &str, tags: Option<&TagPair>) -> Result<RecordSet, InputError> {
    if let Some(tags) = tags {
        return parse_tagged_blocks(content, tags);
    }

    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(InputError::Unparseable("input is empty".to_string()));
    }

    if trimmed.starts_with('[') {
        let records: Vec<Value> = serde_json::from_str(trimmed)
            .map_err(|e| InputError::Unparseable(format!("invalid JSON array: {}", e)))?;
        return Ok(RecordSet {
            records,
            format: InputFormat::JsonArray,
        });
    }

    let records = parse_json_lines(trimmed);
    if !records.is_empty() {
        return Ok(RecordSet {
            records,
            format: InputFormat::JsonLines,
        });
    }

    let wrapped = format!("[{}]", trimmed.trim_end_matches(','));
    match serde_json::from_str::<Vec<Value>>(&wrapped) {
        Ok(records) => {
            info!("Parsed input as comma-separated objects");
            Ok(RecordSet {
                records,
                format: InputFormat::JsonArray,
            })
        }
        Err(e) => Err(InputError::Unparseable(format!(
            "not a JSON array, JSON lines, or comma-separated objects: {}",
            e
        ))),
    }
}

fn parse_json_lines(content: &str) -> Vec<Value> {
    let mut records = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let line = line.strip_suffix(',').unwrap_or(line);
        match serde_json::from_str::<Value>(line) {
            Ok(value) if value.is_object() => records.push(value),
            _ => {
                let preview: String = line.chars().take(50).collect();
                warn!("Skipping invalid JSON line: {}...", preview);
            }
        }
    }
    records
}

fn parse_tagged_blocks(content: &str, tags: &TagPair) -> Result<RecordSet, InputError> {
    let mut records = Vec::new();
    let mut cursor = 0;

    while let Some(start_rel) = content[cursor..].find(&tags.start) {
        let block_start = cursor + start_rel;
        let body_start = block_start + tags.start.len();
        let Some(end_rel) = content[body_start..].find(&tags.end) else {
            warn!("Unterminated block starting at byte {}, ignoring the rest", block_start);
            break;
        };
        let body_end = body_start + end_rel;
        let block_end = body_end + tags.end.len();
        let text = content[body_start..body_end].trim();
        let mut record = serde_json::Map::new();
        record.insert(TAGGED_TEXT_FIELD.to_string(), Value::String(text.to_string()));
        if text.is_empty() {
            record.insert(
                TAGGED_RAW_FIELD.to_string(),
                Value::String(content[block_start..block_end].to_string()),
            );
        }
        records.push(Value::Object(record));
        cursor = block_end;
    }

    if records.is_empty() {
        return Err(InputError::NoTaggedBlocks {
            start: tags.start.clone(),
            end: tags.end.clone(),
        });
    }

    Ok(RecordSet {
        records,
        format: InputFormat::TaggedBlocks(tags.clone()),
    })
}

/// Render records in the given output shape
pub fn render_records(records: &[Value], format: &InputFormat) -> Result<String, serde_json::Error> {
    match format {
        InputFormat::JsonArray => serde_json::to_string_pretty(records),
        InputFormat::JsonLines => {
            let mut out = String::new();
            for record in records {
                out.push_str(&serde_json::to_string(record)?);
                out.push('\n');
            }
            Ok(out)
        }
        InputFormat::TaggedBlocks(tags) => Ok(records
            .iter()
            .map(|record| {
                let text = record
                    .get(TAGGED_TEXT_FIELD)
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                match record.get(TAGGED_RAW_FIELD).and_then(Value::as_str) {
                    // Empty blocks are written back exactly as they were read
                    Some(raw) if text.is_empty() => raw.to_string(),
                    _ => format!("{}\n{}\n{}", tags.start, text, tags.end),
                }
            })
            .collect::<Vec<_>>()
            .join(BLOCK_SEPARATOR)),
    }
}
