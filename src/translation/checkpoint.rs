/*!
 * Persisted run progress.
 *
 * Two artifacts live next to the output file:
 * - `<output>.temp`: JSON array holding the output produced so far
 * - `<output>.progress`: marker with the last completed index and a
 *   fingerprint of the input records
 *
 * Both are replaced atomically after every record, snapshot first. A crash
 * between the two writes leaves a snapshot one record ahead of the marker,
 * which `load` truncates back. Anything unreadable or stale is discarded with
 * a warning and the run starts from scratch.
 */

use chrono::Utc;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::errors::{CheckpointError, CheckpointLoadError};
use crate::file_utils::FileManager;

pub const MARKER_SUFFIX: &str = ".progress";
pub const SNAPSHOT_SUFFIX: &str = ".temp";

/// Content of the progress marker
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgressMarker {
    pub last_completed_index: usize,
    pub input_fingerprint: String,
    pub updated_at: String,
}

/// Progress restored at run start
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckpointState {
    /// Output records for indices `0..=last_completed_index`
    pub accumulated: Vec<Value>,
}

impl CheckpointState {
    pub fn last_completed_index(&self) -> Option<usize> {
        self.accumulated.len().checked_sub(1)
    }

    pub fn is_fresh(&self) -> bool {
        self.accumulated.is_empty()
    }
}

/// Reads and writes the checkpoint artifacts of one output file
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    marker_path: PathBuf,
    snapshot_path: PathBuf,
    fingerprint: String,
}

impl CheckpointStore {
    pub fn new(marker_path: PathBuf, snapshot_path: PathBuf, fingerprint: String) -> Self {
        Self {
            marker_path,
            snapshot_path,
            fingerprint,
        }
    }

    /// Store for `output`, bound to the given input records
    pub fn for_output(output: &Path, records: &[Value]) -> Self {
        Self::new(
            FileManager::sibling_with_suffix(output, MARKER_SUFFIX),
            FileManager::sibling_with_suffix(output, SNAPSHOT_SUFFIX),
            fingerprint(records),
        )
    }

    pub fn marker_path(&self) -> &Path {
        &self.marker_path
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn exists(&self) -> bool {
        FileManager::file_exists(&self.marker_path) || FileManager::file_exists(&self.snapshot_path)
    }

    /// Restore progress for an input of `total` records; never fails
    pub fn load(&self, total: usize) -> CheckpointState {
        match self.try_load(total) {
            Ok(Some(state)) => {
                info!(
                    "Resuming from checkpoint: {} of {} records already done",
                    state.accumulated.len(),
                    total
                );
                state
            }
            Ok(None) => CheckpointState::default(),
            Err(reason) => {
                warn!("Ignoring checkpoint ({}), starting from the beginning", reason);
                CheckpointState::default()
            }
        }
    }

    /// Like `load`, but reports why an existing checkpoint cannot be used
    pub fn try_load(&self, total: usize) -> Result<Option<CheckpointState>, CheckpointLoadError> {
        if !FileManager::file_exists(&self.marker_path) {
            if FileManager::file_exists(&self.snapshot_path) {
                return Err(CheckpointLoadError::OrphanSnapshot(self.snapshot_path.clone()));
            }
            return Ok(None);
        }

        let marker: ProgressMarker = read_json(&self.marker_path)?;
        if marker.input_fingerprint != self.fingerprint {
            return Err(CheckpointLoadError::Stale);
        }

        let expected = marker.last_completed_index + 1;
        if expected > total {
            return Err(CheckpointLoadError::BeyondInput {
                completed: expected,
                total,
            });
        }

        let mut accumulated: Vec<Value> = read_json(&self.snapshot_path)?;
        if accumulated.len() < expected {
            return Err(CheckpointLoadError::Mismatch {
                snapshot: accumulated.len(),
                marker: expected,
            });
        }
        if accumulated.len() > expected {
            warn!(
                "Snapshot is ahead of the progress marker ({} > {}), dropping the extra records",
                accumulated.len(),
                expected
            );
            accumulated.truncate(expected);
        }

        Ok(Some(CheckpointState { accumulated }))
    }

    /// Persist the output produced so far
    pub fn save(&self, accumulated: &[Value]) -> Result<(), CheckpointError> {
        let Some(last_completed_index) = accumulated.len().checked_sub(1) else {
            return Ok(());
        };

        let snapshot = serde_json::to_vec(accumulated)?;
        write(&self.snapshot_path, &snapshot)?;

        let marker = ProgressMarker {
            last_completed_index,
            input_fingerprint: self.fingerprint.clone(),
            updated_at: Utc::now().to_rfc3339(),
        };
        write(&self.marker_path, &serde_json::to_vec_pretty(&marker)?)?;
        Ok(())
    }

    /// Delete both artifacts
    pub fn clear(&self) -> Result<(), CheckpointError> {
        for path in [&self.snapshot_path, &self.marker_path] {
            FileManager::remove_if_exists(path).map_err(|source| CheckpointError::Io {
                path: path.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

/// SHA-256 over the serialized records
pub fn fingerprint(records: &[Value]) -> String {
    let mut hasher = Sha256::new();
    for record in records {
        hasher.update(record.to_string().as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

fn write(path: &Path, content: &[u8]) -> Result<(), CheckpointError> {
    FileManager::write_atomic(path, content).map_err(|source| CheckpointError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CheckpointLoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| CheckpointLoadError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| CheckpointLoadError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}
