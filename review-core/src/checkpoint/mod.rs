//! Checkpoint persistence
//!
//! Two durable artifacts share one JSON shape:
//!
//! ```text
//! feedback_collab.json               {Available Sections, Section Reviews}
//!        │ (read only)
//!        ▼
//! feedback_collab_with_answers.json  {Available Sections, Section Reviews, Answers}
//! ```
//!
//! Both are flushed after every section through a temp-file rename, so a crash
//! loses at most the section in flight.
//!
//! A checkpoint file must be driven by one process at a time. There is no file
//! locking and concurrent runs against the same file are unsupported.

pub mod answers;
pub mod store;
pub mod types;

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

pub use answers::AnswerStore;
pub use store::{CheckpointStore, WorkPlan};
pub use types::*;

/// Result type alias for checkpoint operations
pub type CheckpointResult<T> = Result<T, CheckpointError>;

#[derive(Error, Debug)]
pub enum CheckpointError {
    /// File exists but is not a valid checkpoint
    #[error("Corrupt checkpoint at {path}: {message}")]
    Corrupt { path: PathBuf, message: String },

    /// The review checkpoint the answers stage depends on is missing
    #[error("Review checkpoint not found at {path}")]
    NotFound { path: PathBuf },

    /// Attempt to record a heading that is not an available section
    #[error("Section '{heading}' is not an available section")]
    UnknownSection { heading: String },

    /// Reserved key used as a section heading
    #[error("'{heading}' is reserved and cannot be used as a section heading")]
    ReservedHeading { heading: String },

    /// Answers target would overwrite the review checkpoint
    #[error("Answers path {path} must differ from the review checkpoint path")]
    SamePath { path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Read and parse a JSON file, `Ok(None)` when it does not exist.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> CheckpointResult<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(path)?;
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|e| CheckpointError::Corrupt {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Read a checkpoint, falling back to its `.backup` copy if the primary is corrupt.
pub(crate) fn read_with_recovery<T: DeserializeOwned>(path: &Path) -> CheckpointResult<Option<T>> {
    match read_json(path) {
        Ok(value) => Ok(value),
        Err(CheckpointError::Corrupt { message, .. }) => {
            let backup = backup_path(path);
            warn!(path = %path.display(), error = %message, "Checkpoint corrupt, trying backup");
            match read_json(&backup)? {
                Some(value) => {
                    warn!(backup = %backup.display(), "Recovered checkpoint from backup");
                    Ok(Some(value))
                }
                None => Err(CheckpointError::Corrupt {
                    path: path.to_path_buf(),
                    message,
                }),
            }
        }
        Err(e) => Err(e),
    }
}

/// Atomically replace `path` with the pretty-printed JSON of `value`.
///
/// 1. copy the current file to `<path>.backup` (best effort)
/// 2. write `<path>.tmp`
/// 3. rename the temp file over `path`
pub(crate) fn write_atomic<T: Serialize>(path: &Path, value: &T) -> CheckpointResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    if path.exists() {
        if let Err(e) = std::fs::copy(path, backup_path(path)) {
            warn!(path = %path.display(), error = %e, "Failed to back up checkpoint");
        }
    }

    let temp = suffixed(path, "tmp");
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(&temp, json)?;
    std::fs::rename(&temp, path)?;
    debug!(path = %path.display(), "Checkpoint flushed");
    Ok(())
}

pub fn backup_path(path: &Path) -> PathBuf {
    suffixed(path, "backup")
}

fn suffixed(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    #[test]
    fn test_read_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let value: Option<Value> = read_json(&dir.path().join("absent.json")).unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn test_write_atomic_keeps_backup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("feedback.json");

        write_atomic(&path, &json!({"v": 1})).unwrap();
        assert!(!backup_path(&path).exists());

        write_atomic(&path, &json!({"v": 2})).unwrap();
        let backup: Value = read_json(&backup_path(&path)).unwrap().unwrap();
        let current: Value = read_json(&path).unwrap().unwrap();
        assert_eq!(backup["v"], 1);
        assert_eq!(current["v"], 2);
        assert!(!suffixed(&path, "tmp").exists());
    }

    #[test]
    fn test_recovery_from_backup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("feedback.json");
        write_atomic(&path, &json!({"v": 1})).unwrap();
        write_atomic(&path, &json!({"v": 2})).unwrap();
        std::fs::write(&path, "{ not json").unwrap();

        let recovered: Value = read_with_recovery(&path).unwrap().unwrap();
        assert_eq!(recovered["v"], 1);
    }

    #[test]
    fn test_corrupt_without_backup_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("feedback.json");
        std::fs::write(&path, "[1, 2").unwrap();
        let result: CheckpointResult<Option<Value>> = read_with_recovery(&path);
        assert!(matches!(result, Err(CheckpointError::Corrupt { .. })));
    }
}
