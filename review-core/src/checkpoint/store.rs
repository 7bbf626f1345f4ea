//! Review checkpoint store.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::info;

use super::types::{Checkpoint, DeskReview, ReviewRecord, DESK_REVIEW_KEY};
use super::{read_with_recovery, write_atomic, CheckpointError, CheckpointResult};

/// What a run still has to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkPlan {
    /// Every requested section is already checkpointed.
    NothingToDo,
    /// Headings to review, in document order.
    Process(Vec<String>),
}

/// Incrementally grown, resumable review checkpoint.
#[derive(Debug)]
pub struct CheckpointStore {
    path: PathBuf,
    checkpoint: Checkpoint,
}

impl CheckpointStore {
    /// Open the checkpoint at `path`, starting empty if it does not exist.
    pub fn open(path: impl AsRef<Path>) -> CheckpointResult<Self> {
        let path = path.as_ref().to_path_buf();
        let checkpoint: Checkpoint = read_with_recovery(&path)?.unwrap_or_default();
        if !checkpoint.section_reviews.is_empty() {
            info!(
                path = %path.display(),
                reviewed = checkpoint.reviewed_headings().count(),
                "Resuming from checkpoint"
            );
        }
        Ok(Self { path, checkpoint })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn checkpoint(&self) -> &Checkpoint {
        &self.checkpoint
    }

    pub fn is_reviewed(&self, heading: &str) -> bool {
        self.checkpoint.is_reviewed(heading)
    }

    pub fn desk_review(&self) -> Option<DeskReview> {
        self.checkpoint.desk_review()
    }

    /// Replace the list of sections the current document offers.
    pub fn set_available_sections(&mut self, headings: Vec<String>) {
        self.checkpoint.available_sections = headings;
    }

    /// Decide which headings still need review.
    ///
    /// Already reviewed headings are excluded unless `force` is set. A single
    /// requested heading that is already reviewed yields `NothingToDo`.
    pub fn plan(&self, available: &[String], requested: Option<&str>, force: bool) -> WorkPlan {
        let pending: Vec<String> = match requested {
            Some(heading) => vec![heading.to_string()],
            None => available.to_vec(),
        }
        .into_iter()
        .filter(|h| force || !self.is_reviewed(h))
        .collect();

        if pending.is_empty() {
            WorkPlan::NothingToDo
        } else {
            WorkPlan::Process(pending)
        }
    }

    /// Store the desk verdict as the first `Section Reviews` entry.
    pub fn record_desk_review(&mut self, review: DeskReview) -> CheckpointResult<()> {
        let value = serde_json::to_value(review)?;
        let mut reordered = Map::with_capacity(self.checkpoint.section_reviews.len() + 1);
        reordered.insert(DESK_REVIEW_KEY.to_string(), value);
        for (key, record) in std::mem::take(&mut self.checkpoint.section_reviews) {
            if key != DESK_REVIEW_KEY {
                reordered.insert(key, record);
            }
        }
        self.checkpoint.section_reviews = reordered;
        Ok(())
    }

    /// Record a completed section review. Does not flush.
    pub fn append(&mut self, heading: &str, record: &ReviewRecord) -> CheckpointResult<()> {
        if heading == DESK_REVIEW_KEY {
            return Err(CheckpointError::ReservedHeading {
                heading: heading.to_string(),
            });
        }
        if !self
            .checkpoint
            .available_sections
            .iter()
            .any(|h| h == heading)
        {
            return Err(CheckpointError::UnknownSection {
                heading: heading.to_string(),
            });
        }
        let value: Value = serde_json::to_value(record)?;
        self.checkpoint
            .section_reviews
            .insert(heading.to_string(), value);
        Ok(())
    }

    /// Persist the current state atomically.
    pub fn flush(&self) -> CheckpointResult<()> {
        write_atomic(&self.path, &self.checkpoint)?;
        info!(path = %self.path.display(), "Checkpoint saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn headings(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn record(text: &str) -> ReviewRecord {
        ReviewRecord {
            test: Some(text.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_open_missing_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::open(dir.path().join("feedback.json")).unwrap();
        assert!(store.checkpoint().section_reviews.is_empty());
        assert!(store.desk_review().is_none());
    }

    #[test]
    fn test_plan_excludes_reviewed() {
        let dir = TempDir::new().unwrap();
        let mut store = CheckpointStore::open(dir.path().join("feedback.json")).unwrap();
        let available = headings(&["Abstract", "I. INTRODUCTION", "II. METHOD"]);
        store.set_available_sections(available.clone());
        store.append("Abstract", &record("ok")).unwrap();

        assert_eq!(
            store.plan(&available, None, false),
            WorkPlan::Process(headings(&["I. INTRODUCTION", "II. METHOD"]))
        );
        assert_eq!(
            store.plan(&available, Some("Abstract"), false),
            WorkPlan::NothingToDo
        );
        assert_eq!(
            store.plan(&available, Some("Abstract"), true),
            WorkPlan::Process(headings(&["Abstract"]))
        );
    }

    #[test]
    fn test_plan_nothing_left() {
        let dir = TempDir::new().unwrap();
        let mut store = CheckpointStore::open(dir.path().join("feedback.json")).unwrap();
        let available = headings(&["Abstract"]);
        store.set_available_sections(available.clone());
        store.append("Abstract", &record("ok")).unwrap();
        assert_eq!(store.plan(&available, None, false), WorkPlan::NothingToDo);
    }

    #[test]
    fn test_append_rejects_unknown_and_reserved() {
        let dir = TempDir::new().unwrap();
        let mut store = CheckpointStore::open(dir.path().join("feedback.json")).unwrap();
        store.set_available_sections(headings(&["Abstract"]));
        assert!(matches!(
            store.append("Conclusion", &record("x")),
            Err(CheckpointError::UnknownSection { .. })
        ));
        assert!(matches!(
            store.append(DESK_REVIEW_KEY, &record("x")),
            Err(CheckpointError::ReservedHeading { .. })
        ));
    }

    #[test]
    fn test_desk_review_is_first_entry() {
        let dir = TempDir::new().unwrap();
        let mut store = CheckpointStore::open(dir.path().join("feedback.json")).unwrap();
        store.set_available_sections(headings(&["Abstract"]));
        store.append("Abstract", &record("ok")).unwrap();
        store
            .record_desk_review(DeskReview {
                review: "On topic. Accept".into(),
                accept: true,
            })
            .unwrap();
        let first = store.checkpoint().section_reviews.keys().next().unwrap();
        assert_eq!(first, DESK_REVIEW_KEY);
    }

    #[test]
    fn test_flush_and_reopen_resumes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("feedback.json");
        let available = headings(&["Abstract", "I. INTRODUCTION"]);
        {
            let mut store = CheckpointStore::open(&path).unwrap();
            store.set_available_sections(available.clone());
            store.append("Abstract", &record("done")).unwrap();
            store.flush().unwrap();
        }
        let reopened = CheckpointStore::open(&path).unwrap();
        assert_eq!(reopened.checkpoint().available_sections, available);
        assert_eq!(
            reopened.checkpoint().record("Abstract").unwrap().test.as_deref(),
            Some("done")
        );
        assert_eq!(
            reopened.plan(&available, None, false),
            WorkPlan::Process(headings(&["I. INTRODUCTION"]))
        );
    }
}
