//! Answers checkpoint.
//!
//! Reads the review checkpoint once, never writes to it, and persists the
//! review data plus an `Answers` mapping to a separate file.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::info;

use super::types::{Answers, Checkpoint, DESK_REVIEW_KEY, KEY_QUESTIONER};
use super::{read_json, read_with_recovery, write_atomic, CheckpointError, CheckpointResult};

/// A reviewed section awaiting question answering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuestions {
    pub heading: String,
    /// Questioner output, empty when the slot was not filled.
    pub questioner: String,
}

#[derive(Debug)]
pub struct AnswerStore {
    answers_path: PathBuf,
    checkpoint: Checkpoint,
}

impl AnswerStore {
    /// Open the answers artifact for a review checkpoint.
    ///
    /// Answers already present in `answers_path` are resumed.
    pub fn open(review_path: impl AsRef<Path>, answers_path: impl AsRef<Path>) -> CheckpointResult<Self> {
        let review_path = review_path.as_ref();
        let answers_path = answers_path.as_ref().to_path_buf();
        if review_path == answers_path {
            return Err(CheckpointError::SamePath { path: answers_path });
        }

        let mut checkpoint: Checkpoint =
            read_json(review_path)?.ok_or_else(|| CheckpointError::NotFound {
                path: review_path.to_path_buf(),
            })?;

        let previous: Option<Checkpoint> = read_with_recovery(&answers_path)?;
        let answers = previous.and_then(|p| p.answers).unwrap_or_default();
        if !answers.is_empty() {
            info!(
                path = %answers_path.display(),
                answered = answers.len(),
                "Resuming answers"
            );
        }
        checkpoint.answers = Some(answers);

        Ok(Self {
            answers_path,
            checkpoint,
        })
    }

    pub fn path(&self) -> &Path {
        &self.answers_path
    }

    pub fn checkpoint(&self) -> &Checkpoint {
        &self.checkpoint
    }

    pub fn answers(&self) -> Option<&Answers> {
        self.checkpoint.answers.as_ref()
    }

    pub fn is_answered(&self, heading: &str) -> bool {
        self.answers().is_some_and(|a| a.contains_key(heading))
    }

    /// Reviewed sections, in checkpoint order, with their questioner text.
    pub fn reviewed_sections(&self) -> Vec<PendingQuestions> {
        self.checkpoint
            .section_reviews
            .iter()
            .filter(|(heading, _)| heading.as_str() != DESK_REVIEW_KEY)
            .map(|(heading, record)| PendingQuestions {
                heading: heading.clone(),
                questioner: record
                    .get(KEY_QUESTIONER)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            })
            .collect()
    }

    /// Record all answers for one section: question → agent → answer.
    pub fn record_section(&mut self, heading: &str, answers: Map<String, Value>) {
        self.checkpoint
            .answers
            .get_or_insert_with(Map::new)
            .insert(heading.to_string(), Value::Object(answers));
    }

    pub fn flush(&self) -> CheckpointResult<()> {
        write_atomic(&self.answers_path, &self.checkpoint)?;
        info!(path = %self.answers_path.display(), "Answers saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::store::CheckpointStore;
    use crate::checkpoint::types::ReviewRecord;
    use serde_json::json;
    use tempfile::TempDir;

    fn seeded_review(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("feedback_collab.json");
        let mut store = CheckpointStore::open(&path).unwrap();
        store.set_available_sections(vec!["Abstract".into(), "II. METHOD".into()]);
        let record = ReviewRecord {
            questioner: Some("Why this? How that?".into()),
            ..Default::default()
        };
        store.append("Abstract", &record).unwrap();
        store.append("II. METHOD", &ReviewRecord::default()).unwrap();
        store.flush().unwrap();
        path
    }

    #[test]
    fn test_missing_review_checkpoint() {
        let dir = TempDir::new().unwrap();
        let err = AnswerStore::open(dir.path().join("nope.json"), dir.path().join("a.json"))
            .unwrap_err();
        assert!(matches!(err, CheckpointError::NotFound { .. }));
    }

    #[test]
    fn test_same_path_refused() {
        let dir = TempDir::new().unwrap();
        let review = seeded_review(&dir);
        assert!(matches!(
            AnswerStore::open(&review, &review),
            Err(CheckpointError::SamePath { .. })
        ));
    }

    #[test]
    fn test_flush_leaves_review_checkpoint_untouched() {
        let dir = TempDir::new().unwrap();
        let review = seeded_review(&dir);
        let before = std::fs::read_to_string(&review).unwrap();

        let answers_path = dir.path().join("feedback_collab_with_answers.json");
        let mut store = AnswerStore::open(&review, &answers_path).unwrap();
        let sections = store.reviewed_sections();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].questioner, "Why this? How that?");
        assert_eq!(sections[1].questioner, "");

        let mut answers = Map::new();
        answers.insert("Why this?".into(), json!({"II.METHOD": "No answer"}));
        store.record_section("Abstract", answers);
        store.flush().unwrap();

        assert_eq!(std::fs::read_to_string(&review).unwrap(), before);
        let written: Value =
            serde_json::from_str(&std::fs::read_to_string(&answers_path).unwrap()).unwrap();
        assert_eq!(written["Answers"]["Abstract"]["Why this?"]["II.METHOD"], "No answer");
        assert!(written["Section Reviews"]["Abstract"].is_object());
    }

    #[test]
    fn test_resume_existing_answers() {
        let dir = TempDir::new().unwrap();
        let review = seeded_review(&dir);
        let answers_path = dir.path().join("answers.json");

        let mut first = AnswerStore::open(&review, &answers_path).unwrap();
        assert!(!first.is_answered("Abstract"));
        first.record_section("Abstract", Map::new());
        first.flush().unwrap();

        let second = AnswerStore::open(&review, &answers_path).unwrap();
        assert!(second.is_answered("Abstract"));
        assert!(!second.is_answered("II. METHOD"));
    }
}
