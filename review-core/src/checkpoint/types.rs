//! On-disk checkpoint shapes.
//!
//! Key names are part of the file format and are shared with every consumer of
//! the checkpoint (the Q&A stage and the scoring engine).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const KEY_AVAILABLE_SECTIONS: &str = "Available Sections";
pub const KEY_SECTION_REVIEWS: &str = "Section Reviews";
pub const KEY_ANSWERS: &str = "Answers";

pub const KEY_TEST: &str = "Test";
pub const KEY_REVIEWERS: &str = "Reviewers";
pub const KEY_GRAMMAR: &str = "Grammar Check";
pub const KEY_NOVELTY: &str = "Novelty Check";
pub const KEY_FACT: &str = "Fact Check";
pub const KEY_QUESTIONER: &str = "Questioner";
pub const KEY_FINAL_SUMMARY: &str = "Final Summary";

/// Record components in persisted order.
pub const RECORD_COMPONENTS: [&str; 7] = [
    KEY_TEST,
    KEY_REVIEWERS,
    KEY_GRAMMAR,
    KEY_NOVELTY,
    KEY_FACT,
    KEY_QUESTIONER,
    KEY_FINAL_SUMMARY,
];

/// Reserved `Section Reviews` key holding the once-per-document desk verdict.
pub const DESK_REVIEW_KEY: &str = "DeskReviewer";

/// Answers mapping: section heading → question → agent key → answer.
pub type Answers = Map<String, Value>;

/// Durable review progress for one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    #[serde(rename = "Available Sections", default)]
    pub available_sections: Vec<String>,

    /// Heading → review record. Kept as raw JSON so records written by other
    /// producers survive a round trip untouched.
    #[serde(rename = "Section Reviews", default)]
    pub section_reviews: Map<String, Value>,

    /// Present only in the answers artifact.
    #[serde(rename = "Answers", default, skip_serializing_if = "Option::is_none")]
    pub answers: Option<Answers>,
}

impl Checkpoint {
    pub fn reviewed_headings(&self) -> impl Iterator<Item = &str> {
        self.section_reviews
            .keys()
            .map(String::as_str)
            .filter(|k| *k != DESK_REVIEW_KEY)
    }

    pub fn is_reviewed(&self, heading: &str) -> bool {
        heading != DESK_REVIEW_KEY && self.section_reviews.contains_key(heading)
    }

    pub fn desk_review(&self) -> Option<DeskReview> {
        self.section_reviews
            .get(DESK_REVIEW_KEY)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn record(&self, heading: &str) -> Option<ReviewRecord> {
        self.section_reviews
            .get(heading)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// Once-per-document relevance gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeskReview {
    #[serde(rename = "Review")]
    pub review: String,
    #[serde(rename = "Accept")]
    pub accept: bool,
}

/// Full review of one section.
///
/// A `None` slot means the agent for that slot was unavailable or failed and is
/// persisted as `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    #[serde(rename = "Test")]
    pub test: Option<String>,

    /// Reviewer model → opinion text (or `null`), in consultation order.
    #[serde(rename = "Reviewers", default)]
    pub reviewers: Map<String, Value>,

    #[serde(rename = "Grammar Check")]
    pub grammar_check: Option<String>,

    #[serde(rename = "Novelty Check")]
    pub novelty_check: Option<String>,

    #[serde(rename = "Fact Check")]
    pub fact_check: Option<String>,

    #[serde(rename = "Questioner")]
    pub questioner: Option<String>,

    #[serde(rename = "Final Summary")]
    pub final_summary: Option<String>,
}

impl ReviewRecord {
    pub fn reviewer_opinion(&self, reviewer: &str) -> Option<&str> {
        self.reviewers.get(reviewer).and_then(Value::as_str)
    }

    /// Opinions that were actually produced, in consultation order.
    pub fn answered_opinions(&self) -> Vec<String> {
        self.reviewers
            .values()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    }
}
