//! Decision classification
//!
//! Free-text reviewer output and structured review values are reduced to a
//! tagged [`Classification`]. The first standalone, case-insensitive
//! `accept`/`reject` word wins; `acceptable` or `rejection` never match.
//! A boolean `Accept` field on an object takes priority over any text.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::LazyLock;

static DECISION_WORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(accept|reject)\b").expect("DECISION_WORD_RE regex should compile")
});

/// Binary paper decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Decision {
    Accept,
    Reject,
}

impl Decision {
    pub fn is_accept(self) -> bool {
        matches!(self, Decision::Accept)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Accept => write!(f, "Accept"),
            Decision::Reject => write!(f, "Reject"),
        }
    }
}

/// Outcome of classifying a review value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Accept,
    Reject,
    Ambiguous,
}

impl Classification {
    pub fn decision(self) -> Option<Decision> {
        match self {
            Classification::Accept => Some(Decision::Accept),
            Classification::Reject => Some(Decision::Reject),
            Classification::Ambiguous => None,
        }
    }
}

impl From<bool> for Classification {
    fn from(accept: bool) -> Self {
        if accept {
            Classification::Accept
        } else {
            Classification::Reject
        }
    }
}

/// Classify free text by its first standalone decision word.
pub fn classify_text(text: &str) -> Classification {
    match DECISION_WORD_RE.captures(text) {
        Some(caps) if caps[1].eq_ignore_ascii_case("accept") => Classification::Accept,
        Some(_) => Classification::Reject,
        None => Classification::Ambiguous,
    }
}

/// Classify a review value.
///
/// Objects: a boolean `Accept` field decides outright; otherwise string fields
/// are scanned in iteration order and the first decided one wins. Strings are
/// scanned directly. Anything else is ambiguous.
pub fn classify_value(value: &Value) -> Classification {
    match value {
        Value::Object(map) => {
            if let Some(Value::Bool(accept)) = map.get("Accept") {
                return Classification::from(*accept);
            }
            map.values()
                .filter_map(Value::as_str)
                .map(classify_text)
                .find(|c| *c != Classification::Ambiguous)
                .unwrap_or(Classification::Ambiguous)
        }
        Value::String(text) => classify_text(text),
        _ => Classification::Ambiguous,
    }
}

/// Extract a decision, applying the explicit reject fallback for ambiguous values.
pub fn extract_decision(value: &Value, fallback_to_reject: bool) -> Option<Decision> {
    match classify_value(value).decision() {
        Some(decision) => Some(decision),
        None if fallback_to_reject => Some(Decision::Reject),
        None => None,
    }
}
