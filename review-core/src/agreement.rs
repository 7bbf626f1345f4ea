//! Reviewer agreement statistics
//!
//! For every section with at least two decided reviewers, counts each
//! reviewer's decisions and, for each ordered pair `(i, j)`, how often `j`
//! decided `d_j` when `i` decided `d_i`. From those counts
//! `P(j = d_j | i = d_i)` follows directly.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use serde_json::Value;
use tracing::warn;

use crate::checkpoint::types::{KEY_REVIEWERS, KEY_SECTION_REVIEWS, RECORD_COMPONENTS};
use crate::decision::{classify_value, Decision};
use crate::scoring::{FileFailure, ScoringResult};

/// Record keys that never stand for an individual reviewer.
const NON_REVIEWER_KEYS: &[&str] = &["Review"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecisionCounts {
    pub accept: usize,
    pub reject: usize,
}

impl DecisionCounts {
    pub fn add(&mut self, decision: Decision) {
        match decision {
            Decision::Accept => self.accept += 1,
            Decision::Reject => self.reject += 1,
        }
    }

    pub fn get(&self, decision: Decision) -> usize {
        match decision {
            Decision::Accept => self.accept,
            Decision::Reject => self.reject,
        }
    }

    pub fn total(&self) -> usize {
        self.accept + self.reject
    }
}

#[derive(Debug, Clone, Default)]
pub struct AgreementStats {
    /// Reviewer → decision totals.
    pub totals: BTreeMap<String, DecisionCounts>,
    /// (given reviewer, given decision, target reviewer) → target decisions.
    pub conditional: BTreeMap<(String, Decision, String), DecisionCounts>,
    /// Sections that contributed (two or more decided reviewers).
    pub sections: usize,
}

/// Decided reviewers of one section record, in record order.
pub fn section_decisions(record: &Value) -> Vec<(String, Decision)> {
    let Value::Object(map) = record else {
        return Vec::new();
    };

    let mut decisions: Vec<(String, Decision)> = Vec::new();
    let mut push = |name: &str, decision: Decision| {
        match decisions.iter_mut().find(|(n, _)| n == name) {
            Some(existing) => existing.1 = decision,
            None => decisions.push((name.to_string(), decision)),
        }
    };

    if let Some(Value::Object(reviewers)) = map.get(KEY_REVIEWERS) {
        for (name, opinion) in reviewers {
            if let Some(decision) = classify_value(opinion).decision() {
                push(name, decision);
            }
        }
    }

    for (key, value) in map {
        if RECORD_COMPONENTS.contains(&key.as_str()) || NON_REVIEWER_KEYS.contains(&key.as_str()) {
            continue;
        }
        if let Some(decision) = classify_value(value).decision() {
            push(key, decision);
        }
    }

    decisions
}

impl AgreementStats {
    pub fn add_section(&mut self, record: &Value) {
        let decisions = section_decisions(record);
        if decisions.len() < 2 {
            return;
        }
        self.sections += 1;

        for (i, (given, given_decision)) in decisions.iter().enumerate() {
            self.totals
                .entry(given.clone())
                .or_default()
                .add(*given_decision);
            for (j, (target, target_decision)) in decisions.iter().enumerate() {
                if i == j {
                    continue;
                }
                self.conditional
                    .entry((given.clone(), *given_decision, target.clone()))
                    .or_default()
                    .add(*target_decision);
            }
        }
    }

    /// Add every section of a checkpoint. Returns false if it has no reviews.
    pub fn add_checkpoint(&mut self, checkpoint: &Value) -> bool {
        let Some(reviews) = checkpoint.get(KEY_SECTION_REVIEWS).and_then(Value::as_object) else {
            return false;
        };
        for record in reviews.values() {
            self.add_section(record);
        }
        true
    }

    /// `P(target = target_decision | given = given_decision)`.
    pub fn conditional_probability(
        &self,
        given: &str,
        given_decision: Decision,
        target: &str,
        target_decision: Decision,
    ) -> Option<f64> {
        let counts = self
            .conditional
            .get(&(given.to_string(), given_decision, target.to_string()))?;
        let total = counts.total();
        (total > 0).then(|| counts.get(target_decision) as f64 / total as f64)
    }

    /// Human-readable summary of totals and pairwise conditionals.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Sections with two or more decided reviewers: {}", self.sections);
        let _ = writeln!(out, "\nDecision counts per reviewer:");
        for (reviewer, counts) in &self.totals {
            let _ = writeln!(
                out,
                "  {reviewer}: Accept {}, Reject {}",
                counts.accept, counts.reject
            );
        }
        let _ = writeln!(out, "\nConditional probabilities:");
        for ((given, given_decision, target), counts) in &self.conditional {
            let total = counts.total();
            let _ = writeln!(out, "  {target} given {given} = {given_decision}:");
            for decision in [Decision::Accept, Decision::Reject] {
                let count = counts.get(decision);
                if count == 0 {
                    continue;
                }
                let _ = writeln!(
                    out,
                    "    {decision}: {:.2} ({count}/{total})",
                    count as f64 / total as f64
                );
            }
        }
        out
    }
}

/// Accumulate agreement statistics over every `*.json` checkpoint in `dir`.
pub fn collect_agreement(dir: impl AsRef<Path>) -> ScoringResult<(AgreementStats, Vec<FileFailure>)> {
    let mut files: Vec<_> = std::fs::read_dir(dir.as_ref())?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();

    let mut stats = AgreementStats::default();
    let mut failures = Vec::new();
    for path in files {
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let parsed = std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|text| serde_json::from_str::<Value>(&text).map_err(|e| e.to_string()));
        match parsed {
            Ok(value) => {
                if !stats.add_checkpoint(&value) {
                    failures.push(FileFailure {
                        file,
                        reason: "Checkpoint has no Section Reviews".to_string(),
                    });
                }
            }
            Err(reason) => {
                warn!(file = %file, error = %reason, "Skipping unreadable checkpoint");
                failures.push(FileFailure { file, reason });
            }
        }
    }
    Ok((stats, failures))
}
