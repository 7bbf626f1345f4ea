//! Ablation sweeps over a directory of checkpoints.
//!
//! ```text
//! dir/*.json ──parse once──► papers ──┬─► config A ─► verdicts
//!                                     ├─► config B ─► verdicts
//!                                     └─► ...
//! ```
//!
//! Each named config is resolved from the base config independently. Files
//! that cannot be read or scored are reported in
//! [`AblationReport::failures`] and the sweep continues.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;
use tracing::{info, warn};

use super::config::{NamedConfig, ScoringConfig};
use super::score::{score_paper, PaperScore, Verdict};
use super::ScoringResult;

/// A checkpoint file that was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub file: String,
    pub reason: String,
}

/// Results of one named configuration.
#[derive(Debug, Clone)]
pub struct ConfigRun {
    pub name: String,
    pub config: ScoringConfig,
    /// File name → score.
    pub papers: BTreeMap<String, PaperScore>,
}

impl ConfigRun {
    pub fn accept_count(&self) -> usize {
        self.papers.values().filter(|p| p.verdict.is_accept()).count()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AblationReport {
    pub runs: Vec<ConfigRun>,
    pub failures: Vec<FileFailure>,
}

impl AblationReport {
    /// Every scored paper, sorted by file name.
    pub fn papers(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .runs
            .iter()
            .flat_map(|run| run.papers.keys().cloned())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    pub fn verdict(&self, paper: &str, config: &str) -> Option<Verdict> {
        self.runs
            .iter()
            .find(|run| run.name == config)
            .and_then(|run| run.papers.get(paper))
            .map(|score| score.verdict)
    }

    /// Share of all scored papers accepted by a run, in percent.
    pub fn accept_percentage(&self, run: &ConfigRun) -> f64 {
        let total = self.papers().len();
        if total == 0 {
            0.0
        } else {
            run.accept_count() as f64 / total as f64 * 100.0
        }
    }
}

/// Score every `*.json` checkpoint in `dir` under every named configuration.
pub fn run_ablation(
    dir: impl AsRef<Path>,
    suite: &[NamedConfig],
    base: &ScoringConfig,
) -> ScoringResult<AblationReport> {
    let dir = dir.as_ref();
    let mut report = AblationReport::default();

    let mut files: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();

    let mut papers: Vec<(String, Value)> = Vec::with_capacity(files.len());
    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let parsed = std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|text| serde_json::from_str::<Value>(&text).map_err(|e| e.to_string()));
        match parsed {
            Ok(value) => papers.push((name, value)),
            Err(reason) => {
                warn!(file = %name, error = %reason, "Skipping unreadable checkpoint");
                report.failures.push(FileFailure { file: name, reason });
            }
        }
    }

    let base_config = base.clone();
    let mut unscorable: BTreeMap<String, String> = BTreeMap::new();

    for named in suite {
        let config = base_config.with_overrides(&named.overrides);
        info!(config = %named.name, "Running configuration");

        let mut scored = BTreeMap::new();
        for (name, value) in &papers {
            match score_paper(value, &config) {
                Ok(score) => {
                    scored.insert(name.clone(), score);
                }
                Err(e) => {
                    unscorable.entry(name.clone()).or_insert_with(|| e.to_string());
                }
            }
        }

        report.runs.push(ConfigRun {
            name: named.name.clone(),
            config,
            papers: scored,
        });
    }

    for (file, reason) in unscorable {
        warn!(file = %file, error = %reason, "Skipping checkpoint without reviews");
        report.failures.push(FileFailure { file, reason });
    }

    Ok(report)
}
