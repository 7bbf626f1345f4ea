//! Scoring configuration
//!
//! [`ScoringConfig`] is an immutable value. Ablation variants are produced by
//! cloning a base config and applying [`ConfigOverrides`], never by mutating
//! shared state.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::checkpoint::types::{
    KEY_FACT, KEY_FINAL_SUMMARY, KEY_GRAMMAR, KEY_NOVELTY, KEY_QUESTIONER, KEY_REVIEWERS, KEY_TEST,
};
use crate::decision::Decision;

use super::{ScoringError, ScoringResult};

/// Reviewer models consulted by default, in consultation order.
pub const DEFAULT_REVIEWER_MODELS: [&str; 4] = ["mistral", "llama3.2", "qwen2.5", "deepseek-r1"];

/// Numeric value of each decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecisionScores {
    #[serde(rename = "Accept")]
    pub accept: f64,
    #[serde(rename = "Reject")]
    pub reject: f64,
}

impl Default for DecisionScores {
    fn default() -> Self {
        Self {
            accept: 100.0,
            reject: 0.0,
        }
    }
}

impl DecisionScores {
    pub fn score(&self, decision: Decision) -> f64 {
        match decision {
            Decision::Accept => self.accept,
            Decision::Reject => self.reject,
        }
    }
}

/// How a final paper score becomes a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictPolicy {
    /// Accept at or above `accept_threshold`, otherwise Reject.
    #[default]
    Threshold,
    /// Accept ≥ 85, Minor Revisions ≥ 70, Major Revisions ≥ 50, else Reject.
    FourTier,
}

impl std::fmt::Display for VerdictPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerdictPolicy::Threshold => write!(f, "threshold"),
            VerdictPolicy::FourTier => write!(f, "four_tier"),
        }
    }
}

/// Parameters for turning persisted reviews into a paper verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub decision_scores: DecisionScores,
    pub section_weight: f64,
    pub accept_threshold: f64,
    pub fallback_to_reject: bool,
    pub use_weighted_avg: bool,
    /// Component → included. Components not listed are included.
    pub include_components: BTreeMap<String, bool>,
    /// Reviewer keys that count. `None` counts every reviewer.
    pub active_reviewers: Option<BTreeSet<String>>,
    pub verdict_policy: VerdictPolicy,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        let include_components = [
            (KEY_TEST, true),
            (KEY_REVIEWERS, true),
            (KEY_GRAMMAR, true),
            (KEY_NOVELTY, true),
            (KEY_FACT, true),
            (KEY_QUESTIONER, false),
            (KEY_FINAL_SUMMARY, true),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            decision_scores: DecisionScores::default(),
            section_weight: 1.0,
            accept_threshold: 50.0,
            fallback_to_reject: true,
            use_weighted_avg: true,
            include_components,
            active_reviewers: Some(DEFAULT_REVIEWER_MODELS.iter().map(|m| m.to_string()).collect()),
            verdict_policy: VerdictPolicy::Threshold,
        }
    }
}

impl ScoringConfig {
    pub fn builder() -> ScoringConfigBuilder {
        ScoringConfigBuilder::default()
    }

    /// Whether a record component takes part in scoring.
    pub fn includes(&self, component: &str) -> bool {
        self.include_components.get(component).copied().unwrap_or(true)
    }

    pub fn reviewer_active(&self, reviewer: &str) -> bool {
        self.active_reviewers
            .as_ref()
            .map_or(true, |set| set.contains(reviewer))
    }

    /// Clone this config and apply overrides. `include_components` is merged
    /// key by key; every other field is replaced when present.
    pub fn with_overrides(&self, overrides: &ConfigOverrides) -> ScoringConfig {
        let mut config = self.clone();
        if let Some(scores) = overrides.decision_scores {
            config.decision_scores = scores;
        }
        if let Some(weight) = overrides.section_weight {
            config.section_weight = weight;
        }
        if let Some(threshold) = overrides.accept_threshold {
            config.accept_threshold = threshold;
        }
        if let Some(fallback) = overrides.fallback_to_reject {
            config.fallback_to_reject = fallback;
        }
        if let Some(weighted) = overrides.use_weighted_avg {
            config.use_weighted_avg = weighted;
        }
        if let Some(components) = &overrides.include_components {
            for (component, included) in components {
                config
                    .include_components
                    .insert(component.clone(), *included);
            }
        }
        if let Some(reviewers) = &overrides.active_reviewers {
            config.active_reviewers = Some(reviewers.iter().cloned().collect());
        }
        if let Some(policy) = overrides.verdict_policy {
            config.verdict_policy = policy;
        }
        config
    }
}

/// Builder for [`ScoringConfig`], starting from the documented defaults.
#[derive(Debug, Clone, Default)]
pub struct ScoringConfigBuilder {
    config: ScoringConfig,
}

impl ScoringConfigBuilder {
    pub fn decision_scores(mut self, accept: f64, reject: f64) -> Self {
        self.config.decision_scores = DecisionScores { accept, reject };
        self
    }

    pub fn section_weight(mut self, weight: f64) -> Self {
        self.config.section_weight = weight;
        self
    }

    pub fn accept_threshold(mut self, threshold: f64) -> Self {
        self.config.accept_threshold = threshold;
        self
    }

    pub fn fallback_to_reject(mut self, fallback: bool) -> Self {
        self.config.fallback_to_reject = fallback;
        self
    }

    pub fn use_weighted_avg(mut self, weighted: bool) -> Self {
        self.config.use_weighted_avg = weighted;
        self
    }

    pub fn include_component(mut self, component: impl Into<String>, included: bool) -> Self {
        self.config
            .include_components
            .insert(component.into(), included);
        self
    }

    pub fn active_reviewers<I, S>(mut self, reviewers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.active_reviewers = Some(reviewers.into_iter().map(Into::into).collect());
        self
    }

    /// Count every reviewer key found in a record.
    pub fn all_reviewers(mut self) -> Self {
        self.config.active_reviewers = None;
        self
    }

    pub fn verdict_policy(mut self, policy: VerdictPolicy) -> Self {
        self.config.verdict_policy = policy;
        self
    }

    pub fn build(self) -> ScoringConfig {
        self.config
    }
}

/// Partial configuration applied on top of a base [`ScoringConfig`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigOverrides {
    pub decision_scores: Option<DecisionScores>,
    pub section_weight: Option<f64>,
    pub accept_threshold: Option<f64>,
    pub fallback_to_reject: Option<bool>,
    pub use_weighted_avg: Option<bool>,
    pub include_components: Option<BTreeMap<String, bool>>,
    pub active_reviewers: Option<Vec<String>>,
    pub verdict_policy: Option<VerdictPolicy>,
}

impl ConfigOverrides {
    fn components(entries: &[(&str, bool)]) -> Option<BTreeMap<String, bool>> {
        Some(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
        )
    }
}

/// A named ablation variant.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedConfig {
    pub name: String,
    pub overrides: ConfigOverrides,
}

impl NamedConfig {
    pub fn new(name: impl Into<String>, overrides: ConfigOverrides) -> Self {
        Self {
            name: name.into(),
            overrides,
        }
    }
}

/// Component switches that leave only reviewer opinions in play.
const REVIEWERS_ONLY: &[(&str, bool)] = &[
    (KEY_TEST, false),
    (KEY_GRAMMAR, false),
    (KEY_NOVELTY, false),
    (KEY_FACT, false),
    (KEY_FINAL_SUMMARY, false),
];

/// The standard ablation sweep for a set of reviewer models.
pub fn default_ablation_suite(models: &[String]) -> Vec<NamedConfig> {
    let reviewers_only = || ConfigOverrides {
        include_components: ConfigOverrides::components(REVIEWERS_ONLY),
        ..Default::default()
    };
    let with_reviewers = |reviewers: Vec<String>| ConfigOverrides {
        active_reviewers: Some(reviewers),
        ..reviewers_only()
    };

    let mut suite = vec![
        NamedConfig::new("baseline", ConfigOverrides::default()),
        NamedConfig::new(
            "higher_threshold",
            ConfigOverrides {
                accept_threshold: Some(70.0),
                ..Default::default()
            },
        ),
        NamedConfig::new(
            "lower_threshold",
            ConfigOverrides {
                accept_threshold: Some(30.0),
                ..Default::default()
            },
        ),
        NamedConfig::new("reviewers_only", reviewers_only()),
        NamedConfig::new(
            "no_reviewers",
            ConfigOverrides {
                include_components: ConfigOverrides::components(&[(KEY_REVIEWERS, false)]),
                ..Default::default()
            },
        ),
        NamedConfig::new(
            "test_and_summary_only",
            ConfigOverrides {
                include_components: ConfigOverrides::components(&[
                    (KEY_REVIEWERS, false),
                    (KEY_GRAMMAR, false),
                    (KEY_NOVELTY, false),
                    (KEY_FACT, false),
                ]),
                ..Default::default()
            },
        ),
        NamedConfig::new(
            "fact_and_novelty_only",
            ConfigOverrides {
                include_components: ConfigOverrides::components(&[
                    (KEY_TEST, false),
                    (KEY_REVIEWERS, false),
                    (KEY_GRAMMAR, false),
                    (KEY_FINAL_SUMMARY, false),
                ]),
                ..Default::default()
            },
        ),
        NamedConfig::new(
            "grammar_only",
            ConfigOverrides {
                include_components: ConfigOverrides::components(&[
                    (KEY_TEST, false),
                    (KEY_REVIEWERS, false),
                    (KEY_NOVELTY, false),
                    (KEY_FACT, false),
                    (KEY_FINAL_SUMMARY, false),
                ]),
                ..Default::default()
            },
        ),
        NamedConfig::new(
            "include_questioner",
            ConfigOverrides {
                include_components: ConfigOverrides::components(&[(KEY_QUESTIONER, true)]),
                ..Default::default()
            },
        ),
        NamedConfig::new(
            "different_scores",
            ConfigOverrides {
                decision_scores: Some(DecisionScores {
                    accept: 80.0,
                    reject: 20.0,
                }),
                ..Default::default()
            },
        ),
        NamedConfig::new(
            "no_fallback",
            ConfigOverrides {
                fallback_to_reject: Some(false),
                ..Default::default()
            },
        ),
        NamedConfig::new(
            "unweighted_avg",
            ConfigOverrides {
                use_weighted_avg: Some(false),
                ..Default::default()
            },
        ),
        NamedConfig::new("all_reviewers", with_reviewers(models.to_vec())),
    ];

    if let Some((first, rest)) = models.split_first() {
        suite.push(NamedConfig::new(
            format!("no_{first}"),
            with_reviewers(rest.to_vec()),
        ));
    }
    for model in models {
        suite.push(NamedConfig::new(
            format!("only_{model}"),
            with_reviewers(vec![model.clone()]),
        ));
    }
    suite
}

#[derive(Debug, Deserialize)]
struct SuiteFile {
    #[serde(default)]
    config: Vec<SuiteEntry>,
}

#[derive(Debug, Deserialize)]
struct SuiteEntry {
    name: String,
    #[serde(flatten)]
    overrides: ConfigOverrides,
}

/// Parse an ablation suite from TOML (`[[config]]` entries, order preserved).
pub fn parse_suite(text: &str) -> ScoringResult<Vec<NamedConfig>> {
    let file: SuiteFile = toml::from_str(text)?;
    let mut seen = BTreeSet::new();
    let mut suite = Vec::with_capacity(file.config.len());
    for entry in file.config {
        if !seen.insert(entry.name.clone()) {
            return Err(ScoringError::DuplicateConfig { name: entry.name });
        }
        suite.push(NamedConfig::new(entry.name, entry.overrides));
    }
    if suite.is_empty() {
        return Err(ScoringError::EmptySuite);
    }
    Ok(suite)
}

pub fn load_suite(path: impl AsRef<Path>) -> ScoringResult<Vec<NamedConfig>> {
    let text = std::fs::read_to_string(path.as_ref())?;
    parse_suite(&text)
}
