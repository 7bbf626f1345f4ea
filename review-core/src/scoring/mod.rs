//! Decision scoring and ablation
//!
//! Persisted review records are scored section by section, combined into a
//! paper verdict, and compared across named configuration variants.

pub mod ablation;
pub mod config;
pub mod report;
pub mod score;

use thiserror::Error;

pub use ablation::{run_ablation, AblationReport, ConfigRun, FileFailure};
pub use config::{
    default_ablation_suite, load_suite, parse_suite, ConfigOverrides, DecisionScores,
    NamedConfig, ScoringConfig, ScoringConfigBuilder, VerdictPolicy, DEFAULT_REVIEWER_MODELS,
};
pub use score::{
    extract_score, filter_components, final_verdict, score_paper, PaperScore, Verdict,
    FOUR_TIER_CUTOFFS,
};

/// Result type alias for scoring
pub type ScoringResult<T> = Result<T, ScoringError>;

#[derive(Error, Debug)]
pub enum ScoringError {
    /// Checkpoint has no `Section Reviews` object
    #[error("Checkpoint has no Section Reviews")]
    MissingSectionReviews,

    #[error("Duplicate configuration name: {name}")]
    DuplicateConfig { name: String },

    #[error("Ablation suite defines no configurations")]
    EmptySuite,

    #[error("Invalid ablation suite: {0}")]
    Suite(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
