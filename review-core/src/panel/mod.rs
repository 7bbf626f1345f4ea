//! Reviewer panel
//!
//! Sampled peer-reviewer personas and paper-derived agent identities.

pub mod identity;
pub mod paper;
pub mod sampler;

use thiserror::Error;

pub use identity::{
    ConflictOfInterest, ExperienceLevel, KnowledgeLevel, ReviewerIdentity, Tone,
    DECISION_VOCABULARY,
};
pub use paper::{paper_agent_key, PaperAgent, PaperPanel, PAPER_KEY_LEN};
pub use sampler::{PanelSampler, DEFAULT_MAX_ATTEMPTS};

/// Result type alias for panel construction
pub type PanelResult<T> = Result<T, PanelError>;

#[derive(Error, Debug)]
pub enum PanelError {
    /// Rejection sampling hit its attempt cap
    #[error("Sampled {found} of {wanted} non-conflicted reviewers before giving up after {attempts} attempts")]
    SamplingExhausted {
        wanted: usize,
        found: usize,
        attempts: usize,
    },
}
