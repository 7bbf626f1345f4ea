//! Review Core
//!
//! Deterministic building blocks of the paper review pipeline:
//! - `section`: heading-driven segmentation and structured section input
//! - `panel`: reviewer personas, bounded panel sampling, paper-derived agents
//! - `decision`: Accept/Reject classification of free text and review values
//! - `ensemble`: sentiment-weighted opinion concatenation
//! - `checkpoint`: resumable review and answers checkpoints
//! - `scoring`: section scores, paper verdicts and ablation sweeps
//! - `agreement`: pairwise reviewer agreement statistics
//!
//! Nothing here talks to an agent service; see the `review-agents` crate.

pub mod agreement;
pub mod checkpoint;
pub mod decision;
pub mod ensemble;
pub mod panel;
pub mod scoring;
pub mod section;

pub use checkpoint::{
    AnswerStore, Checkpoint, CheckpointError, CheckpointResult, CheckpointStore, DeskReview,
    ReviewRecord, WorkPlan, DESK_REVIEW_KEY,
};
pub use decision::{classify_text, classify_value, extract_decision, Classification, Decision};
pub use ensemble::{
    repetition_counts, sentiment_weights, weighted_concatenation, weighted_text,
    LexiconSentiment, SentimentScorer,
};
pub use panel::{
    paper_agent_key, PaperPanel, PanelError, PanelResult, PanelSampler, ReviewerIdentity,
};
pub use scoring::{
    run_ablation, score_paper, AblationReport, ConfigOverrides, NamedConfig, ScoringConfig,
    ScoringError, ScoringResult, Verdict, VerdictPolicy,
};
pub use section::{segment, Section, SectionError, SectionResult};
