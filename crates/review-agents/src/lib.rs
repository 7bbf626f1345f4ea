//! Review Agents
//!
//! Agent-facing half of the paper review pipeline. Everything deterministic
//! (segmentation, checkpoints, scoring) lives in `review-core`; this crate
//! talks to the agent service.
//!
//! ```text
//! document ─► sections ─► ReviewPipeline ─► feedback_collab.json
//!                              │                    │
//!                     AgentBackend (Ollama)          ▼
//!                                              QaStage ─► feedback_collab_with_answers.json
//! ```
//!
//! - `agent`: backend trait, Ollama HTTP client, single-slot consultation
//! - `config`: pipeline configuration (defaults, TOML, environment)
//! - `document`: PDF / text / structured document loading
//! - `panel`: topic loading, persona sampling, agent provisioning
//! - `aggregate`: summarizer seam and `Final Summary` assembly
//! - `reference`: encyclopedia lookup for the fact checker
//! - `orchestrator`: stage 1 section review with per-section checkpoints
//! - `qa`: stage 2 question answering by paper agents
//!
//! One process per checkpoint file. Concurrent runs against the same
//! checkpoint are unsupported and nothing locks the file.

pub mod agent;
pub mod aggregate;
pub mod config;
pub mod document;
pub mod orchestrator;
pub mod panel;
pub mod prompts;
pub mod qa;
pub mod reference;

pub use agent::{consult, AgentBackend, AgentError, AgentSpec, Consultation, OllamaBackend};
pub use aggregate::{AgentSummarizer, Summarizer};
pub use config::ReviewConfig;
pub use document::{load_sections, DocumentError};
pub use orchestrator::{ReviewPipeline, RunOutcome, RunRequest, RunSummary};
pub use qa::{answer_questions, QaStage, QaSummary};
pub use reference::{ReferenceLookup, WikipediaLookup};
