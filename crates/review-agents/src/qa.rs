//! Question answering (stage 2).
//!
//! Each reviewed section's `Questioner` text is split into questions and every
//! paper agent except the one built from that section answers each question
//! from its own section knowledge. Results go to the answers artifact, flushed
//! after every section; sections already answered are skipped on resume.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use review_core::checkpoint::AnswerStore;
use review_core::panel::paper_agent_key;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::agent::{consult, AgentBackend};
use crate::config::ReviewConfig;
use crate::panel::read_model_list;
use crate::prompts;

/// Split on `?`, keeping the delimiter on every non-empty fragment.
pub fn split_questions(text: &str) -> Vec<String> {
    text.split('?')
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(|q| format!("{q}?"))
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct QaSummary {
    pub answered: Vec<String>,
    pub skipped: usize,
    pub questions: usize,
    pub consultations: usize,
    pub elapsed: Duration,
}

impl QaSummary {
    pub fn log(&self) {
        info!(
            answered = self.answered.len(),
            skipped = self.skipped,
            questions = self.questions,
            consultations = self.consultations,
            elapsed_secs = self.elapsed.as_secs_f64(),
            "Question answering finished"
        );
    }
}

pub struct QaStage {
    backend: Arc<dyn AgentBackend>,
    exclude_originating_agent: bool,
}

impl QaStage {
    pub fn new(backend: Arc<dyn AgentBackend>, exclude_originating_agent: bool) -> Self {
        Self {
            backend,
            exclude_originating_agent,
        }
    }

    /// Agents that may answer questions raised about `heading`.
    pub fn answering_agents<'a>(&self, heading: &str, agents: &'a [String]) -> Vec<&'a str> {
        let own_key = paper_agent_key(heading);
        agents
            .iter()
            .map(String::as_str)
            .filter(|agent| {
                !self.exclude_originating_agent || (*agent != own_key && *agent != heading)
            })
            .collect()
    }

    /// Answers for one section: question → agent → answer (or `null`).
    async fn answer_section(
        &self,
        heading: &str,
        questioner: &str,
        agents: &[String],
        summary: &mut QaSummary,
    ) -> Map<String, Value> {
        let answering = self.answering_agents(heading, agents);
        let mut answers = Map::new();

        for question in split_questions(questioner) {
            info!(heading, question = %question, "Answering question");
            summary.questions += 1;
            let prompt = prompts::qa_prompt(&question);
            let mut by_agent = Map::new();
            for agent in &answering {
                summary.consultations += 1;
                let answer = consult(self.backend.as_ref(), agent, &prompt)
                    .await
                    .into_answer()
                    .map(Value::String)
                    .unwrap_or(Value::Null);
                by_agent.insert(agent.to_string(), answer);
            }
            answers.insert(question, Value::Object(by_agent));
        }
        answers
    }

    /// Answer every reviewed section not yet in the answers artifact.
    pub async fn run(&self, store: &mut AnswerStore, agents: &[String]) -> Result<QaSummary> {
        let clock = Instant::now();
        let mut summary = QaSummary::default();

        for pending in store.reviewed_sections() {
            if store.is_answered(&pending.heading) {
                info!(heading = %pending.heading, "Skipping already answered section");
                summary.skipped += 1;
                continue;
            }

            info!(heading = %pending.heading, "Processing section questions");
            let answers = self
                .answer_section(&pending.heading, &pending.questioner, agents, &mut summary)
                .await;
            store.record_section(&pending.heading, answers);
            store.flush().with_context(|| {
                format!("Failed to save answers for section '{}'", pending.heading)
            })?;
            summary.answered.push(pending.heading);
        }

        summary.elapsed = clock.elapsed();
        Ok(summary)
    }
}

/// Stage 2 entry point. Returns `None` with a warning when stage 1 has not
/// produced the review checkpoint or the paper agent list yet.
pub async fn answer_questions(
    config: &ReviewConfig,
    backend: Arc<dyn AgentBackend>,
) -> Result<Option<QaSummary>> {
    for (path, artifact) in [
        (&config.checkpoint_path, "review checkpoint"),
        (&config.model_list_path, "paper agent list"),
    ] {
        if !path.is_file() {
            warn!(path = %path.display(), artifact, "Nothing to answer from, skipping question answering");
            return Ok(None);
        }
    }

    let agents = read_model_list(&config.model_list_path)?;
    let mut answers = AnswerStore::open(&config.checkpoint_path, &config.answers_path)
        .context("Failed to open answers checkpoint")?;
    let stage = QaStage::new(backend, config.exclude_originating_agent);
    stage.run(&mut answers, &agents).await.map(Some)
}
