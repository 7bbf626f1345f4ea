//! Section review orchestrator (stage 1).
//!
//! ```text
//! plan ──► provision agents ──► desk review (once, fatal) ──► for each pending section:
//!                                                              reviewers (sequential fold)
//!                                                              ensemble summary
//!                                                              test / grammar / novelty / fact / questions
//!                                                              append + flush
//! ```
//!
//! Reviewer consultations are strictly sequential: reviewer k sees the text
//! of reviewers 0..k when context sharing is on. All other consultations are
//! also awaited one at a time.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use review_core::checkpoint::{CheckpointStore, DeskReview, ReviewRecord, WorkPlan};
use review_core::decision::{classify_text, Classification};
use review_core::ensemble::LexiconSentiment;
use review_core::panel::{PaperPanel, ReviewerIdentity};
use review_core::section::{require_section, Section};
use serde_json::{Map, Value};
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::aggregate::{aggregate_opinions, final_summary, AgentSummarizer, Summarizer};
use crate::agent::{consult, AgentBackend, Consultation};
use crate::config::ReviewConfig;
use crate::panel::{
    base_role_specs, paper_agent_specs, provision_agents, sample_reviewers, write_model_list,
};
use crate::prompts;
use crate::reference::{find_reference, ReferenceLookup};

/// What the caller asked stage 1 to do.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunRequest {
    /// Review only this section (matched approximately).
    pub section: Option<String>,
    /// Re-review sections that are already checkpointed.
    pub force: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    NothingToDo,
    SectionNotFound,
    DeskRejected,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub outcome: RunOutcome,
    pub processed: Vec<String>,
    /// Available sections not reviewed in this run.
    pub skipped: usize,
    pub unprovisioned: Vec<String>,
}

impl RunSummary {
    fn new(run_id: Uuid, started_at: DateTime<Utc>, outcome: RunOutcome) -> Self {
        Self {
            run_id,
            started_at,
            elapsed: Duration::ZERO,
            outcome,
            processed: Vec::new(),
            skipped: 0,
            unprovisioned: Vec::new(),
        }
    }

    pub fn log(&self) {
        info!(
            run_id = %self.run_id,
            started_at = %self.started_at.to_rfc3339(),
            outcome = ?self.outcome,
            processed = self.processed.len(),
            skipped = self.skipped,
            unprovisioned = self.unprovisioned.len(),
            elapsed_secs = self.elapsed.as_secs_f64(),
            "Review stage finished"
        );
    }
}

/// Accumulated reviewer turns for one section.
#[derive(Debug, Default)]
struct Discussion {
    turns: Vec<String>,
}

impl Discussion {
    fn context(&self) -> Option<String> {
        (!self.turns.is_empty()).then(|| self.turns.join("\n"))
    }

    fn push(&mut self, turn: &str) {
        self.turns.push(turn.to_string());
    }
}

/// Whether a yes/no reply starts with "yes".
fn wants_more_facts(reply: &str) -> bool {
    reply
        .trim_start()
        .split(|c: char| !c.is_alphanumeric())
        .next()
        .is_some_and(|word| word.eq_ignore_ascii_case("yes"))
}

pub struct ReviewPipeline {
    config: ReviewConfig,
    backend: Arc<dyn AgentBackend>,
    summarizer: Arc<dyn Summarizer>,
    lookup: Option<Arc<dyn ReferenceLookup>>,
    sentiment: LexiconSentiment,
}

impl ReviewPipeline {
    pub fn new(config: ReviewConfig, backend: Arc<dyn AgentBackend>) -> Self {
        let summarizer: Arc<dyn Summarizer> = Arc::new(AgentSummarizer::new(
            Arc::clone(&backend),
            config.summary_model.clone(),
            config.summary_min_words,
            config.summary_max_words,
        ));
        Self {
            config,
            backend,
            summarizer,
            lookup: None,
            sentiment: LexiconSentiment,
        }
    }

    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = summarizer;
        self
    }

    pub fn with_reference_lookup(mut self, lookup: Arc<dyn ReferenceLookup>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    pub fn config(&self) -> &ReviewConfig {
        &self.config
    }

    async fn ask(&self, agent: &str, prompt: &str) -> Option<String> {
        consult(self.backend.as_ref(), agent, prompt)
            .await
            .into_answer()
    }

    /// Once-per-document relevance gate. Any failure is fatal for the run.
    pub async fn desk_review(&self, first: &Section) -> Result<DeskReview> {
        match consult(self.backend.as_ref(), prompts::DESK_REVIEWER, &first.content).await {
            Consultation::Answered(review) => {
                let accept = classify_text(&review) == Classification::Accept;
                Ok(DeskReview { review, accept })
            }
            Consultation::Unavailable => {
                bail!("Desk reviewer '{}' is not available", prompts::DESK_REVIEWER)
            }
            Consultation::Failed(reason) => bail!("Desk review failed: {reason}"),
        }
    }

    /// Consult every reviewer model in order, folding their replies into the
    /// shared discussion. Slots with no answer are `null`.
    pub async fn reviewer_discussion(
        &self,
        section: &Section,
        reviewers: &[ReviewerIdentity],
    ) -> Map<String, Value> {
        let mut discussion = Discussion::default();
        let mut opinions = Map::new();

        for (i, model) in self.config.reviewer_models.iter().enumerate() {
            let persona = reviewers
                .get(i % reviewers.len().max(1))
                .map(ReviewerIdentity::persona)
                .unwrap_or_default();
            let context = if self.config.share_reviewer_context {
                discussion.context()
            } else {
                None
            };
            let prompt = prompts::reviewer_prompt(&persona, &section.content, context.as_deref());

            match self.ask(model, &prompt).await {
                Some(opinion) => {
                    info!(reviewer = %model, chars = opinion.len(), "Reviewer answered");
                    discussion.push(&opinion);
                    opinions.insert(model.clone(), Value::String(opinion));
                }
                None => {
                    opinions.insert(model.clone(), Value::Null);
                }
            }
        }
        opinions
    }

    /// Fact check, optionally backed by a reference lookup.
    pub async fn fact_check(&self, section: &Section) -> Option<String> {
        let lookup = match &self.lookup {
            Some(lookup) if self.config.fact_check_lookup => lookup,
            _ => {
                return self
                    .ask(prompts::FACT_CHECKER, &prompts::fact_direct_prompt(&section.content))
                    .await
            }
        };

        let reply = self
            .ask(prompts::FACT_CHECKER, &prompts::fact_needs_lookup_prompt(&section.content))
            .await?;
        if !wants_more_facts(&reply) {
            return self
                .ask(prompts::FACT_CHECKER, &prompts::fact_direct_prompt(&section.content))
                .await;
        }

        let Some(reference) = find_reference(lookup.as_ref(), &section.content).await else {
            warn!(heading = %section.heading, "No reference found for fact check");
            return None;
        };
        self.ask(
            prompts::FACT_CHECKER,
            &prompts::fact_with_reference_prompt(&section.content, &reference),
        )
        .await
    }

    /// Produce the full review record for one section.
    pub async fn review_section(
        &self,
        section: &Section,
        reviewers: &[ReviewerIdentity],
    ) -> ReviewRecord {
        info!(heading = %section.heading, "Reviewers begin discussion");
        let opinions_map = self.reviewer_discussion(section, reviewers).await;
        let opinions: Vec<String> = opinions_map
            .values()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();

        let aggregated =
            aggregate_opinions(&opinions, &self.sentiment, self.summarizer.as_ref()).await;
        let narrative = match aggregated.as_deref() {
            Some(aggregated) => {
                self.ask(
                    &self.config.summary_model,
                    &prompts::final_decision_prompt(&section.content, aggregated),
                )
                .await
            }
            None => None,
        };

        let content = section.content.as_str();
        ReviewRecord {
            test: self.ask(prompts::TEST, content).await,
            reviewers: opinions_map,
            grammar_check: self.ask(prompts::GRAMMAR, content).await,
            novelty_check: self.ask(prompts::NOVELTY, content).await,
            fact_check: self.fact_check(section).await,
            questioner: self.ask(prompts::QUESTIONER, content).await,
            final_summary: final_summary(aggregated.as_deref(), narrative.as_deref()),
        }
    }

    /// Run stage 1 against `store`, flushing after the desk review and after
    /// every section.
    pub async fn run(
        &self,
        store: &mut CheckpointStore,
        sections: &[Section],
        topics: &[String],
        request: &RunRequest,
    ) -> Result<RunSummary> {
        let run_id = Uuid::new_v4();
        let span = info_span!("review_run", %run_id);
        self.run_inner(run_id, store, sections, topics, request)
            .instrument(span)
            .await
    }

    async fn run_inner(
        &self,
        run_id: Uuid,
        store: &mut CheckpointStore,
        sections: &[Section],
        topics: &[String],
        request: &RunRequest,
    ) -> Result<RunSummary> {
        let started_at = Utc::now();
        let clock = Instant::now();
        let Some(first) = sections.first() else {
            bail!("Document has no sections to review");
        };

        let available: Vec<String> = sections.iter().map(|s| s.heading.clone()).collect();
        for heading in &available {
            info!(heading = %heading, "Available section");
        }
        store.set_available_sections(available.clone());

        let requested = match request.section.as_deref() {
            Some(name) => match require_section(sections, name) {
                Ok(section) => Some(section.heading.clone()),
                Err(e) => {
                    error!(error = %e, "Requested section is not in the document");
                    let mut summary = RunSummary::new(run_id, started_at, RunOutcome::SectionNotFound);
                    summary.skipped = available.len();
                    summary.elapsed = clock.elapsed();
                    return Ok(summary);
                }
            },
            None => None,
        };

        let pending = match store.plan(&available, requested.as_deref(), request.force) {
            WorkPlan::NothingToDo => {
                info!("No new sections to process");
                let mut summary = RunSummary::new(run_id, started_at, RunOutcome::NothingToDo);
                summary.skipped = available.len();
                summary.elapsed = clock.elapsed();
                return Ok(summary);
            }
            WorkPlan::Process(pending) => pending,
        };
        info!(pending = pending.len(), "Sections to review");

        let reviewers = sample_reviewers(&self.config)?;
        let paper_panel = PaperPanel::from_sections(sections);
        let mut specs = base_role_specs(&self.config, topics);
        specs.extend(paper_agent_specs(&self.config, &paper_panel));
        let provisioned = provision_agents(self.backend.as_ref(), &specs).await;

        let mut summary = RunSummary::new(run_id, started_at, RunOutcome::Completed);
        summary.unprovisioned = provisioned.failed;

        let desk = match store.desk_review() {
            Some(desk) => desk,
            None => {
                let desk = self
                    .desk_review(first)
                    .await
                    .context("Desk review is required before section review")?;
                store.record_desk_review(desk.clone())?;
                store.flush().context("Failed to save desk review")?;
                desk
            }
        };
        info!(accept = desk.accept, "Desk review verdict");

        if !desk.accept && self.config.stop_on_desk_reject {
            warn!("Desk reviewer rejected the paper, stopping before section review");
            summary.outcome = RunOutcome::DeskRejected;
        } else {
            for heading in &pending {
                let Some(section) = sections.iter().find(|s| &s.heading == heading) else {
                    warn!(heading = %heading, "Pending section vanished from the document");
                    continue;
                };
                info!(heading = %heading, "Processing section");
                let record = self.review_section(section, &reviewers).await;
                store.append(heading, &record)?;
                store
                    .flush()
                    .with_context(|| format!("Failed to checkpoint section '{heading}'"))?;
                summary.processed.push(heading.clone());
            }
        }

        write_model_list(&self.config.model_list_path, &paper_panel.keys())?;

        summary.skipped = available.len().saturating_sub(summary.processed.len());
        summary.elapsed = clock.elapsed();
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::MockAgentBackend;
    use review_core::panel::{ConflictOfInterest, ExperienceLevel, KnowledgeLevel, Tone};
    use std::sync::Mutex;

    fn identity(name: &str) -> ReviewerIdentity {
        ReviewerIdentity::new(
            name,
            KnowledgeLevel::Expert,
            ExperienceLevel::SeniorCareer,
            Tone::Neutral,
            ConflictOfInterest::None,
        )
    }

    fn config(models: &[&str]) -> ReviewConfig {
        ReviewConfig {
            reviewer_models: models.iter().map(|m| m.to_string()).collect(),
            ..ReviewConfig::default()
        }
    }

    #[test]
    fn test_wants_more_facts() {
        assert!(wants_more_facts("Yes, the numbers need checking."));
        assert!(wants_more_facts("  yes"));
        assert!(!wants_more_facts("No."));
        assert!(!wants_more_facts("Yesterday's results"));
    }

    #[tokio::test]
    async fn test_reviewers_see_predecessors_in_order() {
        let prompts_seen: Arc<Mutex<Vec<(String, String)>>> = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&prompts_seen);

        let mut backend = MockAgentBackend::new();
        backend
            .expect_is_available()
            .returning(|agent| Ok(agent != "qwen2.5"));
        backend.expect_chat().returning(move |agent, prompt| {
            seen.lock()
                .unwrap()
                .push((agent.to_string(), prompt.to_string()));
            Ok(format!("{agent} says Accept"))
        });

        let pipeline = ReviewPipeline::new(
            config(&["mistral", "qwen2.5", "llama3.2"]),
            Arc::new(backend),
        );
        let section = Section::new("Abstract", "We prune heads.", 0);
        let opinions = pipeline
            .reviewer_discussion(&section, &[identity("Reviewer 1"), identity("Reviewer 2")])
            .await;

        let keys: Vec<&String> = opinions.keys().collect();
        assert_eq!(keys, vec!["mistral", "qwen2.5", "llama3.2"]);
        assert_eq!(opinions["qwen2.5"], Value::Null);
        assert_eq!(opinions["llama3.2"], "llama3.2 says Accept");

        let prompts_seen = prompts_seen.lock().unwrap();
        assert_eq!(prompts_seen.len(), 2);
        assert!(!prompts_seen[0].1.contains("Previous discussion"));
        assert!(prompts_seen[1]
            .1
            .contains("Previous discussion so far: mistral says Accept"));
        // Third model reuses the first persona.
        assert!(prompts_seen[1].1.starts_with("You are Reviewer 1,"));
    }

    #[tokio::test]
    async fn test_context_sharing_can_be_disabled() {
        let mut backend = MockAgentBackend::new();
        backend.expect_is_available().returning(|_| Ok(true));
        backend
            .expect_chat()
            .withf(|_, prompt| !prompt.contains("Previous discussion"))
            .times(2)
            .returning(|_, _| Ok("Reject".into()));

        let mut cfg = config(&["mistral", "llama3.2"]);
        cfg.share_reviewer_context = false;
        let pipeline = ReviewPipeline::new(cfg, Arc::new(backend));
        let section = Section::new("Abstract", "Text.", 0);
        pipeline.reviewer_discussion(&section, &[identity("R")]).await;
    }

    #[tokio::test]
    async fn test_desk_review_classifies_reply() {
        let mut backend = MockAgentBackend::new();
        backend.expect_is_available().returning(|_| Ok(true));
        backend
            .expect_chat()
            .withf(|agent, prompt| agent == "deskreviewer" && prompt == "Abstract text")
            .returning(|_, _| Ok("[Accept] The topic fits.".into()));
        let pipeline = ReviewPipeline::new(ReviewConfig::default(), Arc::new(backend));
        let desk = pipeline
            .desk_review(&Section::new("Abstract", "Abstract text", 0))
            .await
            .unwrap();
        assert!(desk.accept);
        assert_eq!(desk.review, "[Accept] The topic fits.");
    }

    #[tokio::test]
    async fn test_ambiguous_desk_review_is_not_accept() {
        let mut backend = MockAgentBackend::new();
        backend.expect_is_available().returning(|_| Ok(true));
        backend
            .expect_chat()
            .returning(|_, _| Ok("The topic is acceptable.".into()));
        let pipeline = ReviewPipeline::new(ReviewConfig::default(), Arc::new(backend));
        let desk = pipeline
            .desk_review(&Section::new("Abstract", "x", 0))
            .await
            .unwrap();
        assert!(!desk.accept);
    }

    #[tokio::test]
    async fn test_unavailable_desk_reviewer_is_fatal() {
        let mut backend = MockAgentBackend::new();
        backend.expect_is_available().returning(|_| Ok(false));
        backend.expect_chat().never();
        let pipeline = ReviewPipeline::new(ReviewConfig::default(), Arc::new(backend));
        let err = pipeline
            .desk_review(&Section::new("Abstract", "x", 0))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not available"));
    }

    #[tokio::test]
    async fn test_fact_check_without_lookup_asks_directly() {
        let mut backend = MockAgentBackend::new();
        backend.expect_is_available().returning(|_| Ok(true));
        backend
            .expect_chat()
            .withf(|agent, prompt| agent == "factchecker" && prompt.starts_with("Verify the claims"))
            .times(1)
            .returning(|_, _| Ok("[Accept]".into()));
        let pipeline = ReviewPipeline::new(ReviewConfig::default(), Arc::new(backend));
        let verdict = pipeline.fact_check(&Section::new("Intro", "Water boils at 100C.", 0)).await;
        assert_eq!(verdict.as_deref(), Some("[Accept]"));
    }
}
