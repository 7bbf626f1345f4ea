//! Agent panel provisioning.
//!
//! ```text
//! topics ─► deskreviewer
//! fixed roles ─► questioner, grammar, test, novelty, factchecker
//! sections ─► one paper agent per heading key
//! ```
//!
//! Every agent is recreated from `base_model` on each run so its system
//! instructions always match the current document.

use std::path::Path;

use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use review_core::panel::{PaperPanel, PanelSampler, ReviewerIdentity};
use tracing::{info, warn};

use crate::agent::{AgentBackend, AgentSpec};
use crate::config::ReviewConfig;
use crate::prompts;

/// Resolve `<topic-source>`: a file with one topic per line, or a comma-separated list.
pub fn load_topics(source: &str) -> Result<Vec<String>> {
    let path = Path::new(source);
    let topics: Vec<String> = if path.is_file() {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read topic file {}", path.display()))?
            .lines()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    } else {
        source
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    };
    if topics.is_empty() {
        bail!("No conference topics found in '{source}'");
    }
    Ok(topics)
}

/// Sample the reviewer personas for this run.
pub fn sample_reviewers(config: &ReviewConfig) -> Result<Vec<ReviewerIdentity>> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let identities = PanelSampler::new(config.sampling_max_attempts)
        .sample(&mut rng, prompts::PANEL_SIZE)
        .context("Failed to assemble a non-conflicted reviewer panel")?;
    for identity in &identities {
        info!(
            name = identity.name(),
            experience = %identity.experience(),
            knowledge = %identity.knowledge(),
            tone = %identity.tone(),
            "Reviewer sampled"
        );
    }
    Ok(identities)
}

fn spec(config: &ReviewConfig, name: impl Into<String>, system: impl Into<String>) -> AgentSpec {
    AgentSpec {
        name: name.into(),
        base_model: config.base_model.clone(),
        system: system.into(),
        num_ctx: config.num_ctx,
        temperature: config.temperature,
    }
}

/// Specs for the document-independent roles. Every spec here is consulted
/// by the pipeline; reviewer models are used as installed.
pub fn base_role_specs(config: &ReviewConfig, topics: &[String]) -> Vec<AgentSpec> {
    vec![
        spec(
            config,
            prompts::DESK_REVIEWER,
            prompts::desk_reviewer_system(topics),
        ),
        spec(config, prompts::QUESTIONER, prompts::QUESTIONER_SYSTEM),
        spec(config, prompts::GRAMMAR, prompts::GRAMMAR_SYSTEM),
        spec(config, prompts::TEST, prompts::TEST_SYSTEM),
        spec(config, prompts::NOVELTY, prompts::NOVELTY_SYSTEM),
        spec(config, prompts::FACT_CHECKER, prompts::FACT_CHECKER_SYSTEM),
    ]
}

/// Specs for the paper-derived agents, one per distinct heading key.
pub fn paper_agent_specs(config: &ReviewConfig, panel: &PaperPanel) -> Vec<AgentSpec> {
    panel
        .agents()
        .iter()
        .map(|agent| spec(config, agent.key.clone(), agent.system.clone()))
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionReport {
    pub created: Vec<String>,
    pub failed: Vec<String>,
}

/// (Re)create every agent. Failures are logged; consultation later reports
/// those agents as unavailable.
pub async fn provision_agents<B>(backend: &B, specs: &[AgentSpec]) -> ProvisionReport
where
    B: AgentBackend + ?Sized,
{
    let mut report = ProvisionReport::default();
    for spec in specs {
        match backend.provision(spec).await {
            Ok(()) => {
                info!(agent = %spec.name, base = %spec.base_model, "Agent provisioned");
                report.created.push(spec.name.clone());
            }
            Err(e) => {
                warn!(agent = %spec.name, error = %e, "Agent provisioning failed");
                report.failed.push(spec.name.clone());
            }
        }
    }
    report
}

pub fn write_model_list(path: impl AsRef<Path>, keys: &[String]) -> Result<()> {
    let path = path.as_ref();
    let mut contents = String::new();
    for key in keys {
        contents.push_str(key);
        contents.push('\n');
    }
    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write agent list {}", path.display()))?;
    info!(path = %path.display(), agents = keys.len(), "Paper agent list written");
    Ok(())
}

pub fn read_model_list(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read agent list {}", path.display()))?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}
