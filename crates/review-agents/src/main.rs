use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use review_agents::panel::load_topics;
use review_agents::qa::answer_questions;
use review_agents::{
    load_sections, AgentBackend, OllamaBackend, ReviewConfig, ReviewPipeline, RunRequest,
    WikipediaLookup,
};
use review_core::checkpoint::CheckpointStore;
use tracing::info;

/// Multi-agent review of paper sections with resumable checkpoints.
///
/// Run one process per checkpoint file: concurrent runs against the same
/// checkpoint are unsupported and the file is not locked.
#[derive(Parser, Debug)]
#[command(name = "mars", version)]
struct Cli {
    /// Topic file (one topic per line) or a comma-separated topic list
    topic_source: String,

    /// Paper to review: .pdf, .txt, or pre-segmented .json
    document: PathBuf,

    /// Review only this section
    section: Option<String>,

    /// Run the question answering stage after reviewing
    #[arg(long)]
    answer_questions: bool,

    /// Re-review sections that are already checkpointed
    #[arg(long)]
    force: bool,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Review checkpoint path
    #[arg(long)]
    checkpoint: Option<PathBuf>,

    /// Answers checkpoint path
    #[arg(long)]
    answers: Option<PathBuf>,

    /// Agent service URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Seed for reproducible reviewer panels
    #[arg(long)]
    seed: Option<u64>,

    /// Fact check without the encyclopedia lookup
    #[arg(long)]
    no_fact_lookup: bool,
}

impl Cli {
    fn resolve_config(&self) -> Result<ReviewConfig> {
        let mut config = match &self.config {
            Some(path) => ReviewConfig::load(path)?,
            None => ReviewConfig::from_env(),
        };
        if let Some(path) = &self.checkpoint {
            config.checkpoint_path = path.clone();
        }
        if let Some(path) = &self.answers {
            config.answers_path = path.clone();
        }
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.no_fact_lookup {
            config.fact_check_lookup = false;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.resolve_config()?;
    let timeout = Duration::from_secs(config.request_timeout_secs);
    info!(
        endpoint = %config.endpoint,
        checkpoint = %config.checkpoint_path.display(),
        reviewers = ?config.reviewer_models,
        "Paper review starting"
    );

    let sections = load_sections(&cli.document)
        .with_context(|| format!("No content extracted from {}", cli.document.display()))?;
    let topics = load_topics(&cli.topic_source)?;

    let backend: Arc<dyn AgentBackend> = Arc::new(
        OllamaBackend::new(config.endpoint.clone(), timeout)
            .context("Failed to build agent client")?,
    );
    let mut pipeline = ReviewPipeline::new(config.clone(), Arc::clone(&backend));
    if config.fact_check_lookup {
        let lookup = WikipediaLookup::new(timeout).context("Failed to build lookup client")?;
        pipeline = pipeline.with_reference_lookup(Arc::new(lookup));
    }

    let mut store = CheckpointStore::open(&config.checkpoint_path)?;
    let request = RunRequest {
        section: cli.section.clone(),
        force: cli.force,
    };
    let summary = pipeline.run(&mut store, &sections, &topics, &request).await?;
    summary.log();

    if cli.answer_questions {
        info!("Starting question answering stage");
        if let Some(qa) = answer_questions(&config, Arc::clone(&backend)).await? {
            qa.log();
        }
    }

    Ok(())
}
