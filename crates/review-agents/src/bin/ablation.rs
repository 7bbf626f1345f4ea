use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use review_core::agreement::collect_agreement;
use review_core::scoring::{
    default_ablation_suite, load_suite, run_ablation, AblationReport, ConfigOverrides, ConfigRun,
    NamedConfig,
    ScoringConfig, DEFAULT_REVIEWER_MODELS,
};
use tracing::{info, warn};

/// Score a directory of review checkpoints under named scoring configurations
/// and write a CSV comparison table.
#[derive(Parser, Debug)]
#[command(name = "review-ablation", version)]
struct Cli {
    /// Directory containing checkpoint *.json files
    directory: PathBuf,

    /// Only run the baseline configuration
    #[arg(long)]
    baseline_only: bool,

    /// Log per-file section scores and failures
    #[arg(long)]
    verbose: bool,

    /// Also print pairwise reviewer agreement statistics
    #[arg(long)]
    agreement: bool,

    /// TOML suite of named configurations ([[config]] entries)
    #[arg(long)]
    suite: Option<PathBuf>,

    /// Reviewer models for the default suite, comma separated
    #[arg(long, value_delimiter = ',')]
    models: Option<Vec<String>>,

    /// CSV output path
    #[arg(long, default_value = "ablation_results.csv")]
    output: PathBuf,
}

impl Cli {
    fn suite(&self) -> Result<Vec<NamedConfig>> {
        if self.baseline_only {
            return Ok(vec![NamedConfig::new("baseline", ConfigOverrides::default())]);
        }
        if let Some(path) = &self.suite {
            return load_suite(path)
                .with_context(|| format!("Failed to load suite {}", path.display()));
        }
        let models = self.models.clone().unwrap_or_else(|| {
            DEFAULT_REVIEWER_MODELS.iter().map(|m| m.to_string()).collect()
        });
        Ok(default_ablation_suite(&models))
    }
}

/// Configurations whose per-section scores are logged: all of them when verbose.
fn detailed_runs(report: &AblationReport, verbose: bool) -> &[ConfigRun] {
    if verbose {
        report.runs.as_slice()
    } else {
        &[]
    }
}

/// Per-section and per-paper scores of one configuration.
fn log_run_details(run: &ConfigRun) {
    for (paper, score) in &run.papers {
        for (heading, section_score) in &score.section_scores {
            info!(config = %run.name, paper = %paper, section = %heading, score = section_score, "Section score");
        }
        info!(
            config = %run.name,
            paper = %paper,
            final_score = score.final_score,
            verdict = %score.verdict,
            "Paper verdict"
        );
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    if !cli.directory.is_dir() {
        bail!("Not a directory: {}", cli.directory.display());
    }

    let suite = cli.suite()?;
    info!(configs = suite.len(), dir = %cli.directory.display(), "Running ablation study");

    let report = run_ablation(&cli.directory, &suite, &ScoringConfig::default())
        .context("Ablation sweep failed")?;

    for failure in &report.failures {
        warn!(file = %failure.file, reason = %failure.reason, "Checkpoint skipped");
    }

    for run in detailed_runs(&report, cli.verbose) {
        log_run_details(run);
    }

    for run in &report.runs {
        info!(
            config = %run.name,
            accepted = run.accept_count(),
            accept_pct = report.accept_percentage(run),
            "Configuration result"
        );
    }

    report
        .write_csv(&cli.output)
        .with_context(|| format!("Failed to write {}", cli.output.display()))?;
    info!(
        path = %cli.output.display(),
        papers = report.papers().len(),
        failures = report.failures.len(),
        "Ablation results written"
    );

    if cli.agreement {
        let (stats, _) = collect_agreement(&cli.directory).context("Agreement analysis failed")?;
        println!("{}", stats.render());
    }

    Ok(())
}
