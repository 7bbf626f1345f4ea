//! Pipeline configuration.
//!
//! Resolution order: built-in defaults, then an optional TOML file, then
//! environment variables, then CLI flags (applied by the binary).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use review_core::panel::DEFAULT_MAX_ATTEMPTS;
use review_core::scoring::DEFAULT_REVIEWER_MODELS;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Agent service base URL.
    pub endpoint: String,
    /// Model every provisioned agent is derived from.
    pub base_model: String,
    /// Reviewer models consulted in order for every section.
    pub reviewer_models: Vec<String>,
    /// Model writing the final decision narrative and condensed summaries.
    pub summary_model: String,
    pub checkpoint_path: PathBuf,
    pub answers_path: PathBuf,
    /// One paper agent key per line, written after stage 1.
    pub model_list_path: PathBuf,
    /// Pass earlier reviewers' text to later reviewers.
    pub share_reviewer_context: bool,
    /// Skip the paper agent built from the section a question came from.
    pub exclude_originating_agent: bool,
    /// Stop before section review when the desk reviewer rejects.
    pub stop_on_desk_reject: bool,
    pub sampling_max_attempts: usize,
    pub summary_min_words: usize,
    pub summary_max_words: usize,
    pub num_ctx: u32,
    pub temperature: f32,
    pub request_timeout_secs: u64,
    /// Let the fact checker consult the encyclopedia lookup.
    pub fact_check_lookup: bool,
    /// Fixed seed for reproducible reviewer panels.
    pub seed: Option<u64>,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            base_model: "llama3.2".to_string(),
            reviewer_models: DEFAULT_REVIEWER_MODELS.iter().map(|m| m.to_string()).collect(),
            summary_model: "mistral".to_string(),
            checkpoint_path: PathBuf::from("feedback_collab.json"),
            answers_path: PathBuf::from("feedback_collab_with_answers.json"),
            model_list_path: PathBuf::from("paper_specific_models.txt"),
            share_reviewer_context: true,
            exclude_originating_agent: true,
            stop_on_desk_reject: false,
            sampling_max_attempts: DEFAULT_MAX_ATTEMPTS,
            summary_min_words: 40,
            summary_max_words: 150,
            num_ctx: 4096,
            temperature: 0.7,
            request_timeout_secs: 300,
            fact_check_lookup: true,
            seed: None,
        }
    }
}

impl ReviewConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Self {
        Self::default().with_env(|key| std::env::var(key).ok())
    }

    /// Read a TOML file, then apply the process environment on top.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = Self::parse(&text)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(config.with_env(|key| std::env::var(key).ok()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Apply `MARS_*` / `OLLAMA_HOST` overrides from `lookup`.
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(endpoint) = non_empty("MARS_ENDPOINT").or_else(|| non_empty("OLLAMA_HOST")) {
            self.endpoint = normalize_endpoint(&endpoint);
        }
        if let Some(model) = non_empty("MARS_BASE_MODEL") {
            self.base_model = model;
        }
        if let Some(model) = non_empty("MARS_SUMMARY_MODEL") {
            self.summary_model = model;
        }
        if let Some(models) = non_empty("MARS_REVIEWER_MODELS") {
            let models: Vec<String> = models
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string)
                .collect();
            if !models.is_empty() {
                self.reviewer_models = models;
            }
        }
        self
    }
}

/// `OLLAMA_HOST` is commonly given as `host:port`; add a scheme and drop a trailing slash.
fn normalize_endpoint(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    }
}
