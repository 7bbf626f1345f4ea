//! Ensemble aggregation of reviewer opinions.
//!
//! The weighting arithmetic lives in `review_core::ensemble`; this module adds
//! the summarizer and assembles the `Final Summary` slot.

use std::sync::Arc;

use async_trait::async_trait;
use review_core::ensemble::{weighted_text, SentimentScorer};
use tracing::{debug, warn};

use crate::agent::{consult, AgentBackend};
use crate::prompts;

/// Abstractive summarizer with a bounded output length.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summary of `text`, or `None` when no summary could be produced.
    async fn summarize(&self, text: &str) -> Option<String>;
}

/// Summarizer backed by an agent model.
///
/// Falls back to the first `max_words` words of the input when the model
/// gives no answer.
pub struct AgentSummarizer {
    backend: Arc<dyn AgentBackend>,
    model: String,
    min_words: usize,
    max_words: usize,
}

impl AgentSummarizer {
    pub fn new(
        backend: Arc<dyn AgentBackend>,
        model: impl Into<String>,
        min_words: usize,
        max_words: usize,
    ) -> Self {
        Self {
            backend,
            model: model.into(),
            min_words,
            max_words,
        }
    }
}

/// First `max_words` whitespace-separated words of `text`.
pub fn truncate_words(text: &str, max_words: usize) -> String {
    text.split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}

#[async_trait]
impl Summarizer for AgentSummarizer {
    async fn summarize(&self, text: &str) -> Option<String> {
        if text.trim().is_empty() {
            return None;
        }
        let prompt = prompts::condense_prompt(text, self.min_words, self.max_words);
        match consult(self.backend.as_ref(), &self.model, &prompt)
            .await
            .into_answer()
        {
            Some(summary) if !summary.is_empty() => Some(summary),
            _ => {
                warn!(model = %self.model, "Summarizer gave no answer, truncating weighted text");
                Some(truncate_words(text, self.max_words))
            }
        }
    }
}

/// Sentiment-weight the opinions and summarize the weighted text.
pub async fn aggregate_opinions<S>(
    opinions: &[String],
    scorer: &S,
    summarizer: &dyn Summarizer,
) -> Option<String>
where
    S: SentimentScorer + ?Sized,
{
    if opinions.is_empty() {
        return None;
    }
    let weighted = weighted_text(opinions, scorer);
    debug!(
        opinions = opinions.len(),
        weighted_chars = weighted.len(),
        "Opinions weighted"
    );
    summarizer.summarize(&weighted).await
}

/// `aggregated + "\n" + narrative`, keeping whichever parts exist.
pub fn final_summary(aggregated: Option<&str>, narrative: Option<&str>) -> Option<String> {
    match (aggregated, narrative) {
        (Some(a), Some(n)) => Some(format!("{a}\n{n}")),
        (Some(only), None) | (None, Some(only)) => Some(only.to_string()),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AgentError, MockAgentBackend};
    use std::sync::Mutex;

    struct Capture {
        seen: Mutex<Option<String>>,
    }

    #[async_trait]
    impl Summarizer for Capture {
        async fn summarize(&self, text: &str) -> Option<String> {
            *self.seen.lock().unwrap() = Some(text.to_string());
            Some("summary".to_string())
        }
    }

    #[tokio::test]
    async fn test_weighted_text_reaches_summarizer() {
        let opinions = vec!["bad".to_string(), "terrible".to_string(), "ok".to_string()];
        let scorer = |text: &str| match text {
            "bad" => 0.3,
            "terrible" => -0.9,
            _ => 0.0,
        };
        let capture = Capture {
            seen: Mutex::new(None),
        };
        let summary = aggregate_opinions(&opinions, &scorer, &capture).await;
        assert_eq!(summary.as_deref(), Some("summary"));
        let seen = capture.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen, format!("{} {} ok", "bad".repeat(2), "terrible".repeat(7)));
    }

    #[tokio::test]
    async fn test_no_opinions_no_summary() {
        let capture = Capture {
            seen: Mutex::new(None),
        };
        let scorer = |_: &str| 0.5;
        assert_eq!(aggregate_opinions(&[], &scorer, &capture).await, None);
        assert!(capture.seen.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_agent_summarizer_falls_back_to_truncation() {
        let mut backend = MockAgentBackend::new();
        backend.expect_is_available().returning(|_| Ok(true));
        backend
            .expect_chat()
            .returning(|_, _| Err(AgentError::Transport("refused".into())));
        let summarizer = AgentSummarizer::new(Arc::new(backend), "mistral", 1, 3);
        let summary = summarizer.summarize("one two three four five").await;
        assert_eq!(summary.as_deref(), Some("one two three"));
    }

    #[tokio::test]
    async fn test_agent_summarizer_uses_model_answer() {
        let mut backend = MockAgentBackend::new();
        backend
            .expect_is_available()
            .withf(|agent| agent == "mistral")
            .returning(|_| Ok(true));
        backend
            .expect_chat()
            .withf(|_, prompt| prompt.contains("between 40 and 150 words"))
            .returning(|_, _| Ok("Reviewers broadly agree.".into()));
        let summarizer = AgentSummarizer::new(Arc::new(backend), "mistral", 40, 150);
        assert_eq!(
            summarizer.summarize("text").await.as_deref(),
            Some("Reviewers broadly agree.")
        );
    }

    #[test]
    fn test_final_summary_joins_parts() {
        assert_eq!(final_summary(Some("a"), Some("b")).as_deref(), Some("a\nb"));
        assert_eq!(final_summary(None, Some("b")).as_deref(), Some("b"));
        assert_eq!(final_summary(Some("a"), None).as_deref(), Some("a"));
        assert_eq!(final_summary(None, None), None);
    }
}
