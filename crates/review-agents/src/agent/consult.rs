//! Single-slot agent consultation.
//!
//! Every failure mode collapses to "no answer for this slot", but an agent
//! that is simply not loaded is logged as a warning while a transport or
//! response failure is logged as an error.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, error, warn};

use super::{AgentBackend, AgentError};

static THINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<think>.*?</think>").expect("THINK_RE regex should compile")
});

/// Outcome of asking one agent one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Consultation {
    Answered(String),
    Unavailable,
    Failed(String),
}

impl Consultation {
    pub fn answer(&self) -> Option<&str> {
        match self {
            Consultation::Answered(text) => Some(text),
            _ => None,
        }
    }

    pub fn into_answer(self) -> Option<String> {
        match self {
            Consultation::Answered(text) => Some(text),
            _ => None,
        }
    }
}

/// Drop `<think>…</think>` reasoning blocks and surrounding whitespace.
pub fn strip_think(text: &str) -> String {
    THINK_RE.replace_all(text, "").trim().to_string()
}

/// Ask `agent` a single question, checking it is loaded first.
pub async fn consult<B>(backend: &B, agent: &str, prompt: &str) -> Consultation
where
    B: AgentBackend + ?Sized,
{
    if agent.trim().is_empty() {
        warn!("Refusing to consult an agent with a blank name");
        return Consultation::Unavailable;
    }

    match backend.is_available(agent).await {
        Ok(true) => {}
        Ok(false) => {
            warn!(agent, "Agent not loaded, leaving slot empty");
            return Consultation::Unavailable;
        }
        Err(e) => {
            error!(agent, error = %e, "Agent availability check failed");
            return Consultation::Failed(e.to_string());
        }
    }

    match backend.chat(agent, prompt).await {
        Ok(reply) => {
            debug!(agent, chars = reply.len(), "Agent answered");
            Consultation::Answered(strip_think(&reply))
        }
        Err(AgentError::Unavailable { .. }) => {
            warn!(agent, "Agent disappeared before answering");
            Consultation::Unavailable
        }
        Err(e) => {
            error!(agent, error = %e, "Agent consultation failed");
            Consultation::Failed(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::MockAgentBackend;

    #[test]
    fn test_strip_think_blocks() {
        let reply = "<think>\nweighing options\n</think>\n  Accept. Solid work.<think>x</think>";
        assert_eq!(strip_think(reply), "Accept. Solid work.");
        assert_eq!(strip_think("plain"), "plain");
    }

    #[tokio::test]
    async fn test_answered() {
        let mut backend = MockAgentBackend::new();
        backend
            .expect_is_available()
            .withf(|agent| agent == "grammar")
            .returning(|_| Ok(true));
        backend
            .expect_chat()
            .withf(|agent, prompt| agent == "grammar" && prompt == "Check this.")
            .times(1)
            .returning(|_, _| Ok("<think>hm</think>[Accept]".to_string()));

        let outcome = consult(&backend, "grammar", "Check this.").await;
        assert_eq!(outcome, Consultation::Answered("[Accept]".to_string()));
    }

    #[tokio::test]
    async fn test_unloaded_agent_is_never_chatted() {
        let mut backend = MockAgentBackend::new();
        backend.expect_is_available().returning(|_| Ok(false));
        backend.expect_chat().never();

        let outcome = consult(&backend, "novelty", "Is it new?").await;
        assert_eq!(outcome, Consultation::Unavailable);
        assert_eq!(outcome.answer(), None);
    }

    #[tokio::test]
    async fn test_transport_failure_is_distinguished() {
        let mut backend = MockAgentBackend::new();
        backend.expect_is_available().returning(|_| Ok(true));
        backend
            .expect_chat()
            .returning(|_, _| Err(AgentError::Transport("connection reset".into())));

        let outcome = consult(&backend, "test", "Run it").await;
        assert!(matches!(outcome, Consultation::Failed(ref reason) if reason.contains("connection reset")));
        assert_eq!(outcome.into_answer(), None);
    }

    #[tokio::test]
    async fn test_blank_agent_name() {
        let mut backend = MockAgentBackend::new();
        backend.expect_is_available().never();
        assert_eq!(consult(&backend, "  ", "q").await, Consultation::Unavailable);
    }
}
