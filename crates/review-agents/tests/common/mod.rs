//! Scripted in-memory agent service shared by the integration tests.

#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::Mutex;

use async_trait::async_trait;
use review_agents::{AgentBackend, AgentError, AgentSpec};

/// Agent service double: provisioning registers an agent, chat replies are
/// derived from the agent name, and every chat is recorded.
#[derive(Default)]
pub struct ScriptedBackend {
    agents: Mutex<BTreeSet<String>>,
    chats: Mutex<Vec<(String, String)>>,
    provisioned: Mutex<Vec<String>>,
    refused: BTreeSet<String>,
}

impl ScriptedBackend {
    pub fn with_agents(agents: &[&str]) -> Self {
        let backend = Self::default();
        backend
            .agents
            .lock()
            .unwrap()
            .extend(agents.iter().map(|a| a.to_string()));
        backend
    }

    /// Provisioning of these agents fails with a server error.
    pub fn refusing(mut self, agents: &[&str]) -> Self {
        self.refused.extend(agents.iter().map(|a| a.to_string()));
        self
    }

    pub fn chats(&self) -> Vec<(String, String)> {
        self.chats.lock().unwrap().clone()
    }

    pub fn chat_count(&self) -> usize {
        self.chats.lock().unwrap().len()
    }

    pub fn chats_with(&self, agent: &str) -> usize {
        self.chats
            .lock()
            .unwrap()
            .iter()
            .filter(|(a, _)| a == agent)
            .count()
    }

    pub fn provisioned(&self) -> Vec<String> {
        self.provisioned.lock().unwrap().clone()
    }

    fn reply(agent: &str, prompt: &str) -> String {
        match agent {
            "deskreviewer" => "[Accept] In scope.".to_string(),
            "questioner" => "What is pruned? Why does accuracy hold?".to_string(),
            "factchecker" => "[Accept] Claims hold.".to_string(),
            "grammar" | "test" | "novelty" => format!("[Accept] {agent} ok."),
            "mistral" => "<think>draft</think>Strong work. Accept".to_string(),
            "llama3.2" => "Weak evaluation. Reject".to_string(),
            _ if prompt.starts_with("Answer the following question") => {
                format!("{agent}: No answer")
            }
            _ => format!("{agent} reply"),
        }
    }
}

#[async_trait]
impl AgentBackend for ScriptedBackend {
    async fn is_available(&self, agent: &str) -> Result<bool, AgentError> {
        Ok(self.agents.lock().unwrap().contains(agent))
    }

    async fn chat(&self, agent: &str, prompt: &str) -> Result<String, AgentError> {
        if !self.agents.lock().unwrap().contains(agent) {
            return Err(AgentError::Unavailable {
                agent: agent.to_string(),
            });
        }
        self.chats
            .lock()
            .unwrap()
            .push((agent.to_string(), prompt.to_string()));
        Ok(Self::reply(agent, prompt))
    }

    async fn provision(&self, spec: &AgentSpec) -> Result<(), AgentError> {
        if self.refused.contains(&spec.name) {
            return Err(AgentError::Status {
                status: 500,
                body: format!("cannot create {}", spec.name),
            });
        }
        self.agents.lock().unwrap().insert(spec.name.clone());
        self.provisioned.lock().unwrap().push(spec.name.clone());
        Ok(())
    }
}
