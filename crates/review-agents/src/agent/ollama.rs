//! Ollama HTTP backend.
//!
//! ```text
//! is_available ── GET  /api/tags    (name or name:latest)
//! chat ────────── POST /api/chat    (single user message, stream=false)
//! provision ───── DELETE /api/delete (if present) → POST /api/create
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::debug;

use super::{AgentBackend, AgentError, AgentSpec};

pub struct OllamaBackend {
    endpoint: String,
    client: reqwest::Client,
}

impl OllamaBackend {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, AgentError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AgentError::Transport(e.to_string()))?;
        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, AgentError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(AgentError::Status { status, body })
    }
}

/// Whether a `/api/tags` listing contains `agent` or `agent:latest`.
pub(crate) fn tags_contain(tags: &Value, agent: &str) -> bool {
    let latest = format!("{agent}:latest");
    tags.get("models")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|m| m.get("name").or_else(|| m.get("model")).and_then(Value::as_str))
        .any(|name| name == agent || name == latest)
}

/// Reply text of a non-streaming `/api/chat` response.
pub(crate) fn chat_content(body: &Value) -> Result<String, AgentError> {
    body.pointer("/message/content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| AgentError::Malformed("missing message.content".to_string()))
}

pub(crate) fn create_request(spec: &AgentSpec) -> Value {
    json!({
        "model": spec.name,
        "from": spec.base_model,
        "system": spec.system,
        "parameters": {
            "num_ctx": spec.num_ctx,
            "temperature": spec.temperature,
        },
        "stream": false,
    })
}

#[async_trait]
impl AgentBackend for OllamaBackend {
    async fn is_available(&self, agent: &str) -> Result<bool, AgentError> {
        let response = self
            .client
            .get(self.url("/api/tags"))
            .send()
            .await
            .map_err(|e| AgentError::Transport(e.to_string()))?;
        let tags: Value = Self::ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| AgentError::Malformed(e.to_string()))?;
        Ok(tags_contain(&tags, agent))
    }

    async fn chat(&self, agent: &str, prompt: &str) -> Result<String, AgentError> {
        let request = json!({
            "model": agent,
            "messages": [{"role": "user", "content": prompt}],
            "stream": false,
        });
        let response = self
            .client
            .post(self.url("/api/chat"))
            .json(&request)
            .send()
            .await
            .map_err(|e| AgentError::Transport(e.to_string()))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(AgentError::Unavailable {
                agent: agent.to_string(),
            });
        }
        let body: Value = Self::ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| AgentError::Malformed(e.to_string()))?;
        chat_content(&body)
    }

    async fn provision(&self, spec: &AgentSpec) -> Result<(), AgentError> {
        if self.is_available(&spec.name).await? {
            debug!(agent = %spec.name, "Deleting existing agent before recreate");
            let response = self
                .client
                .delete(self.url("/api/delete"))
                .json(&json!({"model": spec.name}))
                .send()
                .await
                .map_err(|e| AgentError::Transport(e.to_string()))?;
            Self::ensure_success(response).await?;
        }

        let response = self
            .client
            .post(self.url("/api/create"))
            .json(&create_request(spec))
            .send()
            .await
            .map_err(|e| AgentError::Transport(e.to_string()))?;
        Self::ensure_success(response).await?;
        Ok(())
    }
}
