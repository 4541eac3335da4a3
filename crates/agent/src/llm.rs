use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use switchboard_core::config::LlmConfig;
use switchboard_core::errors::ServiceError;
use switchboard_integrations::http::build_client;
use tracing::debug;

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ServiceError>;
}

/// Chat-completions client for OpenAI and servers that mimic its API
/// (Ollama's `/v1` endpoint among them).
pub struct OpenAiCompatClient {
    http: Client,
    endpoint: String,
    api_key: Option<SecretString>,
    model: String,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiCompatClient {
    pub fn new(
        http: Client,
        base_url: &str,
        api_key: Option<SecretString>,
        model: impl Into<String>,
        temperature: f32,
    ) -> Self {
        Self {
            http,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
            model: model.into(),
            temperature,
        }
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, ServiceError> {
        let http = build_client(Duration::from_secs(config.timeout_secs))?;
        Ok(Self::new(
            http,
            config.effective_base_url(),
            config.api_key.clone(),
            config.model.clone(),
            config.temperature,
        ))
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatClient {
    async fn complete(&self, prompt: &str) -> Result<String, ServiceError> {
        let body = json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let mut request = self.http.post(&self.endpoint).json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }

        let response = request
            .send()
            .await
            .map_err(|error| ServiceError::Unavailable(format!("model request failed: {error}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Unavailable(format!("model endpoint returned {status}")));
        }

        let completion: CompletionResponse = response.json().await.map_err(|error| {
            ServiceError::Unavailable(format!("model response could not be decoded: {error}"))
        })?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| ServiceError::rejected("model returned no choices"))?;

        debug!(
            event_name = "agent.llm.completed",
            model = %self.model,
            reply_chars = content.chars().count(),
            "model completion received"
        );
        Ok(content)
    }
}
