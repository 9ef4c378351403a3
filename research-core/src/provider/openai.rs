//! OpenAI chat-completions adapter for the reasoning capability.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::client::{build_http_client, ClientConfig};
use super::ReasoningProvider;
use crate::error::{Error, Result};

/// [`ReasoningProvider`] backed by an OpenAI-compatible chat-completions API.
pub struct OpenAIReasoner {
    config: ClientConfig,
    http: Client,
}

impl OpenAIReasoner {
    const DEFAULT_BASE_URL: &'static str = "https://api.openai.com";
    const DEFAULT_MODEL: &'static str = "o3-mini";
    const PROVIDER: &'static str = "openai";

    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = build_http_client(config.timeout_secs)?;
        Ok(Self { config, http })
    }

    /// Build from `OPENAI_API_KEY`, with `OPENAI_REASONING_MODEL` overriding the model.
    pub fn from_env() -> Result<Self> {
        let mut config = ClientConfig::from_env("OPENAI_API_KEY")?;
        if let Ok(model) = std::env::var("OPENAI_REASONING_MODEL") {
            if !model.trim().is_empty() {
                config = config.with_model(model);
            }
        }
        Self::new(config)
    }

    fn base_url(&self) -> &str {
        self.config
            .base_url
            .as_deref()
            .unwrap_or(Self::DEFAULT_BASE_URL)
    }

    /// Model used for every request.
    pub fn model(&self) -> &str {
        self.config.model.as_deref().unwrap_or(Self::DEFAULT_MODEL)
    }
}

#[derive(Debug, Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIError {
    error: OpenAIErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorDetail {
    message: String,
}

#[async_trait]
impl ReasoningProvider for OpenAIReasoner {
    async fn generate_text(&self, prompt: &str) -> Result<String> {
        let api_request = OpenAIRequest {
            model: self.model(),
            messages: vec![OpenAIMessage {
                role: "user".to_string(),
                content: Some(prompt.to_string()),
            }],
        };

        let url = format!("{}/v1/chat/completions", self.base_url());

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("content-type", "application/json")
            .json(&api_request)
            .send()
            .await
            .map_err(|e| Error::provider(Self::PROVIDER, format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            Error::provider(Self::PROVIDER, format!("Failed to read response: {}", e))
        })?;

        if !status.is_success() {
            if let Ok(error) = serde_json::from_str::<OpenAIError>(&body) {
                return Err(Error::provider(
                    Self::PROVIDER,
                    format!("API error: {}", error.error.message),
                ));
            }
            return Err(Error::provider(
                Self::PROVIDER,
                format!("API error ({}): {}", status, body),
            ));
        }

        let api_response: OpenAIResponse = serde_json::from_str(&body).map_err(|e| {
            Error::provider(Self::PROVIDER, format!("Failed to parse response: {}", e))
        })?;

        let content = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::provider(Self::PROVIDER, "No choices in response"))?;

        debug!(model = self.model(), chars = content.len(), "Reasoning completion received");
        Ok(content)
    }

    fn name(&self) -> &str {
        Self::PROVIDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_model() {
        let reasoner = OpenAIReasoner::new(ClientConfig::new("test")).unwrap();
        assert_eq!(reasoner.model(), "o3-mini");
        assert_eq!(reasoner.name(), "openai");
    }

    #[test]
    fn test_model_override() {
        let reasoner =
            OpenAIReasoner::new(ClientConfig::new("test").with_model("gpt-4o")).unwrap();
        assert_eq!(reasoner.model(), "gpt-4o");
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": "hello"}}]}"#;
        let response: OpenAIResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.choices[0].message.content.as_deref(), Some("hello"));
    }
}
