//! OpenRouter backend implementation
//!
//! Talks to the OpenRouter chat completions API (or any server exposing the
//! same `/api/v1/chat/completions` shape). Extraction and insight generation
//! can run on different models since extraction benefits from a stronger
//! model while insights tolerate a cheaper one.
//!
//! # Configuration
//!
//! Environment variables:
//! - `OPENROUTER_API_KEY`: API key (required)
//! - `OPENROUTER_HOST`: Server URL (default: https://openrouter.ai)
//! - `SIFT_EXTRACT_MODEL`: Model for extraction (default: anthropic/claude-3.5-sonnet)
//! - `SIFT_INSIGHT_MODEL`: Model for insights (default: deepseek/deepseek-chat)

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

use super::parsing::{parse_insights_response, parse_statement_response};
use super::prompts::{extraction_prompt, insights_prompt};
use super::types::{ExtractedInsight, ExtractedStatement};
use super::ExtractionBackend;

const DEFAULT_HOST: &str = "https://openrouter.ai";
const DEFAULT_EXTRACT_MODEL: &str = "anthropic/claude-3.5-sonnet";
const DEFAULT_INSIGHT_MODEL: &str = "deepseek/deepseek-chat";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

/// OpenRouter backend
#[derive(Clone)]
pub struct OpenRouterBackend {
    http_client: Client,
    base_url: String,
    api_key: String,
    extract_model: String,
    insight_model: String,
}

impl OpenRouterBackend {
    /// Create a new OpenRouter backend
    pub fn new(base_url: &str, api_key: &str, extract_model: &str, insight_model: &str) -> Self {
        let http_client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            extract_model: extract_model.to_string(),
            insight_model: insight_model.to_string(),
        }
    }

    /// Create from environment variables
    ///
    /// Required: `OPENROUTER_API_KEY`
    /// Optional: `OPENROUTER_HOST`, `SIFT_EXTRACT_MODEL`, `SIFT_INSIGHT_MODEL`
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("OPENROUTER_API_KEY").ok()?;
        let host = std::env::var("OPENROUTER_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let extract_model = std::env::var("SIFT_EXTRACT_MODEL")
            .unwrap_or_else(|_| DEFAULT_EXTRACT_MODEL.to_string());
        let insight_model = std::env::var("SIFT_INSIGHT_MODEL")
            .unwrap_or_else(|_| DEFAULT_INSIGHT_MODEL.to_string());

        Some(Self::new(&host, &api_key, &extract_model, &insight_model))
    }

    /// Make a chat completion request against a specific model
    async fn chat_completion(&self, model: &str, prompt: &str) -> Result<String> {
        let request = ChatCompletionRequest {
            model: model.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: Some(0.1),
            stream: false,
        };

        let response = self
            .http_client
            .post(format!("{}/api/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Extraction(format!(
                "OpenRouter API error {}: {}",
                status, body
            )));
        }

        let chat_response: ChatCompletionResponse = response.json().await?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::Extraction("No response from OpenRouter".into()))
    }
}

/// Chat completion request
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

/// Chat message
#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[async_trait]
impl ExtractionBackend for OpenRouterBackend {
    async fn extract_statement(&self, statement_text: &str) -> Result<ExtractedStatement> {
        let prompt = extraction_prompt(statement_text);
        let response = self.chat_completion(&self.extract_model, &prompt).await?;
        debug!("OpenRouter extraction response: {}", response);

        parse_statement_response(&response)
    }

    async fn generate_insights(
        &self,
        extraction: &ExtractedStatement,
    ) -> Result<Vec<ExtractedInsight>> {
        let prompt = insights_prompt(extraction);
        let response = self.chat_completion(&self.insight_model, &prompt).await?;
        debug!("OpenRouter insight response: {}", response);

        parse_insights_response(&response)
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/api/v1/models", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.extract_model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_new_trims_trailing_slash() {
        let backend = OpenRouterBackend::new(
            "https://openrouter.ai/",
            "sk-test",
            "anthropic/claude-3.5-sonnet",
            "deepseek/deepseek-chat",
        );
        assert_eq!(backend.host(), "https://openrouter.ai");
        assert_eq!(backend.model(), "anthropic/claude-3.5-sonnet");
    }

    #[test]
    fn chat_completion_request_serialization() {
        let request = ChatCompletionRequest {
            model: "anthropic/claude-3.5-sonnet".to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: "Hello".to_string(),
            }],
            temperature: Some(0.1),
            stream: false,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "anthropic/claude-3.5-sonnet");
        assert_eq!(json["messages"][0]["content"], "Hello");
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn chat_completion_response_deserialization() {
        let json = r#"{
            "id": "gen-123",
            "model": "anthropic/claude-3.5-sonnet",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "{}"},
                "finish_reason": "stop"
            }]
        }"#;

        let response: ChatCompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.choices[0].message.content, "{}");
    }

    #[tokio::test]
    async fn health_check_unreachable() {
        let backend = OpenRouterBackend::new("http://127.0.0.1:9", "sk-test", "m1", "m2");
        assert!(!backend.health_check().await);
    }
}
