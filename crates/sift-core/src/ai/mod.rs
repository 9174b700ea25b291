//! Pluggable statement-extraction backend abstraction
//!
//! A backend turns raw statement text into structured financial data and
//! generates insights from it. Backends are network services; the mock
//! variant exists for tests.
//!
//! # Architecture
//!
//! - `ExtractionBackend` trait: the interface every backend implements
//! - `ExtractionClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `OpenRouterBackend`, `OllamaBackend`, `MockBackend`
//!
//! # Configuration
//!
//! Environment variables:
//! - `EXTRACT_BACKEND`: Backend to use (openrouter, ollama, mock). Default: openrouter
//! - `OPENROUTER_API_KEY`: API key for the openrouter backend (required for it)
//! - `OPENROUTER_HOST`: OpenRouter server URL (default: https://openrouter.ai)
//! - `SIFT_EXTRACT_MODEL` / `SIFT_INSIGHT_MODEL`: Per-task model overrides
//! - `OLLAMA_HOST`: Ollama server URL (required for the ollama backend)
//! - `OLLAMA_MODEL`: Ollama model name (default: llama3.2)

mod mock;
mod ollama;
mod openrouter;
pub mod parsing;
pub mod prompts;
pub mod types;

pub use mock::MockBackend;
pub use ollama::OllamaBackend;
pub use openrouter::OpenRouterBackend;
pub use types::*;

use async_trait::async_trait;

use crate::error::Result;

/// Trait defining the interface for all extraction backends
#[async_trait]
pub trait ExtractionBackend: Send + Sync {
    /// Extract structured financial data from raw statement text
    async fn extract_statement(&self, statement_text: &str) -> Result<ExtractedStatement>;

    /// Generate insights from an extraction result
    async fn generate_insights(
        &self,
        extraction: &ExtractedStatement,
    ) -> Result<Vec<ExtractedInsight>>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Extraction model name (for logging)
    fn model(&self) -> &str;

    /// Host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete extraction client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum ExtractionClient {
    /// OpenRouter backend (hosted chat completions API)
    OpenRouter(OpenRouterBackend),
    /// Ollama backend (local HTTP API)
    Ollama(OllamaBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl ExtractionClient {
    /// Create an extraction client from environment variables
    ///
    /// Checks `EXTRACT_BACKEND` to determine which backend to use:
    /// - `openrouter` (default): Uses OPENROUTER_API_KEY and model overrides
    /// - `ollama`: Uses OLLAMA_HOST and OLLAMA_MODEL
    /// - `mock`: Canned responses for testing
    ///
    /// Returns None if the required environment variables are not set.
    pub fn from_env() -> Option<Self> {
        let backend =
            std::env::var("EXTRACT_BACKEND").unwrap_or_else(|_| "openrouter".to_string());

        match backend.to_lowercase().as_str() {
            "openrouter" => OpenRouterBackend::from_env().map(ExtractionClient::OpenRouter),
            "ollama" => OllamaBackend::from_env().map(ExtractionClient::Ollama),
            "mock" => Some(ExtractionClient::Mock(MockBackend::new())),
            _ => {
                tracing::warn!(backend = %backend, "Unknown EXTRACT_BACKEND, falling back to openrouter");
                OpenRouterBackend::from_env().map(ExtractionClient::OpenRouter)
            }
        }
    }

    /// Create an Ollama backend directly
    pub fn ollama(host: &str, model: &str) -> Self {
        ExtractionClient::Ollama(OllamaBackend::new(host, model))
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        ExtractionClient::Mock(MockBackend::new())
    }
}

// Implement ExtractionBackend for ExtractionClient by delegating to the inner backend
#[async_trait]
impl ExtractionBackend for ExtractionClient {
    async fn extract_statement(&self, statement_text: &str) -> Result<ExtractedStatement> {
        match self {
            ExtractionClient::OpenRouter(b) => b.extract_statement(statement_text).await,
            ExtractionClient::Ollama(b) => b.extract_statement(statement_text).await,
            ExtractionClient::Mock(b) => b.extract_statement(statement_text).await,
        }
    }

    async fn generate_insights(
        &self,
        extraction: &ExtractedStatement,
    ) -> Result<Vec<ExtractedInsight>> {
        match self {
            ExtractionClient::OpenRouter(b) => b.generate_insights(extraction).await,
            ExtractionClient::Ollama(b) => b.generate_insights(extraction).await,
            ExtractionClient::Mock(b) => b.generate_insights(extraction).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            ExtractionClient::OpenRouter(b) => b.health_check().await,
            ExtractionClient::Ollama(b) => b.health_check().await,
            ExtractionClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            ExtractionClient::OpenRouter(b) => b.model(),
            ExtractionClient::Ollama(b) => b.model(),
            ExtractionClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            ExtractionClient::OpenRouter(b) => b.host(),
            ExtractionClient::Ollama(b) => b.host(),
            ExtractionClient::Mock(b) => b.host(),
        }
    }
}
