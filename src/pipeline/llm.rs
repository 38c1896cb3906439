//! Generation collaborator: one prompt in, one completion out.
//!
//! [`GenerationClient`] is what the summary stage calls. Two implementations:
//!
//! * [`OllamaClient`] posts to an Ollama-style `/api/generate` endpoint with
//!   streaming disabled. This is the default.
//! * [`ProviderClient`] wraps any `edgequake-llm` provider (OpenAI,
//!   Anthropic, Gemini, ...) for hosted models.
//!
//! A well-formed response that lacks generated text comes back as
//! `Ok(GenerateResponse { response: None })`. The summary stage decides what
//! to substitute; this layer does not invent text.

use crate::error::{DigestError, GenerateError};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Body of a generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    /// Always `false`: the pipeline wants one complete response.
    pub stream: bool,
    pub max_tokens: usize,
    /// Ollama reads the output cap from here.
    pub options: GenerateOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateOptions {
    pub num_predict: usize,
}

impl GenerateRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>, max_tokens: usize) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            stream: false,
            max_tokens,
            options: GenerateOptions {
                num_predict: max_tokens,
            },
        }
    }
}

/// Generation result. `response` is `None` when the endpoint sent no text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub response: Option<String>,
}

#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, GenerateError>;
}

/// Client for an Ollama `/api/generate` endpoint.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: Client,
    endpoint: String,
}

impl OllamaClient {
    /// `endpoint` is the full URL, e.g. `http://localhost:11434/api/generate`.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, DigestError> {
        let http = Client::builder()
            .user_agent(concat!("pdf-digest/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DigestError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl GenerationClient for OllamaClient {
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, GenerateError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|error| {
                GenerateError::Unavailable(format!(
                    "failed to reach {}: {error}",
                    self.endpoint
                ))
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(GenerateError::Unavailable(format!(
                "{} returned 404 (is model '{}' pulled?)",
                self.endpoint, request.model
            )));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerateError::Failed(format!("{status}: {body}")));
        }

        let body: GenerateResponse = response.json().await.map_err(|error| {
            GenerateError::InvalidResponse(format!("failed to decode response: {error}"))
        })?;

        debug!(
            "Generation returned {} chars",
            body.response.as_deref().map_or(0, str::len)
        );
        Ok(body)
    }
}

/// Adapter from an `edgequake-llm` provider to [`GenerationClient`].
///
/// The request's `model` is ignored; the provider was built for a model.
pub struct ProviderClient {
    provider: Arc<dyn LLMProvider>,
}

impl ProviderClient {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self { provider }
    }
}

fn provider_options(request: &GenerateRequest) -> CompletionOptions {
    CompletionOptions {
        max_tokens: Some(request.max_tokens),
        ..Default::default()
    }
}

#[async_trait]
impl GenerationClient for ProviderClient {
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, GenerateError> {
        let messages = vec![ChatMessage::user(&request.prompt)];
        let options = provider_options(request);

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| GenerateError::Failed(e.to_string()))?;

        debug!(
            "Provider: {} input tokens, {} output tokens",
            response.prompt_tokens, response.completion_tokens
        );

        let text = response.content;
        Ok(GenerateResponse {
            response: (!text.trim().is_empty()).then_some(text),
        })
    }
}
