//! Ollama Model Implementation
//!
//! Integration with Ollama's local LLM API. The client is single-shot:
//! retry and backoff policy belongs to the orchestrator, which knows which
//! failures are transient for the job at hand.
//!
//! # Examples
//!
//! ```no_run
//! use reqgraph_llm::OllamaModel;
//!
//! let model = OllamaModel::new("http://localhost:11434");
//! // OllamaModel implements reqgraph_domain::traits::ModelClient; the model
//! // name comes from each ModelRequest.
//! ```

use crate::ModelError;
use reqgraph_domain::traits::{ModelClient, ModelRequest};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default timeout for model requests (120 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Ollama API client for local model inference
pub struct OllamaModel {
    endpoint: String,
    client: reqwest::Client,
}

/// Request body for the Ollama generate API
#[derive(Serialize)]
struct OllamaGenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: OllamaOptions,
}

/// Sampling options passed through to Ollama
#[derive(Serialize)]
struct OllamaOptions {
    temperature: f64,
    num_predict: usize,
}

/// Response from the Ollama generate API
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
    #[allow(dead_code)]
    done: bool,
}

impl OllamaModel {
    /// Create a new Ollama client for the given endpoint
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_timeout(endpoint, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a client with a custom per-request timeout
    pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            endpoint: endpoint.into(),
            client,
        }
    }

    /// Create a client for the default local endpoint
    pub fn local() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }

    /// Invoke the model asynchronously
    ///
    /// # Errors
    ///
    /// - `Timeout` when the request exceeds the client timeout
    /// - `InvalidModel` when Ollama reports the model is not installed
    /// - `Unavailable` for connection failures and server errors
    /// - `InvalidResponse` when the reply body cannot be parsed
    pub async fn generate(&self, request: &ModelRequest) -> Result<String, ModelError> {
        let url = format!("{}/api/generate", self.endpoint);

        let body = OllamaGenerateRequest {
            model: request.model_id.clone(),
            prompt: request.prompt.clone(),
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ModelError::Timeout
                } else {
                    ModelError::Unavailable(format!("Request failed: {}", e))
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ModelError::InvalidModel(request.model_id.clone()));
        }
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ModelError::Unavailable(format!("HTTP {}: {}", status, text)));
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        Ok(parsed.response)
    }
}

impl ModelClient for OllamaModel {
    type Error = ModelError;

    fn invoke(&self, request: &ModelRequest) -> Result<String, Self::Error> {
        // Blocking wrapper for the async call; the orchestrator invokes this
        // from spawn_blocking
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ModelError::Unavailable(format!("Runtime error: {}", e)))?;
        runtime.block_on(self.generate(request))
    }

    fn is_transient(&self, error: &Self::Error) -> bool {
        error.is_transient()
    }
}
