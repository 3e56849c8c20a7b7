//! Reqgraph Model Provider Layer
//!
//! Pluggable implementations of the `ModelClient` trait from
//! `reqgraph-domain`.
//!
//! # Providers
//!
//! - `MockModel`: deterministic mock for testing, with canned responses and
//!   failure injection
//! - `OllamaModel`: local Ollama API integration
//!
//! # Examples
//!
//! ```
//! use reqgraph_llm::MockModel;
//! use reqgraph_domain::traits::{ModelClient, ModelRequest};
//!
//! let model = MockModel::new("roles[1]{id,name}:\n  role-x,Admin\n");
//! let request = ModelRequest {
//!     prompt: "extract".to_string(),
//!     model_id: "mock".to_string(),
//!     temperature: 0.1,
//!     max_tokens: 512,
//! };
//! let response = model.invoke(&request).unwrap();
//! assert!(response.contains("role-x"));
//! ```

#![warn(missing_docs)]

pub mod ollama;

use reqgraph_domain::traits::{ModelClient, ModelRequest};
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub use ollama::OllamaModel;

/// Errors that can occur during model operations
#[derive(Error, Debug)]
pub enum ModelError {
    /// The call exceeded its time budget
    #[error("Model call timed out")]
    Timeout,

    /// The model service could not be reached or returned a server error
    #[error("Model service unavailable: {0}")]
    Unavailable(String),

    /// The requested model does not exist
    #[error("Invalid model: {0}")]
    InvalidModel(String),

    /// The service replied with something unusable
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ModelError {
    /// Timeouts and unavailability are worth retrying; the rest are not
    pub fn is_transient(&self) -> bool {
        matches!(self, ModelError::Timeout | ModelError::Unavailable(_))
    }
}

/// Mock model client for deterministic testing
///
/// Returns pre-configured responses without any network calls. Responses can
/// be keyed on a substring of the prompt, so per-chunk responses are easy to
/// stage, and a number of leading transient failures can be injected to
/// exercise retry paths.
///
/// # Examples
///
/// ```
/// use reqgraph_llm::MockModel;
/// use reqgraph_domain::traits::{ModelClient, ModelRequest};
///
/// let mut model = MockModel::new("default");
/// model.respond_when_contains("chunk one marker", "first response");
///
/// let request = ModelRequest {
///     prompt: "... chunk one marker ...".to_string(),
///     model_id: "mock".to_string(),
///     temperature: 0.0,
///     max_tokens: 128,
/// };
/// assert_eq!(model.invoke(&request).unwrap(), "first response");
/// ```
#[derive(Debug, Clone)]
pub struct MockModel {
    default_response: String,
    rules: Arc<Mutex<Vec<(String, String)>>>,
    transient_failures: Arc<Mutex<usize>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockModel {
    /// Create a mock returning a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            rules: Arc::new(Mutex::new(Vec::new())),
            transient_failures: Arc::new(Mutex::new(0)),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Return `response` for any prompt containing `marker`
    ///
    /// Rules are checked in insertion order; the first match wins.
    pub fn respond_when_contains(&mut self, marker: impl Into<String>, response: impl Into<String>) {
        self.rules
            .lock()
            .unwrap()
            .push((marker.into(), response.into()));
    }

    /// Make the next `n` invocations fail with a transient error
    pub fn fail_times(&mut self, n: usize) {
        *self.transient_failures.lock().unwrap() = n;
    }

    /// How many times `invoke` has been called
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        *self.call_count.lock().unwrap() = 0;
    }
}

impl Default for MockModel {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl ModelClient for MockModel {
    type Error = ModelError;

    fn invoke(&self, request: &ModelRequest) -> Result<String, Self::Error> {
        *self.call_count.lock().unwrap() += 1;

        {
            let mut failures = self.transient_failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(ModelError::Unavailable("injected failure".to_string()));
            }
        }

        let rules = self.rules.lock().unwrap();
        for (marker, response) in rules.iter() {
            if request.prompt.contains(marker) {
                return Ok(response.clone());
            }
        }
        Ok(self.default_response.clone())
    }

    fn is_transient(&self, error: &Self::Error) -> bool {
        error.is_transient()
    }
}
