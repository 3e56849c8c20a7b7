//! Configuration for the extraction orchestrator
//!
//! Per-job knobs (model id, chunk token budget, overlap) travel in
//! `JobOptions`; this config holds the orchestrator-level settings shared by
//! all jobs it runs.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the extraction orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Maximum input text length (characters)
    pub max_text_length: usize,

    /// Retries for transient model failures, per chunk
    pub max_retries: u32,

    /// Initial backoff between retries (milliseconds, doubled per attempt)
    pub retry_backoff_ms: u64,

    /// Concurrent model calls per job
    pub chunk_concurrency: usize,

    /// Maximum time for a single model call (seconds)
    pub model_timeout_secs: u64,

    /// Maximum time for the text-extraction call (seconds)
    pub text_timeout_secs: u64,
}

impl ExtractorConfig {
    /// Get the model call timeout as a Duration
    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.model_timeout_secs)
    }

    /// Get the text-extraction timeout as a Duration
    pub fn text_timeout(&self) -> Duration {
        Duration::from_secs(self.text_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_text_length == 0 {
            return Err("max_text_length must be greater than 0".to_string());
        }
        if self.chunk_concurrency == 0 {
            return Err("chunk_concurrency must be greater than 0".to_string());
        }
        if self.model_timeout_secs == 0 {
            return Err("model_timeout_secs must be greater than 0".to_string());
        }
        if self.text_timeout_secs == 0 {
            return Err("text_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for ExtractorConfig {
    /// Default configuration with balanced settings
    fn default() -> Self {
        Self {
            max_text_length: 200_000,
            max_retries: 2,
            retry_backoff_ms: 500,
            chunk_concurrency: 4,
            model_timeout_secs: 120,
            text_timeout_secs: 60,
        }
    }
}

impl ExtractorConfig {
    /// Aggressive preset: fewer retries, tighter timeouts, more parallelism
    pub fn aggressive() -> Self {
        Self {
            max_text_length: 100_000,
            max_retries: 1,
            retry_backoff_ms: 250,
            chunk_concurrency: 8,
            model_timeout_secs: 60,
            text_timeout_secs: 30,
        }
    }

    /// Lenient preset: more retries and generous timeouts for slow models
    pub fn lenient() -> Self {
        Self {
            max_text_length: 500_000,
            max_retries: 4,
            retry_backoff_ms: 1_000,
            chunk_concurrency: 2,
            model_timeout_secs: 300,
            text_timeout_secs: 120,
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
