//! Trait definitions for external collaborators
//!
//! These traits define the boundaries between the extraction core and
//! infrastructure. Implementations live in other crates.

use crate::entity::Entity;
use crate::job::{Job, JobId};
use crate::relationship::Relationship;

/// A single request to the model collaborator
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    /// Full prompt text
    pub prompt: String,
    /// Model identifier
    pub model_id: String,
    /// Sampling temperature
    pub temperature: f64,
    /// Response token cap
    pub max_tokens: usize,
}

/// Trait for obtaining raw text from a document reference
///
/// Implemented by the document-text-extraction collaborator.
pub trait TextSource {
    /// Error type for text extraction
    type Error: std::fmt::Display;

    /// Extract the full text of the referenced document
    fn extract_text(&self, document_ref: &str) -> Result<String, Self::Error>;
}

/// Trait for language-model inference
///
/// Implemented by the infrastructure layer (reqgraph-llm).
pub trait ModelClient {
    /// Error type for model operations
    type Error: std::fmt::Display;

    /// Invoke the model and return the raw response text
    fn invoke(&self, request: &ModelRequest) -> Result<String, Self::Error>;

    /// Whether a failure is transient and worth retrying
    ///
    /// Timeouts and unavailability are transient; invalid-model and other
    /// permanent failures are not. Defaults to non-transient.
    fn is_transient(&self, _error: &Self::Error) -> bool {
        false
    }
}

/// Trait for persisting a final graph
///
/// The contract is idempotent: applying the same graph twice leaves the
/// store unchanged beyond the first application. Both methods return the
/// number of records newly applied.
pub trait GraphSink {
    /// Error type for persistence operations
    type Error: std::fmt::Display;

    /// Merge entities into the store
    fn merge_entities(&mut self, entities: &[Entity]) -> Result<usize, Self::Error>;

    /// Merge relationships into the store
    fn merge_relationships(&mut self, edges: &[Relationship]) -> Result<usize, Self::Error>;
}

/// Trait for storing and retrieving job records
///
/// A key-value contract (put/get/list by id) so the orchestrator is testable
/// without a process-wide job table.
pub trait JobStore {
    /// Error type for store operations
    type Error: std::fmt::Display;

    /// Insert or replace a job record
    fn put(&mut self, job: Job) -> Result<(), Self::Error>;

    /// Fetch a job by id
    fn get(&self, id: JobId) -> Result<Option<Job>, Self::Error>;

    /// List all job records
    fn list(&self) -> Result<Vec<Job>, Self::Error>;
}
