//! Error types for the extraction pipeline

use reqgraph_domain::JobId;
use thiserror::Error;

/// Fatal errors surfaced by the orchestrator
///
/// Chunk-level failures are not errors at this level; they are recorded as
/// structured `JobError` warnings on the job and never abort it.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Bad chunk-size/overlap or orchestrator parameters; the job never starts
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A run for this job id is already executing
    #[error("Job {0} is already running")]
    JobAlreadyRunning(JobId),

    /// Input text exceeds the configured maximum
    #[error("Text too long: {0} chars (max: {1})")]
    TextTooLong(usize, usize),

    /// The text-extraction collaborator failed; no chunk ever ran
    #[error("Text extraction failed: {0}")]
    TextExtraction(String),

    /// Every chunk failed to produce a usable partial graph
    #[error("All {attempted} chunks failed to produce a partial graph")]
    AllChunksFailed {
        /// How many chunks were attempted
        attempted: usize,
    },

    /// Job store error
    #[error("Job store error: {0}")]
    Store(String),

    /// Internal invariant violation (poisoned lock, task join failure)
    #[error("Internal error: {0}")]
    Internal(String),
}
