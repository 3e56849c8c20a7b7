//! Request and outcome types for extraction runs

use crate::merge::MergeConflict;
use reqgraph_domain::{ExtractionGraph, JobError, JobId, JobOptions};

/// What the caller asks the orchestrator to run
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    /// Reference to the source document (path, URL, or opaque key)
    pub document_ref: String,
    /// Project the extraction belongs to
    pub project_name: String,
    /// Per-job options
    pub options: JobOptions,
}

impl ExtractionRequest {
    /// Build a request with default options
    pub fn new(document_ref: impl Into<String>, project_name: impl Into<String>) -> Self {
        Self {
            document_ref: document_ref.into(),
            project_name: project_name.into(),
            options: JobOptions::default(),
        }
    }

    /// Replace the default options
    pub fn with_options(mut self, options: JobOptions) -> Self {
        self.options = options;
        self
    }
}

/// Provenance and tallies for a completed run
#[derive(Debug, Clone)]
pub struct ExtractionMetadata {
    /// The source document reference
    pub document_ref: String,
    /// Model used for all chunk calls
    pub model_id: String,
    /// Chunks produced from the source text
    pub chunks_total: usize,
    /// Chunks that yielded no usable partial graph
    pub chunks_failed: usize,
    /// When the run finished (seconds since Unix epoch)
    pub extracted_at: u64,
    /// Wall-clock duration of the run
    pub processing_time_ms: u64,
}

/// The result of a successful extraction run
///
/// "Successful" includes runs where some chunks failed; those failures are in
/// `warnings` and counted in the metadata.
#[derive(Debug, Clone)]
pub struct ExtractionOutcome {
    /// Id of the job that produced this outcome
    pub job_id: JobId,
    /// The merged, deduplicated graph
    pub graph: ExtractionGraph,
    /// Cross-chunk field disagreements (informational)
    pub conflicts: Vec<MergeConflict>,
    /// Structured chunk- and job-level warnings
    pub warnings: Vec<JobError>,
    /// Run provenance and tallies
    pub metadata: ExtractionMetadata,
}
