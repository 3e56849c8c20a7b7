//! Job module - the lifecycle record of one extraction run

use crate::graph::{current_timestamp, ExtractionGraph};
use std::fmt;

/// Unique identifier for a job based on UUIDv7
///
/// UUIDv7 provides chronological sortability for job listings and requires
/// no coordination for distributed generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(u128);

impl JobId {
    /// Generate a new UUIDv7-based JobId
    ///
    /// # Examples
    ///
    /// ```
    /// use reqgraph_domain::JobId;
    ///
    /// let id = JobId::new();
    /// assert!(id.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create a JobId from a raw u128 value
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse a JobId from a UUID string
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid job id: {}", e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

/// Processing state of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    /// Created, nothing has run yet
    Pending,
    /// Raw text obtained from the document
    TextExtracted,
    /// Text split into chunks
    Chunked,
    /// Per-chunk model calls in flight
    Prompting,
    /// Partial graphs being reconciled
    Merging,
    /// Terminal: finished (possibly with per-chunk warnings)
    Completed,
    /// Terminal: no usable output
    Failed,
}

impl JobStatus {
    /// Canonical name of this status
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::TextExtracted => "text_extracted",
            JobStatus::Chunked => "chunked",
            JobStatus::Prompting => "prompting",
            JobStatus::Merging => "merging",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// True for Completed and Failed
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Whether this status may transition to `next`
    ///
    /// The chain is Pending → TextExtracted → Chunked → Prompting → Merging
    /// → Completed; Failed is reachable from any non-terminal state.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        if next == JobStatus::Failed {
            return !self.is_terminal();
        }
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::TextExtracted)
                | (JobStatus::TextExtracted, JobStatus::Chunked)
                | (JobStatus::Chunked, JobStatus::Prompting)
                | (JobStatus::Prompting, JobStatus::Merging)
                | (JobStatus::Merging, JobStatus::Completed)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classification of a structured job error or warning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobErrorKind {
    /// Bad chunk-size/overlap parameters; fatal, the job never starts
    InvalidConfiguration,
    /// External collaborator timeout or unavailability, retries exhausted
    TransientExternalFailure,
    /// Response unparsable even via the fallback path; never retried
    DecodeFailure,
    /// Chunk skipped because the job was cancelled
    Cancelled,
}

impl JobErrorKind {
    /// Canonical name of this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            JobErrorKind::InvalidConfiguration => "invalid_configuration",
            JobErrorKind::TransientExternalFailure => "transient_external_failure",
            JobErrorKind::DecodeFailure => "decode_failure",
            JobErrorKind::Cancelled => "cancelled",
        }
    }
}

/// A structured error or warning surfaced to the caller
///
/// Never raw exception text: kind + chunk index + message, so a caller can
/// distinguish "retry the whole job" from "this chunk was unparsable".
#[derive(Debug, Clone, PartialEq)]
pub struct JobError {
    /// What went wrong
    pub kind: JobErrorKind,
    /// Which chunk, when the failure is chunk-scoped
    pub chunk_index: Option<usize>,
    /// Human-readable detail
    pub message: String,
}

impl JobError {
    /// Create a chunk-scoped error
    pub fn for_chunk(kind: JobErrorKind, chunk_index: usize, message: impl Into<String>) -> Self {
        Self {
            kind,
            chunk_index: Some(chunk_index),
            message: message.into(),
        }
    }

    /// Create a job-scoped error
    pub fn job_level(kind: JobErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            chunk_index: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.chunk_index {
            Some(idx) => write!(f, "[{}] chunk {}: {}", self.kind.as_str(), idx, self.message),
            None => write!(f, "[{}] {}", self.kind.as_str(), self.message),
        }
    }
}

/// Per-job options supplied by the caller
#[derive(Debug, Clone, PartialEq)]
pub struct JobOptions {
    /// Model identifier passed to the model collaborator and the estimator
    pub model_id: String,
    /// Token budget per chunk
    pub target_chunk_tokens: usize,
    /// Token overlap between consecutive chunks
    pub overlap_tokens: usize,
    /// Sampling temperature for model calls
    pub temperature: f64,
    /// Response token cap for model calls
    pub max_response_tokens: usize,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            model_id: "llama3".to_string(),
            target_chunk_tokens: 1_500,
            overlap_tokens: 150,
            temperature: 0.1,
            max_response_tokens: 2_048,
        }
    }
}

/// The lifecycle record of one extraction run
///
/// Owns its chunk tally, accumulated warnings, and (once merged) the final
/// graph. Created in Pending and retired on Completed or Failed.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    /// Unique identifier
    pub id: JobId,
    /// Reference to the source document (path, URL, or opaque key)
    pub document_ref: String,
    /// Project the extraction belongs to
    pub project_name: String,
    /// Caller-supplied options
    pub options: JobOptions,
    /// Current status
    pub status: JobStatus,
    /// Number of chunks produced, once known
    pub chunk_count: Option<usize>,
    /// Accumulated structured errors and warnings
    pub errors: Vec<JobError>,
    /// The merged graph, present once the job completes
    pub final_graph: Option<ExtractionGraph>,
    /// When the job was created (seconds since Unix epoch)
    pub created_at: u64,
    /// When the job record last changed
    pub updated_at: u64,
}

impl Job {
    /// Create a new pending job
    pub fn new(
        id: JobId,
        document_ref: impl Into<String>,
        project_name: impl Into<String>,
        options: JobOptions,
    ) -> Self {
        let now = current_timestamp();
        Self {
            id,
            document_ref: document_ref.into(),
            project_name: project_name.into(),
            options,
            status: JobStatus::Pending,
            chunk_count: None,
            errors: Vec::new(),
            final_graph: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move the job to a new status, rejecting illegal transitions
    pub fn transition(&mut self, next: JobStatus) -> Result<(), String> {
        if !self.status.can_transition_to(next) {
            return Err(format!(
                "Illegal job transition: {} -> {}",
                self.status, next
            ));
        }
        self.status = next;
        self.updated_at = current_timestamp();
        Ok(())
    }

    /// Record a structured error or warning
    pub fn record_error(&mut self, error: JobError) {
        self.errors.push(error);
        self.updated_at = current_timestamp();
    }

    /// True when the job finished with at least one chunk-level warning
    pub fn completed_with_warnings(&self) -> bool {
        self.status == JobStatus::Completed && !self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_job() -> Job {
        Job::new(JobId::new(), "doc.pdf", "acme", JobOptions::default())
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut job = pending_job();
        for next in [
            JobStatus::TextExtracted,
            JobStatus::Chunked,
            JobStatus::Prompting,
            JobStatus::Merging,
            JobStatus::Completed,
        ] {
            job.transition(next).unwrap();
        }
        assert!(job.status.is_terminal());
    }

    #[test]
    fn test_failed_reachable_from_any_active_state() {
        let mut job = pending_job();
        job.transition(JobStatus::TextExtracted).unwrap();
        job.transition(JobStatus::Failed).unwrap();
        assert_eq!(job.status, JobStatus::Failed);
    }

    #[test]
    fn test_illegal_skip_rejected() {
        let mut job = pending_job();
        assert!(job.transition(JobStatus::Merging).is_err());
        assert_eq!(job.status, JobStatus::Pending);
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut job = pending_job();
        job.transition(JobStatus::Failed).unwrap();
        assert!(job.transition(JobStatus::Failed).is_err());
        assert!(job.transition(JobStatus::TextExtracted).is_err());
    }

    #[test]
    fn test_completed_with_warnings() {
        let mut job = pending_job();
        job.record_error(JobError::for_chunk(
            JobErrorKind::DecodeFailure,
            2,
            "no structured block found",
        ));
        for next in [
            JobStatus::TextExtracted,
            JobStatus::Chunked,
            JobStatus::Prompting,
            JobStatus::Merging,
            JobStatus::Completed,
        ] {
            job.transition(next).unwrap();
        }
        assert!(job.completed_with_warnings());
    }

    #[test]
    fn test_job_id_string_round_trip() {
        let id = JobId::new();
        let parsed = JobId::from_string(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_job_error_display_is_structured() {
        let err = JobError::for_chunk(JobErrorKind::TransientExternalFailure, 3, "timeout");
        let text = err.to_string();
        assert!(text.contains("transient_external_failure"));
        assert!(text.contains("chunk 3"));
    }
}
