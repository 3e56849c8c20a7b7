//! End-to-end pipeline tests against in-memory collaborators

use crate::{
    ExtractionOrchestrator, ExtractorConfig, ExtractorError, ExtractionRequest,
};
use reqgraph_domain::{
    EntityKind, JobErrorKind, JobId, JobOptions, JobStatus, JobStore, ModelClient, ModelRequest,
    TextSource,
};
use reqgraph_llm::{MockModel, ModelError};
use reqgraph_store::{MemoryGraphSink, MemoryJobStore};
use std::sync::Arc;
use std::time::Duration;

/// Text source returning a fixed body for any reference
struct StaticTextSource {
    text: String,
}

impl StaticTextSource {
    fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl TextSource for StaticTextSource {
    type Error = std::convert::Infallible;

    fn extract_text(&self, _document_ref: &str) -> Result<String, Self::Error> {
        Ok(self.text.clone())
    }
}

/// Text source that always fails
struct FailingTextSource;

impl TextSource for FailingTextSource {
    type Error = String;

    fn extract_text(&self, document_ref: &str) -> Result<String, Self::Error> {
        Err(format!("cannot read {}", document_ref))
    }
}

/// Model that stalls before answering, for cancellation and overlap-run tests
struct SlowModel {
    delay: Duration,
    response: String,
}

impl ModelClient for SlowModel {
    type Error = ModelError;

    fn invoke(&self, _request: &ModelRequest) -> Result<String, Self::Error> {
        std::thread::sleep(self.delay);
        Ok(self.response.clone())
    }
}

fn fast_config() -> ExtractorConfig {
    ExtractorConfig {
        retry_backoff_ms: 1,
        ..Default::default()
    }
}

fn orchestrator<M: ModelClient + Send + Sync + 'static>(
    text: &str,
    model: M,
    config: ExtractorConfig,
) -> ExtractionOrchestrator<StaticTextSource, M, MemoryJobStore, MemoryGraphSink> {
    ExtractionOrchestrator::new(
        StaticTextSource::new(text),
        model,
        MemoryJobStore::new(),
        MemoryGraphSink::new(),
        config,
    )
}

fn request() -> ExtractionRequest {
    ExtractionRequest::new("spec.pdf", "acme")
}

/// Options tuned so a ~24 word llama3 document splits into exactly two chunks
fn two_chunk_options() -> JobOptions {
    JobOptions {
        target_chunk_tokens: 20,
        overlap_tokens: 2,
        ..Default::default()
    }
}

/// ~24 words; "alpha" appears only in the first chunk, "omega" only in the second
fn two_chunk_text() -> String {
    let mut words = vec!["alpha".to_string()];
    words.extend((1..=22).map(|i| format!("w{:02}", i)));
    words.push("omega".to_string());
    words.join(" ")
}

const ROLE_RESPONSE: &str = "roles[1]{id,name,description,tags}:\n  role-1,Administrator,Manages accounts,\n";

const SECOND_CHUNK_RESPONSE: &str = "requirements[1]{id,name,description,type,priority,status,source,rationale,acceptance_criteria,depends_on,tags}:\n  r1,Account Lockout,Lock after repeated failures,functional,high,,,,,,security\nroles[1]{id,name,description,tags}:\n  role-9,administrator,,\nrelationships[1]{type,source_id,target_id}:\n  OWNED_BY,r1,role-9\n";

#[tokio::test]
async fn test_single_chunk_end_to_end() {
    let orch = orchestrator(
        "The administrator manages user accounts.",
        MockModel::new(ROLE_RESPONSE),
        fast_config(),
    );
    let outcome = orch.run(request()).await.unwrap();

    assert_eq!(outcome.metadata.chunks_total, 1);
    assert_eq!(outcome.metadata.chunks_failed, 0);
    assert_eq!(outcome.graph.entities.len(), 1);
    assert_eq!(outcome.graph.entities[0].name(), "Administrator");
    assert!(outcome.warnings.is_empty());

    let job = orch
        .jobs()
        .lock()
        .unwrap()
        .get(outcome.job_id)
        .unwrap()
        .unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.chunk_count, Some(1));
    assert!(job.final_graph.is_some());

    let sink = orch.sink();
    let sink = sink.lock().unwrap();
    assert_eq!(sink.entity_count(), 1);
    assert!(sink.entity("role-1").is_some());
}

#[tokio::test]
async fn test_two_chunks_merge_into_one_graph() {
    let mut model = MockModel::new(ROLE_RESPONSE);
    model.respond_when_contains("alpha", ROLE_RESPONSE);
    model.respond_when_contains("omega", SECOND_CHUNK_RESPONSE);

    let orch = orchestrator(&two_chunk_text(), model, fast_config());
    let outcome = orch
        .run(request().with_options(two_chunk_options()))
        .await
        .unwrap();

    assert_eq!(outcome.metadata.chunks_total, 2);
    // role-9 deduplicated into role-1 by normalized name
    assert_eq!(outcome.graph.entities.len(), 2);
    assert_eq!(outcome.graph.relationships.len(), 1);
    assert_eq!(outcome.graph.relationships[0].target_id, "role-1");
    assert!(outcome.graph.unresolved.is_empty());

    let counts = outcome.graph.counts();
    assert_eq!(counts.roles, 1);
    assert_eq!(counts.requirements, 1);

    let sink = orch.sink();
    let sink = sink.lock().unwrap();
    assert_eq!(sink.entity_count(), 2);
    assert_eq!(sink.relationship_count(), 1);
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let mut model = MockModel::new(ROLE_RESPONSE);
    model.fail_times(2);
    let probe = model.clone();

    let orch = orchestrator("short document", model, fast_config());
    let outcome = orch.run(request()).await.unwrap();

    assert!(outcome.warnings.is_empty());
    assert_eq!(outcome.graph.entities.len(), 1);
    // two injected failures plus the successful call
    assert_eq!(probe.call_count(), 3);
}

#[tokio::test]
async fn test_all_chunks_failed_fails_the_job() {
    let mut model = MockModel::new(ROLE_RESPONSE);
    model.fail_times(50);

    let orch = orchestrator("short document", model, fast_config());
    let result = orch.run(request()).await;

    assert!(matches!(
        result,
        Err(ExtractorError::AllChunksFailed { attempted: 1 })
    ));
    let jobs = orch.jobs().lock().unwrap().list().unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].status, JobStatus::Failed);
    assert!(jobs[0]
        .errors
        .iter()
        .any(|e| e.kind == JobErrorKind::TransientExternalFailure));
}

#[tokio::test]
async fn test_unparsable_chunk_is_a_warning_not_a_failure() {
    // First chunk parses, second chunk returns prose
    let mut model = MockModel::new("I could not find any entities in this text.");
    model.respond_when_contains("alpha", ROLE_RESPONSE);

    let orch = orchestrator(&two_chunk_text(), model, fast_config());
    let outcome = orch
        .run(request().with_options(two_chunk_options()))
        .await
        .unwrap();

    assert_eq!(outcome.metadata.chunks_total, 2);
    assert_eq!(outcome.metadata.chunks_failed, 1);
    assert_eq!(outcome.graph.entities.len(), 1);
    assert!(outcome
        .warnings
        .iter()
        .any(|w| w.kind == JobErrorKind::DecodeFailure && w.chunk_index == Some(1)));

    let job = orch
        .jobs()
        .lock()
        .unwrap()
        .get(outcome.job_id)
        .unwrap()
        .unwrap();
    assert!(job.completed_with_warnings());
}

#[tokio::test]
async fn test_bad_chunk_options_rejected_before_any_record() {
    let orch = orchestrator("text", MockModel::new(ROLE_RESPONSE), fast_config());
    let options = JobOptions {
        target_chunk_tokens: 100,
        overlap_tokens: 100,
        ..Default::default()
    };
    let result = orch.run(request().with_options(options)).await;

    assert!(matches!(
        result,
        Err(ExtractorError::InvalidConfiguration(_))
    ));
    assert!(orch.jobs().lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_duplicate_run_for_same_job_id_rejected() {
    let orch = Arc::new(orchestrator(
        "short document",
        SlowModel {
            delay: Duration::from_millis(300),
            response: ROLE_RESPONSE.to_string(),
        },
        fast_config(),
    ));
    let job_id = JobId::new();

    let first = {
        let orch = Arc::clone(&orch);
        tokio::spawn(async move { orch.run_with_id(job_id, request()).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    let second = orch.run_with_id(job_id, request()).await;

    assert!(matches!(
        second,
        Err(ExtractorError::JobAlreadyRunning(id)) if id == job_id
    ));
    assert!(first.await.unwrap().is_ok());

    // The id is free again once the first run finishes
    assert!(orch.run_with_id(job_id, request()).await.is_ok());
}

#[tokio::test]
async fn test_cancellation_skips_remaining_chunks() {
    let config = ExtractorConfig {
        chunk_concurrency: 1,
        ..fast_config()
    };
    let orch = Arc::new(orchestrator(
        &two_chunk_text(),
        SlowModel {
            delay: Duration::from_millis(200),
            response: ROLE_RESPONSE.to_string(),
        },
        config,
    ));
    let job_id = JobId::new();

    let run = {
        let orch = Arc::clone(&orch);
        tokio::spawn(async move {
            orch.run_with_id(job_id, request().with_options(two_chunk_options()))
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(orch.cancel(job_id));

    let outcome = run.await.unwrap().unwrap();
    // First chunk finished, the rest were skipped at the boundary
    assert!(outcome
        .warnings
        .iter()
        .any(|w| w.kind == JobErrorKind::Cancelled));
    assert_eq!(outcome.graph.entities.len(), 1);

    let job = orch.jobs().lock().unwrap().get(job_id).unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Completed);
}

#[tokio::test]
async fn test_cancel_unknown_job_is_a_noop() {
    let orch = orchestrator("text", MockModel::new(ROLE_RESPONSE), fast_config());
    assert!(!orch.cancel(JobId::new()));
}

#[tokio::test]
async fn test_empty_document_completes_with_empty_graph() {
    let model = MockModel::new(ROLE_RESPONSE);
    let probe = model.clone();

    let orch = orchestrator("   \n\t  ", model, fast_config());
    let outcome = orch.run(request()).await.unwrap();

    assert_eq!(outcome.metadata.chunks_total, 0);
    assert!(outcome.graph.is_empty());
    assert!(outcome.warnings.is_empty());
    assert_eq!(probe.call_count(), 0);

    let job = orch
        .jobs()
        .lock()
        .unwrap()
        .get(outcome.job_id)
        .unwrap()
        .unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.chunk_count, Some(0));
}

#[tokio::test]
async fn test_text_source_failure_fails_the_job() {
    let orch = ExtractionOrchestrator::new(
        FailingTextSource,
        MockModel::new(ROLE_RESPONSE),
        MemoryJobStore::new(),
        MemoryGraphSink::new(),
        fast_config(),
    );
    let result = orch.run(request()).await;

    assert!(matches!(result, Err(ExtractorError::TextExtraction(_))));
    let jobs = orch.jobs().lock().unwrap().list().unwrap();
    assert_eq!(jobs[0].status, JobStatus::Failed);
}

#[tokio::test]
async fn test_oversized_document_rejected() {
    let config = ExtractorConfig {
        max_text_length: 10,
        ..fast_config()
    };
    let orch = orchestrator(
        "this document is longer than ten characters",
        MockModel::new(ROLE_RESPONSE),
        config,
    );
    let result = orch.run(request()).await;

    assert!(matches!(result, Err(ExtractorError::TextTooLong(_, 10))));
    let jobs = orch.jobs().lock().unwrap().list().unwrap();
    assert_eq!(jobs[0].status, JobStatus::Failed);
}

#[tokio::test]
async fn test_missing_entity_ids_get_stable_derived_ids() {
    let body = "roles[1]{id,name,description,tags}:\n  ,Release Manager,Owns deployments,\n";
    let orch = orchestrator("doc", MockModel::new(body), fast_config());
    let outcome = orch.run(request()).await.unwrap();

    let expected = reqgraph_domain::entity_id(EntityKind::Role, "Release Manager");
    assert_eq!(outcome.graph.entities[0].id(), expected);
}
