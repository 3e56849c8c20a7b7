//! The extraction pipeline driver
//!
//! Walks one job through text extraction, chunking, per-chunk model calls,
//! merge, and persistence. Collaborators are trait objects chosen at
//! construction; blocking collaborator calls run on the blocking pool so the
//! async workers stay responsive. At most one run per job id may be in
//! flight at a time.

use crate::chunking::{Chunk, Chunker};
use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::merge::{MergeEngine, PartialGraph};
use crate::parser::parse_response;
use crate::prompt::PromptBuilder;
use crate::token::TokenEstimator;
use crate::types::{ExtractionMetadata, ExtractionOutcome, ExtractionRequest};
use reqgraph_domain::{
    GraphSink, Job, JobError, JobErrorKind, JobId, JobStatus, JobStore, ModelClient,
    ModelRequest, TextSource,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// Drives extraction jobs end to end
pub struct ExtractionOrchestrator<T, M, J, P> {
    text_source: Arc<T>,
    model: Arc<M>,
    jobs: Arc<Mutex<J>>,
    sink: Arc<Mutex<P>>,
    config: ExtractorConfig,
    estimator: TokenEstimator,
    running: Arc<Mutex<HashSet<JobId>>>,
    cancelled: Arc<Mutex<HashSet<JobId>>>,
}

impl<T, M, J, P> ExtractionOrchestrator<T, M, J, P>
where
    T: TextSource + Send + Sync + 'static,
    M: ModelClient + Send + Sync + 'static,
    J: JobStore + Send + 'static,
    P: GraphSink + Send + 'static,
{
    /// Create an orchestrator over the given collaborators
    pub fn new(text_source: T, model: M, jobs: J, sink: P, config: ExtractorConfig) -> Self {
        Self {
            text_source: Arc::new(text_source),
            model: Arc::new(model),
            jobs: Arc::new(Mutex::new(jobs)),
            sink: Arc::new(Mutex::new(sink)),
            config,
            estimator: TokenEstimator::new(),
            running: Arc::new(Mutex::new(HashSet::new())),
            cancelled: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Shared handle to the job store
    pub fn jobs(&self) -> Arc<Mutex<J>> {
        Arc::clone(&self.jobs)
    }

    /// Shared handle to the graph sink
    pub fn sink(&self) -> Arc<Mutex<P>> {
        Arc::clone(&self.sink)
    }

    /// Request cancellation of a running job
    ///
    /// Takes effect at the next chunk boundary; chunks already in flight run
    /// to completion. Returns false when no run with this id is active.
    pub fn cancel(&self, job_id: JobId) -> bool {
        let active = self
            .running
            .lock()
            .map(|r| r.contains(&job_id))
            .unwrap_or(false);
        if !active {
            return false;
        }
        self.cancelled
            .lock()
            .map(|mut c| {
                c.insert(job_id);
                true
            })
            .unwrap_or(false)
    }

    /// Run an extraction under a fresh job id
    pub async fn run(
        &self,
        request: ExtractionRequest,
    ) -> Result<ExtractionOutcome, ExtractorError> {
        self.run_with_id(JobId::new(), request).await
    }

    /// Run an extraction under the caller's job id
    ///
    /// Fails with [`ExtractorError::JobAlreadyRunning`] while a run with the
    /// same id is in flight. Configuration problems are rejected before any
    /// job record is created.
    pub async fn run_with_id(
        &self,
        job_id: JobId,
        request: ExtractionRequest,
    ) -> Result<ExtractionOutcome, ExtractorError> {
        self.config
            .validate()
            .map_err(ExtractorError::InvalidConfiguration)?;
        Chunker::validate_params(
            request.options.target_chunk_tokens,
            request.options.overlap_tokens,
        )?;

        {
            let mut running = lock(&self.running)?;
            if !running.insert(job_id) {
                return Err(ExtractorError::JobAlreadyRunning(job_id));
            }
        }

        let result = self.run_inner(job_id, request).await;

        if let Ok(mut running) = self.running.lock() {
            running.remove(&job_id);
        }
        if let Ok(mut cancelled) = self.cancelled.lock() {
            cancelled.remove(&job_id);
        }
        result
    }

    async fn run_inner(
        &self,
        job_id: JobId,
        request: ExtractionRequest,
    ) -> Result<ExtractionOutcome, ExtractorError> {
        let started = Instant::now();
        let mut job = Job::new(
            job_id,
            request.document_ref.clone(),
            request.project_name.clone(),
            request.options.clone(),
        );
        self.put_job(job.clone())?;
        tracing::info!(
            job = %job_id,
            document = %request.document_ref,
            model = %job.options.model_id,
            "starting extraction"
        );

        let text = match self.extract_text(&request.document_ref).await {
            Ok(text) => text,
            Err(message) => {
                return self.fail_job(
                    &mut job,
                    JobErrorKind::TransientExternalFailure,
                    ExtractorError::TextExtraction(message),
                );
            }
        };
        if text.chars().count() > self.config.max_text_length {
            return self.fail_job(
                &mut job,
                JobErrorKind::InvalidConfiguration,
                ExtractorError::TextTooLong(text.chars().count(), self.config.max_text_length),
            );
        }
        self.advance(&mut job, JobStatus::TextExtracted)?;

        let chunker = Chunker::new(self.estimator);
        let chunks = chunker.chunk(
            &text,
            job.options.target_chunk_tokens,
            job.options.overlap_tokens,
            &job.options.model_id,
        )?;
        let chunk_count = chunks.len();
        job.chunk_count = Some(chunk_count);
        self.advance(&mut job, JobStatus::Chunked)?;
        tracing::info!(job = %job_id, chunks = chunk_count, "document chunked");

        self.advance(&mut job, JobStatus::Prompting)?;
        let (partials, mut chunk_warnings) = if chunks.is_empty() {
            (Vec::new(), Vec::new())
        } else {
            self.run_chunks(job_id, &job, chunks).await?
        };

        chunk_warnings.sort_by_key(|w| w.chunk_index);
        for warning in &chunk_warnings {
            job.record_error(warning.clone());
        }
        let chunks_failed = chunk_count - partials.len();
        if partials.is_empty() && chunk_count > 0 {
            return self.fail_job(
                &mut job,
                JobErrorKind::TransientExternalFailure,
                ExtractorError::AllChunksFailed {
                    attempted: chunk_count,
                },
            );
        }

        self.advance(&mut job, JobStatus::Merging)?;
        let merged = MergeEngine::new().merge(partials);
        let graph = merged.graph;

        if !graph.is_empty() {
            let mut sink = lock(&self.sink)?;
            let applied = sink
                .merge_entities(&graph.entities)
                .and_then(|n| sink.merge_relationships(&graph.relationships).map(|m| n + m));
            match applied {
                Ok(count) => tracing::info!(job = %job_id, applied = count, "graph persisted"),
                Err(e) => {
                    // The graph still lives on the job record; persistence can
                    // be replayed later
                    let warning = JobError::job_level(
                        JobErrorKind::TransientExternalFailure,
                        format!("Persistence failed: {}", e),
                    );
                    tracing::warn!(job = %job_id, "{}", warning);
                    job.record_error(warning);
                }
            }
        }

        job.final_graph = Some(graph.clone());
        self.advance(&mut job, JobStatus::Completed)?;

        let counts = graph.counts();
        tracing::info!(
            job = %job_id,
            entities = counts.total_entities(),
            relationships = counts.relationships,
            unresolved = counts.unresolved,
            chunks_failed,
            "extraction completed"
        );

        Ok(ExtractionOutcome {
            job_id,
            warnings: job.errors.clone(),
            conflicts: merged.conflicts,
            metadata: ExtractionMetadata {
                document_ref: request.document_ref,
                model_id: job.options.model_id.clone(),
                chunks_total: chunk_count,
                chunks_failed,
                extracted_at: graph.extracted_at,
                processing_time_ms: started.elapsed().as_millis() as u64,
            },
            graph,
        })
    }

    /// Obtain the document text on the blocking pool, under a timeout
    async fn extract_text(&self, document_ref: &str) -> Result<String, String> {
        let source = Arc::clone(&self.text_source);
        let document_ref = document_ref.to_string();
        let task = tokio::task::spawn_blocking(move || {
            source
                .extract_text(&document_ref)
                .map_err(|e| e.to_string())
        });
        match tokio::time::timeout(self.config.text_timeout(), task).await {
            Err(_) => Err("text extraction timed out".to_string()),
            Ok(Err(join_err)) => Err(format!("text extraction task failed: {}", join_err)),
            Ok(Ok(result)) => result,
        }
    }

    /// Fan chunks out to bounded concurrent model calls
    async fn run_chunks(
        &self,
        job_id: JobId,
        job: &Job,
        chunks: Vec<Chunk>,
    ) -> Result<(Vec<PartialGraph>, Vec<JobError>), ExtractorError> {
        let chunk_count = chunks.len();
        let semaphore = Arc::new(Semaphore::new(self.config.chunk_concurrency));
        let partials: Arc<Mutex<Vec<PartialGraph>>> = Arc::new(Mutex::new(Vec::new()));
        let warnings: Arc<Mutex<Vec<JobError>>> = Arc::new(Mutex::new(Vec::new()));
        let builder = PromptBuilder::new(&job.project_name);

        let mut handles = Vec::with_capacity(chunk_count);
        for chunk in chunks {
            let semaphore = Arc::clone(&semaphore);
            let model = Arc::clone(&self.model);
            let cancelled = Arc::clone(&self.cancelled);
            let partials = Arc::clone(&partials);
            let warnings = Arc::clone(&warnings);
            let builder = builder.clone();
            let options = job.options.clone();
            let config = self.config.clone();

            handles.push(tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };
                let is_cancelled = cancelled
                    .lock()
                    .map(|c| c.contains(&job_id))
                    .unwrap_or(false);
                if is_cancelled {
                    push(
                        &warnings,
                        JobError::for_chunk(
                            JobErrorKind::Cancelled,
                            chunk.index,
                            "chunk skipped after cancellation",
                        ),
                    );
                    return;
                }

                let request = ModelRequest {
                    prompt: builder.build(&chunk, chunk_count),
                    model_id: options.model_id.clone(),
                    temperature: options.temperature,
                    max_tokens: options.max_response_tokens,
                };

                let mut attempt = 0u32;
                let body = loop {
                    match call_model(&model, &request, config.model_timeout()).await {
                        Ok(body) => break Some(body),
                        Err((message, transient)) => {
                            if transient && attempt < config.max_retries {
                                attempt += 1;
                                let backoff = config.retry_backoff_ms * 2u64.pow(attempt - 1);
                                tracing::warn!(
                                    job = %job_id,
                                    chunk = chunk.index,
                                    attempt,
                                    backoff_ms = backoff,
                                    "transient model failure, retrying: {}",
                                    message
                                );
                                tokio::time::sleep(Duration::from_millis(backoff)).await;
                            } else {
                                tracing::warn!(
                                    job = %job_id,
                                    chunk = chunk.index,
                                    "chunk failed: {}",
                                    message
                                );
                                push(
                                    &warnings,
                                    JobError::for_chunk(
                                        JobErrorKind::TransientExternalFailure,
                                        chunk.index,
                                        message,
                                    ),
                                );
                                break None;
                            }
                        }
                    }
                };
                let Some(body) = body else {
                    return;
                };

                match parse_response(&body) {
                    Ok(parsed) => {
                        for warning in &parsed.warnings {
                            tracing::warn!(job = %job_id, chunk = chunk.index, "{}", warning);
                        }
                        if let Ok(mut guard) = partials.lock() {
                            guard.push(PartialGraph::new(&chunk, parsed.graph));
                        }
                    }
                    Err(e) => {
                        push(
                            &warnings,
                            JobError::for_chunk(JobErrorKind::DecodeFailure, chunk.index, e.to_string()),
                        );
                    }
                }
            }));
        }

        for handle in handles {
            handle
                .await
                .map_err(|e| ExtractorError::Internal(format!("chunk task failed: {}", e)))?;
        }

        let partials = std::mem::take(&mut *lock(&partials)?);
        let warnings = std::mem::take(&mut *lock(&warnings)?);
        Ok((partials, warnings))
    }

    fn advance(&self, job: &mut Job, next: JobStatus) -> Result<(), ExtractorError> {
        job.transition(next).map_err(ExtractorError::Internal)?;
        self.put_job(job.clone())
    }

    fn fail_job(
        &self,
        job: &mut Job,
        kind: JobErrorKind,
        error: ExtractorError,
    ) -> Result<ExtractionOutcome, ExtractorError> {
        tracing::warn!(job = %job.id, "extraction failed: {}", error);
        job.record_error(JobError::job_level(kind, error.to_string()));
        let _ = job.transition(JobStatus::Failed);
        let _ = self.put_job(job.clone());
        Err(error)
    }

    fn put_job(&self, job: Job) -> Result<(), ExtractorError> {
        lock(&self.jobs)?
            .put(job)
            .map_err(|e| ExtractorError::Store(e.to_string()))
    }
}

/// Invoke the model on the blocking pool under a timeout
///
/// Errors carry a transience flag so the caller can decide whether to retry;
/// timeouts count as transient.
async fn call_model<M>(
    model: &Arc<M>,
    request: &ModelRequest,
    timeout: Duration,
) -> Result<String, (String, bool)>
where
    M: ModelClient + Send + Sync + 'static,
{
    let model = Arc::clone(model);
    let request = request.clone();
    let task = tokio::task::spawn_blocking(move || match model.invoke(&request) {
        Ok(body) => Ok(body),
        Err(e) => Err((e.to_string(), model.is_transient(&e))),
    });
    match tokio::time::timeout(timeout, task).await {
        Err(_) => Err(("model call timed out".to_string(), true)),
        Ok(Err(join_err)) => Err((format!("model task failed: {}", join_err), false)),
        Ok(Ok(result)) => result,
    }
}

fn push(warnings: &Arc<Mutex<Vec<JobError>>>, warning: JobError) {
    if let Ok(mut guard) = warnings.lock() {
        guard.push(warning);
    }
}

fn lock<S>(mutex: &Arc<Mutex<S>>) -> Result<std::sync::MutexGuard<'_, S>, ExtractorError> {
    mutex
        .lock()
        .map_err(|_| ExtractorError::Internal("lock poisoned".to_string()))
}
