//! Reqgraph In-Memory Infrastructure
//!
//! In-memory implementations of the storage seams from `reqgraph-domain`:
//!
//! - `MemoryJobStore`: key-value job records (put/get/list by id)
//! - `MemoryGraphSink`: idempotent graph persistence keyed by entity id and
//!   relationship triple
//! - `NullSink`: persistence disabled
//!
//! These back the orchestrator in tests and in deployments where job state
//! and graph output live with the caller rather than in a database.

#![warn(missing_docs)]

use reqgraph_domain::traits::{GraphSink, JobStore};
use reqgraph_domain::{Entity, Job, JobId, RelationType, Relationship};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur in the in-memory stores
#[derive(Error, Debug)]
pub enum StoreError {
    /// An internal lock or map invariant was violated
    #[error("Store error: {0}")]
    Internal(String),
}

/// In-memory job store
///
/// # Examples
///
/// ```
/// use reqgraph_store::MemoryJobStore;
/// use reqgraph_domain::traits::JobStore;
/// use reqgraph_domain::{Job, JobId, JobOptions};
///
/// let mut store = MemoryJobStore::new();
/// let job = Job::new(JobId::new(), "doc.pdf", "acme", JobOptions::default());
/// let id = job.id;
/// store.put(job).unwrap();
/// assert!(store.get(id).unwrap().is_some());
/// ```
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    jobs: HashMap<JobId, Job>,
}

impl MemoryJobStore {
    /// Create an empty job store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of job records held
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// True when no jobs are held
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

impl JobStore for MemoryJobStore {
    type Error = StoreError;

    fn put(&mut self, job: Job) -> Result<(), Self::Error> {
        self.jobs.insert(job.id, job);
        Ok(())
    }

    fn get(&self, id: JobId) -> Result<Option<Job>, Self::Error> {
        Ok(self.jobs.get(&id).cloned())
    }

    fn list(&self) -> Result<Vec<Job>, Self::Error> {
        let mut jobs: Vec<Job> = self.jobs.values().cloned().collect();
        jobs.sort_by_key(|j| j.id);
        Ok(jobs)
    }
}

/// In-memory graph sink with idempotent merge semantics
///
/// Entities are keyed by id, relationships by their (type, source, target)
/// triple. Applying the same graph twice leaves the store unchanged beyond
/// the first application; merge methods return how many records were newly
/// applied.
#[derive(Debug, Default)]
pub struct MemoryGraphSink {
    entities: HashMap<String, Entity>,
    relationships: HashMap<(RelationType, String, String), Relationship>,
}

impl MemoryGraphSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct entities held
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of distinct relationships held
    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    /// Look up a persisted entity by id
    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }
}

impl GraphSink for MemoryGraphSink {
    type Error = StoreError;

    fn merge_entities(&mut self, entities: &[Entity]) -> Result<usize, Self::Error> {
        let mut applied = 0;
        for entity in entities {
            let key = entity.id().to_string();
            if self.entities.insert(key, entity.clone()).is_none() {
                applied += 1;
            }
        }
        Ok(applied)
    }

    fn merge_relationships(&mut self, edges: &[Relationship]) -> Result<usize, Self::Error> {
        let mut applied = 0;
        for edge in edges {
            let key = (
                edge.relation_type,
                edge.source_id.clone(),
                edge.target_id.clone(),
            );
            if self.relationships.insert(key, edge.clone()).is_none() {
                applied += 1;
            }
        }
        Ok(applied)
    }
}

/// A sink that persists nothing
///
/// For callers that only want the in-memory `ExtractionGraph` result.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl GraphSink for NullSink {
    type Error = StoreError;

    fn merge_entities(&mut self, _entities: &[Entity]) -> Result<usize, Self::Error> {
        Ok(0)
    }

    fn merge_relationships(&mut self, _edges: &[Relationship]) -> Result<usize, Self::Error> {
        Ok(0)
    }
}
