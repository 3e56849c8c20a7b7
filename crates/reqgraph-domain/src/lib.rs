//! Reqgraph Domain Layer
//!
//! This crate contains the core domain model for reqgraph: the closed set of
//! entity variants extracted from documents, the relationship vocabulary, the
//! extraction-graph aggregate, the job lifecycle, and the trait seams through
//! which the pipeline talks to external collaborators.
//!
//! ## Key Concepts
//!
//! - **Entity**: a tagged variant (Requirement, Role, Environment, Business,
//!   Infrastructure, SoftwareApplication) with a stable id
//! - **Relationship**: a directed, typed edge identified by its
//!   (type, source, target) triple
//! - **ExtractionGraph**: the deduplicated aggregate of entities and edges,
//!   with dangling edges held separately rather than dropped
//! - **Job**: the lifecycle record of one extraction run
//!
//! ## Architecture
//!
//! This crate carries no external dependencies beyond the `uuid` primitive:
//! pure domain logic only, with trait definitions for all external
//! interactions. Infrastructure implementations live in other crates.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod entity;
pub mod graph;
pub mod ident;
pub mod job;
pub mod relationship;
pub mod traits;

// Re-exports for convenience
pub use entity::{
    normalize_name, Business, Entity, EntityKind, Environment, FieldConflict, Infrastructure,
    Priority, Requirement, RequirementType, Role, SoftwareApplication,
};
pub use graph::{ExtractionGraph, GraphCounts};
pub use ident::entity_id;
pub use job::{Job, JobError, JobErrorKind, JobId, JobOptions, JobStatus};
pub use relationship::{RelationType, Relationship};
pub use traits::{GraphSink, JobStore, ModelClient, ModelRequest, TextSource};
