//! Document-to-knowledge-graph extraction pipeline
//!
//! Takes a document reference, obtains its text, splits it into
//! token-bounded overlapping chunks, prompts a language model per chunk for
//! tabular entity/relationship output, and merges the per-chunk partial
//! graphs into one deduplicated [`reqgraph_domain::ExtractionGraph`].
//!
//! The pipeline is generic over its collaborators: any
//! [`reqgraph_domain::TextSource`], [`reqgraph_domain::ModelClient`],
//! [`reqgraph_domain::JobStore`], and [`reqgraph_domain::GraphSink`] can be
//! plugged in, which is also how the end-to-end tests run without a live
//! model.
//!
//! # Examples
//!
//! ```
//! use reqgraph_extractor::{Chunker, TokenEstimator};
//!
//! let chunker = Chunker::new(TokenEstimator::new());
//! let chunks = chunker.chunk("The system shall log out idle users.", 500, 50, "llama3")?;
//! assert_eq!(chunks.len(), 1);
//! # Ok::<(), reqgraph_extractor::ExtractorError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chunking;
pub mod config;
pub mod error;
pub mod merge;
pub mod orchestrator;
pub mod parser;
pub mod prompt;
pub mod token;
pub mod types;

pub use chunking::{Chunk, Chunker};
pub use config::ExtractorConfig;
pub use error::ExtractorError;
pub use merge::{MergeConflict, MergeEngine, MergeOutcome, PartialGraph};
pub use orchestrator::ExtractionOrchestrator;
pub use parser::{parse_response, ParsedChunk};
pub use prompt::PromptBuilder;
pub use token::{TokenEstimator, TokenStrategy};
pub use types::{ExtractionMetadata, ExtractionOutcome, ExtractionRequest};

#[cfg(test)]
mod tests;
