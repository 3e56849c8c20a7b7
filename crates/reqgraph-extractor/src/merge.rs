//! Merging per-chunk partial graphs into one
//!
//! Duplicate detection runs on (kind, id) first, then (kind, normalized
//! name). Partials are processed in chunk order, so the first chunk to state
//! a field wins and the merge is deterministic for a given set of partials.
//! Ids of absorbed entities are remapped in every relationship endpoint
//! before edges are deduplicated.

use crate::chunking::Chunk;
use reqgraph_domain::{Entity, EntityKind, ExtractionGraph, FieldConflict, Relationship};
use std::collections::{BTreeSet, HashMap};

/// One chunk's contribution to the final graph
#[derive(Debug, Clone)]
pub struct PartialGraph {
    /// Which chunk produced this partial
    pub chunk_index: usize,
    /// The entities and edges parsed from that chunk's response
    pub graph: ExtractionGraph,
}

impl PartialGraph {
    /// Pair a parsed graph with its source chunk
    pub fn new(chunk: &Chunk, graph: ExtractionGraph) -> Self {
        Self {
            chunk_index: chunk.index,
            graph,
        }
    }
}

/// A field disagreement surfaced while merging, with its source chunk
#[derive(Debug, Clone, PartialEq)]
pub struct MergeConflict {
    /// Id of the merged entity
    pub entity_id: String,
    /// Chunk whose value was discarded
    pub chunk_index: usize,
    /// The disagreement itself
    pub conflict: FieldConflict,
}

/// The merged graph plus everything worth reporting about the merge
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// The deduplicated graph
    pub graph: ExtractionGraph,
    /// Field disagreements between chunks (informational)
    pub conflicts: Vec<MergeConflict>,
}

/// Merges chunk partials into a single deduplicated graph
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeEngine;

impl MergeEngine {
    /// Create a merge engine
    pub fn new() -> Self {
        Self
    }

    /// Merge partials into one graph
    ///
    /// Partials are sorted by chunk index first, so the result does not
    /// depend on the order chunks finished in.
    pub fn merge(&self, mut partials: Vec<PartialGraph>) -> MergeOutcome {
        partials.sort_by_key(|p| p.chunk_index);

        let mut merged: Vec<Entity> = Vec::new();
        let mut by_id: HashMap<(EntityKind, String), usize> = HashMap::new();
        let mut by_name: HashMap<(EntityKind, String), usize> = HashMap::new();
        let mut remap: HashMap<String, String> = HashMap::new();
        let mut conflicts = Vec::new();
        let mut edges: Vec<Relationship> = Vec::new();

        for partial in &partials {
            for entity in &partial.graph.entities {
                let kind = entity.kind();
                let id_key = (kind, entity.id().to_string());
                let name_key = (kind, entity.normalized_name());

                let existing = by_id
                    .get(&id_key)
                    .or_else(|| by_name.get(&name_key))
                    .copied();

                match existing {
                    Some(idx) => {
                        let survivor_id = merged[idx].id().to_string();
                        // absorb cannot fail here: lookup keys carry the kind
                        if let Ok(found) = merged[idx].absorb(entity) {
                            for conflict in found {
                                conflicts.push(MergeConflict {
                                    entity_id: survivor_id.clone(),
                                    chunk_index: partial.chunk_index,
                                    conflict,
                                });
                            }
                        }
                        remap.insert(entity.id().to_string(), survivor_id);
                        by_id.entry(id_key).or_insert(idx);
                        by_name.entry(name_key).or_insert(idx);
                    }
                    None => {
                        let idx = merged.len();
                        remap.insert(entity.id().to_string(), entity.id().to_string());
                        by_id.insert(id_key, idx);
                        by_name.insert(name_key, idx);
                        merged.push(entity.clone());
                    }
                }
            }
            edges.extend(partial.graph.relationships.iter().cloned());
            edges.extend(partial.graph.unresolved.iter().cloned());
        }

        let mut graph = ExtractionGraph::new();
        graph.entities = merged;

        let mut seen: BTreeSet<(String, String, String)> = BTreeSet::new();
        for mut edge in edges {
            if let Some(mapped) = remap.get(&edge.source_id) {
                edge.source_id = mapped.clone();
            }
            if let Some(mapped) = remap.get(&edge.target_id) {
                edge.target_id = mapped.clone();
            }
            let key = (
                edge.relation_type.as_str().to_string(),
                edge.source_id.clone(),
                edge.target_id.clone(),
            );
            if seen.insert(key) {
                graph.add_relationship(edge);
            }
        }
        graph.partition_dangling();

        MergeOutcome { graph, conflicts }
    }
}
