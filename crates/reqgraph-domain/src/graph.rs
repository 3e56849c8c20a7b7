//! ExtractionGraph - the aggregate produced by an extraction run
//!
//! Invariant: every relationship endpoint references an entity id present in
//! the same graph, or the edge is held in the unresolved list and reported.
//! Unresolved edges are never silently dropped.

use crate::entity::{Entity, EntityKind};
use crate::relationship::Relationship;
use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

/// Per-variant and edge tallies for a graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GraphCounts {
    /// Requirement entities
    pub requirements: usize,
    /// Role entities
    pub roles: usize,
    /// Environment entities
    pub environments: usize,
    /// Business entities
    pub businesses: usize,
    /// Infrastructure entities
    pub infrastructure: usize,
    /// SoftwareApplication entities
    pub software_applications: usize,
    /// Resolved relationships
    pub relationships: usize,
    /// Dangling relationships
    pub unresolved: usize,
}

impl GraphCounts {
    /// Total entities across all variants
    pub fn total_entities(&self) -> usize {
        self.requirements
            + self.roles
            + self.environments
            + self.businesses
            + self.infrastructure
            + self.software_applications
    }
}

/// An entity/relationship aggregate with ordering-irrelevant sets
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtractionGraph {
    /// All entities, any variant
    pub entities: Vec<Entity>,
    /// Relationships whose endpoints both resolve to entities in this graph
    pub relationships: Vec<Relationship>,
    /// Relationships with at least one endpoint that never resolved
    pub unresolved: Vec<Relationship>,
    /// When this graph was produced (seconds since Unix epoch)
    pub extracted_at: u64,
}

impl ExtractionGraph {
    /// Create an empty graph stamped with the current time
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            relationships: Vec::new(),
            unresolved: Vec::new(),
            extracted_at: current_timestamp(),
        }
    }

    /// True when the graph holds no entities and no edges
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relationships.is_empty() && self.unresolved.is_empty()
    }

    /// Add an entity
    pub fn add_entity(&mut self, entity: Entity) {
        self.entities.push(entity);
    }

    /// Add a relationship (placed in the resolved set; call
    /// [`ExtractionGraph::partition_dangling`] afterwards to enforce the
    /// reference invariant)
    pub fn add_relationship(&mut self, relationship: Relationship) {
        self.relationships.push(relationship);
    }

    /// Find an entity by id
    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id() == id)
    }

    /// The set of entity ids present in this graph
    pub fn entity_ids(&self) -> HashSet<&str> {
        self.entities.iter().map(|e| e.id()).collect()
    }

    /// Move relationships with an unknown endpoint into the unresolved list
    ///
    /// Returns how many edges were moved.
    pub fn partition_dangling(&mut self) -> usize {
        let ids: HashSet<String> = self.entities.iter().map(|e| e.id().to_string()).collect();
        let mut resolved = Vec::with_capacity(self.relationships.len());
        let mut moved = 0;
        for rel in self.relationships.drain(..) {
            if ids.contains(&rel.source_id) && ids.contains(&rel.target_id) {
                resolved.push(rel);
            } else {
                self.unresolved.push(rel);
                moved += 1;
            }
        }
        self.relationships = resolved;
        moved
    }

    /// Tally entities per variant and edges per bucket
    pub fn counts(&self) -> GraphCounts {
        let mut counts = GraphCounts {
            relationships: self.relationships.len(),
            unresolved: self.unresolved.len(),
            ..Default::default()
        };
        for entity in &self.entities {
            match entity.kind() {
                EntityKind::Requirement => counts.requirements += 1,
                EntityKind::Role => counts.roles += 1,
                EntityKind::Environment => counts.environments += 1,
                EntityKind::Business => counts.businesses += 1,
                EntityKind::Infrastructure => counts.infrastructure += 1,
                EntityKind::SoftwareApplication => counts.software_applications += 1,
            }
        }
        counts
    }
}

/// Current timestamp in seconds since Unix epoch
pub(crate) fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Requirement, Role};
    use crate::relationship::RelationType;

    fn graph_with_login() -> ExtractionGraph {
        let mut graph = ExtractionGraph::new();
        graph.add_entity(Entity::Requirement(Requirement {
            id: "r1".to_string(),
            name: "Login".to_string(),
            ..Default::default()
        }));
        graph.add_entity(Entity::Role(Role {
            id: "role-x".to_string(),
            name: "Admin".to_string(),
            ..Default::default()
        }));
        graph
    }

    #[test]
    fn test_counts_per_variant() {
        let graph = graph_with_login();
        let counts = graph.counts();
        assert_eq!(counts.requirements, 1);
        assert_eq!(counts.roles, 1);
        assert_eq!(counts.total_entities(), 2);
    }

    #[test]
    fn test_partition_dangling_keeps_resolved() {
        let mut graph = graph_with_login();
        graph.add_relationship(Relationship::new(RelationType::OwnedBy, "r1", "role-x"));
        let moved = graph.partition_dangling();
        assert_eq!(moved, 0);
        assert_eq!(graph.relationships.len(), 1);
        assert!(graph.unresolved.is_empty());
    }

    #[test]
    fn test_partition_dangling_moves_unknown_endpoint() {
        let mut graph = graph_with_login();
        graph.add_relationship(Relationship::new(RelationType::OwnedBy, "r1", "ghost"));
        let moved = graph.partition_dangling();
        assert_eq!(moved, 1);
        assert!(graph.relationships.is_empty());
        assert_eq!(graph.unresolved.len(), 1);
        assert_eq!(graph.unresolved[0].target_id, "ghost");
    }

    #[test]
    fn test_entity_lookup() {
        let graph = graph_with_login();
        assert!(graph.entity("r1").is_some());
        assert!(graph.entity("nope").is_none());
    }
}
