//! Relationship module - directed typed edges between entities
//!
//! A relationship is uniquely identified by its (type, source, target)
//! triple; duplicates by this triple collapse to one edge.

use std::fmt;

/// Type of relationship between entities (closed vocabulary)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RelationType {
    /// Source entity is owned by the target (e.g. requirement → role)
    OwnedBy,
    /// Source applies to the target (e.g. requirement → environment)
    AppliesTo,
    /// Source supports the target (e.g. requirement → business)
    Supports,
    /// Source depends on the target
    DependsOn,
    /// Source uses the target software application
    UsesSoftware,
    /// Source is deployed in the target environment
    DeployedIn,
    /// Source is realized by the target infrastructure
    RealizedBy,
}

impl RelationType {
    /// All relation types, in declaration order
    pub fn all() -> [RelationType; 7] {
        [
            RelationType::OwnedBy,
            RelationType::AppliesTo,
            RelationType::Supports,
            RelationType::DependsOn,
            RelationType::UsesSoftware,
            RelationType::DeployedIn,
            RelationType::RealizedBy,
        ]
    }

    /// Wire name of this relation type
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationType::OwnedBy => "OWNED_BY",
            RelationType::AppliesTo => "APPLIES_TO",
            RelationType::Supports => "SUPPORTS",
            RelationType::DependsOn => "DEPENDS_ON",
            RelationType::UsesSoftware => "USES_SOFTWARE",
            RelationType::DeployedIn => "DEPLOYED_IN",
            RelationType::RealizedBy => "REALIZED_BY",
        }
    }

    /// Parse a wire name into a relation type
    pub fn parse(s: &str) -> Result<RelationType, String> {
        let folded = s.trim().to_uppercase();
        RelationType::all()
            .into_iter()
            .find(|t| t.as_str() == folded)
            .ok_or_else(|| format!("Unknown relation type: {}", s))
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A directed, typed edge between two entities
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Relationship {
    /// Edge type
    pub relation_type: RelationType,
    /// Id of the source entity
    pub source_id: String,
    /// Id of the target entity
    pub target_id: String,
}

impl Relationship {
    /// Create a new relationship
    pub fn new(
        relation_type: RelationType,
        source_id: impl Into<String>,
        target_id: impl Into<String>,
    ) -> Self {
        Self {
            relation_type,
            source_id: source_id.into(),
            target_id: target_id.into(),
        }
    }

    /// The identifying (type, source, target) triple
    pub fn key(&self) -> (RelationType, &str, &str) {
        (self.relation_type, &self.source_id, &self.target_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trip() {
        for t in RelationType::all() {
            assert_eq!(RelationType::parse(t.as_str()).unwrap(), t);
        }
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!(
            RelationType::parse("owned_by").unwrap(),
            RelationType::OwnedBy
        );
    }

    #[test]
    fn test_parse_unknown() {
        assert!(RelationType::parse("MARRIED_TO").is_err());
    }

    #[test]
    fn test_key_identity() {
        let a = Relationship::new(RelationType::OwnedBy, "r1", "role-x");
        let b = Relationship::new(RelationType::OwnedBy, "r1", "role-x");
        assert_eq!(a.key(), b.key());
        let c = Relationship::new(RelationType::Supports, "r1", "role-x");
        assert_ne!(a.key(), c.key());
    }
}
