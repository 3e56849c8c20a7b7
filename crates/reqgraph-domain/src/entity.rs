//! Entity module - the typed vertices of an extraction graph
//!
//! Entities form a closed set of variants so downstream stages can dispatch
//! on kind without reflection. No entity owns another; entities reference
//! each other only by id.

use std::collections::BTreeSet;
use std::fmt;

/// Discriminant for the closed set of entity variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityKind {
    /// A functional or non-functional requirement
    Requirement,
    /// A human or system role
    Role,
    /// A deployment or operating environment
    Environment,
    /// A business unit or capability
    Business,
    /// An infrastructure element (server, network, platform)
    Infrastructure,
    /// A software application or service
    SoftwareApplication,
}

impl EntityKind {
    /// All entity kinds, in declaration order
    pub fn all() -> [EntityKind; 6] {
        [
            EntityKind::Requirement,
            EntityKind::Role,
            EntityKind::Environment,
            EntityKind::Business,
            EntityKind::Infrastructure,
            EntityKind::SoftwareApplication,
        ]
    }

    /// Canonical name of this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Requirement => "Requirement",
            EntityKind::Role => "Role",
            EntityKind::Environment => "Environment",
            EntityKind::Business => "Business",
            EntityKind::Infrastructure => "Infrastructure",
            EntityKind::SoftwareApplication => "SoftwareApplication",
        }
    }

    /// Table name used on the wire for this kind
    pub fn schema_name(&self) -> &'static str {
        match self {
            EntityKind::Requirement => "requirements",
            EntityKind::Role => "roles",
            EntityKind::Environment => "environments",
            EntityKind::Business => "businesses",
            EntityKind::Infrastructure => "infrastructure",
            EntityKind::SoftwareApplication => "software_applications",
        }
    }

    /// Short prefix used when generating ids for this kind
    pub fn id_prefix(&self) -> &'static str {
        match self {
            EntityKind::Requirement => "req",
            EntityKind::Role => "role",
            EntityKind::Environment => "env",
            EntityKind::Business => "biz",
            EntityKind::Infrastructure => "infra",
            EntityKind::SoftwareApplication => "app",
        }
    }

    /// Resolve a wire table name to a kind
    pub fn from_schema(name: &str) -> Option<EntityKind> {
        EntityKind::all()
            .into_iter()
            .find(|k| k.schema_name() == name)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classification of a requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequirementType {
    /// Describes what the system must do
    Functional,
    /// Describes how well the system must do it
    NonFunctional,
    /// A restriction on design or implementation
    Constraint,
}

impl RequirementType {
    /// Canonical lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            RequirementType::Functional => "functional",
            RequirementType::NonFunctional => "non-functional",
            RequirementType::Constraint => "constraint",
        }
    }

    /// Parse from a string, accepting common spellings
    pub fn parse(s: &str) -> Result<RequirementType, String> {
        match s.trim().to_lowercase().as_str() {
            "functional" => Ok(RequirementType::Functional),
            "non-functional" | "nonfunctional" | "non functional" => {
                Ok(RequirementType::NonFunctional)
            }
            "constraint" => Ok(RequirementType::Constraint),
            other => Err(format!("Unknown requirement type: {}", other)),
        }
    }
}

/// Priority of a requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    /// Nice to have
    Low,
    /// Normal priority
    Medium,
    /// Important
    High,
    /// Must not ship without
    Critical,
}

impl Priority {
    /// Canonical lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }

    /// Parse from a string
    pub fn parse(s: &str) -> Result<Priority, String> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" | "med" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "critical" => Ok(Priority::Critical),
            other => Err(format!("Unknown priority: {}", other)),
        }
    }
}

/// A requirement extracted from a document
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Requirement {
    /// Unique identifier within a graph
    pub id: String,
    /// Short name
    pub name: String,
    /// Longer description
    pub description: String,
    /// Functional / non-functional / constraint
    pub requirement_type: Option<RequirementType>,
    /// Priority, if stated
    pub priority: Option<Priority>,
    /// Lifecycle status (e.g. "proposed", "approved")
    pub status: String,
    /// Where in the source this requirement came from
    pub source: String,
    /// Why this requirement exists
    pub rationale: String,
    /// Acceptance criteria
    pub acceptance_criteria: Vec<String>,
    /// Ids of requirements this one depends on
    pub depends_on: Vec<String>,
    /// Free-form tags
    pub tags: BTreeSet<String>,
}

/// A human or system role
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Role {
    /// Unique identifier within a graph
    pub id: String,
    /// Role name
    pub name: String,
    /// What the role is responsible for
    pub description: String,
    /// Free-form tags
    pub tags: BTreeSet<String>,
}

/// A deployment or operating environment
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Environment {
    /// Unique identifier within a graph
    pub id: String,
    /// Environment name
    pub name: String,
    /// Description
    pub description: String,
    /// Free-form tags
    pub tags: BTreeSet<String>,
}

/// A business unit, process, or capability
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Business {
    /// Unique identifier within a graph
    pub id: String,
    /// Name
    pub name: String,
    /// Description
    pub description: String,
    /// Free-form tags
    pub tags: BTreeSet<String>,
}

/// An infrastructure element
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Infrastructure {
    /// Unique identifier within a graph
    pub id: String,
    /// Name
    pub name: String,
    /// Description
    pub description: String,
    /// Free-form tags
    pub tags: BTreeSet<String>,
}

/// A software application or service
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SoftwareApplication {
    /// Unique identifier within a graph
    pub id: String,
    /// Application name
    pub name: String,
    /// Description
    pub description: String,
    /// Version, if stated
    pub version: String,
    /// Free-form tags
    pub tags: BTreeSet<String>,
}

/// One of the six entity variants
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    /// Requirement variant
    Requirement(Requirement),
    /// Role variant
    Role(Role),
    /// Environment variant
    Environment(Environment),
    /// Business variant
    Business(Business),
    /// Infrastructure variant
    Infrastructure(Infrastructure),
    /// SoftwareApplication variant
    SoftwareApplication(SoftwareApplication),
}

/// A field whose non-empty values disagreed during a merge
///
/// Informational, not an error: the kept value won by chunk order.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldConflict {
    /// Name of the disagreeing field
    pub field: &'static str,
    /// Value that was kept
    pub kept: String,
    /// Value that was discarded
    pub discarded: String,
}

impl Entity {
    /// The kind discriminant of this entity
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Requirement(_) => EntityKind::Requirement,
            Entity::Role(_) => EntityKind::Role,
            Entity::Environment(_) => EntityKind::Environment,
            Entity::Business(_) => EntityKind::Business,
            Entity::Infrastructure(_) => EntityKind::Infrastructure,
            Entity::SoftwareApplication(_) => EntityKind::SoftwareApplication,
        }
    }

    /// The entity's id
    pub fn id(&self) -> &str {
        match self {
            Entity::Requirement(e) => &e.id,
            Entity::Role(e) => &e.id,
            Entity::Environment(e) => &e.id,
            Entity::Business(e) => &e.id,
            Entity::Infrastructure(e) => &e.id,
            Entity::SoftwareApplication(e) => &e.id,
        }
    }

    /// Replace the entity's id
    pub fn set_id(&mut self, id: impl Into<String>) {
        let id = id.into();
        match self {
            Entity::Requirement(e) => e.id = id,
            Entity::Role(e) => e.id = id,
            Entity::Environment(e) => e.id = id,
            Entity::Business(e) => e.id = id,
            Entity::Infrastructure(e) => e.id = id,
            Entity::SoftwareApplication(e) => e.id = id,
        }
    }

    /// The entity's display name
    pub fn name(&self) -> &str {
        match self {
            Entity::Requirement(e) => &e.name,
            Entity::Role(e) => &e.name,
            Entity::Environment(e) => &e.name,
            Entity::Business(e) => &e.name,
            Entity::Infrastructure(e) => &e.name,
            Entity::SoftwareApplication(e) => &e.name,
        }
    }

    /// The entity's name folded for duplicate detection
    ///
    /// See [`normalize_name`] for the folding rule.
    pub fn normalized_name(&self) -> String {
        normalize_name(self.name())
    }

    /// Fold another entity of the same kind into this one
    ///
    /// Field policy: first non-empty value wins; set-valued fields (tags,
    /// acceptance criteria, dependency ids) are unioned. Returns the list of
    /// fields whose non-empty values disagreed. Fails if the kinds differ.
    pub fn absorb(&mut self, other: &Entity) -> Result<Vec<FieldConflict>, String> {
        if self.kind() != other.kind() {
            return Err(format!(
                "Cannot merge {} into {}",
                other.kind(),
                self.kind()
            ));
        }

        let mut conflicts = Vec::new();
        match (self, other) {
            (Entity::Requirement(a), Entity::Requirement(b)) => {
                fill_text(&mut a.name, &b.name, "name", &mut conflicts);
                fill_text(&mut a.description, &b.description, "description", &mut conflicts);
                fill_text(&mut a.status, &b.status, "status", &mut conflicts);
                fill_text(&mut a.source, &b.source, "source", &mut conflicts);
                fill_text(&mut a.rationale, &b.rationale, "rationale", &mut conflicts);
                match (a.requirement_type, b.requirement_type) {
                    (None, Some(t)) => a.requirement_type = Some(t),
                    (Some(x), Some(y)) if x != y => conflicts.push(FieldConflict {
                        field: "type",
                        kept: x.as_str().to_string(),
                        discarded: y.as_str().to_string(),
                    }),
                    _ => {}
                }
                match (a.priority, b.priority) {
                    (None, Some(p)) => a.priority = Some(p),
                    (Some(x), Some(y)) if x != y => conflicts.push(FieldConflict {
                        field: "priority",
                        kept: x.as_str().to_string(),
                        discarded: y.as_str().to_string(),
                    }),
                    _ => {}
                }
                union_list(&mut a.acceptance_criteria, &b.acceptance_criteria);
                union_list(&mut a.depends_on, &b.depends_on);
                a.tags.extend(b.tags.iter().cloned());
            }
            (Entity::Role(a), Entity::Role(b)) => {
                fill_text(&mut a.name, &b.name, "name", &mut conflicts);
                fill_text(&mut a.description, &b.description, "description", &mut conflicts);
                a.tags.extend(b.tags.iter().cloned());
            }
            (Entity::Environment(a), Entity::Environment(b)) => {
                fill_text(&mut a.name, &b.name, "name", &mut conflicts);
                fill_text(&mut a.description, &b.description, "description", &mut conflicts);
                a.tags.extend(b.tags.iter().cloned());
            }
            (Entity::Business(a), Entity::Business(b)) => {
                fill_text(&mut a.name, &b.name, "name", &mut conflicts);
                fill_text(&mut a.description, &b.description, "description", &mut conflicts);
                a.tags.extend(b.tags.iter().cloned());
            }
            (Entity::Infrastructure(a), Entity::Infrastructure(b)) => {
                fill_text(&mut a.name, &b.name, "name", &mut conflicts);
                fill_text(&mut a.description, &b.description, "description", &mut conflicts);
                a.tags.extend(b.tags.iter().cloned());
            }
            (Entity::SoftwareApplication(a), Entity::SoftwareApplication(b)) => {
                fill_text(&mut a.name, &b.name, "name", &mut conflicts);
                fill_text(&mut a.description, &b.description, "description", &mut conflicts);
                fill_text(&mut a.version, &b.version, "version", &mut conflicts);
                a.tags.extend(b.tags.iter().cloned());
            }
            _ => unreachable!("kind equality checked above"),
        }

        Ok(conflicts)
    }
}

/// Fold a name for duplicate detection: case-fold, trim, collapse whitespace
pub fn normalize_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// First non-empty value wins; record a conflict when both disagree
fn fill_text(dst: &mut String, src: &str, field: &'static str, out: &mut Vec<FieldConflict>) {
    if dst.is_empty() {
        if !src.is_empty() {
            *dst = src.to_string();
        }
    } else if !src.is_empty() && dst != src {
        out.push(FieldConflict {
            field,
            kept: dst.clone(),
            discarded: src.to_string(),
        });
    }
}

/// Order-preserving union of list-valued fields
fn union_list(dst: &mut Vec<String>, src: &[String]) {
    for item in src {
        if !item.is_empty() && !dst.iter().any(|x| x == item) {
            dst.push(item.clone());
        }
    }
}
