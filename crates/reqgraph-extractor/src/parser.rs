//! Mapping decoded response tables onto the domain graph
//!
//! Decoding is tolerant; this stage is where leniency is applied with intent.
//! A malformed row or unknown value degrades to a warning and a skipped row
//! or dropped field, never a failed chunk. Only a body with no structured
//! content at all is a chunk-level decode failure.

use reqgraph_domain::{
    entity_id, Business, Entity, EntityKind, Environment, ExtractionGraph, Infrastructure,
    Priority, RelationType, Relationship, Requirement, RequirementType, Role,
    SoftwareApplication,
};
use reqgraph_toon::{decode, CodecError, Table};

/// Wire table name for the relationship edge list
pub const RELATIONSHIPS_SCHEMA: &str = "relationships";

/// Field order on the wire for the relationship table
pub const RELATIONSHIP_FIELDS: [&str; 3] = ["type", "source_id", "target_id"];

/// Field order on the wire for each entity kind's table
pub fn entity_fields(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::Requirement => &[
            "id",
            "name",
            "description",
            "type",
            "priority",
            "status",
            "source",
            "rationale",
            "acceptance_criteria",
            "depends_on",
            "tags",
        ],
        EntityKind::Role | EntityKind::Environment | EntityKind::Business
        | EntityKind::Infrastructure => &["id", "name", "description", "tags"],
        EntityKind::SoftwareApplication => &["id", "name", "description", "version", "tags"],
    }
}

/// One chunk's parsed output
#[derive(Debug, Clone)]
pub struct ParsedChunk {
    /// Entities and relationships recovered from the response
    pub graph: ExtractionGraph,
    /// Non-fatal issues encountered while decoding and mapping
    pub warnings: Vec<String>,
}

/// Parse a model response body into a partial graph
///
/// Fails only when the body contains no structured content at all; every
/// recoverable problem becomes a warning.
pub fn parse_response(text: &str) -> Result<ParsedChunk, CodecError> {
    let decoded = decode(text)?;
    let mut graph = ExtractionGraph::new();
    let mut warnings = decoded.warnings;

    for table in &decoded.tables {
        if table.name == RELATIONSHIPS_SCHEMA {
            parse_relationships(table, &mut graph, &mut warnings);
            continue;
        }
        match EntityKind::from_schema(&table.name) {
            Some(kind) => parse_entities(kind, table, &mut graph, &mut warnings),
            None => warnings.push(format!("Ignoring unknown table '{}'", table.name)),
        }
    }

    Ok(ParsedChunk { graph, warnings })
}

fn parse_entities(
    kind: EntityKind,
    table: &Table,
    graph: &mut ExtractionGraph,
    warnings: &mut Vec<String>,
) {
    for row in 0..table.rows.len() {
        let get = |field: &str| table.value(row, field).unwrap_or("").trim().to_string();

        let name = get("name");
        if name.is_empty() {
            warnings.push(format!(
                "Table '{}' row {}: missing name, row skipped",
                table.name, row
            ));
            continue;
        }
        // Responses often omit ids; derive a stable one from the name
        let mut id = get("id");
        if id.is_empty() {
            id = entity_id(kind, &name);
        }
        let description = get("description");
        let tags = split_multi(&get("tags")).into_iter().collect();

        let entity = match kind {
            EntityKind::Requirement => {
                let requirement_type = parse_lenient(
                    &get("type"),
                    RequirementType::parse,
                    &table.name,
                    row,
                    warnings,
                );
                let priority =
                    parse_lenient(&get("priority"), Priority::parse, &table.name, row, warnings);
                Entity::Requirement(Requirement {
                    id,
                    name,
                    description,
                    requirement_type,
                    priority,
                    status: get("status"),
                    source: get("source"),
                    rationale: get("rationale"),
                    acceptance_criteria: split_multi(&get("acceptance_criteria")),
                    depends_on: split_multi(&get("depends_on")),
                    tags,
                })
            }
            EntityKind::Role => Entity::Role(Role {
                id,
                name,
                description,
                tags,
            }),
            EntityKind::Environment => Entity::Environment(Environment {
                id,
                name,
                description,
                tags,
            }),
            EntityKind::Business => Entity::Business(Business {
                id,
                name,
                description,
                tags,
            }),
            EntityKind::Infrastructure => Entity::Infrastructure(Infrastructure {
                id,
                name,
                description,
                tags,
            }),
            EntityKind::SoftwareApplication => Entity::SoftwareApplication(SoftwareApplication {
                id,
                name,
                description,
                version: get("version"),
                tags,
            }),
        };
        graph.add_entity(entity);
    }
}

fn parse_relationships(table: &Table, graph: &mut ExtractionGraph, warnings: &mut Vec<String>) {
    for row in 0..table.rows.len() {
        let get = |field: &str| table.value(row, field).unwrap_or("").trim().to_string();

        let raw_type = get("type");
        let relation_type = match RelationType::parse(&raw_type) {
            Ok(t) => t,
            Err(e) => {
                warnings.push(format!("Relationships row {}: {}, row skipped", row, e));
                continue;
            }
        };
        let source_id = get("source_id");
        let target_id = get("target_id");
        if source_id.is_empty() || target_id.is_empty() {
            warnings.push(format!(
                "Relationships row {}: missing endpoint id, row skipped",
                row
            ));
            continue;
        }
        graph.add_relationship(Relationship::new(relation_type, source_id, target_id));
    }
}

/// Optional enum fields degrade to None with a warning on bad values
fn parse_lenient<T>(
    value: &str,
    parse: impl Fn(&str) -> Result<T, String>,
    table: &str,
    row: usize,
    warnings: &mut Vec<String>,
) -> Option<T> {
    if value.is_empty() {
        return None;
    }
    match parse(value) {
        Ok(v) => Some(v),
        Err(e) => {
            warnings.push(format!("Table '{}' row {}: {}, field dropped", table, row, e));
            None
        }
    }
}

/// Split a semicolon-packed multi-value cell
fn split_multi(value: &str) -> Vec<String> {
    value
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
