//! Prompt assembly for extraction calls
//!
//! The prompt carries the full output contract: one table per entity kind
//! plus the relationship edge list, in the tabular format the parser expects.
//! Schema lines here and field order in the parser come from the same
//! tables, so the contract cannot drift.

use crate::chunking::Chunk;
use crate::parser::{entity_fields, RELATIONSHIPS_SCHEMA, RELATIONSHIP_FIELDS};
use reqgraph_domain::{EntityKind, RelationType};
use std::fmt::Write;

/// Builds extraction prompts for a project
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    project_name: String,
}

impl PromptBuilder {
    /// Create a builder for the named project
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
        }
    }

    /// Build the prompt for one chunk
    ///
    /// Chunk position is stated so the model knows overlap text may repeat
    /// entities it has already seen in a neighboring chunk.
    pub fn build(&self, chunk: &Chunk, chunk_count: usize) -> String {
        let mut prompt = String::new();
        let _ = writeln!(
            prompt,
            "You are extracting a knowledge graph from project documentation for \"{}\".",
            self.project_name
        );
        let _ = writeln!(
            prompt,
            "This is chunk {} of {}; chunks overlap, so some text may repeat.",
            chunk.index + 1,
            chunk_count
        );
        prompt.push('\n');
        prompt.push_str(
            "Identify every requirement, role, environment, business unit, infrastructure \
             element, and software application mentioned, plus the relationships between them.\n\n",
        );

        prompt.push_str("Output ONLY tables in this exact format, one table per kind:\n\n");
        for kind in EntityKind::all() {
            let _ = writeln!(
                prompt,
                "{}[N]{{{}}}:",
                kind.schema_name(),
                entity_fields(kind).join(",")
            );
            prompt.push_str("  value,value,...\n");
        }
        let _ = writeln!(
            prompt,
            "{}[N]{{{}}}:",
            RELATIONSHIPS_SCHEMA,
            RELATIONSHIP_FIELDS.join(",")
        );
        prompt.push_str("  value,value,...\n\n");

        prompt.push_str("Rules:\n");
        prompt.push_str("- N in each header is the number of rows that follow it.\n");
        prompt.push_str("- Rows are comma-separated and indented two spaces.\n");
        prompt.push_str(
            "- Quote a value with double quotes if it contains a comma, quote, or newline; \
             double any quotes inside it.\n",
        );
        prompt.push_str(
            "- Separate multiple values inside one cell (tags, acceptance_criteria, \
             depends_on) with semicolons.\n",
        );
        prompt.push_str("- Leave the id cell empty; ids are assigned later.\n");
        let _ = writeln!(
            prompt,
            "- Relationship type must be one of: {}.",
            RelationType::all()
                .iter()
                .map(|t| t.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        prompt.push_str("- Omit a table entirely if the chunk has no entities of that kind.\n");
        prompt.push_str("- No prose before or after the tables.\n\n");

        prompt.push_str("Document chunk:\n---\n");
        prompt.push_str(&chunk.text);
        prompt.push_str("\n---\n");
        prompt
    }
}
