//! Encode rows into a TOON table

/// Quote a value when it contains the delimiter, a quote, a newline, or
/// surrounding whitespace; quotes inside a quoted value are doubled.
fn escape_value(value: &str) -> String {
    let padded = value != value.trim();
    if padded || value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Encode a set of rows as one TOON table
///
/// The header declares the schema name, the row count, and the ordered field
/// list; each row carries its values in that fixed order.
///
/// # Examples
///
/// ```
/// use reqgraph_toon::encode;
///
/// let text = encode(
///     "roles",
///     &["id", "name"],
///     &[vec!["role-x".to_string(), "Site Admin".to_string()]],
/// );
/// assert_eq!(text, "roles[1]{id,name}:\n  role-x,Site Admin\n");
/// ```
pub fn encode(schema_name: &str, field_names: &[&str], rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    out.push_str(schema_name);
    out.push('[');
    out.push_str(&rows.len().to_string());
    out.push(']');
    out.push('{');
    out.push_str(&field_names.join(","));
    out.push('}');
    out.push(':');
    out.push('\n');

    for row in rows {
        out.push_str("  ");
        let line = row
            .iter()
            .map(|v| escape_value(v))
            .collect::<Vec<_>>()
            .join(",");
        // An all-empty single-field row would otherwise emit a blank line,
        // which ends the table on decode
        if line.is_empty() {
            out.push_str("\"\"");
        } else {
            out.push_str(&line);
        }
        out.push('\n');
    }

    out
}
