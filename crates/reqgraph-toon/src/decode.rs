//! Tolerant decoding of TOON tables from model responses

use crate::CodecError;
use std::collections::BTreeSet;

/// One decoded table: schema name, ordered fields, aligned rows
///
/// Every row has exactly `fields.len()` values; malformed rows were padded
/// or truncated during decode and a warning recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Schema name from the header
    pub name: String,
    /// Ordered field list from the header
    pub fields: Vec<String>,
    /// Row values, positionally aligned with `fields`
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Index of a field in the declared order
    pub fn field_index(&self, field: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == field)
    }

    /// Value of `field` in row `row`, if both exist
    pub fn value(&self, row: usize, field: &str) -> Option<&str> {
        let idx = self.field_index(field)?;
        self.rows.get(row).map(|r| r[idx].as_str())
    }
}

/// The result of decoding a response body
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    /// All tables found, in document order
    pub tables: Vec<Table>,
    /// Per-row and per-table warnings accumulated during decode
    pub warnings: Vec<String>,
}

impl Decoded {
    /// Find a table by schema name
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }
}

/// Decode one or more TOON tables from a response body
///
/// Locates tables by their header marker, so leading/trailing prose and code
/// fences are tolerated. Rows with the wrong field count are aligned by
/// position (padded with empty strings or truncated) and a warning is
/// recorded; a malformed row never fails the whole decode. When no table
/// header is present, a generic JSON key-value fallback is attempted.
/// Decoding is a pure function of the input text.
pub fn decode(text: &str) -> Result<Decoded, CodecError> {
    let mut tables = Vec::new();
    let mut warnings = Vec::new();

    let lines: Vec<&str> = text.lines().collect();
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        if is_fence(line) {
            i += 1;
            continue;
        }
        let Some((name, count, fields)) = parse_header(line) else {
            i += 1;
            continue;
        };
        i += 1;

        let mut rows = Vec::new();
        while rows.len() < count && i < lines.len() {
            let raw = lines[i];
            if is_fence(raw) || raw.trim().is_empty() || parse_header(raw).is_some() {
                break;
            }
            // A quoted value may span lines: join until quotes balance
            let mut buf = raw.trim_start().to_string();
            while !quotes_balanced(&buf) && i + 1 < lines.len() {
                i += 1;
                buf.push('\n');
                buf.push_str(lines[i]);
            }
            let mut values = parse_row(&buf);
            if values.len() != fields.len() {
                warnings.push(format!(
                    "Table '{}' row {}: expected {} fields, found {}",
                    name,
                    rows.len(),
                    fields.len(),
                    values.len()
                ));
                values.resize(fields.len(), String::new());
            }
            rows.push(values);
            i += 1;
        }
        if rows.len() < count {
            warnings.push(format!(
                "Table '{}' declared {} rows, found {}",
                name,
                count,
                rows.len()
            ));
        }
        tables.push(Table { name, fields, rows });
    }

    if tables.is_empty() {
        let fallback = decode_json_fallback(text)?;
        warnings.push("No TOON table found; decoded via JSON fallback".to_string());
        return Ok(Decoded {
            tables: fallback,
            warnings,
        });
    }

    Ok(Decoded { tables, warnings })
}

fn is_fence(line: &str) -> bool {
    line.trim_start().starts_with("```")
}

/// Parse `name[count]{f1,f2,...}:` into its parts
fn parse_header(line: &str) -> Option<(String, usize, Vec<String>)> {
    let t = line.trim().strip_suffix(':')?;
    let open = t.find('[')?;
    let name = &t[..open];
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return None;
    }
    let rest = &t[open + 1..];
    let close = rest.find(']')?;
    let count: usize = rest[..close].trim().parse().ok()?;
    let rest = rest[close + 1..].strip_prefix('{')?.strip_suffix('}')?;
    let fields: Vec<String> = rest.split(',').map(|f| f.trim().to_string()).collect();
    if fields.iter().any(|f| f.is_empty()) {
        return None;
    }
    Some((name.to_string(), count, fields))
}

/// Even quote count means no value is left open across a line break
fn quotes_balanced(line: &str) -> bool {
    line.chars().filter(|&c| c == '"').count() % 2 == 0
}

/// Split one row on the delimiter, honoring quoting; unquoted values are
/// trimmed, quoted values are kept exact with doubled quotes unescaped
fn parse_row(line: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut was_quoted = false;
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(c);
            }
        } else {
            match c {
                '"' if current.trim().is_empty() && !was_quoted => {
                    current.clear();
                    in_quotes = true;
                    was_quoted = true;
                }
                ',' => {
                    values.push(finish_value(&mut current, &mut was_quoted));
                }
                _ => current.push(c),
            }
        }
    }
    values.push(finish_value(&mut current, &mut was_quoted));
    values
}

fn finish_value(current: &mut String, was_quoted: &mut bool) -> String {
    let value = if *was_quoted {
        std::mem::take(current)
    } else {
        std::mem::take(current).trim().to_string()
    };
    *was_quoted = false;
    value
}

/// Render a JSON scalar as a cell value
fn render_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Build a table from an array of JSON objects; fields are the sorted union
/// of keys across all rows
fn table_from_objects(name: &str, objects: &[serde_json::Value]) -> Table {
    let mut keys = BTreeSet::new();
    for obj in objects {
        if let Some(map) = obj.as_object() {
            keys.extend(map.keys().cloned());
        }
    }
    let fields: Vec<String> = keys.into_iter().collect();
    let rows = objects
        .iter()
        .map(|obj| {
            fields
                .iter()
                .map(|f| obj.get(f).map(render_value).unwrap_or_default())
                .collect()
        })
        .collect();
    Table {
        name: name.to_string(),
        fields,
        rows,
    }
}

/// Strip code fences and keep the fenced body, or the whole trimmed text
fn strip_fences(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    if let Some(start) = lines.iter().position(|l| is_fence(l)) {
        let after = &lines[start + 1..];
        let end = after
            .iter()
            .position(|l| is_fence(l))
            .unwrap_or(after.len());
        after[..end].join("\n")
    } else {
        text.trim().to_string()
    }
}

/// Last-resort decode of a generic JSON body into tables
fn decode_json_fallback(text: &str) -> Result<Vec<Table>, CodecError> {
    let body = strip_fences(text);
    let value: serde_json::Value = serde_json::from_str(&body)
        .map_err(|e| CodecError::NoStructuredBlock(format!("JSON fallback failed: {}", e)))?;

    let mut tables = Vec::new();
    match &value {
        serde_json::Value::Object(map) => {
            let mut scalar_fields = Vec::new();
            let mut scalar_values = Vec::new();
            for (key, val) in map {
                match val.as_array() {
                    Some(arr) if arr.iter().all(|v| v.is_object()) && !arr.is_empty() => {
                        tables.push(table_from_objects(key, arr));
                    }
                    _ => {
                        scalar_fields.push(key.clone());
                        scalar_values.push(render_value(val));
                    }
                }
            }
            if !scalar_fields.is_empty() {
                tables.push(Table {
                    name: "object".to_string(),
                    fields: scalar_fields,
                    rows: vec![scalar_values],
                });
            }
        }
        serde_json::Value::Array(arr) if arr.iter().all(|v| v.is_object()) && !arr.is_empty() => {
            tables.push(table_from_objects("records", arr));
        }
        _ => {}
    }

    if tables.is_empty() {
        return Err(CodecError::NoStructuredBlock(
            "JSON fallback produced no records".to_string(),
        ));
    }
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode;
    use proptest::prelude::*;

    #[test]
    fn test_round_trip_plain_values() {
        let rows = vec![
            vec!["r1".to_string(), "User Login".to_string(), "high".to_string()],
            vec!["r2".to_string(), "Audit Trail".to_string(), "critical".to_string()],
        ];
        let text = encode("requirements", &["id", "name", "priority"], &rows);
        let decoded = decode(&text).unwrap();

        assert!(decoded.warnings.is_empty());
        let table = decoded.table("requirements").unwrap();
        assert_eq!(table.fields, vec!["id", "name", "priority"]);
        assert_eq!(table.rows, rows);
    }

    #[test]
    fn test_round_trip_delimiter_and_quote_injection() {
        let nasty = vec![vec![
            "r1".to_string(),
            "supports \"fast, reliable\" mode,\nalways".to_string(),
        ]];
        let text = encode("requirements", &["id", "name"], &nasty);
        let decoded = decode(&text).unwrap();
        assert_eq!(decoded.table("requirements").unwrap().rows, nasty);
    }

    #[test]
    fn test_multiple_tables_in_one_body() {
        let mut body = encode(
            "requirements",
            &["id", "name"],
            &[vec!["r1".to_string(), "Login".to_string()]],
        );
        body.push_str(&encode(
            "roles",
            &["id", "name"],
            &[vec!["role-x".to_string(), "Admin".to_string()]],
        ));

        let decoded = decode(&body).unwrap();
        assert_eq!(decoded.tables.len(), 2);
        assert!(decoded.table("requirements").is_some());
        assert!(decoded.table("roles").is_some());
    }

    #[test]
    fn test_prose_and_fences_are_tolerated() {
        let fenced = format!(
            "Here are the extracted entities:\n\n```\n{}```\n\nLet me know if you need more.",
            encode(
                "roles",
                &["id", "name"],
                &[vec!["role-x".to_string(), "Admin".to_string()]],
            )
        );
        let bare = encode(
            "roles",
            &["id", "name"],
            &[vec!["role-x".to_string(), "Admin".to_string()]],
        );

        let a = decode(&fenced).unwrap();
        let b = decode(&bare).unwrap();
        assert_eq!(a.tables, b.tables);
    }

    #[test]
    fn test_short_row_padded_with_warning() {
        let body = "requirements[1]{id,name,priority}:\n  r1,Login\n";
        let decoded = decode(body).unwrap();
        let table = decoded.table("requirements").unwrap();
        assert_eq!(table.rows[0], vec!["r1", "Login", ""]);
        assert_eq!(decoded.warnings.len(), 1);
        assert!(decoded.warnings[0].contains("expected 3 fields"));
    }

    #[test]
    fn test_long_row_truncated_with_warning() {
        let body = "roles[1]{id,name}:\n  role-x,Admin,extra,junk\n";
        let decoded = decode(body).unwrap();
        assert_eq!(decoded.table("roles").unwrap().rows[0], vec!["role-x", "Admin"]);
        assert_eq!(decoded.warnings.len(), 1);
    }

    #[test]
    fn test_missing_rows_warned_not_fatal() {
        let body = "roles[3]{id,name}:\n  role-x,Admin\n";
        let decoded = decode(body).unwrap();
        assert_eq!(decoded.table("roles").unwrap().rows.len(), 1);
        assert!(decoded
            .warnings
            .iter()
            .any(|w| w.contains("declared 3 rows")));
    }

    #[test]
    fn test_json_fallback_object_of_arrays() {
        let body = r#"{"roles": [{"id": "role-x", "name": "Admin"}]}"#;
        let decoded = decode(body).unwrap();
        let table = decoded.table("roles").unwrap();
        assert_eq!(table.value(0, "id"), Some("role-x"));
        assert_eq!(table.value(0, "name"), Some("Admin"));
        assert!(decoded.warnings.iter().any(|w| w.contains("fallback")));
    }

    #[test]
    fn test_json_fallback_array_of_objects() {
        let body = r#"[{"id": "r1", "name": "Login"}]"#;
        let decoded = decode(body).unwrap();
        let table = decoded.table("records").unwrap();
        assert_eq!(table.value(0, "name"), Some("Login"));
    }

    #[test]
    fn test_json_fallback_inside_fences() {
        let body = "```json\n{\"roles\": [{\"id\": \"role-x\", \"name\": \"Admin\"}]}\n```";
        let decoded = decode(body).unwrap();
        assert!(decoded.table("roles").is_some());
    }

    #[test]
    fn test_unparsable_body_is_a_decode_failure() {
        let result = decode("The document describes a login system.");
        assert!(matches!(result, Err(CodecError::NoStructuredBlock(_))));
    }

    #[test]
    fn test_decode_is_idempotent() {
        let body = "requirements[1]{id,name}:\n  r1,Login\nnoise line\nroles[1]{id,name}:\n  role-x,Admin\n";
        let first = decode(body).unwrap();
        let second = decode(body).unwrap();
        assert_eq!(first.tables, second.tables);
        assert_eq!(first.warnings, second.warnings);
    }

    #[test]
    fn test_value_accessor() {
        let body = "roles[1]{id,name}:\n  role-x,Admin\n";
        let decoded = decode(body).unwrap();
        let table = decoded.table("roles").unwrap();
        assert_eq!(table.value(0, "name"), Some("Admin"));
        assert_eq!(table.value(0, "missing"), None);
        assert_eq!(table.value(9, "name"), None);
    }

    proptest! {
        #[test]
        fn prop_round_trip_arbitrary_values(
            values in proptest::collection::vec("[ -_a-~]{0,24}", 1..5)
        ) {
            let fields: Vec<String> = (0..values.len()).map(|i| format!("f{}", i)).collect();
            let field_refs: Vec<&str> = fields.iter().map(|s| s.as_str()).collect();
            let rows = vec![values.clone()];
            let text = encode("table", &field_refs, &rows);
            let decoded = decode(&text).unwrap();
            prop_assert_eq!(&decoded.tables[0].rows, &rows);
        }
    }
}
