//! Table output formatting
//!
//! Admin payloads are untyped JSON, so tables are built from the data itself:
//! an array of objects becomes one row per element with a column per key.

use serde_json::{Map, Value};
use tabled::{
    Table,
    builder::Builder,
    settings::{Alignment, Modify, Style, object::Rows},
};

const EMPTY: &str = "No results found.";

/// Render a JSON payload as a table
pub fn format_value(data: &Value) -> String {
    match data {
        Value::Null => EMPTY.to_string(),
        Value::Array(items) if items.is_empty() => EMPTY.to_string(),
        Value::Array(items) if items.iter().all(Value::is_object) => format_records(items),
        Value::Array(items) => format_rows(
            Some(vec!["VALUE".to_string()]),
            items.iter().map(|v| [cell(v)]),
        ),
        Value::Object(map) => format_object(map),
        scalar => cell(scalar),
    }
}

/// Render rows under optional headers
pub fn format_rows<R, I>(headers: Option<Vec<String>>, rows: I) -> String
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = String>,
{
    let mut builder = Builder::default();
    let has_headers = headers.is_some();
    if let Some(headers) = headers {
        builder.push_record(headers);
    }
    for row in rows {
        builder.push_record(row);
    }

    let mut table = builder.build();
    style(&mut table, has_headers);
    table.to_string()
}

fn format_records(items: &[Value]) -> String {
    let mut columns: Vec<&str> = Vec::new();
    for item in items {
        if let Value::Object(map) = item {
            for key in map.keys() {
                if !columns.contains(&key.as_str()) {
                    columns.push(key);
                }
            }
        }
    }

    let headers = columns.iter().map(|c| header(c)).collect();
    let rows = items.iter().map(|item| {
        columns
            .iter()
            .map(|c| item.get(*c).map(cell).unwrap_or_else(|| "-".to_string()))
            .collect::<Vec<_>>()
    });
    format_rows(Some(headers), rows)
}

fn format_object(map: &Map<String, Value>) -> String {
    if map.is_empty() {
        return EMPTY.to_string();
    }
    format_rows(
        Some(vec!["FIELD".to_string(), "VALUE".to_string()]),
        map.iter().map(|(k, v)| [k.clone(), cell(v)]),
    )
}

fn style(table: &mut Table, has_headers: bool) {
    table.with(Style::rounded());
    if has_headers {
        table.with(Modify::new(Rows::first()).with(Alignment::center()));
    }
}

/// `createdAt` -> `CREATED AT`
fn header(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    let mut prev_lower = false;
    for ch in key.chars() {
        if ch == '_' || ch == '-' {
            out.push(' ');
            prev_lower = false;
            continue;
        }
        if ch.is_uppercase() && prev_lower {
            out.push(' ');
        }
        prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        out.extend(ch.to_uppercase());
    }
    out
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
