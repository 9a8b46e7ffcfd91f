use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

/// Reads the raw input document. `None` or `-` reads stdin.
pub fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read input file {}", path.display())),
        _ => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("failed to read records from stdin")?;
            Ok(raw)
        }
    }
}

/// Accepts a JSON array of records or an object with a `books` array. Any
/// other shape is treated as an empty collection.
pub fn parse_records(raw: &str) -> Result<Vec<Value>> {
    if raw.trim().is_empty() {
        tracing::warn!("input is empty, treating it as an empty collection");
        return Ok(Vec::new());
    }

    let document: Value = serde_json::from_str(raw).context("input is not valid JSON")?;
    match document {
        Value::Array(records) => Ok(records),
        Value::Object(mut object) => match object.remove("books") {
            Some(Value::Array(records)) => Ok(records),
            _ => {
                tracing::warn!("input object has no 'books' array, treating it as empty");
                Ok(Vec::new())
            }
        },
        other => {
            tracing::warn!(
                kind = json_kind(&other),
                "input is not a record list, treating it as empty"
            );
            Ok(Vec::new())
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
