use std::collections::HashSet;

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::Node;

/// Author value that denotes "unknown"; kept for display, never matched.
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum NormalizeError {
    #[error("record is not a JSON object")]
    NotAnObject,
    #[error("record has no resolvable id")]
    MissingId,
    #[error("duplicate id '{0}'")]
    DuplicateId(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub index: usize,
    pub reason: NormalizeError,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NormalizedCollection {
    pub nodes: Vec<Node>,
    pub rejected: Vec<Rejection>,
}

pub fn is_unknown_author(author: &str) -> bool {
    let author = author.trim();
    author.is_empty() || author.eq_ignore_ascii_case(UNKNOWN_AUTHOR)
}

/// Cleans one raw record into a [`Node`]. Only a missing id is fatal for the
/// record; every other malformed field falls back to its empty default.
pub fn normalize_record(record: &Value) -> Result<Node, NormalizeError> {
    let Some(fields) = record.as_object() else {
        return Err(NormalizeError::NotAnObject);
    };

    let id = resolve_id(fields.get("id")).ok_or(NormalizeError::MissingId)?;
    let author = string_field(fields, &["author"]).unwrap_or_default();

    Ok(Node {
        id,
        title: string_field(fields, &["title"]).unwrap_or_default(),
        author_known: !is_unknown_author(author.as_str()),
        author,
        tags: normalize_tags(fields.get("tags")),
        genre: string_field(fields, &["genre"]).filter(|value| !value.is_empty()),
        publication_year: year_field(fields),
        created_at: created_at_field(fields),
        notes: string_field(fields, &["notes"]).filter(|value| !value.is_empty()),
    })
}

/// Normalizes a whole record list. Rejected records are logged and returned
/// alongside the surviving nodes; the pass itself never fails.
pub fn normalize_records(records: &[Value]) -> NormalizedCollection {
    let mut seen = HashSet::new();
    let mut collection = NormalizedCollection::default();

    for (index, record) in records.iter().enumerate() {
        let outcome = normalize_record(record).and_then(|node| {
            if seen.insert(node.id.clone()) {
                Ok(node)
            } else {
                Err(NormalizeError::DuplicateId(node.id))
            }
        });

        match outcome {
            Ok(node) => collection.nodes.push(node),
            Err(reason) => {
                tracing::warn!(index, reason = %reason, "dropping book record");
                collection.rejected.push(Rejection { index, reason });
            }
        }
    }

    tracing::debug!(
        accepted = collection.nodes.len(),
        rejected = collection.rejected.len(),
        "normalized book records"
    );
    collection
}

fn resolve_id(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(raw) => Some(raw.trim().to_owned()).filter(|id| !id.is_empty()),
        Value::Number(number) => number
            .as_i64()
            .map(|id| id.to_string())
            .or_else(|| number.as_u64().map(|id| id.to_string())),
        _ => None,
    }
}

fn string_field(fields: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| fields.get(*key).and_then(Value::as_str))
        .map(|value| value.trim().to_owned())
}

fn normalize_tags(value: Option<&Value>) -> Vec<String> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    items
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .filter(|tag| seen.insert((*tag).to_owned()))
        .map(str::to_owned)
        .collect()
}

fn year_field(fields: &Map<String, Value>) -> Option<i32> {
    let value = ["publication_year", "publicationYear", "year"]
        .iter()
        .find_map(|key| fields.get(*key).filter(|value| !value.is_null()))?;

    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|year| year.fract() == 0.0).map(|year| year as i64))
            .and_then(|year| i32::try_from(year).ok()),
        Value::String(raw) => raw.trim().parse::<i32>().ok(),
        _ => None,
    }
}

fn created_at_field(fields: &Map<String, Value>) -> Option<i64> {
    let value = ["created_at", "createdAt"]
        .iter()
        .find_map(|key| fields.get(*key).filter(|value| !value.is_null()))?;

    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(raw) => {
            let raw = raw.trim();
            DateTime::parse_from_rfc3339(raw)
                .map(|timestamp| timestamp.timestamp_millis())
                .ok()
                .or_else(|| raw.parse::<i64>().ok())
        }
        _ => None,
    }
}
