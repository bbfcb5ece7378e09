//! Field normalization: prepares a parsed model record for the template.
//!
//! Steps:
//! 1. `autores`, `alcance`, `exclusiones` default to `[]` when absent or null
//! 2. `autores` is replaced by the user's comma-separated input
//! 3. `alcance` and `exclusiones` lists become bullet text
//!
//! Nothing else is touched. Running it twice is a no-op the second time,
//! since bullet text is no longer list-shaped.

use serde_json::{Map, Value};

pub const BULLET: &str = "•";

const LIST_FIELDS: [&str; 3] = ["alcance", "exclusiones", "autores"];
const BULLET_FIELDS: [&str; 2] = ["alcance", "exclusiones"];

/// Splits the authors input on commas, trimming and dropping empty names.
pub fn parse_authors(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(String::from)
        .collect()
}

/// `["x", "y"]` → `"• x\n• y"`. Anything that is not a list passes through.
pub fn list_to_bullets(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::String(
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => format!("{BULLET} {s}"),
                    other => format!("{BULLET} {other}"),
                })
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        other => other,
    }
}

/// Normalizes a parsed record in place.
pub fn normalize(record: &mut Map<String, Value>, authors_input: &str) {
    for key in LIST_FIELDS {
        let entry = record.entry(key).or_insert(Value::Null);
        if entry.is_null() {
            *entry = Value::Array(Vec::new());
        }
    }

    let authors = parse_authors(authors_input)
        .into_iter()
        .map(Value::String)
        .collect();
    record.insert("autores".to_string(), Value::Array(authors));

    for key in BULLET_FIELDS {
        if let Some(value) = record.get_mut(key) {
            *value = list_to_bullets(value.take());
        }
    }
}
