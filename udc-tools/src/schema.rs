//! Argument validation against the JSON-schema subset used by the catalog:
//! object shape, `required`, primitive `type`s, array `items`, string
//! `enum`s and numeric `minimum`/`maximum`.

use crate::error::FieldIssue;
use serde_json::{Map, Value};

/// Serialized argument payloads above this size are rejected outright.
pub const MAX_ARGUMENT_BYTES: usize = 1_000_000;

/// Checks `input` against `schema`, collecting every offending field.
/// A null input is treated as an empty object.
pub fn validate(schema: &Value, input: &Value) -> Result<(), Vec<FieldIssue>> {
    if let Ok(serialized) = serde_json::to_string(input) {
        if serialized.len() > MAX_ARGUMENT_BYTES {
            return Err(vec![FieldIssue::new(
                "arguments",
                format!("payload exceeds {MAX_ARGUMENT_BYTES} bytes"),
            )]);
        }
    }

    let empty = Map::new();
    let object = match input {
        Value::Null => &empty,
        Value::Object(map) => map,
        other => {
            return Err(vec![FieldIssue::new(
                "arguments",
                format!("expected object, got {}", type_name(other)),
            )])
        }
    };

    let mut issues = Vec::new();

    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for field in required.iter().filter_map(Value::as_str) {
            if !object.contains_key(field) {
                issues.push(FieldIssue::new(field, "is required"));
            }
        }
    }

    if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
        for (field, value) in object {
            if let Some(property) = properties.get(field) {
                check_value(field, property, value, &mut issues);
            }
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn matches_type(expected: &str, value: &Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn check_value(path: &str, schema: &Value, value: &Value, issues: &mut Vec<FieldIssue>) {
    if let Some(expected) = schema.get("type").and_then(Value::as_str) {
        if !matches_type(expected, value) {
            issues.push(FieldIssue::new(
                path,
                format!("expected {expected}, got {}", type_name(value)),
            ));
            return;
        }
    }

    if let Some(allowed) = schema.get("enum").and_then(Value::as_array) {
        if !allowed.contains(value) {
            let options: Vec<String> = allowed.iter().map(Value::to_string).collect();
            issues.push(FieldIssue::new(
                path,
                format!("must be one of {}", options.join(", ")),
            ));
            return;
        }
    }

    if let Some(number) = value.as_f64() {
        if let Some(minimum) = schema.get("minimum").and_then(Value::as_f64) {
            if number < minimum {
                issues.push(FieldIssue::new(path, format!("must be >= {minimum}")));
            }
        }
        if let Some(maximum) = schema.get("maximum").and_then(Value::as_f64) {
            if number > maximum {
                issues.push(FieldIssue::new(path, format!("must be <= {maximum}")));
            }
        }
    }

    if let (Some(items), Some(elements)) = (schema.get("items"), value.as_array()) {
        for (index, element) in elements.iter().enumerate() {
            check_value(&format!("{path}[{index}]"), items, element, issues);
        }
    }
}
