//! Caller-input validation.
//!
//! Every request body that reaches the core is a loosely-typed JSON object.
//! The helpers here pull typed values out of it and report the first field
//! that is wrong, so HTTP callers get a message naming what to fix.

use serde_json::{Map, Value};
use thiserror::Error;

/// A caller-input problem. These are the only errors that propagate out of
/// the core as explicit failures; everything else degrades to a default.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// The body was absent, not a JSON object, or an empty object.
    #[error("No input data provided")]
    EmptyInput,

    /// The body is not valid JSON.
    #[error("Invalid JSON body: {0}")]
    MalformedBody(String),

    /// One or more required fields were absent or `null`.
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    /// A field was present but held the wrong kind of value.
    #[error("Invalid data format for field '{field}': {reason}")]
    InvalidField { field: String, reason: String },
}

impl ValidationError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// The offending field, when the error is about exactly one.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::InvalidField { field, .. } => Some(field),
            Self::MissingFields(fields) if fields.len() == 1 => Some(&fields[0]),
            _ => None,
        }
    }
}

/// Parse a raw request body into a non-empty JSON object.
pub fn parse_object(body: &[u8]) -> Result<Map<String, Value>, ValidationError> {
    parse_optional_object(body)?.ok_or(ValidationError::EmptyInput)
}

/// Like [`parse_object`], but a blank body or `{}` means "no overrides".
///
/// Anything other than a JSON object is still rejected.
pub fn parse_optional_object(body: &[u8]) -> Result<Option<Map<String, Value>>, ValidationError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ValidationError::MalformedBody(e.to_string()))?;
    match value {
        Value::Object(map) if map.is_empty() => Ok(None),
        Value::Object(map) => Ok(Some(map)),
        _ => Err(ValidationError::EmptyInput),
    }
}

/// Read an optional numeric field. `null` counts as absent.
pub fn optional_number(
    body: &Map<String, Value>,
    field: &str,
) -> Result<Option<f64>, ValidationError> {
    match body.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .filter(|v| v.is_finite())
            .map(Some)
            .ok_or_else(|| ValidationError::invalid(field, "number is out of range")),
        Some(other) => Err(ValidationError::invalid(
            field,
            format!("expected a number, got {}", kind_of(other)),
        )),
    }
}

/// Read an optional string field. `null` counts as absent.
pub fn optional_string(
    body: &Map<String, Value>,
    field: &str,
) -> Result<Option<String>, ValidationError> {
    match body.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(ValidationError::invalid(
            field,
            format!("expected a string, got {}", kind_of(other)),
        )),
    }
}

/// Read an optional boolean field. `null` counts as absent.
pub fn optional_bool(
    body: &Map<String, Value>,
    field: &str,
) -> Result<Option<bool>, ValidationError> {
    match body.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(ValidationError::invalid(
            field,
            format!("expected a boolean, got {}", kind_of(other)),
        )),
    }
}

/// Read a set of required numeric fields, in order.
///
/// A present-but-malformed field is reported before any missing ones, so a
/// body like `{"kitchen": "abc"}` names `kitchen` rather than the absent
/// siblings.
pub fn required_numbers<const N: usize>(
    body: &Map<String, Value>,
    fields: [&str; N],
) -> Result<[f64; N], ValidationError> {
    let mut values = [0.0; N];
    let mut missing = Vec::new();
    for (slot, field) in values.iter_mut().zip(fields) {
        match optional_number(body, field)? {
            Some(v) => *slot = v,
            None => missing.push(field.to_string()),
        }
    }
    if missing.is_empty() {
        Ok(values)
    } else {
        Err(ValidationError::MissingFields(missing))
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn empty_and_blank_bodies_are_rejected() {
        assert_eq!(parse_object(b""), Err(ValidationError::EmptyInput));
        assert_eq!(parse_object(b"  \n"), Err(ValidationError::EmptyInput));
        assert_eq!(parse_object(b"{}"), Err(ValidationError::EmptyInput));
        assert_eq!(parse_object(b"[1, 2]"), Err(ValidationError::EmptyInput));
    }

    #[test]
    fn optional_object_treats_blank_and_empty_as_absent() {
        assert_eq!(parse_optional_object(b""), Ok(None));
        assert_eq!(parse_optional_object(b" {}\n"), Ok(None));
        assert_eq!(
            parse_optional_object(br#"{"season": "Winter"}"#),
            Ok(Some(object(json!({"season": "Winter"}))))
        );
        assert_eq!(parse_optional_object(b"42"), Err(ValidationError::EmptyInput));
    }

    #[test]
    fn malformed_json_is_reported() {
        let err = parse_object(b"{not json").unwrap_err();
        assert!(matches!(err, ValidationError::MalformedBody(_)));
    }

    #[test]
    fn string_in_numeric_field_names_the_field() {
        let body = object(json!({"kitchen": "abc"}));
        let err = required_numbers(&body, ["kitchen", "bathroom", "outdoor"]).unwrap_err();
        assert_eq!(err.field(), Some("kitchen"));
        assert!(err.to_string().contains("kitchen"));
    }

    #[test]
    fn missing_fields_are_listed_together() {
        let body = object(json!({"kitchen": 12.0, "outdoor": null}));
        let err = required_numbers(&body, ["kitchen", "bathroom", "outdoor"]).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingFields(vec!["bathroom".into(), "outdoor".into()])
        );
        assert_eq!(err.to_string(), "Missing required fields: bathroom, outdoor");
    }

    #[test]
    fn required_numbers_returns_values_in_order() {
        let body = object(json!({"a": 1, "b": 2.5}));
        assert_eq!(required_numbers(&body, ["b", "a"]).unwrap(), [2.5, 1.0]);
    }

    #[test]
    fn optional_helpers_treat_null_as_absent() {
        let body = object(json!({"x": null}));
        assert_eq!(optional_number(&body, "x").unwrap(), None);
        assert_eq!(optional_string(&body, "x").unwrap(), None);
        assert_eq!(optional_bool(&body, "x").unwrap(), None);
    }

    #[test]
    fn optional_bool_rejects_numbers() {
        let body = object(json!({"leak_detected": 1}));
        let err = optional_bool(&body, "leak_detected").unwrap_err();
        assert_eq!(err.field(), Some("leak_detected"));
    }
}
