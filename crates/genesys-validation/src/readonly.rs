// crates/genesys-validation/src/readonly.rs
// ============================================================================
// Module: Read-Only Adjustment
// Description: Marks read-only schema properties as answered in a payload.
// Purpose: Keep informational fields from blocking a submission.
// Dependencies: genesys-core, serde_json
// ============================================================================

//! ## Overview
//! Read-only properties are modeled as booleans that the user never fills in.
//! Before validation every read-only property is set to `true`, present or
//! not. Object-typed properties are adjusted recursively when their payload
//! value is an object; keys the schema does not declare pass through.

use genesys_core::Payload;
use serde_json::Value;

/// Returns a copy of `payload` with read-only properties set to `true`.
#[must_use]
pub fn adjust_readonly(schema: &Value, payload: &Payload) -> Payload {
    let properties = schema.get("properties").and_then(Value::as_object);
    let mut adjusted = Payload::new();
    for (key, value) in payload {
        let property = properties.and_then(|properties| properties.get(key));
        let next = match (property, value) {
            (Some(property), _) if is_readonly(property) => Value::Bool(true),
            (Some(property), Value::Object(nested)) if is_object(property) => {
                Value::Object(adjust_readonly(property, nested))
            }
            _ => value.clone(),
        };
        adjusted.insert(key.clone(), next);
    }
    for (key, property) in properties.into_iter().flatten() {
        if is_readonly(property) && !adjusted.contains_key(key) {
            adjusted.insert(key.clone(), Value::Bool(true));
        }
    }
    adjusted
}

/// Returns true for `readOnly: true`.
fn is_readonly(property: &Value) -> bool {
    property.get("readOnly").and_then(Value::as_bool).unwrap_or(false)
}

/// Returns true for `type: "object"`.
fn is_object(property: &Value) -> bool {
    property.get("type").and_then(Value::as_str) == Some("object")
}

#[cfg(test)]
mod tests {
    //! Unit tests for read-only adjustment.
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only assertions.")]

    use serde_json::Value;
    use serde_json::json;

    use super::adjust_readonly;

    fn adjust(schema: &Value, payload: &Value) -> Value {
        Value::Object(adjust_readonly(schema, payload.as_object().unwrap()))
    }

    #[test]
    fn readonly_fields_are_forced_true() {
        let schema = json!({
            "properties": {
                "Toelichting": { "type": "boolean", "readOnly": true },
                "Naam": { "type": "string" }
            }
        });
        assert_eq!(adjust(&schema, &json!({})), json!({ "Toelichting": true }));
        assert_eq!(
            adjust(&schema, &json!({ "Toelichting": false, "Naam": "Ann" })),
            json!({ "Toelichting": true, "Naam": "Ann" })
        );
    }

    #[test]
    fn nested_objects_are_adjusted() {
        let schema = json!({
            "properties": {
                "Stap 1": {
                    "type": "object",
                    "properties": { "Uitleg": { "type": "boolean", "readOnly": true } }
                }
            }
        });
        assert_eq!(
            adjust(&schema, &json!({ "Stap 1": {} })),
            json!({ "Stap 1": { "Uitleg": true } })
        );
        assert_eq!(adjust(&schema, &json!({ "Stap 1": "x" })), json!({ "Stap 1": "x" }));
    }

    #[test]
    fn unknown_keys_pass_through() {
        let schema = json!({ "properties": {} });
        assert_eq!(adjust(&schema, &json!({ "extra": [1, 2] })), json!({ "extra": [1, 2] }));
        assert_eq!(adjust(&json!(true), &json!({ "extra": 1 })), json!({ "extra": 1 }));
    }
}
