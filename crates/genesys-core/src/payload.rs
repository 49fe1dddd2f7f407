// crates/genesys-core/src/payload.rs
// ============================================================================
// Module: Form Payload
// Description: Payload shape and value-presence rules for form data.
// Purpose: Define how stored field values are looked up and judged present.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A payload maps field names to JSON values. Lookups are best-effort: payload
//! keys need not match extracted field names. Whether a stored value counts as
//! "answered" is governed by [`ValuePresence`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Field-name keyed form payload.
pub type Payload = Map<String, Value>;

/// Rule deciding whether a stored payload value counts as present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuePresence {
    /// Falsy values (`null`, `false`, `0`, `""`) read as absent.
    #[default]
    Truthy,
    /// Any non-null value reads as present.
    Present,
}

impl ValuePresence {
    /// Returns true when `value` counts as present under this rule.
    #[must_use]
    pub fn admits(self, value: &Value) -> bool {
        match self {
            Self::Truthy => is_truthy(value),
            Self::Present => !value.is_null(),
        }
    }

    /// Looks up `field_name` in `payload`, honoring this presence rule.
    #[must_use]
    pub fn lookup<'a>(self, payload: Option<&'a Payload>, field_name: &str) -> Option<&'a Value> {
        payload.and_then(|payload| payload.get(field_name)).filter(|value| self.admits(value))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the truthiness of a JSON value.
///
/// `null`, `false`, zero and the empty string are falsy. Arrays and objects
/// are truthy even when empty.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for presence rules.
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only assertions.")]

    use serde_json::json;

    use super::Payload;
    use super::ValuePresence;
    use super::is_truthy;

    fn payload(value: serde_json::Value) -> Payload {
        value.as_object().cloned().expect("object payload")
    }

    #[test]
    fn truthiness_matches_form_semantics() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(0.0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!("nee")));
        assert!(is_truthy(&json!(-1)));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!({})));
    }

    #[test]
    fn truthy_presence_drops_falsy_answers() {
        let data = payload(json!({ "akkoord": false, "aantal": 0, "naam": "Ann" }));
        assert_eq!(ValuePresence::Truthy.lookup(Some(&data), "akkoord"), None);
        assert_eq!(ValuePresence::Truthy.lookup(Some(&data), "aantal"), None);
        assert_eq!(ValuePresence::Truthy.lookup(Some(&data), "naam"), Some(&json!("Ann")));
    }

    #[test]
    fn present_rule_keeps_falsy_answers() {
        let data = payload(json!({ "akkoord": false, "aantal": 0, "leeg": null }));
        assert_eq!(ValuePresence::Present.lookup(Some(&data), "akkoord"), Some(&json!(false)));
        assert_eq!(ValuePresence::Present.lookup(Some(&data), "aantal"), Some(&json!(0)));
        assert_eq!(ValuePresence::Present.lookup(Some(&data), "leeg"), None);
        assert_eq!(ValuePresence::Present.lookup(None, "akkoord"), None);
    }
}
