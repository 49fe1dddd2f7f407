// crates/genesys-validation/src/messages.rs
// ============================================================================
// Module: Readable Messages
// Description: Dutch user-facing messages for schema violations.
// Purpose: Turn raw validator output into text a form user can act on.
// Dependencies: genesys-core, serde_json
// ============================================================================

//! ## Overview
//! Messages are derived per failing keyword from the violating instance and
//! the keyword value in the schema. Keywords without a dedicated message fall
//! back to the raw message annotated with the keyword and location, and an
//! [`SchemaDiagnostic::UnparsedValidationError`] is reported.

// ============================================================================
// SECTION: Imports
// ============================================================================

use genesys_core::DiagnosticSink;
use genesys_core::SchemaDiagnostic;
use genesys_core::SchemaKeyword;
use serde_json::Value;

use crate::path::SchemaLocation;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Suffix the validator appends to a missing property name.
const REQUIRED_SUFFIX: &str = " is a required property";

// ============================================================================
// SECTION: Messages
// ============================================================================

/// Builds the readable message for one violation.
#[must_use]
pub fn readable_message(
    message: &str,
    instance: &Value,
    location: &SchemaLocation<'_>,
    diagnostics: &dyn DiagnosticSink,
) -> String {
    let parsed = match location.keyword() {
        Some(SchemaKeyword::AdditionalProperties) => additional_properties(message, instance, location),
        Some(SchemaKeyword::Format) => date_format(instance, location),
        Some(SchemaKeyword::Type) => integer_type(instance, location),
        Some(SchemaKeyword::Required) => required_message(message, diagnostics),
        Some(SchemaKeyword::Enum) => enum_options(instance, location),
        Some(SchemaKeyword::AnyOf) => exclusive_fields(location),
        _ => None,
    };
    parsed.unwrap_or_else(|| {
        let validator = location.keyword_name();
        let schema_path = location.display();
        diagnostics.report(SchemaDiagnostic::UnparsedValidationError {
            message: message.to_string(),
            validator: validator.clone(),
            schema_path: schema_path.clone(),
        });
        format!(
            "{message} (validator: '{}', locatie: '{schema_path}')",
            validator.as_deref().unwrap_or("onbekend")
        )
    })
}

/// Extracts the property named by a `required` violation message.
///
/// Accepts a JSON-quoted name (`"age" is a required property`) as well as a
/// single-quoted one (`'age' is a required property`).
#[must_use]
pub fn required_property(message: &str) -> Option<String> {
    let quoted = message.strip_suffix(REQUIRED_SUFFIX).unwrap_or(message);
    if quoted.starts_with('"') {
        return serde_json::Deserializer::from_str(quoted)
            .into_iter::<String>()
            .next()
            .and_then(Result::ok)
            .filter(|name| !name.is_empty());
    }
    quoted
        .strip_prefix('\'')
        .and_then(|rest| rest.split_once('\''))
        .map(|(name, _)| name.to_string())
        .filter(|name| !name.is_empty())
}

// ============================================================================
// SECTION: Keyword Parsers
// ============================================================================

/// `required`: names the missing field.
fn required_message(message: &str, diagnostics: &dyn DiagnosticSink) -> Option<String> {
    let Some(field) = required_property(message) else {
        diagnostics.report(SchemaDiagnostic::RequiredPropertyNotFound {
            message: message.to_string(),
        });
        return None;
    };
    Some(format!("Veld '{field}' is verplicht"))
}

/// `additionalProperties`: names the unexpected fields.
fn additional_properties(
    message: &str,
    instance: &Value,
    location: &SchemaLocation<'_>,
) -> Option<String> {
    let mut names = quoted_names(message);
    if names.is_empty() {
        names = undeclared_keys(instance, location);
    }
    match names.as_slice() {
        [] => None,
        [single] => Some(format!("Veld '{single}' is niet toegestaan")),
        several => {
            let listed = several.iter().map(|name| format!("'{name}'")).collect::<Vec<_>>();
            Some(format!("Velden {} zijn niet toegestaan", listed.join(", ")))
        }
    }
}

/// `format: date`: names the rejected value.
fn date_format(instance: &Value, location: &SchemaLocation<'_>) -> Option<String> {
    (location.node.and_then(Value::as_str) == Some("date")).then(|| {
        format!(
            "Waarde '{}' is geen geldige waarde voor dit veld met datatype 'datum'",
            display_value(instance)
        )
    })
}

/// `type: integer`: names the rejected value.
fn integer_type(instance: &Value, location: &SchemaLocation<'_>) -> Option<String> {
    let expects_integer = match location.node {
        Some(Value::String(kind)) => kind == "integer",
        Some(Value::Array(kinds)) => kinds.iter().any(|kind| kind.as_str() == Some("integer")),
        _ => false,
    };
    expects_integer.then(|| {
        format!(
            "Waarde '{}' is geen geldige waarde voor dit veld met datatype 'geheel getal'",
            display_value(instance)
        )
    })
}

/// `enum`: lists the allowed values.
fn enum_options(instance: &Value, location: &SchemaLocation<'_>) -> Option<String> {
    let options = location.node.and_then(Value::as_array)?;
    let allowed = options.iter().map(display_value).collect::<Vec<_>>().join(", ");
    Some(format!(
        "Waarde '{}' is niet toegestaan, alleen de volgende waardes zijn toegestaan: {allowed}",
        display_value(instance)
    ))
}

/// `anyOf` built from `required` / `not.required` pairs: mutually exclusive fields.
fn exclusive_fields(location: &SchemaLocation<'_>) -> Option<String> {
    let first = location.node.and_then(Value::as_array).and_then(|branches| branches.first())?;
    if first.get("required").is_none() && first.get("not").is_none() {
        return None;
    }
    let own = first.get("required").and_then(Value::as_array);
    let excluded =
        first.get("not").and_then(|not| not.get("required")).and_then(Value::as_array);
    let fields = own
        .into_iter()
        .chain(excluded)
        .flatten()
        .map(|field| format!("'{}'", display_value(field)))
        .collect::<Vec<_>>();
    if fields.is_empty() {
        return None;
    }
    Some(format!("De volgende velden mogen niet tegelijk zijn ingevuld: {}", fields.join(", ")))
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Renders a value the way users typed it: strings without quotes.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Collects single-quoted names from the parenthesized tail of a message.
fn quoted_names(message: &str) -> Vec<String> {
    let Some(start) = message.rfind('(') else {
        return Vec::new();
    };
    message[start ..]
        .split('\'')
        .skip(1)
        .step_by(2)
        .filter(|name| !name.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Lists instance keys the holding schema does not declare.
fn undeclared_keys(instance: &Value, location: &SchemaLocation<'_>) -> Vec<String> {
    let Some(payload) = instance.as_object() else {
        return Vec::new();
    };
    let declared = location.parent.and_then(|schema| schema.get("properties")).and_then(Value::as_object);
    payload
        .keys()
        .filter(|key| declared.is_none_or(|declared| !declared.contains_key(*key)))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    //! Unit tests for readable messages.
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only assertions.")]

    use genesys_core::DiagnosticLog;
    use genesys_core::NoopDiagnosticSink;
    use genesys_core::SchemaDiagnostic;
    use serde_json::json;

    use super::quoted_names;
    use super::readable_message;
    use super::required_property;
    use crate::path::SchemaLocation;

    #[test]
    fn required_property_accepts_both_quote_styles() {
        assert_eq!(required_property("\"age\" is a required property"), Some("age".to_string()));
        assert_eq!(required_property("'Datum besluit' is a required property"), Some("Datum besluit".to_string()));
        assert_eq!(required_property("\"a \\\"b\\\"\" is a required property"), Some("a \"b\"".to_string()));
        assert_eq!(required_property("something else"), None);
    }

    #[test]
    fn quoted_names_read_parenthesized_tail() {
        assert_eq!(
            quoted_names("Additional properties are not allowed ('x', 'y' were unexpected)"),
            vec!["x".to_string(), "y".to_string()]
        );
        assert!(quoted_names("no tail").is_empty());
    }

    #[test]
    fn additional_property_messages_are_singular_or_plural() {
        let schema = json!({ "properties": {}, "additionalProperties": false });
        let location = SchemaLocation::resolve(&schema, "/additionalProperties");
        let single = readable_message(
            "Additional properties are not allowed ('x' was unexpected)",
            &json!({ "x": 1 }),
            &location,
            &NoopDiagnosticSink,
        );
        assert_eq!(single, "Veld 'x' is niet toegestaan");
        let plural = readable_message(
            "Additional properties are not allowed ('x', 'y' were unexpected)",
            &json!({ "x": 1, "y": 2 }),
            &location,
            &NoopDiagnosticSink,
        );
        assert_eq!(plural, "Velden 'x', 'y' zijn niet toegestaan");
    }

    #[test]
    fn additional_properties_fall_back_to_instance_keys() {
        let schema = json!({ "properties": { "a": {} }, "additionalProperties": false });
        let location = SchemaLocation::resolve(&schema, "/additionalProperties");
        let message = readable_message("unexpected", &json!({ "a": 1, "z": 2 }), &location, &NoopDiagnosticSink);
        assert_eq!(message, "Veld 'z' is niet toegestaan");
    }

    #[test]
    fn keyword_messages_use_instance_and_schema() {
        let schema = json!({
            "properties": {
                "datum": { "type": "string", "format": "date" },
                "aantal": { "type": "integer" },
                "keuze": { "enum": ["Ja", "Nee", 3] }
            }
        });
        let date = SchemaLocation::resolve(&schema, "/properties/datum/format");
        assert_eq!(
            readable_message("m", &json!("2024-13-45"), &date, &NoopDiagnosticSink),
            "Waarde '2024-13-45' is geen geldige waarde voor dit veld met datatype 'datum'"
        );
        let integer = SchemaLocation::resolve(&schema, "/properties/aantal/type");
        assert_eq!(
            readable_message("m", &json!("tien"), &integer, &NoopDiagnosticSink),
            "Waarde 'tien' is geen geldige waarde voor dit veld met datatype 'geheel getal'"
        );
        let choice = SchemaLocation::resolve(&schema, "/properties/keuze/enum");
        assert_eq!(
            readable_message("m", &json!("Misschien"), &choice, &NoopDiagnosticSink),
            "Waarde 'Misschien' is niet toegestaan, alleen de volgende waardes zijn toegestaan: Ja, Nee, 3"
        );
    }

    #[test]
    fn exclusive_any_of_names_both_fields() {
        let schema = json!({
            "anyOf": [
                { "required": ["Datum besluit"], "not": { "required": ["Datum afhandeling"] } },
                { "required": ["Datum afhandeling"], "not": { "required": ["Datum besluit"] } }
            ]
        });
        let location = SchemaLocation::resolve(&schema, "/anyOf");
        assert_eq!(
            readable_message("m", &json!({}), &location, &NoopDiagnosticSink),
            "De volgende velden mogen niet tegelijk zijn ingevuld: 'Datum besluit', 'Datum afhandeling'"
        );
    }

    #[test]
    fn unparsed_keywords_fall_back_and_report() {
        let schema = json!({ "properties": { "leeftijd": { "minimum": 18 } } });
        let location = SchemaLocation::resolve(&schema, "/properties/leeftijd/minimum");
        let log = DiagnosticLog::new();
        let message = readable_message("12 is less than the minimum of 18", &json!(12), &location, &log);
        assert_eq!(
            message,
            "12 is less than the minimum of 18 (validator: 'minimum', locatie: 'properties/leeftijd/minimum')"
        );
        assert!(matches!(
            log.entries().as_slice(),
            [SchemaDiagnostic::UnparsedValidationError { validator: Some(validator), .. }] if validator == "minimum"
        ));
    }

    #[test]
    fn unreadable_required_message_reports_missing_property() {
        let schema = json!({ "required": ["x"] });
        let location = SchemaLocation::resolve(&schema, "/required");
        let log = DiagnosticLog::new();
        let _ = readable_message("garbled", &json!({}), &location, &log);
        let entries = log.entries();
        assert!(matches!(entries.first(), Some(SchemaDiagnostic::RequiredPropertyNotFound { .. })));
        assert_eq!(entries.len(), 2);
    }
}
