// crates/genesys-forms/src/session/tests.rs
// ============================================================================
// Module: Form Session Unit Tests
// Description: Field state lifecycle and validation projection.
// ============================================================================

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only assertions.")]

use genesys_core::NoopDiagnosticSink;
use genesys_core::Payload;
use genesys_core::PayloadValidationError;
use genesys_core::SchemaKeyword;
use genesys_core::SchemaPathSegment;
use genesys_core::ValidationResult;
use genesys_core::ValuePresence;
use serde_json::Value;
use serde_json::json;

use super::FormSession;
use super::FormSessionError;

fn template() -> Value {
    json!({
        "type": "object",
        "definitions": {
            "Persoon": {
                "type": "object",
                "properties": { "Voornaam": { "type": "string" } }
            }
        },
        "allOf": [{ "$ref": "#/definitions/Persoon" }],
        "properties": {
            "Leeftijd": { "type": "integer" },
            "Akkoord": { "type": "boolean" }
        }
    })
}

fn session(presence: ValuePresence, payload: Value) -> FormSession {
    let payload: Payload = payload.as_object().cloned().unwrap();
    FormSession::new(template(), Some(payload), presence, &NoopDiagnosticSink).unwrap()
}

fn key(name: &str) -> SchemaPathSegment {
    SchemaPathSegment::Key(name.to_string())
}

#[test]
fn session_exposes_deep_and_shallow_fields() {
    let session = session(ValuePresence::Truthy, json!({}));
    let deep: Vec<&str> = session.fields().iter().map(|field| field.field_name.as_str()).collect();
    assert_eq!(deep, vec!["Voornaam", "Leeftijd", "Akkoord"]);
    assert_eq!(session.field_names(), ["Leeftijd".to_string(), "Akkoord".to_string()]);
    assert!(!session.pagination_possible());
}

#[test]
fn rendered_state_follows_presence_policy() {
    let payload = json!({ "Leeftijd": 0, "Akkoord": false });
    let mut truthy = session(ValuePresence::Truthy, payload.clone());
    assert_eq!(truthy.render_field("Leeftijd").unwrap().value, None);

    let mut present = session(ValuePresence::Present, payload);
    assert_eq!(present.render_field("Leeftijd").unwrap().value, Some(json!(0)));
    assert_eq!(present.render_field("Akkoord").unwrap().value, Some(json!(false)));
}

#[test]
fn updates_reach_payload_and_rendered_state() {
    let mut session = session(ValuePresence::Truthy, json!({}));
    session.render_field("Voornaam").unwrap();
    session.update_field("Voornaam", Some(json!("Ann"))).unwrap();
    assert_eq!(session.payload().get("Voornaam"), Some(&json!("Ann")));
    assert_eq!(session.field_state("Voornaam").unwrap().value, Some(json!("Ann")));

    session.update_field("Voornaam", None).unwrap();
    assert!(session.payload().get("Voornaam").is_none());
    assert_eq!(session.field_state("Voornaam").unwrap().value, None);
}

#[test]
fn unknown_fields_are_rejected() {
    let mut session = session(ValuePresence::Truthy, json!({}));
    assert_eq!(
        session.update_field("Onbekend", Some(json!(1))),
        Err(FormSessionError::UnknownField {
            field_name: "Onbekend".to_string()
        })
    );
    assert!(session.touch_field("Onbekend").is_err());
}

#[test]
fn validation_is_projected_onto_rendered_fields() {
    let mut session = session(ValuePresence::Truthy, json!({ "Leeftijd": "oud" }));
    for name in ["Voornaam", "Leeftijd", "Akkoord"] {
        session.render_field(name).unwrap();
    }
    session.touch_field("Leeftijd").unwrap();
    let result = ValidationResult {
        is_valid: false,
        validation_errors: vec![PayloadValidationError {
            message: "\"oud\" is not of type \"integer\"".to_string(),
            absolute_schema_path: vec![key("properties"), key("Leeftijd"), key("type")],
            validator: Some(SchemaKeyword::Type),
            readable_message: "Waarde 'oud' is geen geldige waarde voor dit veld met datatype 'geheel getal'"
                .to_string(),
        }],
        required_properties: vec!["Voornaam".to_string()],
    };
    session.apply_validation(&result);

    let age = session.field_state("Leeftijd").unwrap();
    assert!(age.touched);
    assert!(!age.valid);
    assert_eq!(age.errors.len(), 1);

    let name = session.field_state("Voornaam").unwrap();
    assert!(name.required);
    assert_eq!(name.errors, vec!["Veld 'Voornaam' is verplicht".to_string()]);

    let consent = session.field_state("Akkoord").unwrap();
    assert!(consent.valid);
    assert!(!consent.required);

    session.apply_validation(&ValidationResult {
        is_valid: true,
        ..ValidationResult::default()
    });
    assert!(session.field_state("Leeftijd").unwrap().valid);
    assert!(session.field_state("Voornaam").unwrap().errors.is_empty());
}

#[test]
fn teardown_drops_field_state() {
    let mut session = session(ValuePresence::Truthy, json!({}));
    session.render_field("Akkoord").unwrap();
    session.teardown();
    assert!(session.field_state("Akkoord").is_none());
}

#[test]
fn flattened_schema_follows_definitions() {
    let schema = json!({
        "definitions": { "Adres": { "type": "object", "properties": { "Straat": {} } } },
        "properties": { "Adres": { "$ref": "#/definitions/Adres" } }
    });
    let session = FormSession::new(schema, None, ValuePresence::Truthy, &NoopDiagnosticSink).unwrap();
    let field = session.field("Adres").unwrap();
    let flat = session.flattened_schema(field, &NoopDiagnosticSink).unwrap();
    assert_eq!(flat.get("type"), Some(&json!("object")));
}
