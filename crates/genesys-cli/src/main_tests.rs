// crates/genesys-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for CLI parsing, input limits and schema commands.
// Purpose: Ensure command helpers produce the documented output and errors.
// Dependencies: genesys-cli main helpers, tempfile
// ============================================================================

//! ## Overview
//! Exercises bounded reads, field listing, flattening and local validation
//! without spawning the binary.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    clippy::use_debug,
    reason = "Test-only panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;

use clap::Parser;
use genesys_config::GenesysConfig;
use genesys_core::NoopDiagnosticSink;
use genesys_core::ValuePresence;
use serde_json::Value;
use serde_json::json;
use tempfile::TempDir;

use super::Cli;
use super::Commands;
use super::FieldsFormat;
use super::ReadLimitError;
use super::fields_report;
use super::flatten_field;
use super::read_bytes_with_limit;
use super::load_optional_config;
use super::read_json_file;
use super::read_payload_file;
use super::render_fields_text;
use super::validate_payload;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn template() -> Value {
    json!({
        "type": "object",
        "definitions": {
            "Adres": {
                "type": "object",
                "properties": { "Straat": { "type": "string" } }
            }
        },
        "properties": {
            "Voornaam": { "type": "string", "minLength": 2 },
            "Adres": { "$ref": "#/definitions/Adres" }
        },
        "required": ["Voornaam"]
    })
}

// ============================================================================
// SECTION: Input Limits
// ============================================================================

#[test]
fn read_bytes_with_limit_allows_small_file() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("small.json");
    fs::write(&path, b"{}").expect("write small file");

    let bytes = read_bytes_with_limit(&path, 16).expect("read small file");
    assert_eq!(bytes, b"{}");
}

#[test]
fn read_bytes_with_limit_rejects_large_file() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("large.json");
    let limit = 8_usize;
    fs::write(&path, vec![b' '; limit + 1]).expect("write large file");

    match read_bytes_with_limit(&path, limit) {
        Err(ReadLimitError::TooLarge {
            size,
            limit: reported,
        }) => {
            assert_eq!(size, 9);
            assert_eq!(reported, limit);
        }
        other => panic!("expected size limit failure, got {other:?}"),
    }
}

#[test]
fn read_json_file_reports_missing_and_malformed_inputs() {
    let dir = TempDir::new().expect("temp dir");
    let missing = dir.path().join("missing.json");
    let err = read_json_file(&missing, "schema").expect_err("missing file");
    assert!(err.to_string().starts_with("failed to read schema"));

    let malformed = dir.path().join("broken.json");
    fs::write(&malformed, b"{ not json").expect("write malformed file");
    let err = read_json_file(&malformed, "payload").expect_err("malformed file");
    assert!(err.to_string().starts_with("invalid payload json"));
}

// ============================================================================
// SECTION: Schema Commands
// ============================================================================

#[test]
fn fields_report_lists_descriptors_and_names() {
    let report = fields_report(template(), None, ValuePresence::default(), &NoopDiagnosticSink).expect("fields");
    let names: Vec<&str> = report.fields.iter().map(|field| field.field_name.as_str()).collect();
    assert_eq!(names, vec!["Voornaam", "Adres"]);
    assert_eq!(report.field_names, vec!["Voornaam".to_string(), "Adres".to_string()]);
    assert!(!report.pagination_possible);

    let text = render_fields_text(&report);
    assert!(text.starts_with("Voornaam\tstring\n"));
    assert!(text.ends_with("pagination_possible\tfalse\n"));
}

#[test]
fn fields_report_values_follow_configured_presence() {
    let dir = TempDir::new().expect("temp dir");
    let config_path = dir.path().join("genesys.toml");
    fs::write(&config_path, "[client]\nvalue_presence = \"present\"\n").expect("write config");
    let payload_path = dir.path().join("answers.json");
    fs::write(&payload_path, json!({ "Voornaam": "" }).to_string()).expect("write payload");

    let config = load_optional_config(Some(&config_path)).expect("config");
    assert_eq!(config.client.value_presence, ValuePresence::Present);
    let answers = read_payload_file(&payload_path).expect("payload");

    let present = fields_report(
        template(),
        Some(answers.clone()),
        config.client.value_presence,
        &NoopDiagnosticSink,
    )
    .expect("fields");
    let values = present.values.as_ref().expect("values");
    assert_eq!(values.get("Voornaam"), Some(&json!("")));
    assert_eq!(values.get("Adres"), Some(&Value::Null));
    assert_eq!(present.value_presence, Some(ValuePresence::Present));
    assert!(render_fields_text(&present).starts_with("Voornaam\tstring\t\"\"\n"));

    let truthy =
        fields_report(template(), Some(answers), ValuePresence::Truthy, &NoopDiagnosticSink)
            .expect("fields");
    assert_eq!(truthy.values.expect("values").get("Voornaam"), Some(&Value::Null));

    let bare = fields_report(template(), None, config.client.value_presence, &NoopDiagnosticSink)
        .expect("fields");
    assert!(bare.values.is_none());
    let rendered = serde_json::to_value(&bare).expect("serialize");
    assert!(rendered.get("values").is_none());
}

#[test]
fn payload_files_must_hold_objects() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("answers.json");
    fs::write(&path, b"[1, 2]").expect("write payload");
    let err = read_payload_file(&path).expect_err("array payload");
    assert!(err.to_string().ends_with("must be a JSON object"));
}

#[test]
fn fields_report_rejects_boolean_property_schema() {
    let schema = json!({ "properties": { "Vrij": true } });
    let err = fields_report(schema, None, ValuePresence::default(), &NoopDiagnosticSink).expect_err("boolean property");
    assert!(err.to_string().starts_with("field extraction failed"));
}

#[test]
fn flatten_field_resolves_definitions() {
    let flat = flatten_field(template(), "Adres", &NoopDiagnosticSink).expect("flatten");
    assert_eq!(flat.get("type"), Some(&json!("object")));

    let err = flatten_field(template(), "Onbekend", &NoopDiagnosticSink).expect_err("unknown");
    assert_eq!(err.to_string(), "unknown field: Onbekend");
}

// ============================================================================
// SECTION: Validate Command
// ============================================================================

#[tokio::test]
async fn validate_payload_runs_locally_without_endpoint() {
    let config = GenesysConfig::default();

    let invalid = validate_payload(&config, None, template(), &json!({ "Voornaam": "A" }))
        .await
        .expect("local validation");
    assert!(!invalid.is_valid);
    assert_eq!(invalid.validation_errors.len(), 1);

    let valid = validate_payload(&config, None, template(), &json!({ "Voornaam": "Ann" }))
        .await
        .expect("local validation");
    assert!(valid.is_valid);
    assert_eq!(valid.required_properties, vec!["Voornaam".to_string()]);
}

#[tokio::test]
async fn validate_payload_rejects_bad_endpoint() {
    let config = GenesysConfig::default();
    let err = validate_payload(&config, Some("ftp://localhost"), template(), &json!({}))
        .await
        .expect_err("invalid endpoint");
    assert!(!err.to_string().is_empty());
}

// ============================================================================
// SECTION: Argument Parsing
// ============================================================================

#[test]
fn cli_parses_subcommands() {
    let cli = Cli::try_parse_from(["genesys", "fields", "--schema", "form.json", "--format", "text"])
        .expect("parse fields");
    match cli.command {
        Commands::Fields(command) => assert_eq!(command.format, FieldsFormat::Text),
        other => panic!("unexpected command: {other:?}"),
    }

    let cli = Cli::try_parse_from([
        "genesys",
        "validate",
        "--schema",
        "form.json",
        "--payload",
        "data.json",
        "--endpoint",
        "http://127.0.0.1:8000/api/json-schema-validation/",
    ])
    .expect("parse validate");
    assert!(matches!(cli.command, Commands::Validate(ref command) if command.endpoint.is_some()));

    assert!(Cli::try_parse_from(["genesys", "flatten", "--schema", "form.json"]).is_err());
}
