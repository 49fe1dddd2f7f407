// crates/genesys-config/tests/load_validation.rs
// =============================================================================
// Module: Config Load Validation Tests
// Description: Loading genesys.toml from disk and fail-closed validation.
// Purpose: Ensure defaults, limits, and cross-field rules are enforced.
// =============================================================================

//! Load and validation tests for genesys-config.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic_in_result_fn,
    clippy::use_debug,
    reason = "Test-only assertions use unwrap/expect for clarity."
)]

use std::io::Write;
use std::time::Duration;

use genesys_config::AuditSinkKind;
use genesys_config::ConfigError;
use genesys_config::GenesysConfig;
use genesys_core::ValuePresence;
use genesys_forms::ResponseOrdering;

type TestResult = Result<(), String>;

/// Assert that parsing fails with a message containing `needle`.
fn assert_invalid(toml: &str, needle: &str) -> TestResult {
    match GenesysConfig::from_bytes(toml.as_bytes()) {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error '{message}' did not contain '{needle}'"))
            }
        }
        Ok(_) => Err(format!("expected invalid config for {toml:?}")),
    }
}

#[test]
fn empty_file_yields_defaults() -> TestResult {
    let config = GenesysConfig::from_bytes(b"").map_err(|err| err.to_string())?;
    assert_eq!(config.server.bind, "127.0.0.1:8080");
    assert_eq!(config.server.mount_path, "/api");
    assert_eq!(config.server.max_body_bytes, 1024 * 1024);
    assert!(config.validation.adjust_readonly);
    assert!(config.validation.dynamic_required);
    assert_eq!(config.audit.sink, AuditSinkKind::Stderr);
    assert_eq!(config.client.ordering, ResponseOrdering::LatestIssued);
    assert_eq!(config.client.value_presence, ValuePresence::Truthy);
    assert!(config.form_templates.is_empty());
    Ok(())
}

#[test]
fn full_file_loads_from_disk() -> TestResult {
    let mut file = tempfile::NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(
        br#"
[server]
bind = "0.0.0.0:9000"
mount_path = "/forms"
max_body_bytes = 4096

[validation]
dynamic_required = false

[audit]
sink = "none"

[client]
endpoint = "https://validation.example/api/json-schema-validation/"
connect_timeout_ms = 250
request_timeout_ms = 2000
bearer_token = "token-123"
ordering = "arrival"
value_presence = "present"

[[form_templates]]
name = "Intake"
path = "templates/intake.json"
"#,
    )
    .map_err(|err| err.to_string())?;

    let config = GenesysConfig::load(Some(file.path())).map_err(|err| err.to_string())?;
    assert_eq!(config.server.bind_addr().map_err(|err| err.to_string())?.port(), 9000);
    assert_eq!(config.server.route_prefix(), "/forms");
    assert!(config.validation.engine_options().adjust_readonly);
    assert!(!config.validation.engine_options().dynamic_required);
    assert_eq!(config.audit.sink, AuditSinkKind::None);
    assert_eq!(config.client.ordering, ResponseOrdering::Arrival);
    assert_eq!(config.client.value_presence, ValuePresence::Present);
    assert_eq!(config.form_template("Intake").map(|entry| entry.path.as_str()), Some("templates/intake.json"));

    let service = config.client.service_config(None).map_err(|err| err.to_string())?;
    assert_eq!(service.bearer_token.as_deref(), Some("token-123"));
    assert_eq!(service.connect_timeout, Duration::from_millis(250));
    assert_eq!(service.request_timeout, Duration::from_millis(2000));
    let override_endpoint =
        config.client.service_config(Some("http://127.0.0.1:1/v")).map_err(|err| err.to_string())?;
    assert_eq!(override_endpoint.endpoint, "http://127.0.0.1:1/v");
    Ok(())
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let result = GenesysConfig::load(Some(&dir.path().join("absent.toml")));
    assert!(matches!(result, Err(ConfigError::Io(_))));
}

#[test]
fn malformed_toml_is_parse_error() {
    let result = GenesysConfig::from_bytes(b"[server\nbind = 1");
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[test]
fn oversized_and_non_utf8_files_are_rejected() -> TestResult {
    let big = vec![b'#'; 1024 * 1024 + 1];
    match GenesysConfig::from_bytes(&big) {
        Err(ConfigError::Invalid(message)) if message.contains("size limit") => {}
        other => return Err(format!("unexpected result: {other:?}")),
    }
    match GenesysConfig::from_bytes(&[0xff, 0xfe]) {
        Err(ConfigError::Invalid(message)) if message.contains("utf-8") => Ok(()),
        other => Err(format!("unexpected result: {other:?}")),
    }
}

#[test]
fn server_limits_are_enforced() -> TestResult {
    assert_invalid("[server]\nbind = \"localhost\"", "server.bind")?;
    assert_invalid("[server]\nmount_path = \"api\"", "start with /")?;
    assert_invalid("[server]\nmount_path = \"/api/\"", "not end with /")?;
    assert_invalid("[server]\nmax_body_bytes = 1023", "max_body_bytes")?;
    assert_invalid("[server]\nmax_body_bytes = 16777217", "max_body_bytes")?;
    GenesysConfig::from_bytes(b"[server]\nmax_body_bytes = 1024").map_err(|err| err.to_string())?;
    GenesysConfig::from_bytes(b"[server]\nmax_body_bytes = 16777216").map_err(|err| err.to_string())?;
    Ok(())
}

#[test]
fn client_limits_are_enforced() -> TestResult {
    assert_invalid("[client]\nendpoint = \"ftp://example\"", "client.endpoint")?;
    assert_invalid("[client]\nconnect_timeout_ms = 99", "connect_timeout_ms")?;
    assert_invalid("[client]\nconnect_timeout_ms = 10001", "connect_timeout_ms")?;
    assert_invalid("[client]\nrequest_timeout_ms = 499", "request_timeout_ms")?;
    assert_invalid("[client]\nrequest_timeout_ms = 60001", "request_timeout_ms")?;
    assert_invalid("[client]\nbearer_token = \"  \"", "bearer_token")?;
    assert_invalid("[client]\nordering = \"random\"", "config parse error")?;
    Ok(())
}

#[test]
fn audit_file_sink_requires_path() -> TestResult {
    assert_invalid("[audit]\nsink = \"file\"", "audit.path")?;
    let config = GenesysConfig::from_bytes(b"[audit]\nsink = \"file\"\npath = \"audit.jsonl\"")
        .map_err(|err| err.to_string())?;
    assert_eq!(config.audit.path.as_deref(), Some("audit.jsonl"));
    Ok(())
}

#[test]
fn form_template_names_are_unique_and_non_empty() -> TestResult {
    assert_invalid("[[form_templates]]\nname = \" \"\npath = \"a.json\"", "non-empty")?;
    assert_invalid("[[form_templates]]\nname = \"A\"\npath = \"\"", "form_templates.path")?;
    assert_invalid(
        "[[form_templates]]\nname = \"A\"\npath = \"a.json\"\n\n[[form_templates]]\nname = \"A\"\npath = \"b.json\"",
        "duplicate name A",
    )?;
    Ok(())
}

#[test]
fn service_config_needs_an_endpoint() {
    let config = GenesysConfig::default();
    assert!(matches!(config.client.service_config(None), Err(ConfigError::Invalid(_))));
}
