// crates/genesys-server/src/audit.rs
// ============================================================================
// Module: Validation Audit Logging
// Description: Structured audit events for HTTP request handling.
// Purpose: Emit one redacted JSON line per request without a logging framework.
// Dependencies: genesys-config, serde
// ============================================================================

//! ## Overview
//! Every request handled by the service produces one [`ValidationAuditEvent`].
//! Events describe the request (route, template name, sizes, status, validity
//! and error count) but never carry schema or payload contents.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use genesys_config::AuditConfig;
use genesys_config::AuditSinkKind;
use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Route classification for audit events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditRoute {
    /// `POST {mount}/json-schema-validation/`.
    JsonSchemaValidation,
    /// `GET {mount}/form-template/{name}`.
    FormTemplate,
    /// `POST {mount}/form-template/{name}/validation`.
    FormTemplateValidation,
}

/// Request outcome classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    /// The request was answered with a result.
    Ok,
    /// The request was rejected.
    Error,
}

/// Request audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Route that handled the request.
    pub route: AuditRoute,
    /// Template name for template routes.
    pub form_name: Option<String>,
    /// Request outcome.
    pub outcome: AuditOutcome,
    /// HTTP status code.
    pub status: u16,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
    /// Request body size in bytes.
    pub request_bytes: usize,
    /// Validity of the payload when validated.
    pub is_valid: Option<bool>,
    /// Number of validation errors when validated.
    pub error_count: Option<usize>,
}

/// Inputs for [`ValidationAuditEvent::new`].
#[derive(Debug, Clone)]
pub struct ValidationAuditEventParams {
    /// Route that handled the request.
    pub route: AuditRoute,
    /// Template name for template routes.
    pub form_name: Option<String>,
    /// HTTP status code.
    pub status: u16,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
    /// Request body size in bytes.
    pub request_bytes: usize,
    /// Validity of the payload when validated.
    pub is_valid: Option<bool>,
    /// Number of validation errors when validated.
    pub error_count: Option<usize>,
}

impl ValidationAuditEvent {
    /// Creates a new audit event with a consistent timestamp.
    #[must_use]
    pub fn new(params: ValidationAuditEventParams) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        let outcome = if params.error_kind.is_some() { AuditOutcome::Error } else { AuditOutcome::Ok };
        Self {
            event: "validation_request",
            timestamp_ms,
            route: params.route,
            form_name: params.form_name,
            outcome,
            status: params.status,
            error_kind: params.error_kind,
            request_bytes: params.request_bytes,
            is_valid: params.is_valid,
            error_count: params.error_count,
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink for request events.
pub trait ValidationAuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: &ValidationAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl ValidationAuditSink for StderrAuditSink {
    fn record(&self, event: &ValidationAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that appends JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl ValidationAuditSink for FileAuditSink {
    fn record(&self, event: &ValidationAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl ValidationAuditSink for NoopAuditSink {
    fn record(&self, _event: &ValidationAuditEvent) {}
}

/// Builds the sink selected by `config`.
///
/// # Errors
///
/// Returns an error when the file sink cannot open its log file.
pub fn audit_sink_from_config(config: &AuditConfig) -> io::Result<Arc<dyn ValidationAuditSink>> {
    match (config.sink, config.path.as_deref()) {
        (AuditSinkKind::Stderr, _) => Ok(Arc::new(StderrAuditSink)),
        (AuditSinkKind::None, _) => Ok(Arc::new(NoopAuditSink)),
        (AuditSinkKind::File, Some(path)) => Ok(Arc::new(FileAuditSink::new(Path::new(path.trim()))?)),
        (AuditSinkKind::File, None) => {
            Err(io::Error::new(io::ErrorKind::InvalidInput, "audit.path is required for the file sink"))
        }
    }
}
