// crates/genesys-core/src/diagnostics.rs
// ============================================================================
// Module: Schema Diagnostics
// Description: Structured diagnostics for absorbed schema resolution failures.
// Purpose: Report degraded resolution steps without aborting extraction.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Resolution steps that degrade instead of failing (an unknown definition key,
//! a tuple-typed `items`, a cyclic `allOf` branch) report a
//! [`SchemaDiagnostic`] through a [`DiagnosticSink`]. Sinks emit JSON lines so
//! deployments can route them into their own log pipeline.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Diagnostic raised by an absorbed resolution or validation step.
///
/// # Invariants
/// - Variants are stable for log classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaDiagnostic {
    /// A `$ref` key has no entry in the definitions map.
    UnknownDefinition {
        /// Raw reference string.
        reference: String,
        /// Definition key extracted from the reference.
        key: String,
    },
    /// A `$ref` string does not point into `definitions` or `$defs`.
    MalformedReference {
        /// Raw reference string.
        reference: String,
    },
    /// An array schema uses the tuple form of `items`.
    TupleItemsUnsupported,
    /// A reference chain revisits a definition.
    CyclicReference {
        /// Raw reference string that closed the cycle.
        reference: String,
    },
    /// A property schema is neither an object nor a boolean.
    InvalidPropertySchema {
        /// Property name.
        field_name: String,
    },
    /// A validation error has no readable message parser.
    UnparsedValidationError {
        /// Raw validator message.
        message: String,
        /// Failing keyword, when known.
        validator: Option<String>,
        /// JSON pointer into the schema.
        schema_path: String,
    },
    /// A `required` error did not name a property.
    RequiredPropertyNotFound {
        /// Raw validator message.
        message: String,
    },
}

/// JSON-line envelope for a diagnostic.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticEvent<'a> {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Diagnostic payload.
    #[serde(flatten)]
    pub diagnostic: &'a SchemaDiagnostic,
}

impl<'a> DiagnosticEvent<'a> {
    /// Wraps a diagnostic with a consistent timestamp.
    #[must_use]
    pub fn new(diagnostic: &'a SchemaDiagnostic) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event: "schema_diagnostic",
            timestamp_ms,
            diagnostic,
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Sink for schema diagnostics.
pub trait DiagnosticSink: Send + Sync {
    /// Records a diagnostic.
    fn report(&self, diagnostic: SchemaDiagnostic);
}

/// Diagnostic sink that logs JSON lines to stderr.
pub struct StderrDiagnosticSink;

impl DiagnosticSink for StderrDiagnosticSink {
    fn report(&self, diagnostic: SchemaDiagnostic) {
        if let Ok(payload) = serde_json::to_string(&DiagnosticEvent::new(&diagnostic)) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// No-op diagnostic sink.
pub struct NoopDiagnosticSink;

impl DiagnosticSink for NoopDiagnosticSink {
    fn report(&self, _diagnostic: SchemaDiagnostic) {}
}

/// In-memory diagnostic sink.
///
/// # Invariants
/// - Diagnostics are kept in report order.
#[derive(Default)]
pub struct DiagnosticLog {
    /// Collected diagnostics.
    entries: Mutex<Vec<SchemaDiagnostic>>,
}

impl DiagnosticLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the collected diagnostics.
    #[must_use]
    pub fn entries(&self) -> Vec<SchemaDiagnostic> {
        self.entries.lock().map(|entries| entries.clone()).unwrap_or_default()
    }

    /// Returns true when nothing has been reported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().map(|entries| entries.is_empty()).unwrap_or(true)
    }
}

impl DiagnosticSink for DiagnosticLog {
    fn report(&self, diagnostic: SchemaDiagnostic) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(diagnostic);
        }
    }
}
