// crates/genesys-validation/src/engine.rs
// ============================================================================
// Module: Validation Engine
// Description: Compiled payload validators and the engine facade.
// Purpose: Validate payloads against form templates with typed outcomes.
// Dependencies: genesys-core, jsonschema, serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`PayloadValidator`] compiles one schema (draft 2020-12, format assertions
//! enabled) and turns each violation into a
//! [`genesys_core::PayloadValidationError`]. [`ValidationEngine`] is the
//! facade used by the HTTP service and in-process clients; it compiles per
//! request and applies [`EngineOptions`].
//!
//! Schemas and payloads are untrusted input: an uncompilable schema and a
//! non-object payload are rejected with [`ValidationEngineError`]. Only
//! references inside the submitted schema resolve; any `$ref` to an external
//! document (`file://`, `http(s)://`, ...) fails compilation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use genesys_core::DiagnosticSink;
use genesys_core::PayloadValidationError;
use genesys_core::SchemaKeyword;
use genesys_core::ValidationRequest;
use genesys_core::ValidationResult;
use jsonschema::Draft;
use jsonschema::Retrieve;
use jsonschema::Uri;
use jsonschema::Validator;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::evaluate::evaluate;
use crate::messages::readable_message;
use crate::messages::required_property;
use crate::path::SchemaLocation;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Validation engine errors.
///
/// # Invariants
/// - Variants are stable for HTTP status mapping.
#[derive(Debug, Error)]
pub enum ValidationEngineError {
    /// The schema could not be compiled.
    #[error("invalid json schema: {0}")]
    InvalidSchema(String),
    /// The payload is not a JSON object.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

// ============================================================================
// SECTION: Options
// ============================================================================

/// Switches for full evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineOptions {
    /// Set read-only properties to `true` before validating.
    pub adjust_readonly: bool,
    /// Check which answered properties would become required when removed.
    pub dynamic_required: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            adjust_readonly: true,
            dynamic_required: true,
        }
    }
}

// ============================================================================
// SECTION: Retriever
// ============================================================================

/// Retriever refusing every external document.
struct LocalOnlyRetriever;

impl Retrieve for LocalOnlyRetriever {
    fn retrieve(
        &self,
        uri: &Uri<String>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        Err(format!("external reference not allowed: {}", uri.as_str()).into())
    }
}

// ============================================================================
// SECTION: Validator
// ============================================================================

/// Schema compiled for repeated payload validation.
pub struct PayloadValidator {
    /// Source schema, kept for location lookups.
    schema: Value,
    /// Compiled validator.
    compiled: Validator,
    /// Sink for unparsed messages.
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl PayloadValidator {
    /// Compiles `schema`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationEngineError::InvalidSchema`] when the schema does
    /// not compile.
    pub fn new(
        schema: Value,
        diagnostics: Arc<dyn DiagnosticSink>,
    ) -> Result<Self, ValidationEngineError> {
        let compiled = jsonschema::options()
            .with_draft(Draft::Draft202012)
            .should_validate_formats(true)
            .with_retriever(LocalOnlyRetriever)
            .build(&schema)
            .map_err(|err| ValidationEngineError::InvalidSchema(err.to_string()))?;
        Ok(Self {
            schema,
            compiled,
            diagnostics,
        })
    }

    /// Returns the source schema.
    #[must_use]
    pub const fn schema(&self) -> &Value {
        &self.schema
    }

    /// Validates `payload` as is.
    ///
    /// `required_properties` lists the property of each `required` violation.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationEngineError::InvalidPayload`] when `payload` is not
    /// an object.
    pub fn validate(&self, payload: &Value) -> Result<ValidationResult, ValidationEngineError> {
        ensure_object(payload)?;
        Ok(self.check(payload))
    }

    /// Validates a payload already known to be an object.
    pub(crate) fn check(&self, payload: &Value) -> ValidationResult {
        let validation_errors = self.errors(payload);
        let required_properties = required_of(&validation_errors);
        ValidationResult {
            is_valid: validation_errors.is_empty(),
            validation_errors,
            required_properties,
        }
    }

    /// Returns the properties `payload` is missing.
    pub(crate) fn missing(&self, payload: &Value) -> Vec<String> {
        self.compiled
            .iter_errors(payload)
            .filter(|err| err.schema_path.as_str().ends_with("/required"))
            .filter_map(|err| required_property(&err.to_string()))
            .collect()
    }

    /// Converts every violation of `payload`.
    fn errors(&self, payload: &Value) -> Vec<PayloadValidationError> {
        self.compiled
            .iter_errors(payload)
            .map(|err| {
                let message = err.to_string();
                let location = SchemaLocation::resolve(&self.schema, err.schema_path.as_str());
                let readable_message =
                    readable_message(&message, &err.instance, &location, self.diagnostics.as_ref());
                PayloadValidationError {
                    validator: location.keyword(),
                    absolute_schema_path: location.segments,
                    message,
                    readable_message,
                }
            })
            .collect()
    }
}

// ============================================================================
// SECTION: Engine
// ============================================================================

/// Request-level validation facade.
#[derive(Clone)]
pub struct ValidationEngine {
    /// Evaluation switches.
    options: EngineOptions,
    /// Sink for unparsed messages.
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl ValidationEngine {
    /// Creates an engine.
    #[must_use]
    pub fn new(options: EngineOptions, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            options,
            diagnostics,
        }
    }

    /// Compiles `schema` with this engine's diagnostics.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationEngineError::InvalidSchema`] when the schema does
    /// not compile.
    pub fn compile(&self, schema: Value) -> Result<PayloadValidator, ValidationEngineError> {
        PayloadValidator::new(schema, Arc::clone(&self.diagnostics))
    }

    /// Plain validation of the request payload.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationEngineError`] for an invalid schema or payload.
    pub fn validate(
        &self,
        request: &ValidationRequest,
    ) -> Result<ValidationResult, ValidationEngineError> {
        self.compile(request.jsonschema.clone())?.validate(&request.payload)
    }

    /// Full evaluation of the request payload.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationEngineError`] for an invalid schema or payload.
    pub fn evaluate(
        &self,
        request: &ValidationRequest,
    ) -> Result<ValidationResult, ValidationEngineError> {
        let validator = self.compile(request.jsonschema.clone())?;
        evaluate(&validator, &request.payload, self.options)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Rejects non-object payloads.
pub(crate) fn ensure_object(payload: &Value) -> Result<(), ValidationEngineError> {
    if payload.is_object() {
        Ok(())
    } else {
        Err(ValidationEngineError::InvalidPayload(format!(
            "payload must be a JSON object, got {}",
            kind_of(payload)
        )))
    }
}

/// Lists the property of each `required` violation.
fn required_of(errors: &[PayloadValidationError]) -> Vec<String> {
    errors
        .iter()
        .filter(|error| error.validator == Some(SchemaKeyword::Required))
        .filter_map(|error| required_property(&error.message))
        .collect()
}

/// Names the JSON type of `value`.
const fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
