// crates/genesys-core/src/lib.rs
// ============================================================================
// Module: Genesys Core Library
// Description: Public API surface for the Genesys form engine core.
// Purpose: Expose schema resolution, field extraction, and wire types.
// Dependencies: crate::{schema, payload, validation, diagnostics}
// ============================================================================

//! ## Overview
//! Genesys core turns a JSON Schema form template into a flat, order-stable list
//! of renderable fields. It resolves `$ref` pointers against the template's
//! definitions, walks `allOf` inheritance, and defines the payload and
//! validation-result shapes shared by the validation service and its clients.
//!
//! Schemas are read-only inputs: nothing in this crate mutates a schema.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod diagnostics;
pub mod payload;
pub mod schema;
pub mod validation;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use diagnostics::DiagnosticEvent;
pub use diagnostics::DiagnosticLog;
pub use diagnostics::DiagnosticSink;
pub use diagnostics::NoopDiagnosticSink;
pub use diagnostics::SchemaDiagnostic;
pub use diagnostics::StderrDiagnosticSink;
pub use payload::Payload;
pub use payload::ValuePresence;
pub use payload::is_truthy;
pub use schema::CHILD_MARKER;
pub use schema::DefinitionsMap;
pub use schema::ExtractError;
pub use schema::FieldDescriptor;
pub use schema::FlattenError;
pub use schema::RefPath;
pub use schema::ReferenceError;
pub use schema::SchemaResolver;
pub use schema::definitions_of;
pub use schema::extract_fields;
pub use schema::field_names;
pub use schema::flatten_schema;
pub use schema::pagination_possible;
pub use schema::properties_of_field;
pub use validation::PayloadValidationError;
pub use validation::SchemaKeyword;
pub use validation::SchemaPathSegment;
pub use validation::ValidationRequest;
pub use validation::ValidationResult;
