// crates/genesys-validation/src/lib.rs
// ============================================================================
// Module: Genesys Validation Library
// Description: Payload validation against JSON Schema form templates.
// Purpose: Serve the validation contract consumed by form sessions.
// Dependencies: genesys-core, jsonschema
// ============================================================================

//! ## Overview
//! The validation engine checks a payload against a form template (draft
//! 2020-12) and reports each violation with its schema location and a Dutch
//! user-facing message. Full evaluation additionally adjusts read-only fields
//! and computes which properties are still required, including properties
//! that only become required once another answer is given.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod engine;
pub mod evaluate;
pub mod messages;
pub mod path;
pub mod readonly;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use engine::EngineOptions;
pub use engine::PayloadValidator;
pub use engine::ValidationEngine;
pub use engine::ValidationEngineError;
pub use evaluate::MAX_DYNAMIC_REQUIRED_KEYS;
pub use evaluate::evaluate;
pub use messages::readable_message;
pub use messages::required_property;
pub use path::SchemaLocation;
pub use readonly::adjust_readonly;
