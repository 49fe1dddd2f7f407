// crates/genesys-core/src/schema/mod.rs
// ============================================================================
// Module: Schema Resolution
// Description: Reference resolution, flattening, and field extraction.
// Purpose: Turn a JSON Schema form template into a flat list of fields.
// Dependencies: crate::diagnostics, serde_json
// ============================================================================

//! ## Overview
//! The schema layer is built leaves first:
//! - [`SchemaResolver`] looks a `$ref` up in a definitions map.
//! - [`flatten_schema`] follows a chain of references down to a concrete schema.
//! - [`extract_fields`] walks `allOf` inheritance and `properties` into an
//!   order-stable list of [`FieldDescriptor`] values.
//!
//! Extraction never flattens a field's schema; flattening is applied on demand
//! through [`properties_of_field`].

// ============================================================================
// SECTION: Modules
// ============================================================================

mod definitions;
mod fields;
mod flatten;
mod reference;


// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use definitions::DefinitionsMap;
pub use definitions::definitions_of;
pub use fields::ExtractError;
pub use fields::FieldDescriptor;
pub use fields::extract_fields;
pub use fields::field_names;
pub use fields::pagination_possible;
pub use fields::properties_of_field;
pub use flatten::FlattenError;
pub use flatten::flatten_schema;
pub use reference::RefPath;
pub use reference::ReferenceError;
pub use reference::SchemaResolver;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Non-standard property attribute marking a dependent (child) field.
pub const CHILD_MARKER: &str = "x-is-child";
