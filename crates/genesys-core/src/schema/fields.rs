// crates/genesys-core/src/schema/fields.rs
// ============================================================================
// Module: Field Extractor
// Description: Derives an ordered field list from a form template schema.
// Purpose: Produce the renderable fields a form session tracks.
// Dependencies: crate::diagnostics, crate::payload, serde, serde_json
// ============================================================================

//! ## Overview
//! Fields are emitted in a fixed order:
//! 1. fields inherited through `allOf` references, depth-first in declaration
//!    order;
//! 2. fields of the definition the root `$ref` points at;
//! 3. the root's own `properties`.
//!
//! Steps 1 and 2 only run when the root carries definitions. Unknown
//! references and cyclic inheritance are reported and skipped so the rest of
//! the template still renders. A boolean property schema is not supported and
//! fails the whole extraction.
//!
//! Identically named fields from different branches are not deduplicated.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use super::CHILD_MARKER;
use super::definitions::DefinitionsMap;
use super::definitions::definitions_of;
use super::flatten::FlattenError;
use super::flatten::flatten_schema;
use super::reference::RefPath;
use super::reference::SchemaResolver;
use crate::diagnostics::DiagnosticSink;
use crate::diagnostics::SchemaDiagnostic;
use crate::payload::is_truthy;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Renderable unit derived from one schema property.
///
/// # Invariants
/// - `json_schema_field` is the property schema exactly as declared; it is
///   never flattened during extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    /// Property name.
    pub field_name: String,
    /// Declared property schema.
    pub json_schema_field: Value,
    /// Whether the property carries the child marker.
    pub is_child: bool,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Extraction failures that abort the pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// A property schema is a boolean.
    #[error("field {field_name} is a boolean schema, this is not implemented")]
    BooleanProperty {
        /// Property name.
        field_name: String,
    },
}

// ============================================================================
// SECTION: Extraction
// ============================================================================

/// Extracts the ordered field list of `root`.
///
/// # Errors
///
/// Returns [`ExtractError::BooleanProperty`] when any visited property schema
/// is `true` or `false`.
pub fn extract_fields(
    root: &Value,
    diagnostics: &dyn DiagnosticSink,
) -> Result<Vec<FieldDescriptor>, ExtractError> {
    let mut fields = Vec::new();
    if let Some(definitions) = definitions_of(root) {
        let mut walker = Walker {
            resolver: SchemaResolver::new(definitions, diagnostics),
            chain: Vec::new(),
        };
        walker.from_all_of(root, &mut fields)?;
        walker.from_ref(root, &mut fields)?;
    }
    from_properties(root, diagnostics, &mut fields)?;
    Ok(fields)
}

/// Returns the root's own property names, without inheritance.
#[must_use]
pub fn field_names(root: &Value) -> Vec<String> {
    root.get("properties")
        .and_then(Value::as_object)
        .map(|properties| properties.keys().cloned().collect())
        .unwrap_or_default()
}

/// Returns true when every field's schema declares `type: "object"`.
///
/// An empty field list is paginatable.
#[must_use]
pub fn pagination_possible(fields: &[FieldDescriptor]) -> bool {
    fields
        .iter()
        .all(|field| field.json_schema_field.get("type").and_then(Value::as_str) == Some("object"))
}

/// Returns the flattened schema of a single field.
///
/// # Errors
///
/// Returns [`FlattenError`] when the field references a definition without
/// `definitions` or the reference chain is cyclic.
pub fn properties_of_field<'a>(
    field: &'a FieldDescriptor,
    definitions: Option<&'a DefinitionsMap>,
    diagnostics: &dyn DiagnosticSink,
) -> Result<&'a Value, FlattenError> {
    flatten_schema(&field.json_schema_field, definitions, diagnostics)
}

// ============================================================================
// SECTION: Walker
// ============================================================================

/// Recursive `allOf` and `$ref` walk over the root definitions.
struct Walker<'a> {
    /// Resolver over the root definitions.
    resolver: SchemaResolver<'a>,
    /// Definition keys currently being expanded.
    chain: Vec<String>,
}

impl<'a> Walker<'a> {
    /// Emits fields of every `allOf` entry that is a reference.
    fn from_all_of(
        &mut self,
        schema: &Value,
        fields: &mut Vec<FieldDescriptor>,
    ) -> Result<(), ExtractError> {
        let Some(entries) = schema.get("allOf").and_then(Value::as_array) else {
            return Ok(());
        };
        for entry in entries {
            let Some(reference) = entry.get("$ref").and_then(Value::as_str) else {
                continue;
            };
            let Some((key, resolved)) = self.enter(reference) else {
                continue;
            };
            let outcome = self.from_all_of(resolved, fields).and_then(|()| {
                self.from_ref(resolved, fields)?;
                from_properties(resolved, self.resolver.diagnostics(), fields)
            });
            self.leave(&key);
            outcome?;
        }
        Ok(())
    }

    /// Emits fields of the definition `schema.$ref` points at.
    ///
    /// Only schemas that carry their own definitions are followed; the lookup
    /// still uses the root definitions.
    fn from_ref(
        &mut self,
        schema: &Value,
        fields: &mut Vec<FieldDescriptor>,
    ) -> Result<(), ExtractError> {
        if definitions_of(schema).is_none() {
            return Ok(());
        }
        let Some(reference) = schema.get("$ref").and_then(Value::as_str) else {
            return Ok(());
        };
        let Some((key, resolved)) = self.enter(reference) else {
            return Ok(());
        };
        let outcome = from_properties(resolved, self.resolver.diagnostics(), fields)
            .and_then(|()| self.from_all_of(resolved, fields));
        self.leave(&key);
        outcome
    }

    /// Resolves `reference` and pushes its key onto the expansion chain.
    ///
    /// Returns `None` after reporting when the reference is unknown or already
    /// being expanded.
    fn enter(&mut self, reference: &str) -> Option<(String, &'a Value)> {
        let diagnostics = self.resolver.diagnostics();
        let path = match RefPath::parse(reference) {
            Ok(path) => path,
            Err(err) => {
                diagnostics.report(err.to_diagnostic());
                return None;
            }
        };
        if self.chain.iter().any(|key| key == path.key()) {
            diagnostics.report(SchemaDiagnostic::CyclicReference {
                reference: reference.to_string(),
            });
            return None;
        }
        let resolved = match self.resolver.try_resolve_path(&path) {
            Ok(resolved) => resolved,
            Err(err) => {
                diagnostics.report(err.to_diagnostic());
                return None;
            }
        };
        let key = path.key().to_string();
        self.chain.push(key.clone());
        Some((key, resolved))
    }

    /// Pops `key` off the expansion chain.
    fn leave(&mut self, key: &str) {
        if self.chain.last().is_some_and(|last| last == key) {
            self.chain.pop();
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Emits one descriptor per entry of `schema.properties`.
fn from_properties(
    schema: &Value,
    diagnostics: &dyn DiagnosticSink,
    fields: &mut Vec<FieldDescriptor>,
) -> Result<(), ExtractError> {
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Ok(());
    };
    for (field_name, property) in properties {
        match property {
            Value::Bool(_) => {
                return Err(ExtractError::BooleanProperty {
                    field_name: field_name.clone(),
                });
            }
            Value::Object(attributes) => {
                let is_child = attributes.get(CHILD_MARKER).is_some_and(is_truthy);
                fields.push(FieldDescriptor {
                    field_name: field_name.clone(),
                    json_schema_field: property.clone(),
                    is_child,
                });
            }
            _ => diagnostics.report(SchemaDiagnostic::InvalidPropertySchema {
                field_name: field_name.clone(),
            }),
        }
    }
    Ok(())
}
