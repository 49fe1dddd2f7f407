// crates/genesys-core/src/schema/flatten.rs
// ============================================================================
// Module: Schema Flattener
// Description: Follows `$ref` chains down to a concrete schema.
// Purpose: Give renderers the effective schema of a single field.
// Dependencies: crate::diagnostics, serde_json, thiserror
// ============================================================================

//! ## Overview
//! An array schema is flattened through `items.$ref`; any other schema through
//! its own `$ref`. Each step consumes one definition key and a pass never
//! visits the same key twice, so an acyclic chain ends after at most one step
//! per definition and a cyclic chain fails with
//! [`FlattenError::CyclicReference`].
//!
//! Unknown or malformed references and tuple-typed `items` are absorbed: a
//! diagnostic is reported and the input schema is returned unchanged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde_json::Value;
use thiserror::Error;

use super::definitions::DefinitionsMap;
use super::reference::RefPath;
use super::reference::lookup;
use crate::diagnostics::DiagnosticSink;
use crate::diagnostics::SchemaDiagnostic;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Flattening failures that must reach the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlattenError {
    /// A reference is present but no definitions were supplied.
    #[error("field has properties defined in reference {reference}, but there are no definitions")]
    MissingDefinitions {
        /// Raw reference string.
        reference: String,
    },
    /// The reference chain revisits a definition.
    #[error("cyclic schema reference: {reference}")]
    CyclicReference {
        /// Raw reference string that closed the cycle.
        reference: String,
    },
}

// ============================================================================
// SECTION: Types
// ============================================================================

/// Next action for one flattening step.
enum Step<'a> {
    /// The schema carries no reference.
    Done,
    /// The schema uses tuple-typed `items`.
    Tuple,
    /// The schema points at a definition.
    Follow(&'a str),
}

// ============================================================================
// SECTION: Flattening
// ============================================================================

/// Substitutes references in `schema` until a schema without `$ref` remains.
///
/// A schema without a reference is returned as is.
///
/// # Errors
///
/// Returns [`FlattenError::MissingDefinitions`] when a reference is present
/// and `definitions` is `None`, and [`FlattenError::CyclicReference`] when the
/// chain revisits a definition key.
pub fn flatten_schema<'a>(
    schema: &'a Value,
    definitions: Option<&'a DefinitionsMap>,
    diagnostics: &dyn DiagnosticSink,
) -> Result<&'a Value, FlattenError> {
    let mut current = schema;
    let mut visited = BTreeSet::new();
    loop {
        let reference = match next_step(current) {
            Step::Done => return Ok(current),
            Step::Tuple => {
                diagnostics.report(SchemaDiagnostic::TupleItemsUnsupported);
                return Ok(schema);
            }
            Step::Follow(reference) => reference,
        };
        let Some(definitions) = definitions else {
            return Err(FlattenError::MissingDefinitions {
                reference: reference.to_string(),
            });
        };
        let outcome = RefPath::parse(reference).and_then(|path| {
            let resolved = lookup(definitions, &path)?;
            Ok((path, resolved))
        });
        let (path, resolved) = match outcome {
            Ok(found) => found,
            Err(err) => {
                diagnostics.report(err.to_diagnostic());
                return Ok(schema);
            }
        };
        if !visited.insert(path.key().to_string()) {
            return Err(FlattenError::CyclicReference {
                reference: reference.to_string(),
            });
        }
        current = resolved;
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Determines where the next reference of `schema` lives.
fn next_step(schema: &Value) -> Step<'_> {
    match schema.get("items") {
        Some(Value::Bool(_)) => return Step::Done,
        Some(Value::Array(_)) => return Step::Tuple,
        _ => {}
    }
    let holder = if schema.get("type").and_then(Value::as_str) == Some("array") {
        schema.get("items")
    } else {
        Some(schema)
    };
    holder.and_then(|node| node.get("$ref")).and_then(Value::as_str).map_or(Step::Done, Step::Follow)
}
