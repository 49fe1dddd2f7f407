// crates/genesys-core/src/schema/reference.rs
// ============================================================================
// Module: Reference Resolver
// Description: Parses `$ref` strings and looks them up in a definitions map.
// Purpose: Provide a single, non-recursive reference lookup step.
// Dependencies: crate::diagnostics, serde_json, thiserror
// ============================================================================

//! ## Overview
//! A reference such as `#/definitions/Address` or `#/$defs/Address` is parsed
//! into JSON Pointer segments. The definition key is the segment that follows
//! the `definitions` or `$defs` anchor and it must be the final segment; any
//! other shape is rejected as malformed instead of guessing a key.
//!
//! [`SchemaResolver::try_resolve`] returns a typed outcome so each call site
//! chooses whether to propagate or absorb. [`SchemaResolver::resolve`] is the
//! absorbing form: it reports a diagnostic and yields `None`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde_json::Value;
use thiserror::Error;

use super::definitions::DefinitionsMap;
use crate::diagnostics::DiagnosticSink;
use crate::diagnostics::SchemaDiagnostic;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Pointer segments that introduce a definition key.
const DEFINITION_ANCHORS: [&str; 2] = ["definitions", "$defs"];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Reference resolution failures.
///
/// # Invariants
/// - Variants are stable for diagnostics and tests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    /// The reference does not end in `definitions/<key>` or `$defs/<key>`.
    #[error("malformed schema reference: {reference}")]
    MalformedPath {
        /// Raw reference string.
        reference: String,
    },
    /// The definition key has no entry in the definitions map.
    #[error("key {key} does not exist in definitions (reference {reference})")]
    UnknownDefinition {
        /// Raw reference string.
        reference: String,
        /// Definition key extracted from the reference.
        key: String,
    },
}

impl ReferenceError {
    /// Converts the error into its diagnostic form.
    #[must_use]
    pub fn to_diagnostic(&self) -> SchemaDiagnostic {
        match self {
            Self::MalformedPath {
                reference,
            } => SchemaDiagnostic::MalformedReference {
                reference: reference.clone(),
            },
            Self::UnknownDefinition {
                reference,
                key,
            } => SchemaDiagnostic::UnknownDefinition {
                reference: reference.clone(),
                key: key.clone(),
            },
        }
    }
}

// ============================================================================
// SECTION: Types
// ============================================================================

/// Parsed `$ref` pointing into a definitions map.
///
/// # Invariants
/// - `key` is non-empty and was the final pointer segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefPath {
    /// Raw reference string.
    raw: String,
    /// Unescaped definition key.
    key: String,
}

impl RefPath {
    /// Parses a reference string into a definition key.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceError::MalformedPath`] when the reference has no
    /// definitions anchor, the key is empty, or segments follow the key.
    pub fn parse(reference: &str) -> Result<Self, ReferenceError> {
        let malformed = || ReferenceError::MalformedPath {
            reference: reference.to_string(),
        };
        let pointer = reference.strip_prefix('#').unwrap_or(reference);
        let pointer = pointer.strip_prefix('/').unwrap_or(pointer);
        let segments: Vec<String> = pointer.split('/').map(unescape_segment).collect();
        let anchor = segments
            .iter()
            .position(|segment| DEFINITION_ANCHORS.contains(&segment.as_str()))
            .ok_or_else(malformed)?;
        let key_index = anchor + 1;
        if key_index + 1 != segments.len() {
            return Err(malformed());
        }
        let key = segments[key_index].clone();
        if key.is_empty() {
            return Err(malformed());
        }
        Ok(Self {
            raw: reference.to_string(),
            key,
        })
    }

    /// Returns the raw reference string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the definition key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for RefPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Single-step resolver over a borrowed definitions map.
#[derive(Clone, Copy)]
pub struct SchemaResolver<'a> {
    /// Definitions the references point into.
    definitions: &'a DefinitionsMap,
    /// Sink for absorbed failures.
    diagnostics: &'a dyn DiagnosticSink,
}

impl<'a> SchemaResolver<'a> {
    /// Creates a resolver over `definitions`.
    #[must_use]
    pub fn new(definitions: &'a DefinitionsMap, diagnostics: &'a dyn DiagnosticSink) -> Self {
        Self {
            definitions,
            diagnostics,
        }
    }

    /// Returns the definitions map.
    #[must_use]
    pub const fn definitions(&self) -> &'a DefinitionsMap {
        self.definitions
    }

    /// Returns the diagnostic sink.
    #[must_use]
    pub fn diagnostics(&self) -> &'a dyn DiagnosticSink {
        self.diagnostics
    }

    /// Resolves a raw reference string.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceError`] when the reference is malformed or unknown.
    pub fn try_resolve(&self, reference: &str) -> Result<&'a Value, ReferenceError> {
        let path = RefPath::parse(reference)?;
        self.try_resolve_path(&path)
    }

    /// Resolves an already parsed reference.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceError::UnknownDefinition`] when the key is absent.
    pub fn try_resolve_path(&self, path: &RefPath) -> Result<&'a Value, ReferenceError> {
        lookup(self.definitions, path)
    }

    /// Resolves a reference, reporting a diagnostic and returning `None` on failure.
    #[must_use]
    pub fn resolve(&self, reference: &str) -> Option<&'a Value> {
        match self.try_resolve(reference) {
            Ok(schema) => Some(schema),
            Err(err) => {
                self.diagnostics.report(err.to_diagnostic());
                None
            }
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Looks a parsed reference up in `definitions`.
pub(crate) fn lookup<'a>(
    definitions: &'a DefinitionsMap,
    path: &RefPath,
) -> Result<&'a Value, ReferenceError> {
    definitions.get(path.key()).ok_or_else(|| ReferenceError::UnknownDefinition {
        reference: path.as_str().to_string(),
        key: path.key().to_string(),
    })
}

/// Unescapes a JSON Pointer segment.
fn unescape_segment(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

#[cfg(test)]
mod tests {
    //! Unit tests for reference parsing.
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only assertions.")]

    use super::RefPath;
    use super::ReferenceError;

    #[test]
    fn parses_definitions_and_defs_anchors() {
        assert_eq!(RefPath::parse("#/definitions/Address").unwrap().key(), "Address");
        assert_eq!(RefPath::parse("#/$defs/Address").unwrap().key(), "Address");
        assert_eq!(RefPath::parse("/definitions/Address").unwrap().key(), "Address");
    }

    #[test]
    fn unescapes_pointer_segments() {
        assert_eq!(RefPath::parse("#/definitions/a~1b~0c").unwrap().key(), "a/b~c");
    }

    #[test]
    fn keys_off_the_anchor_not_a_fixed_index() {
        let path = RefPath::parse("#/components/definitions/Nested").unwrap();
        assert_eq!(path.key(), "Nested");
    }

    #[test]
    fn rejects_unexpected_shapes() {
        for reference in [
            "#/properties/name",
            "#/definitions",
            "#/definitions/",
            "#/definitions/Outer/properties/inner",
            "",
        ] {
            assert_eq!(
                RefPath::parse(reference),
                Err(ReferenceError::MalformedPath {
                    reference: reference.to_string(),
                }),
                "reference {reference:?}"
            );
        }
    }
}
