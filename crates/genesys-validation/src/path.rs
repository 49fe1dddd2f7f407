// crates/genesys-validation/src/path.rs
// ============================================================================
// Module: Schema Locations
// Description: Converts validator schema pointers into typed path segments.
// Purpose: Report where in the schema a violation was raised.
// Dependencies: genesys-core, serde_json
// ============================================================================

//! ## Overview
//! The validator reports a JSON Pointer into the schema. The pointer is walked
//! alongside the schema itself so a segment that indexes an array becomes an
//! integer and every other segment stays a string. A `$ref` segment hops to
//! the referenced node so the walk can continue into the definition.

// ============================================================================
// SECTION: Imports
// ============================================================================

use genesys_core::SchemaKeyword;
use genesys_core::SchemaPathSegment;
use serde_json::Value;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Resolved location of a failing keyword.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaLocation<'a> {
    /// Typed path segments.
    pub segments: Vec<SchemaPathSegment>,
    /// Keyword value at the location, when the walk could follow it.
    pub node: Option<&'a Value>,
    /// Schema that holds the keyword.
    pub parent: Option<&'a Value>,
}

impl<'a> SchemaLocation<'a> {
    /// Walks `pointer` through `root`.
    #[must_use]
    pub fn resolve(root: &'a Value, pointer: &str) -> Self {
        let mut segments = Vec::new();
        let mut node = Some(root);
        let mut parent = None;
        for raw in pointer.split('/').skip(1) {
            let segment = raw.replace("~1", "/").replace("~0", "~");
            parent = node;
            if segment == "$ref" {
                node = node
                    .and_then(|current| current.get("$ref"))
                    .and_then(Value::as_str)
                    .and_then(|reference| local_target(root, reference));
                segments.push(SchemaPathSegment::Key(segment));
                continue;
            }
            match (node, segment.parse::<u64>()) {
                (Some(Value::Array(items)), Ok(index)) => {
                    node = usize::try_from(index).ok().and_then(|index| items.get(index));
                    segments.push(SchemaPathSegment::Index(index));
                }
                (None, Ok(index)) if follows_array_keyword(&segments) => {
                    segments.push(SchemaPathSegment::Index(index));
                }
                (current, _) => {
                    node = current.and_then(|current| current.get(segment.as_str()));
                    segments.push(SchemaPathSegment::Key(segment));
                }
            }
        }
        Self {
            segments,
            node,
            parent,
        }
    }

    /// Returns the last segment in wire spelling.
    #[must_use]
    pub fn keyword_name(&self) -> Option<String> {
        self.segments.last().map(ToString::to_string)
    }

    /// Returns the failing keyword, taken from the last segment.
    #[must_use]
    pub fn keyword(&self) -> Option<SchemaKeyword> {
        match self.segments.last() {
            Some(SchemaPathSegment::Key(key)) => SchemaKeyword::from_keyword(key),
            _ => None,
        }
    }

    /// Renders the path as a `/`-joined string.
    #[must_use]
    pub fn display(&self) -> String {
        self.segments.iter().map(ToString::to_string).collect::<Vec<_>>().join("/")
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Keywords whose value is an array of subschemas.
const ARRAY_KEYWORDS: [&str; 5] = ["allOf", "anyOf", "oneOf", "prefixItems", "items"];

/// Returns true when the previous segment is an array-valued keyword.
fn follows_array_keyword(segments: &[SchemaPathSegment]) -> bool {
    matches!(segments.last(), Some(SchemaPathSegment::Key(key)) if ARRAY_KEYWORDS.contains(&key.as_str()))
}

/// Resolves a document-local reference.
fn local_target<'a>(root: &'a Value, reference: &str) -> Option<&'a Value> {
    reference.strip_prefix('#').and_then(|pointer| root.pointer(pointer))
}

#[cfg(test)]
mod tests {
    //! Unit tests for schema location walking.
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only assertions.")]

    use genesys_core::SchemaKeyword;
    use genesys_core::SchemaPathSegment;
    use serde_json::json;

    use super::SchemaLocation;

    fn key(value: &str) -> SchemaPathSegment {
        SchemaPathSegment::Key(value.to_string())
    }

    #[test]
    fn array_indices_become_integers() {
        let schema = json!({ "allOf": [{ "required": ["a"] }] });
        let location = SchemaLocation::resolve(&schema, "/allOf/0/required");
        assert_eq!(location.segments, vec![key("allOf"), SchemaPathSegment::Index(0), key("required")]);
        assert_eq!(location.node, Some(&json!(["a"])));
        assert_eq!(location.keyword(), Some(SchemaKeyword::Required));
    }

    #[test]
    fn numeric_property_names_stay_strings() {
        let schema = json!({ "properties": { "2024": { "type": "string" } } });
        let location = SchemaLocation::resolve(&schema, "/properties/2024/type");
        assert_eq!(location.segments, vec![key("properties"), key("2024"), key("type")]);
        assert_eq!(location.node, Some(&json!("string")));
        assert_eq!(location.parent, Some(&json!({ "type": "string" })));
    }

    #[test]
    fn reference_segments_hop_into_definitions() {
        let schema = json!({
            "properties": { "keuze": { "$ref": "#/$defs/Keuze" } },
            "$defs": { "Keuze": { "enum": ["Ja", "Nee"] } }
        });
        let location = SchemaLocation::resolve(&schema, "/properties/keuze/$ref/enum");
        assert_eq!(location.node, Some(&json!(["Ja", "Nee"])));
        assert_eq!(location.display(), "properties/keuze/$ref/enum");
    }

    #[test]
    fn empty_pointer_has_no_keyword() {
        let schema = json!({});
        let location = SchemaLocation::resolve(&schema, "");
        assert!(location.segments.is_empty());
        assert_eq!(location.keyword(), None);
    }
}
