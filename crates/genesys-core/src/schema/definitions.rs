// crates/genesys-core/src/schema/definitions.rs
// ============================================================================
// Module: Schema Definitions
// Description: Access to the reusable schema fragments of a root schema.
// Purpose: Locate the definitions map a template's references point into.
// Dependencies: serde_json
// ============================================================================

use serde_json::Map;
use serde_json::Value;

/// Named schema fragments keyed by definition name.
pub type DefinitionsMap = Map<String, Value>;

/// Returns the definitions map carried by `schema`.
///
/// `definitions` takes precedence; `$defs` is used when it is absent. A
/// non-object value under either key is treated as absent.
#[must_use]
pub fn definitions_of(schema: &Value) -> Option<&DefinitionsMap> {
    schema
        .get("definitions")
        .and_then(Value::as_object)
        .or_else(|| schema.get("$defs").and_then(Value::as_object))
}
