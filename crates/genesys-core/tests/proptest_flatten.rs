// crates/genesys-core/tests/proptest_flatten.rs
// ============================================================================
// Module: Flattener Property-Based Tests
// Description: Property tests for flattening idempotence and termination.
// Purpose: Check reference chains across wide generated inputs.
// ============================================================================

//! Property-based tests for schema flattening invariants.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use genesys_core::DefinitionsMap;
use genesys_core::NoopDiagnosticSink;
use genesys_core::flatten_schema;
use proptest::prelude::*;
use serde_json::Value;
use serde_json::json;

fn json_value_strategy(max_depth: u32) -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|v| Value::Number(v.into())),
        "[a-z]{0,8}".prop_map(Value::String),
    ];

    leaf.prop_recursive(max_depth, 64, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0 .. 4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0 .. 4).prop_map(|map| {
                let mut object = serde_json::Map::new();
                for (key, value) in map {
                    object.insert(key, value);
                }
                Value::Object(object)
            }),
        ]
    })
}

fn schema_strategy() -> impl Strategy<Value = Value> {
    (
        prop_oneof![Just("string"), Just("object"), Just("array"), Just("integer")],
        json_value_strategy(3),
    )
        .prop_map(|(kind, extra)| json!({ "type": kind, "x-extra": extra }))
}

/// Builds `D0 -> D1 -> ... -> Dn` where `Dn` is concrete.
fn chain(length: usize, terminal: &Value, via_items: bool) -> DefinitionsMap {
    let mut definitions = DefinitionsMap::new();
    for index in 0 .. length {
        let reference = format!("#/definitions/D{}", index + 1);
        let node = if via_items && index % 2 == 1 {
            json!({ "type": "array", "items": { "$ref": reference } })
        } else {
            json!({ "$ref": reference })
        };
        definitions.insert(format!("D{index}"), node);
    }
    definitions.insert(format!("D{length}"), terminal.clone());
    definitions
}

proptest! {
    #[test]
    fn flattening_ref_free_schema_is_identity(
        schema in json_value_strategy(4),
        definitions in prop::option::of(
            prop::collection::btree_map("[A-Z][a-z]{0,4}", schema_strategy(), 0 .. 4)
        ),
    ) {
        let definitions: Option<DefinitionsMap> =
            definitions.map(|map| map.into_iter().collect());
        let flat = flatten_schema(&schema, definitions.as_ref(), &NoopDiagnosticSink).unwrap();
        prop_assert_eq!(flat, &schema);
    }

    #[test]
    fn flattening_acyclic_chain_reaches_terminal(
        length in 0usize .. 12,
        terminal in schema_strategy(),
        via_items in any::<bool>(),
    ) {
        let definitions = chain(length, &terminal, via_items);
        let root = json!({ "$ref": "#/definitions/D0" });
        let flat = flatten_schema(&root, Some(&definitions), &NoopDiagnosticSink).unwrap();
        prop_assert_eq!(flat, &terminal);
    }

    #[test]
    fn flattening_cyclic_chain_fails(length in 1usize .. 12) {
        let mut definitions = DefinitionsMap::new();
        for index in 0 .. length {
            let next = (index + 1) % length;
            definitions.insert(format!("D{index}"), json!({ "$ref": format!("#/definitions/D{next}") }));
        }
        let root = json!({ "$ref": "#/definitions/D0" });
        let outcome = flatten_schema(&root, Some(&definitions), &NoopDiagnosticSink);
        prop_assert!(outcome.is_err());
    }
}
