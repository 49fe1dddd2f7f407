// crates/genesys-validation/src/evaluate.rs
// ============================================================================
// Module: Full Evaluation
// Description: Validation result served to form clients.
// Purpose: Combine read-only adjustment with static and dynamic requirements.
// Dependencies: genesys-core, serde_json
// ============================================================================

//! ## Overview
//! Full evaluation answers two questions at once:
//! - Is the payload valid? Checked on the read-only adjusted payload.
//! - Which properties need a value? The union, in first-seen order, of the
//!   properties required for an empty payload, those required for the
//!   current payload, and each answered property that would become required
//!   if its answer were removed.
//!
//! The last group catches conditional requirements (`if`/`then`,
//! `dependentRequired`) that an answered field satisfies and would otherwise
//! never be reported. Each answered property costs one validation pass, so
//! only the first [`MAX_DYNAMIC_REQUIRED_KEYS`] answers are checked.

// ============================================================================
// SECTION: Imports
// ============================================================================

use genesys_core::Payload;
use genesys_core::ValidationResult;
use serde_json::Value;

use crate::engine::EngineOptions;
use crate::engine::PayloadValidator;
use crate::engine::ValidationEngineError;
use crate::engine::ensure_object;
use crate::readonly::adjust_readonly;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Answered properties, in payload order, checked for conditional requirements.
pub const MAX_DYNAMIC_REQUIRED_KEYS: usize = 256;

// ============================================================================
// SECTION: Evaluation
// ============================================================================

/// Evaluates `payload` against the compiled schema.
///
/// # Errors
///
/// Returns [`ValidationEngineError::InvalidPayload`] when `payload` is not an
/// object.
pub fn evaluate(
    validator: &PayloadValidator,
    payload: &Value,
    options: EngineOptions,
) -> Result<ValidationResult, ValidationEngineError> {
    ensure_object(payload)?;
    let answers = payload.as_object().cloned().unwrap_or_default();

    let checked = if options.adjust_readonly {
        Value::Object(adjust_readonly(validator.schema(), &answers))
    } else {
        payload.clone()
    };
    let outcome = validator.check(&checked);

    let mut required = Vec::new();
    extend_unique(&mut required, validator.missing(&Value::Object(Payload::new())));
    extend_unique(&mut required, validator.missing(payload));
    if options.dynamic_required {
        extend_unique(&mut required, dynamic_required(validator, &answers));
    }

    Ok(ValidationResult {
        is_valid: outcome.is_valid,
        validation_errors: outcome.validation_errors,
        required_properties: required,
    })
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Lists answered properties that become required once removed.
fn dynamic_required(validator: &PayloadValidator, answers: &Payload) -> Vec<String> {
    let mut without = Value::Object(answers.clone());
    let mut required = Vec::new();
    for (key, answer) in answers.iter().take(MAX_DYNAMIC_REQUIRED_KEYS) {
        if let Some(map) = without.as_object_mut() {
            map.remove(key.as_str());
        }
        if validator.missing(&without).iter().any(|name| name == key) {
            required.push(key.clone());
        }
        if let Some(map) = without.as_object_mut() {
            map.insert(key.clone(), answer.clone());
        }
    }
    required
}

/// Appends names not yet present, keeping first-seen order.
fn extend_unique(target: &mut Vec<String>, names: Vec<String>) {
    for name in names {
        if !target.contains(&name) {
            target.push(name);
        }
    }
}
