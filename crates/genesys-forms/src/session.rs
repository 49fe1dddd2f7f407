// crates/genesys-forms/src/session.rs
// ============================================================================
// Module: Form Session
// Description: Field list, live payload, and per-field state of one form.
// Purpose: Replace shared global form state with an explicit session object.
// Dependencies: genesys-core, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! A session is built from a form template and an optional stored payload.
//! It keeps two views of the template:
//! - `fields` is the deep, flattened extraction (inherited fields included);
//! - `field_names` is the shallow list of the template's own properties.
//!
//! Field state exists only for rendered fields. Validation snapshots are
//! projected onto that state: an error belongs to a field when its schema
//! path names the field after a `properties` segment, and a field listed in
//! `required_properties` without a present value gets a "required" error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use genesys_core::DefinitionsMap;
use genesys_core::DiagnosticSink;
use genesys_core::ExtractError;
use genesys_core::FieldDescriptor;
use genesys_core::FlattenError;
use genesys_core::Payload;
use genesys_core::ValidationResult;
use genesys_core::ValuePresence;
use genesys_core::definitions_of;
use genesys_core::extract_fields;
use genesys_core::field_names;
use genesys_core::pagination_possible;
use genesys_core::properties_of_field;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Form session failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormSessionError {
    /// The template could not be extracted.
    #[error(transparent)]
    Extract(#[from] ExtractError),
    /// No extracted field has this name.
    #[error("unknown field: {field_name}")]
    UnknownField {
        /// Requested field name.
        field_name: String,
    },
}

// ============================================================================
// SECTION: Types
// ============================================================================

/// UI state of one rendered field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldState {
    /// Current value under the session's presence rule.
    pub value: Option<Value>,
    /// Readable validation messages.
    pub errors: Vec<String>,
    /// Whether the user has interacted with the field.
    pub touched: bool,
    /// Whether the field has no validation errors.
    pub valid: bool,
    /// Whether the field is listed as required.
    pub required: bool,
}

impl FieldState {
    /// Fresh state holding `value`.
    const fn new(value: Option<Value>) -> Self {
        Self {
            value,
            errors: Vec::new(),
            touched: false,
            valid: true,
            required: false,
        }
    }
}

/// One form-editing context.
#[derive(Debug, Clone)]
pub struct FormSession {
    /// Form template.
    schema: Value,
    /// Deep field extraction.
    fields: Vec<FieldDescriptor>,
    /// Shallow property names.
    field_names: Vec<String>,
    /// Live payload.
    payload: Payload,
    /// State of rendered fields.
    states: BTreeMap<String, FieldState>,
    /// Value presence rule.
    presence: ValuePresence,
}

impl FormSession {
    /// Extracts `schema` and opens a session over `payload`.
    ///
    /// # Errors
    ///
    /// Returns [`FormSessionError::Extract`] when the template contains a
    /// boolean property schema.
    pub fn new(
        schema: Value,
        payload: Option<Payload>,
        presence: ValuePresence,
        diagnostics: &dyn DiagnosticSink,
    ) -> Result<Self, FormSessionError> {
        let fields = extract_fields(&schema, diagnostics)?;
        let field_names = field_names(&schema);
        Ok(Self {
            schema,
            fields,
            field_names,
            payload: payload.unwrap_or_default(),
            states: BTreeMap::new(),
            presence,
        })
    }

    /// Returns the form template.
    #[must_use]
    pub const fn schema(&self) -> &Value {
        &self.schema
    }

    /// Returns the template definitions.
    #[must_use]
    pub fn definitions(&self) -> Option<&DefinitionsMap> {
        definitions_of(&self.schema)
    }

    /// Returns the deep field list.
    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Returns the shallow property names.
    #[must_use]
    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    /// Returns the live payload.
    #[must_use]
    pub const fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Returns the presence rule.
    #[must_use]
    pub const fn presence(&self) -> ValuePresence {
        self.presence
    }

    /// Returns true when every field is an object step.
    #[must_use]
    pub fn pagination_possible(&self) -> bool {
        pagination_possible(&self.fields)
    }

    /// Looks `field` up in `payload` under the session's presence rule.
    #[must_use]
    pub fn current_value<'p>(
        &self,
        field: &FieldDescriptor,
        payload: Option<&'p Payload>,
    ) -> Option<&'p Value> {
        self.presence.lookup(payload, &field.field_name)
    }

    /// Returns a field's flattened schema.
    ///
    /// # Errors
    ///
    /// Returns [`FlattenError`] when the field's references cannot be followed.
    pub fn flattened_schema<'a>(
        &'a self,
        field: &'a FieldDescriptor,
        diagnostics: &dyn DiagnosticSink,
    ) -> Result<&'a Value, FlattenError> {
        properties_of_field(field, self.definitions(), diagnostics)
    }

    /// Returns the descriptor for `field_name`; the last extracted wins.
    #[must_use]
    pub fn field(&self, field_name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().rev().find(|field| field.field_name == field_name)
    }

    /// Returns the state of a rendered field.
    #[must_use]
    pub fn field_state(&self, field_name: &str) -> Option<&FieldState> {
        self.states.get(field_name)
    }

    /// Creates the state of `field_name` on first render.
    ///
    /// # Errors
    ///
    /// Returns [`FormSessionError::UnknownField`] for names not extracted.
    pub fn render_field(&mut self, field_name: &str) -> Result<&FieldState, FormSessionError> {
        let value = self.known_value(field_name)?;
        Ok(self.states.entry(field_name.to_string()).or_insert_with(|| FieldState::new(value)))
    }

    /// Sets or clears a field value in the live payload.
    ///
    /// # Errors
    ///
    /// Returns [`FormSessionError::UnknownField`] for names not extracted.
    pub fn update_field(
        &mut self,
        field_name: &str,
        value: Option<Value>,
    ) -> Result<(), FormSessionError> {
        self.ensure_known(field_name)?;
        match value {
            Some(value) => {
                self.payload.insert(field_name.to_string(), value);
            }
            None => {
                self.payload.remove(field_name);
            }
        }
        let current = self.presence.lookup(Some(&self.payload), field_name).cloned();
        if let Some(state) = self.states.get_mut(field_name) {
            state.value = current;
        }
        Ok(())
    }

    /// Marks a field as touched, rendering it when needed.
    ///
    /// # Errors
    ///
    /// Returns [`FormSessionError::UnknownField`] for names not extracted.
    pub fn touch_field(&mut self, field_name: &str) -> Result<(), FormSessionError> {
        let value = self.known_value(field_name)?;
        self.states
            .entry(field_name.to_string())
            .or_insert_with(|| FieldState::new(value))
            .touched = true;
        Ok(())
    }

    /// Projects a validation snapshot onto every rendered field.
    pub fn apply_validation(&mut self, result: &ValidationResult) {
        for (field_name, state) in &mut self.states {
            let mut errors: Vec<String> = result
                .validation_errors
                .iter()
                .filter(|error| error.property_names().contains(&field_name.as_str()))
                .map(|error| error.readable_message.clone())
                .collect();
            let required = result.requires(field_name);
            let answered = self.presence.lookup(Some(&self.payload), field_name).is_some();
            if required && !answered {
                let message = format!("Veld '{field_name}' is verplicht");
                if !errors.contains(&message) {
                    errors.push(message);
                }
            }
            state.valid = errors.is_empty();
            state.required = required;
            state.errors = errors;
        }
    }

    /// Drops all field state.
    pub fn teardown(&mut self) {
        self.states.clear();
    }

    /// Rejects names that were not extracted.
    fn ensure_known(&self, field_name: &str) -> Result<(), FormSessionError> {
        if self.field(field_name).is_some() {
            Ok(())
        } else {
            Err(FormSessionError::UnknownField {
                field_name: field_name.to_string(),
            })
        }
    }

    /// Returns the present value of a known field.
    fn known_value(&self, field_name: &str) -> Result<Option<Value>, FormSessionError> {
        let field = self.field(field_name).ok_or_else(|| FormSessionError::UnknownField {
            field_name: field_name.to_string(),
        })?;
        Ok(self.current_value(field, Some(&self.payload)).cloned())
    }
}

#[cfg(test)]
mod tests;
