// crates/genesys-forms/src/form_data.rs
// ============================================================================
// Module: Form Data Records
// Description: Stored form answers and their submission lifecycle.
// Purpose: Keep validated and unvalidated payloads apart and lock submitted data.
// Dependencies: genesys-core, serde, thiserror
// ============================================================================

//! ## Overview
//! A record stores at most one of two payloads: `payload` holds answers that
//! passed validation, `payload_unvalidated` holds everything else. Once a
//! record is submitted or approved its stored answers may no longer change;
//! re-saving identical answers is still accepted. Moving into or out of the
//! approved state requires approval permission.

// ============================================================================
// SECTION: Imports
// ============================================================================

use genesys_core::Payload;
use genesys_core::ValidationResult;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Form data lifecycle failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormDataError {
    /// Answers of a submitted or approved record cannot change.
    #[error(
        "Het formulier {form_template_name} is al ingediend of goedgekeurd en kan niet meer worden aangepast."
    )]
    Locked {
        /// Template name of the record.
        form_template_name: String,
    },
    /// The status change needs approval permission.
    #[error("approval permission required to change status from {from} to {to}")]
    ApprovalForbidden {
        /// Current status.
        from: FormStatus,
        /// Requested status.
        to: FormStatus,
    },
}

// ============================================================================
// SECTION: Types
// ============================================================================

/// Lifecycle status of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormStatus {
    /// Answers may still be edited.
    Gestart,
    /// Submitted for review.
    Ingediend,
    /// Approved by a reviewer.
    Goedgekeurd,
}

impl FormStatus {
    /// Returns the wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gestart => "Gestart",
            Self::Ingediend => "Ingediend",
            Self::Goedgekeurd => "Goedgekeurd",
        }
    }
}

impl std::fmt::Display for FormStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored answers for one form template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormDataRecord {
    /// Template the answers belong to.
    pub form_template_name: String,
    /// Answers that passed validation.
    #[serde(default)]
    pub payload: Option<Payload>,
    /// Answers saved without passing validation.
    #[serde(default)]
    pub payload_unvalidated: Option<Payload>,
    /// Whether the record was submitted.
    #[serde(default)]
    pub submitted: bool,
    /// Whether the record was approved.
    #[serde(default)]
    pub approved: bool,
}

impl FormDataRecord {
    /// Creates an empty record.
    #[must_use]
    pub fn new(form_template_name: impl Into<String>) -> Self {
        Self {
            form_template_name: form_template_name.into(),
            ..Self::default()
        }
    }

    /// Returns the lifecycle status; approval outranks submission.
    #[must_use]
    pub const fn status(&self) -> FormStatus {
        if self.approved {
            FormStatus::Goedgekeurd
        } else if self.submitted {
            FormStatus::Ingediend
        } else {
            FormStatus::Gestart
        }
    }

    /// Returns true while answers may be edited.
    #[must_use]
    pub const fn edit_allowed(&self) -> bool {
        matches!(self.status(), FormStatus::Gestart)
    }

    /// Returns true when validated answers are stored.
    #[must_use]
    pub fn has_valid_payload(&self) -> bool {
        self.payload.as_ref().is_some_and(|payload| !payload.is_empty())
    }

    /// Returns the answers to show: validated first, unvalidated otherwise.
    #[must_use]
    pub fn visible_payload(&self) -> Option<&Payload> {
        if self.has_valid_payload() {
            self.payload.as_ref()
        } else {
            self.payload_unvalidated.as_ref()
        }
    }

    /// Stores new answers according to their validation outcome.
    ///
    /// A `None` payload leaves the stored answers untouched.
    ///
    /// # Errors
    ///
    /// Returns [`FormDataError::Locked`] when a submitted or approved record
    /// would change its validated answers.
    pub fn upsert_payload(
        &mut self,
        payload: Option<Payload>,
        validation: Option<&ValidationResult>,
    ) -> Result<(), FormDataError> {
        let changed = self.payload.is_some() && self.payload != payload;
        if !self.edit_allowed() && changed {
            return Err(FormDataError::Locked {
                form_template_name: self.form_template_name.clone(),
            });
        }
        let Some(payload) = payload else {
            return Ok(());
        };
        let valid = !payload.is_empty() && validation.is_some_and(|result| result.is_valid);
        if valid {
            self.payload = Some(payload);
            self.payload_unvalidated = None;
        } else {
            self.payload_unvalidated = Some(payload);
            self.payload = None;
        }
        Ok(())
    }

    /// Moves the record to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`FormDataError::ApprovalForbidden`] when the record is or
    /// would become approved and `can_approve` is false.
    pub fn set_status(&mut self, target: FormStatus, can_approve: bool) -> Result<(), FormDataError> {
        let current = self.status();
        let needs_approval = current == FormStatus::Goedgekeurd || target == FormStatus::Goedgekeurd;
        if needs_approval && !can_approve {
            return Err(FormDataError::ApprovalForbidden {
                from: current,
                to: target,
            });
        }
        match target {
            FormStatus::Goedgekeurd => {
                self.approved = true;
                self.submitted = true;
            }
            FormStatus::Ingediend => {
                self.approved = false;
                self.submitted = true;
            }
            FormStatus::Gestart => {
                self.approved = false;
                self.submitted = false;
            }
        }
        Ok(())
    }
}
