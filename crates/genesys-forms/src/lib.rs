// crates/genesys-forms/src/lib.rs
// ============================================================================
// Module: Genesys Forms Library
// Description: Form-editing sessions and validation reconciliation.
// Purpose: Track field state against a live payload and gate submission.
// Dependencies: genesys-core, genesys-validation, reqwest
// ============================================================================

//! ## Overview
//! A [`FormSession`] is created per form-editing context. It owns the
//! extracted fields, the live payload and the state of each rendered field.
//! A [`ValidationReconciler`] watches the payload, submits it to a
//! [`ValidationService`] and keeps the latest validity snapshot, which decides
//! whether the form may be submitted. [`FormDataRecord`] models the persisted
//! form data and its submission lifecycle.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod form_data;
pub mod reconciler;
pub mod service;
pub mod session;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use form_data::FormDataError;
pub use form_data::FormDataRecord;
pub use form_data::FormStatus;
pub use reconciler::ApplyOutcome;
pub use reconciler::ResponseOrdering;
pub use reconciler::SubmissionGate;
pub use reconciler::ValidationReconciler;
pub use reconciler::ValidationResponse;
pub use reconciler::ValidationTicket;
pub use service::HttpServiceConfig;
pub use service::HttpValidationService;
pub use service::LocalValidationService;
pub use service::ValidationService;
pub use service::ValidationServiceError;
pub use session::FieldState;
pub use session::FormSession;
pub use session::FormSessionError;
