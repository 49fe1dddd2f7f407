// crates/genesys-forms/src/reconciler.rs
// ============================================================================
// Module: Validation Reconciler
// Description: Payload-driven validation state machine with stale-response guard.
// Purpose: Keep one authoritative validity snapshot that gates submission.
// Dependencies: genesys-core, crate::service
// ============================================================================

//! ## Overview
//! The reconciler issues a validation request on start and on every payload
//! change (deep equality, so nested edits count). Each request is tagged with
//! a generation number. Responses replace the stored snapshot wholesale.
//! [`ValidationReconciler::started`] builds a reconciler together with the
//! ticket for its initial validation. When the latest round-trip failed,
//! observing the same payload again re-issues it, so a form retries without
//! waiting for an edit.
//!
//! Request issuance, the async round-trip and response application are split
//! so a caller can run several round-trips concurrently:
//! [`ValidationReconciler::observe`] returns a [`ValidationTicket`],
//! [`ValidationReconciler::dispatch`] performs the call without borrowing the
//! reconciler, and [`ValidationReconciler::apply`] folds the response in.
//!
//! Under [`ResponseOrdering::LatestIssued`] only the response to the most
//! recently issued request may update state; older responses are discarded.
//! [`ResponseOrdering::Arrival`] applies every response in arrival order, so a
//! slow early response can overwrite a later one.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use genesys_core::ValidationRequest;
use genesys_core::ValidationResult;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::service::ValidationService;
use crate::service::ValidationServiceError;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Policy for responses that arrive out of order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseOrdering {
    /// Only the response to the latest issued request updates state.
    #[default]
    LatestIssued,
    /// The last response to arrive wins.
    Arrival,
}

/// Submission readiness derived from the validity snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionGate {
    /// A relevant validation is outstanding or none has completed.
    Pending,
    /// The snapshot is valid.
    Ready,
    /// The snapshot is invalid or the latest validation failed.
    Blocked,
}

/// Issued validation request.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationTicket {
    /// Request generation.
    pub generation: u64,
    /// Request body.
    pub request: ValidationRequest,
}

/// Outcome of one validation round-trip.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResponse {
    /// Generation of the request this answers.
    pub generation: u64,
    /// Service outcome.
    pub outcome: Result<ValidationResult, ValidationServiceError>,
}

/// Effect of applying a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The snapshot was replaced.
    Applied,
    /// The response answered a superseded request.
    Discarded,
}

// ============================================================================
// SECTION: Reconciler
// ============================================================================

/// Validation state machine for one form-editing context.
///
/// # Invariants
/// - Generations are issued in strictly increasing order starting at 1.
/// - The snapshot is only ever replaced wholesale.
#[derive(Debug, Clone)]
pub struct ValidationReconciler {
    /// Schema sent with every request.
    schema: Value,
    /// Out-of-order response policy.
    ordering: ResponseOrdering,
    /// Payload of the latest issued request.
    last_payload: Option<Value>,
    /// Latest issued generation (0 before start).
    issued: u64,
    /// Issued generations without a response.
    in_flight: BTreeSet<u64>,
    /// Latest applied result.
    snapshot: Option<ValidationResult>,
    /// Generation of the applied result.
    snapshot_generation: Option<u64>,
    /// Generation whose round-trip failed most recently.
    failed_generation: Option<u64>,
}

impl ValidationReconciler {
    /// Creates a reconciler for `schema` without issuing a request.
    ///
    /// The first validation is issued by [`Self::start`]; use
    /// [`Self::started`] to get both at once.
    #[must_use]
    pub fn new(schema: Value, ordering: ResponseOrdering) -> Self {
        Self {
            schema,
            ordering,
            last_payload: None,
            issued: 0,
            in_flight: BTreeSet::new(),
            snapshot: None,
            snapshot_generation: None,
            failed_generation: None,
        }
    }

    /// Creates a reconciler and the ticket for its initial validation.
    #[must_use]
    pub fn started(
        schema: Value,
        ordering: ResponseOrdering,
        payload: Option<&Value>,
    ) -> (Self, ValidationTicket) {
        let mut reconciler = Self::new(schema, ordering);
        let ticket = reconciler.start(payload);
        (reconciler, ticket)
    }

    /// Issues a validation regardless of prior observations.
    pub fn start(&mut self, payload: Option<&Value>) -> ValidationTicket {
        let request = ValidationRequest::new(Some(&self.schema), payload);
        self.issue(request)
    }

    /// Issues a validation when `payload` differs from the last issued one,
    /// or when the latest issued round-trip failed.
    pub fn observe(&mut self, payload: Option<&Value>) -> Option<ValidationTicket> {
        let request = ValidationRequest::new(Some(&self.schema), payload);
        let latest_failed = self.failed_generation == Some(self.issued);
        if !latest_failed && self.last_payload.as_ref() == Some(&request.payload) {
            return None;
        }
        Some(self.issue(request))
    }

    /// Performs the round-trip for `ticket`.
    pub async fn dispatch(
        service: &dyn ValidationService,
        ticket: ValidationTicket,
    ) -> ValidationResponse {
        let outcome = service.validate(&ticket.request).await;
        ValidationResponse {
            generation: ticket.generation,
            outcome,
        }
    }

    /// Folds a response into the snapshot.
    ///
    /// # Errors
    ///
    /// Returns the service error of an applicable failed round-trip. The
    /// previous snapshot is kept.
    pub fn apply(
        &mut self,
        response: ValidationResponse,
    ) -> Result<ApplyOutcome, ValidationServiceError> {
        self.in_flight.remove(&response.generation);
        if self.ordering == ResponseOrdering::LatestIssued && response.generation != self.issued {
            return Ok(ApplyOutcome::Discarded);
        }
        match response.outcome {
            Ok(result) => {
                self.snapshot = Some(result);
                self.snapshot_generation = Some(response.generation);
                self.failed_generation = None;
                Ok(ApplyOutcome::Applied)
            }
            Err(err) => {
                self.failed_generation = Some(response.generation);
                Err(err)
            }
        }
    }

    /// Validates `payload` now and applies the response.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationServiceError`] when the round-trip fails.
    pub async fn validate_now(
        &mut self,
        service: &dyn ValidationService,
        payload: Option<&Value>,
    ) -> Result<&ValidationResult, ValidationServiceError> {
        let ticket = self.start(payload);
        let response = Self::dispatch(service, ticket).await;
        self.apply(response)?;
        self.snapshot.as_ref().ok_or(ValidationServiceError::EmptyResponse)
    }

    /// Returns the current validity snapshot.
    #[must_use]
    pub const fn snapshot(&self) -> Option<&ValidationResult> {
        self.snapshot.as_ref()
    }

    /// Returns the generation of the current snapshot.
    #[must_use]
    pub const fn snapshot_generation(&self) -> Option<u64> {
        self.snapshot_generation
    }

    /// Returns the latest issued generation.
    #[must_use]
    pub const fn issued_generation(&self) -> u64 {
        self.issued
    }

    /// Returns true while any issued request has no response.
    #[must_use]
    pub fn has_in_flight(&self) -> bool {
        !self.in_flight.is_empty()
    }

    /// Returns submission readiness.
    #[must_use]
    pub fn gate(&self) -> SubmissionGate {
        let waiting = match self.ordering {
            ResponseOrdering::LatestIssued => self.in_flight.contains(&self.issued),
            ResponseOrdering::Arrival => !self.in_flight.is_empty(),
        };
        if waiting {
            return SubmissionGate::Pending;
        }
        if self.failed_generation.is_some() {
            return SubmissionGate::Blocked;
        }
        match &self.snapshot {
            None => SubmissionGate::Pending,
            Some(result) if result.is_valid => SubmissionGate::Ready,
            Some(_) => SubmissionGate::Blocked,
        }
    }

    /// Records and returns a new ticket.
    fn issue(&mut self, request: ValidationRequest) -> ValidationTicket {
        self.issued += 1;
        self.in_flight.insert(self.issued);
        self.last_payload = Some(request.payload.clone());
        ValidationTicket {
            generation: self.issued,
            request,
        }
    }
}
