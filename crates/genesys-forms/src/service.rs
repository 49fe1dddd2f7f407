// crates/genesys-forms/src/service.rs
// ============================================================================
// Module: Validation Services
// Description: Remote and in-process implementations of payload validation.
// Purpose: Give the reconciler one async seam for validation round-trips.
// Dependencies: genesys-core, genesys-validation, async-trait, reqwest
// ============================================================================

//! ## Overview
//! [`ValidationService`] is the collaborator boundary of the reconciler. The
//! HTTP implementation posts `{ jsonschema, payload }` to the validation
//! endpoint; any transport failure, non-success status, empty body or `null`
//! body is a hard failure for that attempt. The local implementation runs
//! the validation engine in-process with the same full-evaluation semantics
//! as the endpoint.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use genesys_core::ValidationRequest;
use genesys_core::ValidationResult;
use genesys_validation::ValidationEngine;
use reqwest::Client;
use reqwest::Url;
use reqwest::header::AUTHORIZATION;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Validation round-trip failures.
///
/// # Invariants
/// - Variants are stable for error classification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationServiceError {
    /// Client configuration is invalid.
    #[error("invalid validation client configuration: {0}")]
    Config(String),
    /// The service could not be reached.
    #[error("validation service unavailable: {0}")]
    Unavailable(String),
    /// The service answered with a non-success status.
    #[error("validation service returned status {status}: {detail}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error detail reported by the service.
        detail: String,
    },
    /// The service answered with an empty or `null` body.
    #[error("validation service returned an empty response")]
    EmptyResponse,
    /// The body is not a validation result.
    #[error("invalid validation response: {0}")]
    InvalidResponse(String),
    /// In-process validation rejected the request.
    #[error("validation rejected: {0}")]
    Rejected(String),
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Validation round-trip interface.
#[async_trait]
pub trait ValidationService: Send + Sync {
    /// Validates one request.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationServiceError`] when no validation result is
    /// available for the request.
    async fn validate(
        &self,
        request: &ValidationRequest,
    ) -> Result<ValidationResult, ValidationServiceError>;
}

// ============================================================================
// SECTION: HTTP Service
// ============================================================================

/// Settings for [`HttpValidationService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpServiceConfig {
    /// Full URL of the validation endpoint.
    pub endpoint: String,
    /// Optional bearer token.
    pub bearer_token: Option<String>,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Whole-request timeout.
    pub request_timeout: Duration,
}

impl HttpServiceConfig {
    /// Creates settings with default timeouts and no token.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            bearer_token: None,
            connect_timeout: Duration::from_millis(500),
            request_timeout: Duration::from_millis(5_000),
        }
    }
}

/// Validation service reached over HTTP.
///
/// # Invariants
/// - `endpoint` is an absolute `http` or `https` URL.
pub struct HttpValidationService {
    /// Validation endpoint.
    endpoint: Url,
    /// Default request headers.
    headers: HeaderMap,
    /// HTTP client configured with timeouts.
    client: Client,
}

impl HttpValidationService {
    /// Builds a client for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationServiceError::Config`] for an invalid endpoint or
    /// token and [`ValidationServiceError::Unavailable`] when the HTTP client
    /// cannot be built.
    pub fn new(config: &HttpServiceConfig) -> Result<Self, ValidationServiceError> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|err| ValidationServiceError::Config(format!("endpoint: {err}")))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ValidationServiceError::Config(format!(
                "endpoint scheme must be http or https, got {}",
                endpoint.scheme()
            )));
        }
        let mut headers = HeaderMap::new();
        if let Some(token) = &config.bearer_token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| ValidationServiceError::Config("invalid bearer token".to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| ValidationServiceError::Unavailable(err.to_string()))?;
        Ok(Self {
            endpoint,
            headers,
            client,
        })
    }
}

#[async_trait]
impl ValidationService for HttpValidationService {
    async fn validate(
        &self,
        request: &ValidationRequest,
    ) -> Result<ValidationResult, ValidationServiceError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .headers(self.headers.clone())
            .json(request)
            .send()
            .await
            .map_err(|err| ValidationServiceError::Unavailable(err.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| ValidationServiceError::Unavailable(err.to_string()))?;
        if !status.is_success() {
            return Err(ValidationServiceError::Status {
                status: status.as_u16(),
                detail: error_detail(&body),
            });
        }
        parse_result(&body)
    }
}

// ============================================================================
// SECTION: Local Service
// ============================================================================

/// Validation service running the engine in-process.
pub struct LocalValidationService {
    /// Validation engine.
    engine: ValidationEngine,
}

impl LocalValidationService {
    /// Wraps an engine.
    #[must_use]
    pub const fn new(engine: ValidationEngine) -> Self {
        Self {
            engine,
        }
    }
}

#[async_trait]
impl ValidationService for LocalValidationService {
    async fn validate(
        &self,
        request: &ValidationRequest,
    ) -> Result<ValidationResult, ValidationServiceError> {
        self.engine
            .evaluate(request)
            .map_err(|err| ValidationServiceError::Rejected(err.to_string()))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses a success body into a validation result.
fn parse_result(body: &[u8]) -> Result<ValidationResult, ValidationServiceError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ValidationServiceError::EmptyResponse);
    }
    let value: Value = serde_json::from_slice(body)
        .map_err(|err| ValidationServiceError::InvalidResponse(err.to_string()))?;
    if value.is_null() {
        return Err(ValidationServiceError::EmptyResponse);
    }
    serde_json::from_value(value).map_err(|err| ValidationServiceError::InvalidResponse(err.to_string()))
}

/// Extracts `detail` from an error body, falling back to the raw text.
fn error_detail(body: &[u8]) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|value| value.get("detail").map(|detail| match detail {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }))
        .unwrap_or_else(|| String::from_utf8_lossy(body).into_owned())
}
