// crates/genesys-server/src/server.rs
// ============================================================================
// Module: Validation Server
// Description: HTTP routes for payload validation and form templates.
// Purpose: Serve the validation endpoint consumed by form clients.
// Dependencies: genesys-config, genesys-core, genesys-validation, axum, tokio
// ============================================================================

//! ## Overview
//! The server mounts three routes under the configured prefix:
//! - `POST {mount}/json-schema-validation/` runs a full evaluation of
//!   `{ jsonschema, payload }`;
//! - `GET {mount}/form-template/{form_name}` returns a registered template;
//! - `POST {mount}/form-template/{form_name}/validation` runs plain
//!   validation of the body against a registered template.
//!
//! Oversized bodies are 413, malformed JSON is 400, schemas that do not
//! compile and non-object payloads are 422, unknown templates are 404. Error
//! bodies are `{ "detail": "<message>" }`. Every request is audited.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::extract::Path;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use genesys_config::GenesysConfig;
use genesys_core::DiagnosticSink;
use genesys_core::StderrDiagnosticSink;
use genesys_core::ValidationRequest;
use genesys_core::ValidationResult;
use genesys_validation::ValidationEngine;
use genesys_validation::ValidationEngineError;
use serde::de::DeserializeOwned;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::runtime::RuntimeFlavor;

use crate::audit::AuditRoute;
use crate::audit::ValidationAuditEvent;
use crate::audit::ValidationAuditEventParams;
use crate::audit::ValidationAuditSink;
use crate::audit::audit_sink_from_config;
use crate::registry::TemplateRegistry;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Server startup and transport errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration is invalid.
    #[error("server config error: {0}")]
    Config(String),
    /// A form template could not be loaded.
    #[error("form template error: {0}")]
    Template(String),
    /// Audit sink initialization failed.
    #[error("audit sink error: {0}")]
    Audit(String),
    /// Binding or serving failed.
    #[error("server transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// Validation HTTP server.
pub struct GenesysServer {
    /// Validated configuration.
    config: GenesysConfig,
    /// Shared handler state.
    state: Arc<ServerState>,
}

impl GenesysServer {
    /// Builds a server with the sinks selected by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when the configuration, audit sink or a
    /// template is invalid.
    pub fn from_config(config: GenesysConfig) -> Result<Self, ServerError> {
        let audit =
            audit_sink_from_config(&config.audit).map_err(|err| ServerError::Audit(err.to_string()))?;
        Self::with_sinks(config, audit, Arc::new(StderrDiagnosticSink))
    }

    /// Builds a server with explicit audit and diagnostic sinks.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when the configuration or a template is invalid.
    pub fn with_sinks(
        config: GenesysConfig,
        audit: Arc<dyn ValidationAuditSink>,
        diagnostics: Arc<dyn DiagnosticSink>,
    ) -> Result<Self, ServerError> {
        config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
        let engine = ValidationEngine::new(config.validation.engine_options(), diagnostics);
        let templates = TemplateRegistry::load(&config.form_templates, &engine)?;
        let state = Arc::new(ServerState {
            engine,
            templates,
            audit,
            max_body_bytes: config.server.max_body_bytes,
        });
        Ok(Self {
            config,
            state,
        })
    }

    /// Returns the template registry.
    #[must_use]
    pub fn templates(&self) -> &TemplateRegistry {
        &self.state.templates
    }

    /// Builds the route table.
    #[must_use]
    pub fn router(&self) -> Router {
        let prefix = self.config.server.route_prefix();
        Router::new()
            .route(&format!("{prefix}/json-schema-validation/"), post(handle_json_schema_validation))
            .route(&format!("{prefix}/form-template/{{form_name}}"), get(handle_form_template))
            .route(
                &format!("{prefix}/form-template/{{form_name}}/validation"),
                post(handle_form_template_validation),
            )
            .layer(DefaultBodyLimit::max(self.state.max_body_bytes))
            .with_state(Arc::clone(&self.state))
    }

    /// Serves on the configured bind address until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Transport`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        let addr =
            self.config.server.bind_addr().map_err(|err| ServerError::Config(err.to_string()))?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|err| ServerError::Transport(format!("bind {addr}: {err}")))?;
        self.serve_with_listener(listener, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
    }

    /// Serves on `listener` until `shutdown` completes.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Transport`] when serving fails.
    pub async fn serve_with_listener<F>(
        self,
        listener: TcpListener,
        shutdown: F,
    ) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|err| ServerError::Transport(err.to_string()))
    }
}

// ============================================================================
// SECTION: Handler State
// ============================================================================

/// Shared state for request handlers.
struct ServerState {
    /// Engine for ad-hoc schemas.
    engine: ValidationEngine,
    /// Registered templates.
    templates: TemplateRegistry,
    /// Request audit sink.
    audit: Arc<dyn ValidationAuditSink>,
    /// Maximum allowed request body size.
    max_body_bytes: usize,
}

/// Successful handler output.
enum Reply {
    /// Validation outcome.
    Validation(ValidationResult),
    /// Template document.
    Template(Value),
}

/// Request failure mapped to an HTTP status.
#[derive(Debug)]
enum ApiError {
    /// Body exceeds the configured limit.
    PayloadTooLarge,
    /// Body could not be read or parsed.
    BadRequest(String),
    /// Unknown template.
    NotFound(String),
    /// Schema or payload rejected by the engine.
    Unprocessable(String),
}

impl ApiError {
    /// Returns the HTTP status.
    const fn status(&self) -> StatusCode {
        match self {
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    /// Returns the audit label.
    const fn kind(&self) -> &'static str {
        match self {
            Self::PayloadTooLarge => "payload_too_large",
            Self::BadRequest(_) => "malformed_request",
            Self::NotFound(_) => "template_not_found",
            Self::Unprocessable(_) => "unprocessable",
        }
    }

    /// Returns the response detail.
    fn detail(&self) -> String {
        match self {
            Self::PayloadTooLarge => "request body too large".to_string(),
            Self::BadRequest(detail) | Self::NotFound(detail) | Self::Unprocessable(detail) => {
                detail.clone()
            }
        }
    }
}

impl From<ValidationEngineError> for ApiError {
    fn from(err: ValidationEngineError) -> Self {
        Self::Unprocessable(err.to_string())
    }
}

impl ServerState {
    /// Checks the buffered body against the size limit.
    fn body(&self, body: Result<Bytes, BytesRejection>) -> Result<Bytes, ApiError> {
        let bytes = body.map_err(|rejection| {
            if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                ApiError::PayloadTooLarge
            } else {
                ApiError::BadRequest(rejection.body_text())
            }
        })?;
        if bytes.len() > self.max_body_bytes {
            return Err(ApiError::PayloadTooLarge);
        }
        Ok(bytes)
    }

    /// Audits the request and renders the response.
    fn respond(
        &self,
        route: AuditRoute,
        form_name: Option<String>,
        request_bytes: usize,
        outcome: Result<Reply, ApiError>,
    ) -> Response {
        let (status, error_kind, validity, body) = match outcome {
            Ok(Reply::Validation(result)) => {
                let validity = Some((result.is_valid, result.validation_errors.len()));
                (StatusCode::OK, None, validity, Json(result).into_response())
            }
            Ok(Reply::Template(document)) => {
                (StatusCode::OK, None, None, Json(document).into_response())
            }
            Err(err) => {
                let status = err.status();
                let body = (status, Json(json!({ "detail": err.detail() }))).into_response();
                (status, Some(err.kind()), None, body)
            }
        };
        self.audit.record(&ValidationAuditEvent::new(ValidationAuditEventParams {
            route,
            form_name,
            status: status.as_u16(),
            error_kind,
            request_bytes,
            is_valid: validity.map(|(is_valid, _)| is_valid),
            error_count: validity.map(|(_, count)| count),
        }));
        body
    }
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Handles `POST {mount}/json-schema-validation/`.
async fn handle_json_schema_validation(
    State(state): State<Arc<ServerState>>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let route = AuditRoute::JsonSchemaValidation;
    let bytes = match state.body(body) {
        Ok(bytes) => bytes,
        Err(err) => return state.respond(route, None, 0, Err(err)),
    };
    let outcome = parse_json::<ValidationRequest>(&bytes).and_then(|request| {
        let request = ValidationRequest::new(Some(&request.jsonschema), Some(&request.payload));
        run_blocking(|| state.engine.evaluate(&request))
            .map(Reply::Validation)
            .map_err(ApiError::from)
    });
    state.respond(route, None, bytes.len(), outcome)
}

/// Handles `GET {mount}/form-template/{form_name}`.
async fn handle_form_template(
    State(state): State<Arc<ServerState>>,
    Path(form_name): Path<String>,
) -> Response {
    let outcome = state
        .templates
        .get(&form_name)
        .map(|validator| {
            Reply::Template(json!({ "name": &form_name, "template_schema": validator.schema() }))
        })
        .ok_or_else(|| ApiError::NotFound(format!("form template not found: {form_name}")));
    state.respond(AuditRoute::FormTemplate, Some(form_name), 0, outcome)
}

/// Handles `POST {mount}/form-template/{form_name}/validation`.
async fn handle_form_template_validation(
    State(state): State<Arc<ServerState>>,
    Path(form_name): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let route = AuditRoute::FormTemplateValidation;
    let bytes = match state.body(body) {
        Ok(bytes) => bytes,
        Err(err) => return state.respond(route, Some(form_name), 0, Err(err)),
    };
    let outcome = state
        .templates
        .get(&form_name)
        .ok_or_else(|| ApiError::NotFound(format!("form template not found: {form_name}")))
        .and_then(|validator| {
            let payload = parse_json::<Value>(&bytes)?;
            run_blocking(|| validator.validate(&payload))
                .map(Reply::Validation)
                .map_err(ApiError::from)
        });
    state.respond(route, Some(form_name), bytes.len(), outcome)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses a JSON body.
fn parse_json<T: DeserializeOwned>(bytes: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(bytes.as_ref())
        .map_err(|err| ApiError::BadRequest(format!("invalid json body: {err}")))
}

/// Runs CPU-bound validation off the async worker when the runtime allows it.
fn run_blocking<T>(work: impl FnOnce() -> T) -> T {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(work)
        }
        _ => work(),
    }
}
