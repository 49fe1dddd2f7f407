// crates/genesys-server/src/lib.rs
// ============================================================================
// Module: Genesys Server Library
// Description: HTTP service for payload validation and form templates.
// Purpose: Expose the validation engine to form clients over HTTP.
// Dependencies: genesys-config, genesys-core, genesys-validation, axum, tokio
// ============================================================================

//! ## Overview
//! [`GenesysServer`] is built from a validated [`genesys_config::GenesysConfig`].
//! It compiles the configured form templates at startup, serves the
//! validation routes with axum, and records one audit event per request.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod registry;
pub mod server;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditOutcome;
pub use audit::AuditRoute;
pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use audit::ValidationAuditEvent;
pub use audit::ValidationAuditEventParams;
pub use audit::ValidationAuditSink;
pub use audit::audit_sink_from_config;
pub use registry::TemplateRegistry;
pub use server::GenesysServer;
pub use server::ServerError;
