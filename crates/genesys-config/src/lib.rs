// crates/genesys-config/src/lib.rs
// ============================================================================
// Module: Genesys Config Library
// Description: Canonical configuration model and validation.
// Purpose: Single source of truth for genesys.toml semantics.
// Dependencies: genesys-core, genesys-forms, genesys-validation, serde, toml
// ============================================================================

//! ## Overview
//! `genesys-config` defines the configuration model shared by the HTTP
//! service and the CLI. Loading is strict and fails closed: oversized files,
//! non-UTF-8 content, unparsable TOML and inconsistent values are errors.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
