// crates/genesys-server/src/registry.rs
// ============================================================================
// Module: Form Template Registry
// Description: Named form templates compiled once at startup.
// Purpose: Serve template schemas and validate payloads against them.
// Dependencies: genesys-config, genesys-validation, serde_json
// ============================================================================

//! ## Overview
//! Templates are read from the paths listed under `[[form_templates]]` and
//! compiled with the service's validation engine. A template that cannot be
//! read, parsed or compiled stops startup.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use genesys_config::FormTemplateConfig;
use genesys_validation::PayloadValidator;
use genesys_validation::ValidationEngine;
use serde_json::Value;

use crate::server::ServerError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum template file size in bytes.
const MAX_TEMPLATE_FILE_SIZE: u64 = 4 * 1024 * 1024;

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Compiled form templates keyed by name.
#[derive(Clone, Default)]
pub struct TemplateRegistry {
    /// Compiled templates.
    templates: BTreeMap<String, Arc<PayloadValidator>>,
}

impl TemplateRegistry {
    /// Reads and compiles every configured template.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Template`] when a template cannot be loaded.
    pub fn load(
        entries: &[FormTemplateConfig],
        engine: &ValidationEngine,
    ) -> Result<Self, ServerError> {
        let mut registry = Self::default();
        for entry in entries {
            let schema = read_template(entry)?;
            registry.insert(entry.name.trim(), schema, engine)?;
        }
        Ok(registry)
    }

    /// Compiles `schema` and registers it under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Template`] when the schema does not compile.
    pub fn insert(
        &mut self,
        name: &str,
        schema: Value,
        engine: &ValidationEngine,
    ) -> Result<(), ServerError> {
        let validator = engine
            .compile(schema)
            .map_err(|err| ServerError::Template(format!("{name}: {err}")))?;
        self.templates.insert(name.to_string(), Arc::new(validator));
        Ok(())
    }

    /// Returns the compiled template named `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<PayloadValidator>> {
        self.templates.get(name)
    }

    /// Returns the registered names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    /// Returns the number of templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Returns true when no template is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads one template file as JSON.
fn read_template(entry: &FormTemplateConfig) -> Result<Value, ServerError> {
    let path = Path::new(entry.path.trim());
    let metadata = fs::metadata(path)
        .map_err(|err| ServerError::Template(format!("{}: {err}", path.display())))?;
    if metadata.len() > MAX_TEMPLATE_FILE_SIZE {
        return Err(ServerError::Template(format!("{}: file exceeds size limit", path.display())));
    }
    let bytes =
        fs::read(path).map_err(|err| ServerError::Template(format!("{}: {err}", path.display())))?;
    let schema: Value = serde_json::from_slice(&bytes)
        .map_err(|err| ServerError::Template(format!("{}: {err}", path.display())))?;
    if !schema.is_object() {
        return Err(ServerError::Template(format!(
            "{}: template must be a JSON object",
            path.display()
        )));
    }
    Ok(schema)
}
