// crates/genesys-config/src/config.rs
// ============================================================================
// Module: Genesys Configuration
// Description: Configuration loading and validation for the form engine.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: genesys-core, genesys-forms, genesys-validation, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! The path is taken from the caller, then from `GENESYS_CONFIG`, then from
//! `genesys.toml` in the working directory. Every section has defaults, so an
//! empty file is a valid configuration.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use genesys_core::ValuePresence;
use genesys_forms::HttpServiceConfig;
use genesys_forms::ResponseOrdering;
use genesys_validation::EngineOptions;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "genesys.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "GENESYS_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default server bind address.
const DEFAULT_BIND: &str = "127.0.0.1:8080";
/// Default mount path of the HTTP routes.
const DEFAULT_MOUNT_PATH: &str = "/api";
/// Default maximum request body size in bytes.
const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;
/// Minimum allowed request body limit in bytes.
pub(crate) const MIN_MAX_BODY_BYTES: usize = 1024;
/// Maximum allowed request body limit in bytes.
pub(crate) const MAX_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;
/// Default validation client connect timeout in milliseconds.
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 500;
/// Default validation client request timeout in milliseconds.
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;
/// Minimum validation client connect timeout in milliseconds.
pub(crate) const MIN_CONNECT_TIMEOUT_MS: u64 = 100;
/// Maximum validation client connect timeout in milliseconds.
pub(crate) const MAX_CONNECT_TIMEOUT_MS: u64 = 10_000;
/// Minimum validation client request timeout in milliseconds.
pub(crate) const MIN_REQUEST_TIMEOUT_MS: u64 = 500;
/// Maximum validation client request timeout in milliseconds.
pub(crate) const MAX_REQUEST_TIMEOUT_MS: u64 = 60_000;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Genesys configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenesysConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Validation engine switches.
    #[serde(default)]
    pub validation: ValidationConfig,
    /// Request audit configuration.
    #[serde(default)]
    pub audit: AuditConfig,
    /// Remote validation client configuration.
    #[serde(default)]
    pub client: ClientConfig,
    /// Form template registry.
    #[serde(default)]
    pub form_templates: Vec<FormTemplateConfig>,
}

impl GenesysConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path, env::var(CONFIG_ENV_VAR).ok())?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved)
            .map_err(|err| ConfigError::Io(format!("{}: {err}", resolved.display())))?;
        Self::from_bytes(&bytes)
    }

    /// Parses and validates configuration bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the content is oversized, not UTF-8,
    /// unparsable, or invalid.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.audit.validate()?;
        self.client.validate()?;
        let mut names = BTreeSet::new();
        for template in &self.form_templates {
            template.validate()?;
            if !names.insert(template.name.trim()) {
                return Err(ConfigError::Invalid(format!(
                    "form_templates: duplicate name {}",
                    template.name.trim()
                )));
            }
        }
        Ok(())
    }

    /// Looks up a form template entry by name.
    #[must_use]
    pub fn form_template(&self, name: &str) -> Option<&FormTemplateConfig> {
        self.form_templates.iter().find(|template| template.name == name)
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Path prefix of every route.
    #[serde(default = "default_mount_path")]
    pub mount_path: String,
    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            mount_path: default_mount_path(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerConfig {
    /// Returns the parsed bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `bind` is not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("server.bind is invalid: {}", self.bind)))
    }

    /// Validates server configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        if !self.mount_path.starts_with('/') {
            return Err(ConfigError::Invalid("server.mount_path must start with /".to_string()));
        }
        if self.mount_path.len() > 1 && self.mount_path.ends_with('/') {
            return Err(ConfigError::Invalid("server.mount_path must not end with /".to_string()));
        }
        if self.mount_path.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid(
                "server.mount_path must not contain whitespace".to_string(),
            ));
        }
        if !(MIN_MAX_BODY_BYTES ..= MAX_MAX_BODY_BYTES).contains(&self.max_body_bytes) {
            return Err(ConfigError::Invalid(format!(
                "server.max_body_bytes must be between {MIN_MAX_BODY_BYTES} and \
                 {MAX_MAX_BODY_BYTES}"
            )));
        }
        Ok(())
    }

    /// Returns the mount path with a root mount collapsed to the empty prefix.
    #[must_use]
    pub fn route_prefix(&self) -> &str {
        if self.mount_path == "/" { "" } else { &self.mount_path }
    }
}

/// Validation engine switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ValidationConfig {
    /// Force read-only properties to `true` before validating.
    #[serde(default = "default_true")]
    pub adjust_readonly: bool,
    /// Report answered properties that are only conditionally required.
    #[serde(default = "default_true")]
    pub dynamic_required: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            adjust_readonly: true,
            dynamic_required: true,
        }
    }
}

impl ValidationConfig {
    /// Returns the engine options for these switches.
    #[must_use]
    pub const fn engine_options(self) -> EngineOptions {
        EngineOptions {
            adjust_readonly: self.adjust_readonly,
            dynamic_required: self.dynamic_required,
        }
    }
}

/// Audit sink selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to a file.
    File,
    /// Auditing disabled.
    None,
}

/// Request audit configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditConfig {
    /// Sink selection.
    #[serde(default)]
    pub sink: AuditSinkKind,
    /// Log file path for the file sink.
    #[serde(default)]
    pub path: Option<String>,
}

impl AuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (AuditSinkKind::File, None) => {
                Err(ConfigError::Invalid("audit.path is required for the file sink".to_string()))
            }
            (AuditSinkKind::File, Some(path)) => validate_path_string("audit.path", path),
            (_, _) => Ok(()),
        }
    }
}

/// Remote validation client configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Validation endpoint URL.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Optional bearer token sent with every request.
    #[serde(default)]
    pub bearer_token: Option<String>,
    /// Out-of-order response policy.
    #[serde(default)]
    pub ordering: ResponseOrdering,
    /// Rule deciding whether stored values count as present.
    #[serde(default)]
    pub value_presence: ValuePresence,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            bearer_token: None,
            ordering: ResponseOrdering::default(),
            value_presence: ValuePresence::default(),
        }
    }
}

impl ClientConfig {
    /// Returns HTTP service settings for `endpoint`, falling back to the
    /// configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when no endpoint is known.
    pub fn service_config(&self, endpoint: Option<&str>) -> Result<HttpServiceConfig, ConfigError> {
        let endpoint = endpoint
            .or(self.endpoint.as_deref())
            .ok_or_else(|| ConfigError::Invalid("client.endpoint must be set".to_string()))?;
        let mut config = HttpServiceConfig::new(endpoint.trim());
        config.bearer_token.clone_from(&self.bearer_token);
        config.connect_timeout = Duration::from_millis(self.connect_timeout_ms);
        config.request_timeout = Duration::from_millis(self.request_timeout_ms);
        Ok(config)
    }

    /// Validates client configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(endpoint) = &self.endpoint {
            let trimmed = endpoint.trim();
            if !(trimmed.starts_with("https://") || trimmed.starts_with("http://")) {
                return Err(ConfigError::Invalid(
                    "client.endpoint must include http:// or https://".to_string(),
                ));
            }
        }
        if !(MIN_CONNECT_TIMEOUT_MS ..= MAX_CONNECT_TIMEOUT_MS).contains(&self.connect_timeout_ms) {
            return Err(ConfigError::Invalid(format!(
                "client.connect_timeout_ms must be between {MIN_CONNECT_TIMEOUT_MS} and \
                 {MAX_CONNECT_TIMEOUT_MS}"
            )));
        }
        if !(MIN_REQUEST_TIMEOUT_MS ..= MAX_REQUEST_TIMEOUT_MS).contains(&self.request_timeout_ms) {
            return Err(ConfigError::Invalid(format!(
                "client.request_timeout_ms must be between {MIN_REQUEST_TIMEOUT_MS} and \
                 {MAX_REQUEST_TIMEOUT_MS}"
            )));
        }
        if let Some(token) = &self.bearer_token
            && (token.trim().is_empty() || token.chars().any(char::is_control))
        {
            return Err(ConfigError::Invalid(
                "client.bearer_token must be non-empty printable text".to_string(),
            ));
        }
        Ok(())
    }
}

/// Form template registry entry.
#[derive(Debug, Clone, Deserialize)]
pub struct FormTemplateConfig {
    /// Template name used in routes.
    pub name: String,
    /// Path of the JSON template schema.
    pub path: String,
}

impl FormTemplateConfig {
    /// Validates a registry entry.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("form_templates.name must be non-empty".to_string()));
        }
        validate_path_string("form_templates.path", &self.path)
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path: explicit, then environment, then default.
fn resolve_path(path: Option<&Path>, env_path: Option<String>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Some(env_path) = env_path {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} component too long")));
        }
    }
    Ok(())
}

/// Default bind address.
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

/// Default mount path.
fn default_mount_path() -> String {
    DEFAULT_MOUNT_PATH.to_string()
}

/// Default request body limit.
const fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

/// Default connect timeout.
const fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

/// Default request timeout.
const fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

/// Serde default for enabled switches.
const fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    //! Unit tests for path resolution.
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only assertions.")]

    use std::path::Path;
    use std::path::PathBuf;

    use super::ConfigError;
    use super::MAX_PATH_COMPONENT_LENGTH;
    use super::resolve_path;
    use super::validate_path;

    #[test]
    fn explicit_path_wins_over_environment() {
        let resolved =
            resolve_path(Some(Path::new("explicit.toml")), Some("env.toml".to_string())).unwrap();
        assert_eq!(resolved, PathBuf::from("explicit.toml"));
        let resolved = resolve_path(None, Some("env.toml".to_string())).unwrap();
        assert_eq!(resolved, PathBuf::from("env.toml"));
        assert_eq!(resolve_path(None, None).unwrap(), PathBuf::from("genesys.toml"));
    }

    #[test]
    fn oversized_paths_are_rejected() {
        assert!(matches!(resolve_path(None, Some("a".repeat(5000))), Err(ConfigError::Invalid(_))));
        let component = "c".repeat(MAX_PATH_COMPONENT_LENGTH + 1);
        let path = PathBuf::from("configs").join(component);
        assert!(matches!(validate_path(&path), Err(ConfigError::Invalid(_))));
    }
}
