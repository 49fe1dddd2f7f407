// crates/genesys-cli/src/main.rs
// ============================================================================
// Module: Genesys CLI Entry Point
// Description: Command dispatcher for the validation server and schema tools.
// Purpose: Serve validation, inspect form templates, and validate payloads.
// Dependencies: clap, genesys-config, genesys-core, genesys-forms, genesys-server, tokio.
// ============================================================================

//! ## Overview
//! The `genesys` binary starts the validation server and offers offline tools
//! for form templates: listing extracted fields, flattening a single field,
//! validating a payload (in-process or against a remote endpoint) and
//! checking a configuration file. Schema diagnostics are written to stderr as
//! JSON lines; command output goes to stdout.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use genesys_config::GenesysConfig;
use genesys_core::DiagnosticSink;
use genesys_core::FieldDescriptor;
use genesys_core::Payload;
use genesys_core::StderrDiagnosticSink;
use genesys_core::ValidationResult;
use genesys_core::ValuePresence;
use genesys_forms::FormSession;
use genesys_forms::HttpValidationService;
use genesys_forms::LocalValidationService;
use genesys_forms::ValidationReconciler;
use genesys_forms::ValidationService;
use genesys_server::GenesysServer;
use genesys_validation::ValidationEngine;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum schema or payload file size accepted by the CLI.
const MAX_INPUT_BYTES: usize = 4 * 1024 * 1024;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "genesys", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the validation HTTP server.
    Serve(ServeCommand),
    /// List the fields extracted from a form template.
    Fields(FieldsCommand),
    /// Print the flattened schema of one field.
    Flatten(FlattenCommand),
    /// Validate a payload against a form template.
    Validate(ValidateCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Arguments for `serve`.
#[derive(Args, Debug)]
struct ServeCommand {
    /// Config file path (defaults to `GENESYS_CONFIG` or `genesys.toml`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Output format for `fields`.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
enum FieldsFormat {
    /// Pretty-printed JSON.
    #[default]
    Json,
    /// One line per field.
    Text,
}

/// Arguments for `fields`.
#[derive(Args, Debug)]
struct FieldsCommand {
    /// Form template path.
    #[arg(long, value_name = "PATH")]
    schema: PathBuf,
    /// Stored answers to show per field.
    #[arg(long, value_name = "PATH")]
    payload: Option<PathBuf>,
    /// Config file supplying `client.value_presence`.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Output format.
    #[arg(long, value_enum, default_value_t = FieldsFormat::Json)]
    format: FieldsFormat,
}

/// Arguments for `flatten`.
#[derive(Args, Debug)]
struct FlattenCommand {
    /// Form template path.
    #[arg(long, value_name = "PATH")]
    schema: PathBuf,
    /// Field to flatten.
    #[arg(long, value_name = "NAME")]
    field: String,
}

/// Arguments for `validate`.
#[derive(Args, Debug)]
struct ValidateCommand {
    /// Form template path.
    #[arg(long, value_name = "PATH")]
    schema: PathBuf,
    /// Payload path.
    #[arg(long, value_name = "PATH")]
    payload: PathBuf,
    /// Remote validation endpoint; validates in-process when omitted.
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,
    /// Config file for client and engine settings.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate a config file.
    Validate(ConfigValidateCommand),
}

/// Arguments for `config validate`.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Config file path (defaults to `GENESYS_CONFIG` or `genesys.toml`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Output of `fields`.
#[derive(Debug, Serialize)]
struct FieldsReport {
    /// Deep field extraction.
    fields: Vec<FieldDescriptor>,
    /// Shallow property names.
    field_names: Vec<String>,
    /// Whether every field is an object step.
    pagination_possible: bool,
    /// Presence rule applied to `values`.
    #[serde(skip_serializing_if = "Option::is_none")]
    value_presence: Option<ValuePresence>,
    /// Current value per field when answers were supplied; `null` when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    values: Option<Payload>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

/// Errors returned by bounded file reads.
#[derive(Debug)]
enum ReadLimitError {
    /// File I/O failure.
    Io(std::io::Error),
    /// File size exceeds the configured limit.
    TooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Allowed limit in bytes.
        limit: usize,
    },
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve(command) => command_serve(command).await,
        Commands::Fields(command) => command_fields(&command),
        Commands::Flatten(command) => command_flatten(&command),
        Commands::Validate(command) => command_validate(command).await,
        Commands::Config {
            command,
        } => command_config(&command),
    }
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(command: ServeCommand) -> CliResult<ExitCode> {
    let config = GenesysConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    let bind = config.server.bind.clone();
    let server = tokio::task::spawn_blocking(move || GenesysServer::from_config(config))
        .await
        .map_err(|err| CliError::new(format!("server init join failed: {err}")))?
        .map_err(|err| CliError::new(format!("server init failed: {err}")))?;
    let names = server.templates().names().collect::<Vec<_>>().join(", ");
    write_stderr_line(&format!(
        "genesys: serving {} form template(s) on {bind} [{names}]",
        server.templates().len()
    ))
    .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    server.serve().await.map_err(|err| CliError::new(format!("server failed: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Schema Commands
// ============================================================================

/// Executes the `fields` command.
fn command_fields(command: &FieldsCommand) -> CliResult<ExitCode> {
    let schema = read_json_file(&command.schema, "schema")?;
    let config = load_optional_config(command.config.as_deref())?;
    let answers = match command.payload.as_deref() {
        Some(path) => Some(read_payload_file(path)?),
        None => None,
    };
    let report =
        fields_report(schema, answers, config.client.value_presence, &StderrDiagnosticSink)?;
    let output = match command.format {
        FieldsFormat::Json => to_pretty_json(&report)?,
        FieldsFormat::Text => render_fields_text(&report),
    };
    write_stdout_line(output.trim_end()).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `flatten` command.
fn command_flatten(command: &FlattenCommand) -> CliResult<ExitCode> {
    let schema = read_json_file(&command.schema, "schema")?;
    let flattened = flatten_field(schema, &command.field, &StderrDiagnosticSink)?;
    write_stdout_line(&to_pretty_json(&flattened)?)
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Extracts the fields of `schema`, reading `answers` under `presence`.
fn fields_report(
    schema: Value,
    answers: Option<Payload>,
    presence: ValuePresence,
    diagnostics: &dyn DiagnosticSink,
) -> CliResult<FieldsReport> {
    let with_values = answers.is_some();
    let session = open_session(schema, answers, presence, diagnostics)?;
    let values = with_values.then(|| {
        session
            .fields()
            .iter()
            .map(|field| {
                let value = session.current_value(field, Some(session.payload()));
                (field.field_name.clone(), value.cloned().unwrap_or(Value::Null))
            })
            .collect::<Payload>()
    });
    Ok(FieldsReport {
        fields: session.fields().to_vec(),
        field_names: session.field_names().to_vec(),
        pagination_possible: session.pagination_possible(),
        value_presence: with_values.then(|| session.presence()),
        values,
    })
}

/// Renders one line per field: name, type, and a child marker.
fn render_fields_text(report: &FieldsReport) -> String {
    let mut output = String::new();
    for field in &report.fields {
        let kind = field.json_schema_field.get("type").and_then(Value::as_str).unwrap_or("-");
        output.push_str(&field.field_name);
        output.push('\t');
        output.push_str(kind);
        if field.is_child {
            output.push_str("\tchild");
        }
        if let Some(value) = report.values.as_ref().and_then(|values| values.get(&field.field_name)) {
            output.push('\t');
            output.push_str(&value.to_string());
        }
        output.push('\n');
    }
    output.push_str("pagination_possible\t");
    output.push_str(if report.pagination_possible { "true" } else { "false" });
    output.push('\n');
    output
}

/// Returns the flattened schema of `field_name`.
fn flatten_field(
    schema: Value,
    field_name: &str,
    diagnostics: &dyn DiagnosticSink,
) -> CliResult<Value> {
    let session = open_session(schema, None, ValuePresence::default(), diagnostics)?;
    let field = session
        .field(field_name)
        .ok_or_else(|| CliError::new(format!("unknown field: {field_name}")))?;
    session
        .flattened_schema(field, diagnostics)
        .cloned()
        .map_err(|err| CliError::new(format!("flatten failed: {err}")))
}

/// Opens a form session over `schema`.
fn open_session(
    schema: Value,
    answers: Option<Payload>,
    presence: ValuePresence,
    diagnostics: &dyn DiagnosticSink,
) -> CliResult<FormSession> {
    FormSession::new(schema, answers, presence, diagnostics)
        .map_err(|err| CliError::new(format!("field extraction failed: {err}")))
}

// ============================================================================
// SECTION: Validate Command
// ============================================================================

/// Executes the `validate` command; an invalid payload exits with failure.
async fn command_validate(command: ValidateCommand) -> CliResult<ExitCode> {
    let schema = read_json_file(&command.schema, "schema")?;
    let payload = read_json_file(&command.payload, "payload")?;
    let config = load_optional_config(command.config.as_deref())?;
    let result = validate_payload(&config, command.endpoint.as_deref(), schema, &payload).await?;
    write_stdout_line(&to_pretty_json(&result)?)
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(if result.is_valid { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Validates `payload` remotely when an endpoint is known, locally otherwise.
async fn validate_payload(
    config: &GenesysConfig,
    endpoint: Option<&str>,
    schema: Value,
    payload: &Value,
) -> CliResult<ValidationResult> {
    let remote = endpoint.or(config.client.endpoint.as_deref());
    let service: Box<dyn ValidationService> = match remote {
        Some(endpoint) => {
            let settings = config
                .client
                .service_config(Some(endpoint))
                .map_err(|err| CliError::new(err.to_string()))?;
            Box::new(
                HttpValidationService::new(&settings)
                    .map_err(|err| CliError::new(format!("validation client failed: {err}")))?,
            )
        }
        None => Box::new(LocalValidationService::new(ValidationEngine::new(
            config.validation.engine_options(),
            Arc::new(StderrDiagnosticSink),
        ))),
    };
    let (mut reconciler, ticket) =
        ValidationReconciler::started(schema, config.client.ordering, Some(payload));
    let response = ValidationReconciler::dispatch(service.as_ref(), ticket).await;
    reconciler
        .apply(response)
        .map_err(|err| CliError::new(format!("validation failed: {err}")))?;
    reconciler
        .snapshot()
        .cloned()
        .ok_or_else(|| CliError::new("validation failed: no result".to_string()))
}

// ============================================================================
// SECTION: Config Command
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: &ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => command_config_validate(command),
    }
}

/// Executes the config validation command.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    let config = GenesysConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    write_stdout_line(&format!(
        "config ok: {} form template(s), mount path {}",
        config.form_templates.len(),
        config.server.mount_path
    ))
    .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Input Helpers
// ============================================================================

/// Reads a file from disk while enforcing a hard size limit.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    let file = File::open(path).map_err(ReadLimitError::Io)?;
    let metadata = file.metadata().map_err(ReadLimitError::Io)?;
    let size = metadata.len();
    let limit = u64::try_from(max_bytes).map_err(|_| ReadLimitError::TooLarge {
        size,
        limit: max_bytes,
    })?;
    if size > limit {
        return Err(ReadLimitError::TooLarge {
            size,
            limit: max_bytes,
        });
    }

    let mut limited = file.take(limit.saturating_add(1));
    let mut bytes = Vec::new();
    limited.read_to_end(&mut bytes).map_err(ReadLimitError::Io)?;
    if bytes.len() > max_bytes {
        let actual = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
        return Err(ReadLimitError::TooLarge {
            size: actual,
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

/// Loads `path` when given; defaults otherwise.
fn load_optional_config(path: Option<&Path>) -> CliResult<GenesysConfig> {
    match path {
        Some(path) => GenesysConfig::load(Some(path))
            .map_err(|err| CliError::new(format!("failed to load config: {err}"))),
        None => Ok(GenesysConfig::default()),
    }
}

/// Reads a payload file that must hold a JSON object.
fn read_payload_file(path: &Path) -> CliResult<Payload> {
    match read_json_file(path, "payload")? {
        Value::Object(answers) => Ok(answers),
        _ => Err(CliError::new(format!("payload {} must be a JSON object", path.display()))),
    }
}

/// Reads and parses a JSON input file.
fn read_json_file(path: &Path, label: &str) -> CliResult<Value> {
    let bytes = read_bytes_with_limit(path, MAX_INPUT_BYTES).map_err(|err| match err {
        ReadLimitError::Io(err) => {
            CliError::new(format!("failed to read {label} {}: {err}", path.display()))
        }
        ReadLimitError::TooLarge {
            size,
            limit,
        } => CliError::new(format!(
            "{label} {} is {size} bytes, exceeding the {limit} byte limit",
            path.display()
        )),
    })?;
    serde_json::from_slice(&bytes)
        .map_err(|err| CliError::new(format!("invalid {label} json {}: {err}", path.display())))
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Serializes a value as pretty JSON.
fn to_pretty_json<T: Serialize>(value: &T) -> CliResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(format!("failed to serialize output: {err}")))
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
