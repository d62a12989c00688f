pub mod backup;
pub mod config;
pub mod doctor;
pub mod history;
pub mod quote;
pub mod render;

use std::fs;
use std::path::Path;

use orcamento_core::config::{AppConfig, LoadOptions};
use orcamento_core::errors::{ApplicationError, InterfaceError};
use orcamento_db::{open_store, KeyValueStore, QuoteStore, StorageError};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_INPUT: u8 = 3;
pub const EXIT_STORAGE: u8 = 4;
pub const EXIT_NOT_FOUND: u8 = 5;
pub const EXIT_INTERNAL: u8 = 6;

pub type CliStore = QuoteStore<Box<dyn KeyValueStore>>;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data: None,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn with_data(command: &str, message: impl Into<String>, data: &impl Serialize) -> Self {
        let data = match serde_json::to_value(data) {
            Ok(data) => data,
            Err(error) => {
                return Self::failure(command, "serialization", error.to_string(), EXIT_INTERNAL)
            }
        };
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data: Some(data),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Plain text output, for commands whose product is a document.
    pub fn raw(output: String) -> Self {
        Self { exit_code: 0, output }
    }

    pub fn not_found(command: &str, message: impl Into<String>) -> Self {
        Self::failure(command, "not_found", message, EXIT_NOT_FOUND)
    }

    pub fn from_interface(command: &str, error: InterfaceError) -> Self {
        let (error_class, exit_code) = match &error {
            InterfaceError::BadRequest { .. } => ("bad_request", EXIT_INPUT),
            InterfaceError::StorageUnavailable { .. } => ("storage_unavailable", EXIT_STORAGE),
            InterfaceError::Internal { .. } => ("internal", EXIT_INTERNAL),
        };
        Self::failure(
            command,
            error_class,
            format!("{} ({})", error.user_message(), error.message()),
            exit_code,
        )
    }

    pub fn from_application(command: &str, error: ApplicationError) -> Self {
        Self::from_interface(command, InterfaceError::from(error))
    }

    pub fn from_storage(command: &str, error: StorageError) -> Self {
        warn!(event_name = "cli.storage.failed", command, error = %error, "storage operation failed");
        Self::from_application(command, ApplicationError::from(error))
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

pub(crate) fn load_config(command: &str, options: &LoadOptions) -> Result<AppConfig, CommandResult> {
    AppConfig::load(options.clone()).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            EXIT_CONFIG,
        )
    })
}

pub(crate) fn open_quote_store(command: &str, options: &LoadOptions) -> Result<CliStore, CommandResult> {
    let config = load_config(command, options)?;
    store_for(command, &config)
}

pub(crate) fn store_for(command: &str, config: &AppConfig) -> Result<CliStore, CommandResult> {
    open_store(&config.database)
        .map(QuoteStore::new)
        .map_err(|error| CommandResult::from_storage(command, error))
}

pub(crate) fn read_input(command: &str, path: &Path) -> Result<String, CommandResult> {
    fs::read_to_string(path).map_err(|error| {
        CommandResult::failure(
            command,
            "input_unreadable",
            format!("could not read `{}`: {error}", path.display()),
            EXIT_INPUT,
        )
    })
}

pub(crate) fn write_output(command: &str, path: &Path, contents: &str) -> Result<(), CommandResult> {
    fs::write(path, contents).map_err(|error| {
        CommandResult::failure(
            command,
            "output_unwritable",
            format!("could not write `{}`: {error}", path.display()),
            EXIT_INTERNAL,
        )
    })
}
