use std::path::Path;

use orcamento_core::config::LoadOptions;
use orcamento_db::StoreBackup;
use serde::Serialize;

use crate::commands::{
    open_quote_store, read_input, write_output, CommandResult, EXIT_INPUT, EXIT_INTERNAL,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Restored {
    current: bool,
    last_number: Option<u64>,
    history_entries: Option<usize>,
}

pub fn backup(options: &LoadOptions, output: Option<&Path>) -> CommandResult {
    const COMMAND: &str = "backup";
    let store = match open_quote_store(COMMAND, options) {
        Ok(store) => store,
        Err(failure) => return failure,
    };
    let backup = match store.export_backup() {
        Ok(backup) => backup,
        Err(error) => return CommandResult::from_storage(COMMAND, error),
    };

    let Some(output) = output else {
        return CommandResult::with_data(COMMAND, "store backup", &backup);
    };

    let json = match serde_json::to_string_pretty(&backup) {
        Ok(json) => json,
        Err(error) => {
            return CommandResult::failure(COMMAND, "serialization", error.to_string(), EXIT_INTERNAL)
        }
    };
    match write_output(COMMAND, output, &json) {
        Ok(()) => CommandResult::success(COMMAND, format!("backup written to {}", output.display())),
        Err(failure) => failure,
    }
}

/// Writes only the parts present in the backup file.
pub fn restore(options: &LoadOptions, path: &Path) -> CommandResult {
    const COMMAND: &str = "restore";
    let raw = match read_input(COMMAND, path) {
        Ok(raw) => raw,
        Err(failure) => return failure,
    };
    let backup: StoreBackup = match serde_json::from_str(&raw) {
        Ok(backup) => backup,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "invalid_backup",
                format!("backup file is not valid: {error}"),
                EXIT_INPUT,
            )
        }
    };

    let store = match open_quote_store(COMMAND, options) {
        Ok(store) => store,
        Err(failure) => return failure,
    };
    match store.import_backup(&backup) {
        Ok(()) => CommandResult::with_data(
            COMMAND,
            format!("restored backup taken at {}", backup.exported_at.to_rfc3339()),
            &Restored {
                current: backup.current.is_some(),
                last_number: backup.last_number,
                history_entries: backup.history.as_ref().map(Vec::len),
            },
        ),
        Err(error) => CommandResult::from_storage(COMMAND, error),
    }
}
