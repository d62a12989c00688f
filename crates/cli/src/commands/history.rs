use chrono::{DateTime, Utc};
use orcamento_core::clock::Clock;
use orcamento_core::config::LoadOptions;
use orcamento_core::domain::history::{HistoryEntry, HistorySummary};
use orcamento_core::format::{
    format_currency, format_date_time, format_quote_number, format_relative_time, truncate_text,
};
use serde::Serialize;
use tracing::info;

use crate::commands::{open_quote_store, CommandResult, EXIT_INPUT};

const LISTING_TEXT_WIDTH: usize = 40;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoryRow {
    id: i64,
    number: String,
    company: String,
    client: String,
    total: String,
    created_at: String,
    created: String,
}

impl HistoryRow {
    fn new(entry: &HistoryEntry, now: DateTime<Utc>) -> Self {
        let created_at = entry.created_at.to_rfc3339();
        Self {
            id: entry.id,
            number: format_quote_number(entry.number),
            company: truncate_text(&entry.company, LISTING_TEXT_WIDTH),
            client: truncate_text(&entry.client, LISTING_TEXT_WIDTH),
            total: format_currency(entry.total),
            created_at: format_date_time(&created_at),
            created: format_relative_time(&created_at, now),
        }
    }
}

/// Most recent first.
pub fn list(options: &LoadOptions, clock: &impl Clock) -> CommandResult {
    const COMMAND: &str = "history";
    let store = match open_quote_store(COMMAND, options) {
        Ok(store) => store,
        Err(failure) => return failure,
    };

    match store.history() {
        Ok(history) => {
            let now = clock.now();
            let rows: Vec<HistoryRow> =
                history.iter().map(|entry| HistoryRow::new(entry, now)).collect();
            CommandResult::with_data(COMMAND, format!("{} saved quotes", rows.len()), &rows)
        }
        Err(error) => CommandResult::from_storage(COMMAND, error),
    }
}

pub fn show(options: &LoadOptions, id: i64) -> CommandResult {
    const COMMAND: &str = "show";
    let store = match open_quote_store(COMMAND, options) {
        Ok(store) => store,
        Err(failure) => return failure,
    };

    match store.load_history_entry(id) {
        Ok(Some(entry)) => CommandResult::with_data(
            COMMAND,
            format!("quote {}", format_quote_number(entry.number)),
            &entry,
        ),
        Ok(None) => CommandResult::not_found(COMMAND, format!("no history entry with id {id}")),
        Err(error) => CommandResult::from_storage(COMMAND, error),
    }
}

pub fn remove(options: &LoadOptions, id: i64) -> CommandResult {
    const COMMAND: &str = "remove";
    let store = match open_quote_store(COMMAND, options) {
        Ok(store) => store,
        Err(failure) => return failure,
    };

    match store.remove_history_entry(id) {
        Ok(Some(entry)) => CommandResult::with_data(
            COMMAND,
            format!("removed quote {} from history", format_quote_number(entry.number)),
            &HistorySummary::from(&entry),
        ),
        Ok(None) => CommandResult::not_found(COMMAND, format!("no history entry with id {id}")),
        Err(error) => CommandResult::from_storage(COMMAND, error),
    }
}

pub fn stats(options: &LoadOptions) -> CommandResult {
    const COMMAND: &str = "stats";
    let store = match open_quote_store(COMMAND, options) {
        Ok(store) => store,
        Err(failure) => return failure,
    };

    match store.stats() {
        Ok(stats) => CommandResult::with_data(
            COMMAND,
            format!("{} saved quotes using {}", stats.total_entries, stats.storage_size),
            &stats,
        ),
        Err(error) => CommandResult::from_storage(COMMAND, error),
    }
}

/// Wipes the current quote, the numbering and the history. Needs `confirmed`.
pub fn clear(options: &LoadOptions, confirmed: bool) -> CommandResult {
    const COMMAND: &str = "clear";
    if !confirmed {
        return CommandResult::failure(
            COMMAND,
            "confirmation_required",
            "refusing to clear stored quotes without --yes",
            EXIT_INPUT,
        );
    }

    let store = match open_quote_store(COMMAND, options) {
        Ok(store) => store,
        Err(failure) => return failure,
    };

    match store.clear_all() {
        Ok(()) => {
            info!(event_name = "cli.store.cleared", "stored quotes cleared");
            CommandResult::success(COMMAND, "cleared current quote, numbering and history")
        }
        Err(error) => CommandResult::from_storage(COMMAND, error),
    }
}
