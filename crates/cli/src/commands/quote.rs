//! Commands that work on a single quote: numbering, drafting, totals,
//! saving and exporting.

use std::path::Path;

use orcamento_core::clock::Clock;
use orcamento_core::config::LoadOptions;
use orcamento_core::cpq::{recompute_with_trace, summarize, LineItemsSummary, PricingTraceStep};
use orcamento_core::domain::history::HistorySummary;
use orcamento_core::domain::quote::{FinancialSummary, Quote};
use orcamento_core::errors::ApplicationError;
use orcamento_core::exchange::{import_quote, suggested_export_file_name, QuoteExport};
use orcamento_core::format::{format_currency, format_quote_number};
use serde::Serialize;
use tracing::info;

use crate::commands::{
    load_config, open_quote_store, read_input, store_for, write_output, CommandResult,
    EXIT_INTERNAL,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NextNumber {
    next_number: u64,
    formatted: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Draft {
    quote: Quote,
    missing_fields: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FormattedTotals {
    subtotal: String,
    discount: String,
    surcharge: String,
    total: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Totals {
    financial: FinancialSummary,
    formatted: FormattedTotals,
    items: LineItemsSummary,
    steps: Vec<PricingTraceStep>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Saved {
    entry: HistorySummary,
    missing_fields: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Exported {
    file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    export: Option<QuoteExport>,
}

/// Shows the number the next saved quote will get. Never consumes it.
pub fn next_number(options: &LoadOptions) -> CommandResult {
    const COMMAND: &str = "next-number";
    let store = match open_quote_store(COMMAND, options) {
        Ok(store) => store,
        Err(failure) => return failure,
    };

    let next_number = store.next_number();
    let formatted = format_quote_number(next_number);
    CommandResult::with_data(
        COMMAND,
        format!("next quote number is {formatted}"),
        &NextNumber { next_number, formatted },
    )
}

/// Drafts a quote from the configured issuer with the next number and today's date.
pub fn new(options: &LoadOptions, clock: &impl Clock) -> CommandResult {
    const COMMAND: &str = "new";
    let config = match load_config(COMMAND, options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let store = match store_for(COMMAND, &config) {
        Ok(store) => store,
        Err(failure) => return failure,
    };

    let quote = Quote::draft(
        store.next_number(),
        clock.now().date_naive(),
        config.company.to_company_info(),
        config.quote.validity_days,
        config.quote.salesperson.clone(),
    );
    let missing_fields = quote.missing_required_fields();
    CommandResult::with_data(
        COMMAND,
        format!("drafted quote {}", format_quote_number(quote.metadata.number)),
        &Draft { quote, missing_fields },
    )
}

/// Recomputes the totals of a quote file without touching the store.
pub fn totals(path: &Path) -> CommandResult {
    const COMMAND: &str = "totals";
    let quote = match load_quote_file(COMMAND, path) {
        Ok(quote) => quote,
        Err(failure) => return failure,
    };

    let trace = recompute_with_trace(
        &quote.items,
        quote.financial.discount_percent,
        quote.financial.surcharge,
    );
    let financial = trace.summary;
    let formatted = FormattedTotals {
        subtotal: format_currency(financial.subtotal),
        discount: format_currency(financial.discount_value),
        surcharge: format_currency(financial.surcharge),
        total: format_currency(financial.total),
    };
    let message = format!("total {}", formatted.total);
    CommandResult::with_data(
        COMMAND,
        message,
        &Totals { financial, formatted, items: summarize(&quote.items), steps: trace.steps },
    )
}

/// Commits a quote file to the history. Fields the file omits take their
/// defaults; a file without a number takes the next one in sequence.
pub fn save(options: &LoadOptions, path: &Path) -> CommandResult {
    const COMMAND: &str = "save";
    let store = match open_quote_store(COMMAND, options) {
        Ok(store) => store,
        Err(failure) => return failure,
    };
    let mut quote = match load_quote_file(COMMAND, path) {
        Ok(quote) => quote,
        Err(failure) => return failure,
    };
    if quote.metadata.number == 0 {
        quote.metadata.number = store.next_number();
    }

    let missing_fields = quote.missing_required_fields();
    match store.commit(&quote) {
        Ok(entry) => {
            info!(
                event_name = "cli.quote.saved",
                quote_number = entry.number,
                missing_fields = missing_fields.len(),
                "quote saved"
            );
            CommandResult::with_data(
                COMMAND,
                format!("saved quote {}", format_quote_number(entry.number)),
                &Saved { entry: HistorySummary::from(&entry), missing_fields },
            )
        }
        Err(error) => CommandResult::from_storage(COMMAND, error),
    }
}

pub fn current(options: &LoadOptions) -> CommandResult {
    const COMMAND: &str = "current";
    let store = match open_quote_store(COMMAND, options) {
        Ok(store) => store,
        Err(failure) => return failure,
    };

    match store.load_current() {
        Ok(Some(quote)) => CommandResult::with_data(
            COMMAND,
            format!("current quote {}", format_quote_number(quote.metadata.number)),
            &quote,
        ),
        Ok(None) => CommandResult::not_found(COMMAND, "no quote has been saved yet"),
        Err(error) => CommandResult::from_storage(COMMAND, error),
    }
}

/// Wraps the current quote in the export envelope, either printed or
/// written to `output`.
pub fn export(options: &LoadOptions, output: Option<&Path>, clock: &impl Clock) -> CommandResult {
    const COMMAND: &str = "export";
    let store = match open_quote_store(COMMAND, options) {
        Ok(store) => store,
        Err(failure) => return failure,
    };
    let quote = match store.load_current() {
        Ok(Some(quote)) => quote,
        Ok(None) => return CommandResult::not_found(COMMAND, "no quote has been saved yet"),
        Err(error) => return CommandResult::from_storage(COMMAND, error),
    };

    let now = clock.now();
    let file_name = suggested_export_file_name(&quote, now.date_naive());
    let export = QuoteExport::new(quote, now);

    let Some(output) = output else {
        return CommandResult::with_data(
            COMMAND,
            format!("suggested file name {file_name}"),
            &Exported { file_name, export: Some(export) },
        );
    };

    let json = match export.to_json_pretty() {
        Ok(json) => json,
        Err(error) => {
            return CommandResult::failure(COMMAND, "serialization", error.to_string(), EXIT_INTERNAL)
        }
    };
    if let Err(failure) = write_output(COMMAND, output, &json) {
        return failure;
    }
    CommandResult::with_data(
        COMMAND,
        format!("exported to {}", output.display()),
        &Exported { file_name, export: None },
    )
}

/// Reads a quote file the way an import would, starting from an empty quote.
pub(crate) fn load_quote_file(command: &str, path: &Path) -> Result<Quote, CommandResult> {
    let payload = read_input(command, path)?;
    import_quote(&Quote::default(), &payload)
        .map_err(|error| CommandResult::from_application(command, ApplicationError::from(error)))
}
