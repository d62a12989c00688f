use std::path::Path;

use orcamento_core::clock::Clock;
use orcamento_core::document::assemble_quote;
use orcamento_core::exchange::suggested_pdf_file_name;
use serde::Serialize;
use tracing::info;

use crate::commands::quote::load_quote_file;
use crate::commands::{write_output, CommandResult, EXIT_INTERNAL};
use crate::render::QuoteRenderer;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Rendered {
    output: String,
    print_file_name: String,
}

/// Renders a quote file to HTML, printed to stdout or written to `output`.
pub fn run(path: &Path, output: Option<&Path>, clock: &impl Clock) -> CommandResult {
    const COMMAND: &str = "render";
    let quote = match load_quote_file(COMMAND, path) {
        Ok(quote) => quote,
        Err(failure) => return failure,
    };
    let renderer = match QuoteRenderer::with_embedded_template() {
        Ok(renderer) => renderer,
        Err(error) => {
            return CommandResult::failure(COMMAND, "template", error.to_string(), EXIT_INTERNAL)
        }
    };

    let document = assemble_quote(&quote);
    let html = match renderer.render(&document, &quote.financial) {
        Ok(html) => html,
        Err(error) => {
            return CommandResult::failure(COMMAND, "render", error.to_string(), EXIT_INTERNAL)
        }
    };

    let Some(output) = output else {
        return CommandResult::raw(html);
    };
    if let Err(failure) = write_output(COMMAND, output, &html) {
        return failure;
    }

    info!(
        event_name = "cli.quote.rendered",
        quote_number = quote.metadata.number,
        output = %output.display(),
        "quote rendered"
    );
    let print_file_name = suggested_pdf_file_name(&quote, clock.now().date_naive());
    CommandResult::with_data(
        COMMAND,
        format!("rendered {}", document.title),
        &Rendered { output: output.display().to_string(), print_file_name },
    )
}
