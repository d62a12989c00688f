pub mod commands;
pub mod logging;
pub mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use orcamento_core::clock::{Clock, SystemClock};
use orcamento_core::config::{ConfigOverrides, LoadOptions};

use crate::commands::CommandResult;

#[derive(Debug, Parser)]
#[command(
    name = "orcamento",
    about = "Orcamento quote generator CLI",
    long_about = "Draft, total, render and keep a numbered history of customer quotes.",
    after_help = "Examples:\n  orcamento new > draft.json\n  orcamento totals quote.json\n  orcamento render quote.json --output quote.html\n  orcamento save quote.json\n  orcamento history"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Read configuration from this file")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Override database.url (`:memory:` or a sqlite URL)")]
    database_url: Option<String>,
    #[arg(long, global = true, help = "Override logging.level")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[command(about = "Show the number the next saved quote will receive")]
    NextNumber,
    #[command(about = "Draft a new quote from the configured company defaults")]
    New {
        #[arg(long, help = "Issuer name for this draft")]
        company: Option<String>,
        #[arg(long, help = "Salesperson for this draft")]
        salesperson: Option<String>,
        #[arg(long, help = "Validity in days for this draft")]
        validity_days: Option<u32>,
    },
    #[command(about = "Recompute subtotal, discount and total of a quote file")]
    Totals { file: PathBuf },
    #[command(about = "Render a quote file to print-ready HTML")]
    Render {
        file: PathBuf,
        #[arg(long, short, help = "Write the HTML here instead of stdout")]
        output: Option<PathBuf>,
    },
    #[command(about = "Save a quote file to the history under the next quote number")]
    Save { file: PathBuf },
    #[command(about = "Print the current (last saved) quote")]
    Current,
    #[command(about = "List saved quotes, most recent first")]
    History,
    #[command(about = "Print one saved quote by history id")]
    Show { id: i64 },
    #[command(about = "Delete one saved quote by history id")]
    Remove { id: i64 },
    #[command(about = "Export the current quote with its export envelope")]
    Export {
        #[arg(long, short, help = "Write the export here instead of stdout")]
        output: Option<PathBuf>,
    },
    #[command(about = "Back up current quote, numbering and history")]
    Backup {
        #[arg(long, short, help = "Write the backup here instead of stdout")]
        output: Option<PathBuf>,
    },
    #[command(about = "Restore a backup file produced by `backup`")]
    Restore { file: PathBuf },
    #[command(about = "Show history size, latest quote and storage usage")]
    Stats,
    #[command(about = "Delete the current quote, numbering and history")]
    Clear {
        #[arg(long, help = "Confirm the deletion")]
        yes: bool,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, storage and template readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

impl Cli {
    /// Global flags plus the per-draft overrides of `new`.
    pub fn load_options(&self) -> LoadOptions {
        let mut overrides = ConfigOverrides {
            database_url: self.database_url.clone(),
            log_level: self.log_level.clone(),
            ..ConfigOverrides::default()
        };
        if let Command::New { company, salesperson, validity_days } = &self.command {
            overrides.company_name = company.clone();
            overrides.salesperson = salesperson.clone();
            overrides.validity_days = *validity_days;
        }

        LoadOptions { config_path: self.config.clone(), require_file: self.config.is_some(), overrides }
    }
}

pub fn execute(cli: Cli) -> CommandResult {
    let options = cli.load_options();
    execute_with(cli.command, &options, &SystemClock)
}

pub fn execute_with(command: Command, options: &LoadOptions, clock: &impl Clock) -> CommandResult {
    match command {
        Command::NextNumber => commands::quote::next_number(options),
        Command::New { .. } => commands::quote::new(options, clock),
        Command::Totals { file } => commands::quote::totals(&file),
        Command::Render { file, output } => {
            commands::render::run(&file, output.as_deref(), clock)
        }
        Command::Save { file } => commands::quote::save(options, &file),
        Command::Current => commands::quote::current(options),
        Command::History => commands::history::list(options, clock),
        Command::Show { id } => commands::history::show(options, id),
        Command::Remove { id } => commands::history::remove(options, id),
        Command::Export { output } => commands::quote::export(options, output.as_deref(), clock),
        Command::Backup { output } => commands::backup::backup(options, output.as_deref()),
        Command::Restore { file } => commands::backup::restore(options, &file),
        Command::Stats => commands::history::stats(options),
        Command::Clear { yes } => commands::history::clear(options, yes),
        Command::Config => CommandResult { exit_code: 0, output: commands::config::run(options) },
        Command::Doctor { json } => commands::doctor::run(options, json),
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Command};

    #[test]
    fn new_flags_become_config_overrides() {
        let cli = Cli::parse_from([
            "orcamento",
            "--database-url",
            ":memory:",
            "new",
            "--company",
            "Barros",
            "--validity-days",
            "15",
        ]);
        let options = cli.load_options();

        assert_eq!(options.overrides.database_url.as_deref(), Some(":memory:"));
        assert_eq!(options.overrides.company_name.as_deref(), Some("Barros"));
        assert_eq!(options.overrides.validity_days, Some(15));
        assert!(!options.require_file);
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::parse_from(["orcamento", "show", "42", "--config", "custom.toml"]);
        assert!(matches!(cli.command, Command::Show { id: 42 }));
        assert!(cli.load_options().require_file);
    }

    #[test]
    fn clear_requires_explicit_flag_to_confirm() {
        let cli = Cli::parse_from(["orcamento", "clear"]);
        assert!(matches!(cli.command, Command::Clear { yes: false }));
    }
}
