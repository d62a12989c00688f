use std::process::ExitCode;

use clap::Parser;
use orcamento_cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(error) = orcamento_cli::logging::init(&cli.load_options()) {
        eprintln!("orcamento: logging disabled: {error:#}");
    }

    let result = orcamento_cli::execute(cli);
    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
