use clap::Parser;
use colored::Colorize;

use lockwarden_cli::cli::Cli;
use lockwarden_cli::error::CliError;
use lockwarden_cli::output::OutputWriter;
use lockwarden_cli::{logging, scan};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = scan::load_config(&cli).await?;

    logging::init_tracing(&config.general).map_err(|e| CliError::Logging(e.to_string()))?;

    let writer = OutputWriter::new(cli.output);
    scan::execute(&cli, config, &writer).await
}
