//! Command-line interface for the Utflykt aggregation pipeline.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod error;
mod fs;
mod run;

pub use error::CliError;

/// Run the Utflykt CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Run(args) => run::execute(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "utflykt",
    about = "Aggregate points of interest from open data sources into published dumps",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch every configured source, run the pipeline, and write the dumps.
    Run(run::RunArgs),
}
