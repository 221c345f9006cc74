//! aqe - command-line entry point for the air-quality ELT pipeline

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use air_quality_core::pipeline::ConfigFile;

mod cli;
mod commands;
mod error;

use cli::{Cli, Commands};
use error::CliError;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let config = match cli.config {
        Some(ref path) => ConfigFile::load(path)?,
        None => ConfigFile::default(),
    };

    match &cli.command {
        Commands::Setup(args) => commands::setup::handle_setup(args, &config),
        Commands::Extract(args) => commands::extract::handle_extract(args, &config),
        Commands::Transform(args) => commands::transform::handle_transform(args, &config),
        Commands::Inspect(args) => commands::inspect::handle_inspect(args, &config),
    }
}
