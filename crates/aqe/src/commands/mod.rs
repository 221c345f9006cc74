//! CLI command implementations
//!
//! Each command layers its flags over the optional config file: a flag wins,
//! then the file, and a value missing from both is a
//! [`CliError::MissingArgument`].

pub mod extract;
pub mod inspect;
pub mod setup;
pub mod transform;

use std::path::PathBuf;

use air_quality_core::database::Connector;
use air_quality_core::pipeline::{ConfigFile, DEFAULT_DATABASE_PATH, PipelineRunner, RunMode};
use air_quality_core::{DuckDbConnector, RunReport};

use crate::error::CliError;

/// Pick the flag value, falling back to the config file value
pub(crate) fn resolve<T: Clone>(
    flag: &Option<T>,
    file: &Option<T>,
    name: &str,
) -> Result<T, CliError> {
    flag.as_ref()
        .or(file.as_ref())
        .cloned()
        .ok_or_else(|| CliError::MissingArgument(name.to_string()))
}

/// Database path from the flag, the config file or the default
pub(crate) fn database_path(flag: &Option<PathBuf>, config: &ConfigFile) -> PathBuf {
    flag.as_ref()
        .or(config.database_path.as_ref())
        .cloned()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH))
}

/// Connector for `path` with the configured session settings
pub(crate) fn connector(path: PathBuf, config: &ConfigFile) -> DuckDbConnector {
    DuckDbConnector::new(path).with_settings(config.connection.clone())
}

/// Run one mode and print its step summary, also when the run fails
pub(crate) fn run_and_report<C: Connector>(
    runner: &mut PipelineRunner<C>,
    mode: &RunMode,
) -> Result<RunReport, CliError> {
    match runner.run(mode) {
        Ok(report) => {
            report.print_summary();
            eprintln!();
            eprintln!("Pipeline {} completed successfully!", report.mode);
            Ok(report)
        }
        Err(e) => {
            if let Some(report) = runner.last_report() {
                report.print_summary();
            }
            Err(e.into())
        }
    }
}
