//! `aqe transform`: run the transformation scripts

use air_quality_core::pipeline::{ConfigFile, PipelineRunner, RunMode};

use super::{connector, database_path, resolve, run_and_report};
use crate::cli::TransformArgs;
use crate::error::CliError;

/// Handle the `transform` command
pub fn handle_transform(args: &TransformArgs, config: &ConfigFile) -> Result<(), CliError> {
    let db_path = database_path(&args.database_path, config);
    let query_dir = resolve(
        &args.query_directory,
        &config.transform.query_directory,
        "query_directory",
    )?;

    let mut runner = PipelineRunner::new(connector(db_path, config));
    run_and_report(&mut runner, &RunMode::Transform { query_dir })?;
    Ok(())
}
