//! `aqe setup`: create the schema or destroy the database

use air_quality_core::database::destroy_database;
use air_quality_core::pipeline::{ConfigFile, PipelineRunner, RunMode};

use super::{connector, database_path, resolve, run_and_report};
use crate::cli::SetupArgs;
use crate::error::CliError;

/// Handle the `setup` command
pub fn handle_setup(args: &SetupArgs, config: &ConfigFile) -> Result<(), CliError> {
    let db_path = database_path(&args.database_path, config);

    if args.destroy {
        let existed = destroy_database(&db_path).map_err(|source| CliError::DestroyError {
            path: db_path.clone(),
            source,
        })?;
        if existed {
            eprintln!("Destroyed database: {}", db_path.display());
        } else {
            eprintln!("No database found at: {}", db_path.display());
        }
        return Ok(());
    }

    let ddl_dir = resolve(
        &args.ddl_query_parent_dir,
        &config.setup.ddl_query_parent_dir,
        "ddl-query-parent-dir",
    )?;

    let mut runner = PipelineRunner::new(connector(db_path, config));
    run_and_report(&mut runner, &RunMode::Setup { ddl_dir })?;
    Ok(())
}
