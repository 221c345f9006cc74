//! `aqe inspect`: print rows of a presentation table

use air_quality_core::database::{AccessMode, ConnectionGuard, Connector};
use air_quality_core::pipeline::ConfigFile;
use air_quality_core::presentation::read_presentation;

use super::{connector, database_path};
use crate::cli::InspectArgs;
use crate::error::CliError;

/// Handle the `inspect` command
pub fn handle_inspect(args: &InspectArgs, config: &ConfigFile) -> Result<(), CliError> {
    let db_path = database_path(&args.database_path, config);
    let reader = connector(db_path, config).with_access_mode(AccessMode::ReadOnly);

    let guard = ConnectionGuard::new(reader.open()?);
    let rows = read_presentation(guard.connection()?, args.table, args.limit)?;
    guard.release()?;

    let output =
        serde_json::to_string_pretty(&rows).map_err(|e| CliError::OutputError(e.to_string()))?;
    println!("{}", output);
    eprintln!("{} row(s) from {}", rows.len(), args.table);
    Ok(())
}
