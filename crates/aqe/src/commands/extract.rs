//! `aqe extract`: load raw partitions into the database

use air_quality_core::pipeline::{ConfigFile, ExtractConfig, PipelineRunner, RunMode};

use super::{connector, database_path, resolve, run_and_report};
use crate::cli::ExtractArgs;
use crate::error::CliError;

/// Merge flags and config file into an [`ExtractConfig`]
pub fn extract_config(args: &ExtractArgs, config: &ConfigFile) -> Result<ExtractConfig, CliError> {
    let file = &config.extract;

    let mut extract = ExtractConfig::new(
        resolve(
            &args.locations_file_path,
            &file.locations_file_path,
            "locations_file_path",
        )?,
        resolve(&args.start_date, &file.start_date, "start_date")?,
        resolve(&args.end_date, &file.end_date, "end_date")?,
        resolve(
            &args.extract_query_template_path,
            &file.extract_query_template_path,
            "extract_query_template_path",
        )?,
        resolve(
            &args.source_base_path,
            &file.source_base_path,
            "source_base_path",
        )?,
    );

    if let Some(ref template) = file.partition_path_template {
        extract = extract.with_partition_path_template(template);
    }

    Ok(extract)
}

/// Handle the `extract` command
pub fn handle_extract(args: &ExtractArgs, config: &ConfigFile) -> Result<(), CliError> {
    let db_path = database_path(&args.database_path, config);
    let extract = extract_config(args, config)?;

    let mut runner = PipelineRunner::new(connector(db_path, config));
    run_and_report(&mut runner, &RunMode::Extract(extract))?;
    Ok(())
}
