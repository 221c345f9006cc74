//! Command-line definitions for the `aqe` binary
//!
//! Flag spellings follow the pipeline's historical scripts: `setup` uses
//! hyphenated flags, `extract`, `transform` and `inspect` use underscores.
//! The other spelling is accepted as an alias everywhere.

use std::path::PathBuf;

use air_quality_core::{PresentationTable, YearMonth};
use clap::{ArgGroup, Args, Parser, Subcommand};

/// Air-quality ELT pipeline over DuckDB
#[derive(Debug, Parser)]
#[command(name = "aqe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// TOML configuration file; command-line flags take precedence
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create the database schema or destroy the database file
    Setup(SetupArgs),
    /// Load raw monthly partitions for every location
    Extract(ExtractArgs),
    /// Run the transformation scripts
    Transform(TransformArgs),
    /// Print rows of a presentation table
    Inspect(InspectArgs),
}

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("action").required(true).args(["create", "destroy"])))]
pub struct SetupArgs {
    /// Create the database by running the DDL scripts
    #[arg(long)]
    pub create: bool,

    /// Destroy the database
    #[arg(long)]
    pub destroy: bool,

    /// Path to the database
    #[arg(long = "database-path", alias = "database_path")]
    pub database_path: Option<PathBuf>,

    /// Path to the parent directory of the DDL queries
    #[arg(long = "ddl-query-parent-dir", alias = "ddl_query_parent_dir")]
    pub ddl_query_parent_dir: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ExtractArgs {
    /// Path to the JSON file keyed by location id
    #[arg(long = "locations_file_path", alias = "locations-file-path")]
    pub locations_file_path: Option<PathBuf>,

    /// Start date in YYYY-MM format
    #[arg(long = "start_date", alias = "start-date")]
    pub start_date: Option<YearMonth>,

    /// End date in YYYY-MM format (inclusive)
    #[arg(long = "end_date", alias = "end-date")]
    pub end_date: Option<YearMonth>,

    /// Path to the extraction query template
    #[arg(
        long = "extract_query_template_path",
        alias = "extract-query-template-path"
    )]
    pub extract_query_template_path: Option<PathBuf>,

    /// Path to the database
    #[arg(long = "database_path", alias = "database-path")]
    pub database_path: Option<PathBuf>,

    /// Base path of the source partitions (directory or s3:// prefix)
    #[arg(long = "source_base_path", alias = "source-base-path")]
    pub source_base_path: Option<String>,
}

#[derive(Debug, Args)]
pub struct TransformArgs {
    /// Path to the database
    #[arg(long = "database_path", alias = "database-path")]
    pub database_path: Option<PathBuf>,

    /// Directory containing the transformation queries
    #[arg(long = "query_directory", alias = "query-directory")]
    pub query_directory: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Path to the database
    #[arg(long = "database_path", alias = "database-path")]
    pub database_path: Option<PathBuf>,

    /// Table to read: `latest` or `daily`
    #[arg(long)]
    pub table: PresentationTable,

    /// Maximum number of rows to print
    #[arg(long)]
    pub limit: Option<usize>,
}
