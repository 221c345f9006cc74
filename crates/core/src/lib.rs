//! Air Quality Core - ELT pipeline for air-quality measurements over DuckDB
//!
//! Provides:
//! - Connection handling with exactly-once release
//! - Ordered SQL script discovery
//! - `{{ name }}` query templating
//! - Extraction planning over locations and months
//! - Setup, extract and transform runs with per-step reports
//! - Read-only access to the presentation tables

pub mod database;
pub mod extraction;
pub mod pipeline;
pub mod presentation;
pub mod scripts;
pub mod template;

// Re-export commonly used types
pub use database::{
    ConnectionGuard, ConnectionSettings, Connector, DatabaseConnection, DatabaseError,
};
#[cfg(feature = "duckdb-backend")]
pub use database::{AccessMode, DuckDbConnection, DuckDbConnector};

pub use extraction::{ExtractionUnit, LocationRegistry, YearMonth};
pub use pipeline::{
    ConfigFile, ExtractConfig, PipelineError, PipelineResult, PipelineRunner, RunMode, RunReport,
    RunState, StepOutcome, StepStatus, run_pipeline,
};
pub use presentation::PresentationTable;
pub use scripts::{ScriptFile, collect_scripts};
pub use template::{TemplateError, TemplateVars, render};
