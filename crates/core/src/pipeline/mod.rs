//! Pipeline orchestration for setup, extract and transform runs
//!
//! A run opens one database connection, does its work and releases the
//! connection before returning:
//!
//! - **Setup**: execute DDL scripts in path order, stop at the first failure
//! - **Extract**: execute one ingestion query per (location, month) unit;
//!   units whose source partition does not exist are logged and skipped,
//!   any other failure stops the run
//! - **Transform**: execute transformation scripts in path order, stop at the
//!   first failure
//!
//! # Example
//!
//! ```rust,ignore
//! use air_quality_core::database::DuckDbConnector;
//! use air_quality_core::pipeline::{PipelineRunner, RunMode};
//!
//! let mut runner = PipelineRunner::new(DuckDbConnector::new("air_quality.db"));
//! let report = runner.run(&RunMode::Transform {
//!     query_dir: "sql/transform".into(),
//! })?;
//!
//! println!("Run completed in {}", report.duration_formatted());
//! ```

mod config;
mod error;
mod report;
mod runner;

pub use config::{
    ConfigFile, DEFAULT_DATABASE_PATH, ExtractConfig, ExtractSection, RunMode, SetupSection,
    TransformSection,
};
pub use error::{PipelineError, PipelineResult};
pub use report::{RunReport, RunState, StepOutcome, StepStatus};
pub use runner::PipelineRunner;

use crate::database::Connector;

/// Run a single pipeline mode with a fresh runner
///
/// This is a convenience function for one-shot runs.
pub fn run_pipeline<C: Connector>(connector: C, mode: &RunMode) -> PipelineResult<RunReport> {
    PipelineRunner::new(connector).run(mode)
}
