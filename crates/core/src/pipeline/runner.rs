//! Pipeline runner driving setup, extract and transform runs

use std::path::Path;
use std::time::Instant;

use tracing::{debug, error, info, info_span, warn};
use uuid::Uuid;

use super::config::{ExtractConfig, RunMode};
use super::error::{PipelineError, PipelineResult};
use super::report::{RunReport, RunState, StepOutcome};
use crate::database::{ConnectionGuard, Connector, DatabaseError};
use crate::extraction::{expand_locations, expand_units, unit_to_path, unit_to_query};
use crate::scripts::{collect_scripts, read_script};

/// Runs pipeline modes against databases opened by a [`Connector`]
///
/// Each run opens one connection, holds it exclusively and releases it
/// exactly once before the run reaches `Closed` or `Failed`.
pub struct PipelineRunner<C: Connector> {
    connector: C,
    state: RunState,
    transitions: Vec<RunState>,
    last_report: Option<RunReport>,
}

impl<C: Connector> PipelineRunner<C> {
    /// Create a new runner
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            state: RunState::Idle,
            transitions: vec![RunState::Idle],
            last_report: None,
        }
    }

    /// Current state (terminal once a run has returned)
    pub fn state(&self) -> RunState {
        self.state
    }

    /// States visited by the most recent run, starting with `Idle`
    pub fn transitions(&self) -> &[RunState] {
        &self.transitions
    }

    /// Report of the most recent run, also available after a failure
    pub fn last_report(&self) -> Option<&RunReport> {
        self.last_report.as_ref()
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Run one pipeline mode
    pub fn run(&mut self, mode: &RunMode) -> PipelineResult<RunReport> {
        let run_id = Uuid::new_v4().to_string();
        let _span = info_span!("pipeline_run", run_id = %run_id, mode = mode.name()).entered();

        let start = Instant::now();
        self.state = RunState::Idle;
        self.transitions = vec![RunState::Idle];
        let mut report = RunReport::new(&run_id, mode.name());

        info!(
            run_id = %run_id,
            mode = mode.name(),
            database = %self.connector.location(),
            "Starting pipeline run"
        );

        let result = self.run_connected(mode, &mut report);

        report.state = self.state;
        report.duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(()) => {
                info!(
                    run_id = %run_id,
                    duration_ms = report.duration_ms,
                    executed = report.executed_count(),
                    skipped = report.skipped_count(),
                    "Pipeline run completed"
                );
                self.last_report = Some(report.clone());
                Ok(report)
            }
            Err(e) => {
                error!(run_id = %run_id, error = %e, kind = e.kind(), "Pipeline run failed");
                report.error = Some(e.to_string());
                self.last_report = Some(report);
                Err(e)
            }
        }
    }

    /// Open, process and release; the connection never outlives this call
    fn run_connected(&mut self, mode: &RunMode, report: &mut RunReport) -> PipelineResult<()> {
        if let RunMode::Extract(config) = mode {
            config.validate().map_err(PipelineError::Config)?;
        }

        // Nothing was acquired if opening fails, so the run stays Idle
        let guard = ConnectionGuard::new(self.connector.open()?);
        self.transition(RunState::Connected);

        let outcome = match mode {
            RunMode::Setup { ddl_dir } => self.run_scripts(&guard, ddl_dir, report),
            RunMode::Transform { query_dir } => self.run_scripts(&guard, query_dir, report),
            RunMode::Extract(config) => self.run_extract(&guard, config, report),
        };

        let released = guard.release();

        match (outcome, released) {
            (Ok(()), Ok(())) => {
                self.transition(RunState::Closed);
                Ok(())
            }
            (Ok(()), Err(close_err)) => {
                self.transition(RunState::Failed);
                Err(close_err.into())
            }
            (Err(e), released) => {
                if let Err(close_err) = released {
                    warn!(error = %close_err, "Failed to close database connection after error");
                }
                self.transition(RunState::Failed);
                Err(e)
            }
        }
    }

    /// Execute every script under `dir` in collection order, stopping at the
    /// first failure
    fn run_scripts(
        &mut self,
        conn: &ConnectionGuard<C::Connection>,
        dir: &Path,
        report: &mut RunReport,
    ) -> PipelineResult<()> {
        let scripts = collect_scripts(dir)?;
        self.transition(RunState::Processing);

        for script in &scripts {
            let target = script.path.display().to_string();
            let _step = info_span!("pipeline_step", script = %target).entered();
            let started = Instant::now();

            let result = script
                .read()
                .and_then(|sql| conn.execute(&sql).map_err(PipelineError::from));

            match result {
                Ok(()) => {
                    info!(script = %target, "Executed query");
                    report.record(StepOutcome::executed(target, started.elapsed()));
                }
                Err(e) => {
                    error!(script = %target, error = %e, "Script failed");
                    report.record(StepOutcome::failed(target, e.to_string(), started.elapsed()));
                    return Err(e);
                }
            }
        }

        Ok(())
    }

    /// Load every planned unit, skipping units whose source is unavailable
    fn run_extract(
        &mut self,
        conn: &ConnectionGuard<C::Connection>,
        config: &ExtractConfig,
        report: &mut RunReport,
    ) -> PipelineResult<()> {
        let query_template = read_script(&config.extract_query_template_path)?;
        let location_ids = expand_locations(&config.locations_file_path)?;
        let units = expand_units(&location_ids, config.start_date, config.end_date);

        if units.is_empty() {
            warn!(
                locations = location_ids.len(),
                start = %config.start_date,
                end = %config.end_date,
                "No extraction units planned"
            );
        } else {
            info!(
                locations = location_ids.len(),
                units = units.len(),
                start = %config.start_date,
                end = %config.end_date,
                "Planned extraction units"
            );
        }

        self.transition(RunState::Processing);

        for unit in &units {
            let _step = info_span!(
                "extract_unit",
                location_id = %unit.location_id,
                year = unit.year,
                month = unit.month
            )
            .entered();

            let started = Instant::now();
            let rendered = unit_to_path(unit, &config.partition_path_template).and_then(|path| {
                let query = unit_to_query(&config.source_base_path, &path, &query_template)?;
                Ok((path, query))
            });

            let (unit_path, query) = match rendered {
                Ok(rendered) => rendered,
                Err(e) => {
                    error!(unit = %unit, error = %e, "Could not render unit");
                    report.record(StepOutcome::failed(
                        unit.to_string(),
                        e.to_string(),
                        started.elapsed(),
                    ));
                    return Err(e.into());
                }
            };
            debug!(query = %query, "Rendered ingestion query");

            info!(unit = %unit_path, "Extracting data");

            match conn.execute(&query) {
                Ok(()) => {
                    info!(unit = %unit_path, "Extracted data");
                    report.record(StepOutcome::executed(unit_path, started.elapsed()));
                }
                Err(DatabaseError::SourceUnavailable { message }) => {
                    warn!(unit = %unit_path, error = %message, "Could not find data, skipping unit");
                    report.record(StepOutcome::skipped(unit_path, message, started.elapsed()));
                }
                Err(e) => {
                    error!(unit = %unit_path, error = %e, "Extraction failed");
                    report.record(StepOutcome::failed(
                        unit_path,
                        e.to_string(),
                        started.elapsed(),
                    ));
                    return Err(e.into());
                }
            }
        }

        Ok(())
    }

    fn transition(&mut self, next: RunState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        debug!(from = %self.state, to = %next, "Run state transition");
        self.state = next;
        self.transitions.push(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{DatabaseConnection, DatabaseError};
    use std::cell::RefCell;
    use std::rc::Rc;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Log {
        executed: Vec<String>,
        opens: usize,
        closes: usize,
    }

    struct FakeConnection {
        log: Rc<RefCell<Log>>,
    }

    impl DatabaseConnection for FakeConnection {
        fn execute(&self, sql: &str) -> Result<(), DatabaseError> {
            self.log.borrow_mut().executed.push(sql.to_string());
            Ok(())
        }

        fn close(self) -> Result<(), DatabaseError> {
            self.log.borrow_mut().closes += 1;
            Ok(())
        }
    }

    struct FakeConnector {
        log: Rc<RefCell<Log>>,
        fail_open: bool,
    }

    impl Connector for FakeConnector {
        type Connection = FakeConnection;

        fn open(&self) -> Result<FakeConnection, DatabaseError> {
            if self.fail_open {
                return Err(DatabaseError::connection("database is locked"));
            }
            self.log.borrow_mut().opens += 1;
            Ok(FakeConnection {
                log: self.log.clone(),
            })
        }

        fn location(&self) -> String {
            "fake".to_string()
        }
    }

    fn runner(fail_open: bool) -> (PipelineRunner<FakeConnector>, Rc<RefCell<Log>>) {
        let log = Rc::new(RefCell::new(Log::default()));
        let connector = FakeConnector {
            log: log.clone(),
            fail_open,
        };
        (PipelineRunner::new(connector), log)
    }

    #[test]
    fn test_setup_runs_scripts_in_order() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("002_tables.sql"), "CREATE TABLE raw.t (x INT);").unwrap();
        std::fs::write(temp.path().join("001_schema.sql"), "CREATE SCHEMA raw;").unwrap();

        let (mut runner, log) = runner(false);
        let report = runner
            .run(&RunMode::Setup {
                ddl_dir: temp.path().to_path_buf(),
            })
            .unwrap();

        assert!(report.is_success());
        assert_eq!(
            log.borrow().executed,
            vec!["CREATE SCHEMA raw;", "CREATE TABLE raw.t (x INT);"]
        );
        assert_eq!(log.borrow().closes, 1);
        assert_eq!(
            runner.transitions(),
            &[
                RunState::Idle,
                RunState::Connected,
                RunState::Processing,
                RunState::Closed
            ]
        );
    }

    #[test]
    fn test_missing_script_dir_fails_while_connected() {
        let temp = TempDir::new().unwrap();
        let (mut runner, log) = runner(false);

        let err = runner
            .run(&RunMode::Transform {
                query_dir: temp.path().join("missing"),
            })
            .unwrap_err();

        assert!(matches!(err, PipelineError::NotFound(_)));
        assert_eq!(runner.state(), RunState::Failed);
        assert_eq!(
            runner.transitions(),
            &[RunState::Idle, RunState::Connected, RunState::Failed]
        );
        assert_eq!(log.borrow().closes, 1);
    }

    #[test]
    fn test_open_failure_stays_idle() {
        let temp = TempDir::new().unwrap();
        let (mut runner, log) = runner(true);

        let err = runner
            .run(&RunMode::Setup {
                ddl_dir: temp.path().to_path_buf(),
            })
            .unwrap_err();

        assert_eq!(err.kind(), "connection");
        assert_eq!(runner.state(), RunState::Idle);
        assert_eq!(log.borrow().closes, 0);
        assert!(runner.last_report().unwrap().error.is_some());
    }

    #[test]
    fn test_extract_rejects_invalid_config_before_connecting() {
        let (mut runner, log) = runner(false);
        let config = ExtractConfig::new(
            "locations.json",
            "2024-01".parse().unwrap(),
            "2024-02".parse().unwrap(),
            "extract.sql",
            "",
        );

        let err = runner.run(&RunMode::Extract(config)).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
        assert_eq!(log.borrow().opens, 0);
    }
}
