//! Pipeline runner behavior against a scripted connection

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use air_quality_core::database::{Connector, DatabaseConnection, DatabaseError};
use air_quality_core::pipeline::{
    ExtractConfig, PipelineError, PipelineRunner, RunMode, RunState, StepStatus,
};
use tempfile::TempDir;

#[derive(Default)]
struct Recorder {
    executed: Vec<String>,
    closes: usize,
    /// (substring, error) pairs; the first match decides the outcome
    failures: Vec<(String, DatabaseError)>,
}

struct ScriptedConnection {
    recorder: Rc<RefCell<Recorder>>,
}

impl DatabaseConnection for ScriptedConnection {
    fn execute(&self, sql: &str) -> Result<(), DatabaseError> {
        let mut recorder = self.recorder.borrow_mut();
        recorder.executed.push(sql.to_string());
        let failure = recorder
            .failures
            .iter()
            .find(|(needle, _)| sql.contains(needle.as_str()))
            .map(|(_, err)| err.clone());
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn close(self) -> Result<(), DatabaseError> {
        self.recorder.borrow_mut().closes += 1;
        Ok(())
    }
}

struct ScriptedConnector {
    recorder: Rc<RefCell<Recorder>>,
}

impl Connector for ScriptedConnector {
    type Connection = ScriptedConnection;

    fn open(&self) -> Result<ScriptedConnection, DatabaseError> {
        Ok(ScriptedConnection {
            recorder: self.recorder.clone(),
        })
    }

    fn location(&self) -> String {
        "scripted".to_string()
    }
}

fn scripted(
    failures: Vec<(&str, DatabaseError)>,
) -> (PipelineRunner<ScriptedConnector>, Rc<RefCell<Recorder>>) {
    let recorder = Rc::new(RefCell::new(Recorder {
        failures: failures
            .into_iter()
            .map(|(needle, err)| (needle.to_string(), err))
            .collect(),
        ..Recorder::default()
    }));
    let runner = PipelineRunner::new(ScriptedConnector {
        recorder: recorder.clone(),
    });
    (runner, recorder)
}

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

fn extract_fixture(temp: &TempDir, registry: &str, start: &str, end: &str) -> ExtractConfig {
    let locations = temp.path().join("locations.json");
    let template = temp.path().join("extract.sql");
    write(&locations, registry);
    write(
        &template,
        "INSERT INTO raw.measurements SELECT * FROM read_csv_auto('{{ data_file_path }}');",
    );
    ExtractConfig::new(
        locations,
        start.parse().unwrap(),
        end.parse().unwrap(),
        template,
        "s3://bucket/records",
    )
}

#[test]
fn test_extract_plans_locations_then_months() {
    let temp = TempDir::new().unwrap();
    let config = extract_fixture(&temp, r#"{"B": {}, "A": {}}"#, "2023-11", "2024-01");
    let (mut runner, recorder) = scripted(vec![]);

    let report = runner.run(&RunMode::Extract(config)).unwrap();

    assert_eq!(report.executed_count(), 6);
    assert_eq!(
        report.targets(|_| true),
        vec![
            "locationid=B/year=2023/month=11/*",
            "locationid=B/year=2023/month=12/*",
            "locationid=B/year=2024/month=01/*",
            "locationid=A/year=2023/month=11/*",
            "locationid=A/year=2023/month=12/*",
            "locationid=A/year=2024/month=01/*",
        ]
    );
    assert!(recorder.borrow().executed[0].contains(
        "read_csv_auto('s3://bucket/records/locationid=B/year=2023/month=11/*')"
    ));
    assert_eq!(recorder.borrow().closes, 1);
}

#[test]
fn test_extract_skips_unavailable_units() {
    let temp = TempDir::new().unwrap();
    let config = extract_fixture(&temp, r#"{"8118": {}}"#, "2024-01", "2024-03");
    let (mut runner, recorder) = scripted(vec![(
        "month=02",
        DatabaseError::source_unavailable("IO Error: No files found that match the pattern"),
    )]);

    let report = runner.run(&RunMode::Extract(config)).unwrap();

    assert_eq!(runner.state(), RunState::Closed);
    assert!(report.is_success());
    assert_eq!(report.executed_count(), 2);
    assert_eq!(report.skipped_count(), 1);
    assert_eq!(
        report.targets(|s| s.is_skipped()),
        vec!["locationid=8118/year=2024/month=02/*"]
    );
    assert!(matches!(
        &report.steps[1].status,
        StepStatus::Skipped { reason } if reason.contains("No files found")
    ));
    assert_eq!(recorder.borrow().executed.len(), 3);
    assert_eq!(recorder.borrow().closes, 1);
}

#[test]
fn test_extract_stops_on_execution_error() {
    let temp = TempDir::new().unwrap();
    let config = extract_fixture(&temp, r#"{"8118": {}}"#, "2024-01", "2024-03");
    let (mut runner, recorder) = scripted(vec![(
        "month=02",
        DatabaseError::execution("Binder Error: table raw.measurements has 3 columns"),
    )]);

    let err = runner.run(&RunMode::Extract(config)).unwrap_err();

    assert_eq!(err.kind(), "execution");
    assert_eq!(runner.state(), RunState::Failed);
    assert_eq!(recorder.borrow().executed.len(), 2);
    assert_eq!(recorder.borrow().closes, 1);

    let report = runner.last_report().unwrap();
    assert_eq!(report.executed_count(), 1);
    assert_eq!(report.failed_count(), 1);
    assert_eq!(report.state, RunState::Failed);
}

#[test]
fn test_extract_reversed_range_plans_nothing() {
    let temp = TempDir::new().unwrap();
    let config = extract_fixture(&temp, r#"{"8118": {}}"#, "2024-03", "2024-01");
    let (mut runner, recorder) = scripted(vec![]);

    let report = runner.run(&RunMode::Extract(config)).unwrap();

    assert!(report.steps.is_empty());
    assert_eq!(runner.state(), RunState::Closed);
    assert!(recorder.borrow().executed.is_empty());
    assert_eq!(recorder.borrow().closes, 1);
}

#[test]
fn test_extract_missing_registry_fails_and_closes() {
    let temp = TempDir::new().unwrap();
    let mut config = extract_fixture(&temp, "{}", "2024-01", "2024-01");
    config.locations_file_path = temp.path().join("nope.json");
    let (mut runner, recorder) = scripted(vec![]);

    let err = runner.run(&RunMode::Extract(config)).unwrap_err();

    assert!(matches!(err, PipelineError::NotFound(_)));
    assert_eq!(
        runner.transitions(),
        &[RunState::Idle, RunState::Connected, RunState::Failed]
    );
    assert_eq!(recorder.borrow().closes, 1);
}

#[test]
fn test_extract_malformed_registry_fails() {
    let temp = TempDir::new().unwrap();
    let config = extract_fixture(&temp, r#"["8118"]"#, "2024-01", "2024-01");
    let (mut runner, recorder) = scripted(vec![]);

    let err = runner.run(&RunMode::Extract(config)).unwrap_err();

    assert!(matches!(err, PipelineError::Registry { .. }));
    assert_eq!(recorder.borrow().closes, 1);
}

#[test]
fn test_extract_template_without_placeholder_fails() {
    let temp = TempDir::new().unwrap();
    let config = extract_fixture(&temp, r#"{"8118": {}}"#, "2024-01", "2024-01")
        .with_partition_path_template("{{station}}/{{year}}/*");
    let (mut runner, recorder) = scripted(vec![]);

    let err = runner.run(&RunMode::Extract(config)).unwrap_err();

    assert!(matches!(err, PipelineError::Template(_)));
    assert_eq!(runner.state(), RunState::Failed);
    assert!(recorder.borrow().executed.is_empty());
    assert_eq!(recorder.borrow().closes, 1);

    let report = runner.last_report().unwrap();
    assert_eq!(report.failed_count(), 1);
    assert_eq!(report.targets(|s| s.is_failed()), vec!["8118@2024-01"]);
    assert!(matches!(
        &report.steps[0].status,
        StepStatus::Failed { error } if error.contains("station")
    ));
}

#[test]
fn test_transform_fails_fast() {
    let temp = TempDir::new().unwrap();
    write(&temp.path().join("01_a.sql"), "SELECT 'first';");
    write(&temp.path().join("02_b.sql"), "SELECT 'second';");
    write(&temp.path().join("03_c.sql"), "SELECT 'third';");
    let (mut runner, recorder) = scripted(vec![(
        "second",
        DatabaseError::execution("Catalog Error: Table does not exist"),
    )]);

    let err = runner
        .run(&RunMode::Transform {
            query_dir: temp.path().to_path_buf(),
        })
        .unwrap_err();

    assert_eq!(err.kind(), "execution");
    assert_eq!(
        recorder.borrow().executed,
        vec!["SELECT 'first';", "SELECT 'second';"]
    );
    assert_eq!(recorder.borrow().closes, 1);
    assert_eq!(runner.state(), RunState::Failed);
    assert_eq!(
        runner.transitions(),
        &[
            RunState::Idle,
            RunState::Connected,
            RunState::Processing,
            RunState::Failed
        ]
    );
}

#[test]
fn test_setup_treats_unavailable_source_as_fatal() {
    let temp = TempDir::new().unwrap();
    write(&temp.path().join("001.sql"), "CREATE SCHEMA raw;");
    write(&temp.path().join("002.sql"), "COPY raw.t FROM 'missing.csv';");
    write(&temp.path().join("003.sql"), "CREATE SCHEMA presentation;");
    let (mut runner, recorder) = scripted(vec![(
        "missing.csv",
        DatabaseError::source_unavailable("IO Error: No files found"),
    )]);

    let err = runner
        .run(&RunMode::Setup {
            ddl_dir: temp.path().to_path_buf(),
        })
        .unwrap_err();

    assert!(err.is_source_unavailable());
    assert_eq!(recorder.borrow().executed.len(), 2);
    assert_eq!(recorder.borrow().closes, 1);
}

#[test]
fn test_setup_visits_nested_scripts_in_path_order() {
    let temp = TempDir::new().unwrap();
    write(&temp.path().join("02_tables/measurements.sql"), "T2;");
    write(&temp.path().join("01_schemas/raw.sql"), "T1;");
    write(&temp.path().join("README.md"), "not sql");
    let (mut runner, recorder) = scripted(vec![]);

    let report = runner
        .run(&RunMode::Setup {
            ddl_dir: temp.path().to_path_buf(),
        })
        .unwrap();

    assert_eq!(report.executed_count(), 2);
    assert_eq!(recorder.borrow().executed, vec!["T1;", "T2;"]);
}

#[test]
fn test_runner_is_reusable() {
    let temp = TempDir::new().unwrap();
    write(&temp.path().join("001.sql"), "SELECT 1;");
    let (mut runner, recorder) = scripted(vec![]);
    let mode = RunMode::Transform {
        query_dir: temp.path().to_path_buf(),
    };

    let first = runner.run(&mode).unwrap();
    let second = runner.run(&mode).unwrap();

    assert_ne!(first.run_id, second.run_id);
    assert_eq!(recorder.borrow().closes, 2);
    assert_eq!(runner.transitions().len(), 4);
}
