//! Run states and per-step outcomes

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a pipeline run
///
/// `Idle → Connected → Processing → Closed`; `Failed` is reachable from
/// `Connected` and `Processing`. `Closed` and `Failed` are terminal and both
/// are entered only after the connection has been released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Idle,
    Connected,
    Processing,
    Closed,
    Failed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Closed | RunState::Failed)
    }

    /// Whether `self → next` is a legal transition
    pub fn can_transition_to(&self, next: RunState) -> bool {
        matches!(
            (self, next),
            (RunState::Idle, RunState::Connected)
                | (RunState::Connected, RunState::Processing)
                | (RunState::Connected, RunState::Failed)
                | (RunState::Processing, RunState::Closed)
                | (RunState::Processing, RunState::Failed)
        )
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunState::Idle => write!(f, "idle"),
            RunState::Connected => write!(f, "connected"),
            RunState::Processing => write!(f, "processing"),
            RunState::Closed => write!(f, "closed"),
            RunState::Failed => write!(f, "failed"),
        }
    }
}

/// Result of one step (a script or an extraction unit)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StepStatus {
    Executed,
    Skipped { reason: String },
    Failed { error: String },
}

/// Outcome of one executed, skipped or failed step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOutcome {
    /// Script path or unit source path
    pub target: String,
    #[serde(flatten)]
    pub status: StepStatus,
    pub duration_ms: u64,
}

impl StepOutcome {
    pub fn executed(target: impl Into<String>, duration: Duration) -> Self {
        Self {
            target: target.into(),
            status: StepStatus::Executed,
            duration_ms: duration.as_millis() as u64,
        }
    }

    pub fn skipped(
        target: impl Into<String>,
        reason: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            target: target.into(),
            status: StepStatus::Skipped {
                reason: reason.into(),
            },
            duration_ms: duration.as_millis() as u64,
        }
    }

    pub fn failed(
        target: impl Into<String>,
        error: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            target: target.into(),
            status: StepStatus::Failed {
                error: error.into(),
            },
            duration_ms: duration.as_millis() as u64,
        }
    }

    pub fn is_executed(&self) -> bool {
        matches!(self.status, StepStatus::Executed)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.status, StepStatus::Skipped { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, StepStatus::Failed { .. })
    }
}

/// Report from a pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run_id: String,
    /// Mode name (`setup`, `extract`, `transform`)
    pub mode: String,
    pub state: RunState,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    /// Steps in execution order
    pub steps: Vec<StepOutcome>,
    /// Error that ended the run, if it failed
    pub error: Option<String>,
}

impl RunReport {
    pub fn new(run_id: impl Into<String>, mode: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            mode: mode.into(),
            state: RunState::Idle,
            started_at: Utc::now(),
            duration_ms: 0,
            steps: Vec::new(),
            error: None,
        }
    }

    /// Append a step outcome
    pub fn record(&mut self, outcome: StepOutcome) {
        self.steps.push(outcome);
    }

    /// Check if the run finished without error
    pub fn is_success(&self) -> bool {
        self.state == RunState::Closed
    }

    pub fn executed_count(&self) -> usize {
        self.steps.iter().filter(|s| s.is_executed()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.steps.iter().filter(|s| s.is_skipped()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.steps.iter().filter(|s| s.is_failed()).count()
    }

    /// Targets of steps with the given predicate, in order
    pub fn targets(&self, pred: impl Fn(&StepOutcome) -> bool) -> Vec<&str> {
        self.steps
            .iter()
            .filter(|s| pred(s))
            .map(|s| s.target.as_str())
            .collect()
    }

    /// Get formatted duration
    pub fn duration_formatted(&self) -> String {
        let secs = self.duration_ms / 1000;
        let mins = secs / 60;
        let remaining_secs = secs % 60;

        if mins > 0 {
            format!("{}m {}s", mins, remaining_secs)
        } else {
            format!("{}s", secs)
        }
    }

    /// Print summary to stderr
    pub fn print_summary(&self) {
        eprintln!();
        eprintln!("Run {} ({}) - {}", self.run_id, self.mode, self.state);
        eprintln!("Duration: {}", self.duration_formatted());
        eprintln!(
            "Steps: {} executed, {} skipped, {} failed",
            self.executed_count(),
            self.skipped_count(),
            self.failed_count()
        );

        for step in self.steps.iter().filter(|s| !s.is_executed()) {
            match &step.status {
                StepStatus::Skipped { reason } => {
                    eprintln!("  - skipped {}: {}", step.target, reason)
                }
                StepStatus::Failed { error } => eprintln!("  - failed {}: {}", step.target, error),
                StepStatus::Executed => {}
            }
        }

        if let Some(ref error) = self.error {
            eprintln!("Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        use RunState::*;

        assert!(Idle.can_transition_to(Connected));
        assert!(Connected.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Closed));
        assert!(Processing.can_transition_to(Failed));
        assert!(Connected.can_transition_to(Failed));

        assert!(!Idle.can_transition_to(Processing));
        assert!(!Idle.can_transition_to(Failed));
        assert!(!Connected.can_transition_to(Closed));
        assert!(!Closed.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Closed));
        assert!(Closed.is_terminal() && Failed.is_terminal());
    }

    #[test]
    fn test_report_counts() {
        let mut report = RunReport::new("run-1", "extract");
        report.record(StepOutcome::executed("a", Duration::from_millis(5)));
        report.record(StepOutcome::skipped("b", "IO Error: No files found", Duration::ZERO));
        report.record(StepOutcome::executed("c", Duration::from_millis(7)));

        assert_eq!(report.executed_count(), 2);
        assert_eq!(report.skipped_count(), 1);
        assert_eq!(report.failed_count(), 0);
        assert_eq!(report.targets(|s| s.is_executed()), vec!["a", "c"]);
        assert!(!report.is_success());

        report.state = RunState::Closed;
        assert!(report.is_success());
    }

    #[test]
    fn test_duration_formatted() {
        let mut report = RunReport::new("run-1", "setup");
        report.duration_ms = 65_000;
        assert_eq!(report.duration_formatted(), "1m 5s");
        report.duration_ms = 900;
        assert_eq!(report.duration_formatted(), "0s");
    }

    #[test]
    fn test_step_outcome_serialization() {
        let outcome = StepOutcome::skipped(
            "locationid=1/year=2024/month=01/*",
            "missing",
            Duration::ZERO,
        );
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], serde_json::json!("skipped"));
        assert_eq!(json["reason"], serde_json::json!("missing"));
        assert_eq!(json["durationMs"], serde_json::json!(0));
    }
}
