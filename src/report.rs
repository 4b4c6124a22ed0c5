//! Result and report model
//!
//! Per-step outcomes roll up into per-case results, which roll up into a
//! suite report. The report is the single artifact persisted after a run.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{paths, Error, FailureKind, Result};
use crate::engine::ExecutionMode;

/// Outcome of one executed step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    /// Step sequence number
    pub step: u32,
    /// Device class identifier
    pub device: String,
    /// Function identifier
    pub function: String,
    pub success: bool,
    /// Value returned by the driver
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Failure message, present iff `success` is false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StepOutcome {
    pub fn passed(step: u32, device: &str, function: &str, value: String) -> Self {
        Self {
            step,
            device: device.to_string(),
            function: function.to_string(),
            success: true,
            value: Some(value),
            message: None,
        }
    }

    pub fn failed(step: u32, device: &str, function: &str, message: String) -> Self {
        Self {
            step,
            device: device.to_string(),
            function: function.to_string(),
            success: false,
            value: None,
            message: Some(message),
        }
    }

    /// Attach the value a failing step still produced
    pub fn with_value(mut self, value: String) -> Self {
        self.value = Some(value);
        self
    }
}

/// Final disposition of one test case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCaseResult {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub success: bool,
    /// Value of the result step, if one ran
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measured_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_kind: Option<FailureKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Start of the first attempt
    pub started_at: DateTime<Utc>,
    /// End of the last attempt
    pub finished_at: DateTime<Utc>,
    #[serde(with = "duration_secs")]
    pub duration: Duration,
    /// Attempts made, including the first
    pub attempts: u32,
    /// Steps of the last attempt, in execution order
    pub steps: Vec<StepOutcome>,
}

impl TestCaseResult {
    /// Result for a case whose task died before producing one
    pub fn crashed(id: String, name: String, message: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            name,
            group: None,
            success: false,
            measured_value: None,
            unit: None,
            failure_kind: Some(FailureKind::Internal),
            message: Some(message),
            started_at: now,
            finished_at: now,
            duration: Duration::ZERO,
            attempts: 0,
            steps: Vec::new(),
        }
    }
}

/// How a suite was executed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    #[serde(flatten)]
    pub mode: ExecutionMode,
    /// Size of each batch, in launch order (one entry per case when sequential)
    pub batches: Vec<usize>,
}

/// Aggregated result of a suite run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteReport {
    pub suite: String,
    pub execution: ExecutionSummary,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Sum of per-case durations; exceeds `wall_clock` under parallel runs
    #[serde(with = "duration_secs")]
    pub total_duration: Duration,
    /// Elapsed time of the whole run
    #[serde(with = "duration_secs")]
    pub wall_clock: Duration,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Case results in completion order
    pub results: Vec<TestCaseResult>,
}

impl SuiteReport {
    pub fn new(
        suite: String,
        execution: ExecutionSummary,
        started_at: DateTime<Utc>,
        wall_clock: Duration,
        results: Vec<TestCaseResult>,
    ) -> Self {
        let total = results.len();
        let passed = results.iter().filter(|r| r.success).count();
        let total_duration = results.iter().map(|r| r.duration).sum();
        let finished_at = started_at
            + chrono::Duration::from_std(wall_clock).unwrap_or_else(|_| chrono::Duration::zero());

        Self {
            suite,
            execution,
            total,
            passed,
            failed: total - passed,
            total_duration,
            wall_clock,
            started_at,
            finished_at,
            results,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Percentage of passing cases (0 for an empty suite)
    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.passed as f64 * 100.0 / self.total as f64
        }
    }

    pub fn result(&self, id: &str) -> Option<&TestCaseResult> {
        self.results.iter().find(|r| r.id == id)
    }

    /// Write the report as pretty-printed JSON
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        paths::ensure_parent_dir(path)?;
        std::fs::write(path, json).map_err(|e| Error::FileWrite {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        tracing::info!(path = %path.display(), "Wrote JSON report");
        Ok(())
    }
}

/// Durations as fractional seconds
mod duration_secs {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Duration::try_from_secs_f64(secs).map_err(D::Error::custom)
    }
}
