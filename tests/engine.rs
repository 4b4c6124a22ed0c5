//! End-to-end tests for suite execution
//!
//! These tests drive the library API the way the CLI does: load a suite,
//! build it against a driver registry, run it and inspect the report.
//! Simulated drivers run with zero latency; deterministic fake drivers
//! cover retry, timeout and batching behavior.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use inspector::common::config::SimulationConfig;
use inspector::drivers::{DeviceClass, DriverRegistry, StepHandler};
use inspector::suite::{
    load_suite, ParamValue, RetryPolicy, SpecRange, StepDescription, TestCaseDescription,
    TestSuiteDescription,
};
use inspector::{Error, ExecutionMode, ExecutionSettings, FailureKind, Orchestrator, SuiteReport};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn settings() -> ExecutionSettings {
    ExecutionSettings {
        retry_delay: Duration::ZERO,
        case_timeout: Some(Duration::from_secs(10)),
    }
}

fn simulated() -> Orchestrator {
    Orchestrator::new(
        Arc::new(DriverRegistry::simulated(&SimulationConfig::instant())),
        settings(),
    )
}

fn with_handler(handler: Arc<dyn StepHandler>, settings: ExecutionSettings) -> Orchestrator {
    let mut registry = DriverRegistry::new();
    registry.register(handler);
    Orchestrator::new(Arc::new(registry), settings)
}

fn stepped_case(id: &str, steps: Vec<StepDescription>, spec: SpecRange) -> TestCaseDescription {
    TestCaseDescription {
        id: id.to_string(),
        name: format!("case {}", id),
        type_tag: "standard".to_string(),
        group: None,
        unit: None,
        steps,
        spec,
        retry: RetryPolicy::default(),
        parameters: BTreeMap::new(),
    }
}

fn dmm_read(no: u32) -> StepDescription {
    StepDescription {
        no,
        device: "DMM".to_string(),
        function: "MeasureDCVoltage".to_string(),
        parameters: vec![],
        result_step: true,
        compare: None,
    }
}

fn suite(cases: Vec<TestCaseDescription>) -> TestSuiteDescription {
    TestSuiteDescription {
        name: "generated".to_string(),
        description: None,
        model: None,
        author: None,
        cases,
    }
}

/// Multimeter returning 100, 101, 102... and optionally sleeping first
struct CountingMeter {
    reads: AtomicU32,
    delay: Duration,
}

impl CountingMeter {
    fn new(delay_ms: u64) -> Arc<Self> {
        Arc::new(Self {
            reads: AtomicU32::new(0),
            delay: Duration::from_millis(delay_ms),
        })
    }
}

#[async_trait]
impl StepHandler for CountingMeter {
    fn device_class(&self) -> DeviceClass {
        DeviceClass::Dmm
    }

    fn functions(&self) -> &'static [&'static str] {
        &["MeasureDCVoltage"]
    }

    async fn execute(&self, _function: &str, _parameters: &[String]) -> inspector::Result<String> {
        let n = self.reads.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(format!("{}", 100 + n))
    }
}

/// Source that reads back far from any target and logs every call
#[derive(Default)]
struct RecordingSource {
    calls: Mutex<Vec<String>>,
}

#[async_trait]
impl StepHandler for RecordingSource {
    fn device_class(&self) -> DeviceClass {
        DeviceClass::Psu
    }

    fn functions(&self) -> &'static [&'static str] {
        &["SetVoltage", "Output", "MeasureVoltage"]
    }

    async fn execute(&self, function: &str, parameters: &[String]) -> inspector::Result<String> {
        let call = format!("{} {}", function, parameters.join(" "));
        self.calls.lock().unwrap().push(call.trim().to_string());
        match function {
            "MeasureVoltage" => Ok("0.0000".to_string()),
            _ => Ok("true".to_string()),
        }
    }
}

#[tokio::test]
async fn test_bench_suite_passes_sequentially() {
    let suite = load_suite(&fixture("bench.yaml")).unwrap();
    let report = simulated()
        .run_suite(&suite, ExecutionMode::Sequential)
        .await
        .unwrap();

    let declared: Vec<_> = suite.cases.iter().map(|c| c.id.as_str()).collect();
    let executed: Vec<_> = report.results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(executed, declared);

    for result in &report.results {
        assert!(result.success, "{} failed: {:?}", result.id, result.message);
        assert_eq!(result.attempts, 1);
    }
    assert_eq!(report.total, suite.cases.len());
    assert_eq!(report.passed, report.total);
}

#[tokio::test]
async fn test_stepped_case_runs_in_number_order() {
    let suite = load_suite(&fixture("bench.yaml")).unwrap();
    let report = simulated()
        .run_suite(&suite, ExecutionMode::Sequential)
        .await
        .unwrap();

    let m001 = report.result("M001").unwrap();
    let numbers: Vec<_> = m001.steps.iter().map(|s| s.step).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4]);
    assert_eq!(m001.measured_value, m001.steps[2].value);
    assert_eq!(m001.unit.as_deref(), Some("A"));
}

#[tokio::test]
async fn test_parallel_batches_do_not_overlap() {
    let cases: Vec<_> = (1..=5)
        .map(|i| {
            stepped_case(
                &format!("P{}", i),
                vec![dmm_read(1)],
                SpecRange::between(100.0, 200.0),
            )
        })
        .collect();
    let orchestrator = with_handler(CountingMeter::new(30), settings());

    let report = orchestrator
        .run_suite(&suite(cases), ExecutionMode::parallel(2))
        .await
        .unwrap();

    assert_eq!(report.execution.batches, vec![2, 2, 1]);
    assert_eq!(report.total, 5);
    assert!(report.all_passed());

    let batch_of = |id: &str| match id {
        "P1" | "P2" => 0,
        "P3" | "P4" => 1,
        _ => 2,
    };
    for batch in 0..2 {
        let finished = report
            .results
            .iter()
            .filter(|r| batch_of(r.id.as_str()) == batch)
            .map(|r| r.finished_at)
            .max()
            .unwrap();
        let next_started = report
            .results
            .iter()
            .filter(|r| batch_of(r.id.as_str()) == batch + 1)
            .map(|r| r.started_at)
            .min()
            .unwrap();
        assert!(next_started >= finished, "batch {} overlapped the next", batch);
    }

    // Summed case time exceeds the elapsed time when cases overlap
    assert!(report.total_duration > report.wall_clock);
}

#[tokio::test]
async fn test_retry_keeps_only_last_attempt() {
    let mut case = stepped_case("R1", vec![dmm_read(1)], SpecRange::between(0.0, 1.0));
    case.retry = RetryPolicy::retries(2);
    let meter = CountingMeter::new(0);
    let orchestrator = with_handler(meter.clone(), settings());

    let report = orchestrator
        .run_suite(&suite(vec![case]), ExecutionMode::Sequential)
        .await
        .unwrap();

    let result = &report.results[0];
    assert!(!result.success);
    assert_eq!(result.attempts, 3);
    assert_eq!(result.failure_kind, Some(FailureKind::Verification));
    assert_eq!(result.steps.len(), 1);
    assert_eq!(result.steps[0].value.as_deref(), Some("102"));
    assert_eq!(result.measured_value.as_deref(), Some("102"));
    assert_eq!(meter.reads.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_measured_value_fails_case_without_spec() {
    let case = stepped_case("U1", vec![dmm_read(1)], SpecRange::default());
    let orchestrator = with_handler(CountingMeter::new(0), settings());

    let report = orchestrator
        .run_suite(&suite(vec![case]), ExecutionMode::Sequential)
        .await
        .unwrap();

    let result = &report.results[0];
    assert!(!result.success);
    assert_eq!(result.failure_kind, Some(FailureKind::Verification));
    assert_eq!(result.measured_value.as_deref(), Some("100"));
}

#[tokio::test]
async fn test_unknown_device_fails_only_its_case() {
    let suite = load_suite(&fixture("unknown_device.yaml")).unwrap();
    let report = simulated()
        .run_suite(&suite, ExecutionMode::parallel(3))
        .await
        .unwrap();

    assert_eq!(report.total, 3);
    assert_eq!(report.failed, 1);
    let scope = report.result("SCOPE1").unwrap();
    assert_eq!(scope.failure_kind, Some(FailureKind::Configuration));
    assert!(!scope.steps[0].success);
    assert!(report.result("OK1").unwrap().success);
    assert!(report.result("OK2").unwrap().success);
}

#[tokio::test]
async fn test_unknown_type_fails_before_running() {
    let suite = load_suite(&fixture("unknown_type.yaml")).unwrap();
    let source = Arc::new(RecordingSource::default());
    let orchestrator = with_handler(source.clone(), settings());

    let err = orchestrator
        .run_suite(&suite, ExecutionMode::Sequential)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::UnsupportedTestType(ref t) if t == "thermal"));
    assert!(source.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_cleanup_runs_once_per_attempt() {
    let case = TestCaseDescription {
        id: "V001".to_string(),
        name: "Basic voltage output".to_string(),
        type_tag: "voltage".to_string(),
        group: None,
        unit: None,
        steps: vec![],
        spec: SpecRange::default(),
        retry: RetryPolicy::retries(1),
        parameters: BTreeMap::from([
            ("targetVoltage".to_string(), ParamValue::Float(12.0)),
            ("channel".to_string(), ParamValue::Integer(2)),
        ]),
    };
    let source = Arc::new(RecordingSource::default());
    let orchestrator = with_handler(source.clone(), settings());

    let report = orchestrator
        .run_suite(&suite(vec![case]), ExecutionMode::Sequential)
        .await
        .unwrap();

    let result = &report.results[0];
    assert_eq!(result.attempts, 2);
    assert_eq!(result.failure_kind, Some(FailureKind::Verification));

    let calls = source.calls.lock().unwrap();
    assert_eq!(calls.iter().filter(|c| *c == "Output off 2").count(), 2);
    assert_eq!(calls.iter().filter(|c| *c == "Output on 2").count(), 2);
    assert_eq!(calls.len(), 8);
}

#[tokio::test]
async fn test_hung_step_times_out() {
    let case = stepped_case("H1", vec![dmm_read(1)], SpecRange::default());
    let orchestrator = with_handler(
        CountingMeter::new(5_000),
        ExecutionSettings {
            retry_delay: Duration::ZERO,
            case_timeout: Some(Duration::from_millis(50)),
        },
    );

    let report = orchestrator
        .run_suite(&suite(vec![case]), ExecutionMode::Sequential)
        .await
        .unwrap();

    let result = &report.results[0];
    assert_eq!(result.failure_kind, Some(FailureKind::TimedOut));
    assert!(result.duration < Duration::from_secs(1));
}

#[tokio::test]
async fn test_report_round_trips_through_json() {
    let suite = load_suite(&fixture("unknown_device.yaml")).unwrap();
    let report = simulated()
        .run_suite(&suite, ExecutionMode::Sequential)
        .await
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.json");
    report.write_json(&path).unwrap();

    let loaded: SuiteReport =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(loaded.total, 3);
    assert_eq!(loaded.passed + loaded.failed, loaded.total);
    assert_eq!(loaded.results.len(), report.results.len());
    for result in &loaded.results {
        assert!(result.finished_at >= result.started_at);
    }
}
