//! Suite execution
//!
//! Runs built cases either one after another in declaration order, or in
//! fixed-size batches where every case of a batch runs as its own task and
//! the next batch starts only after the whole batch has finished.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::case::{execute_case, ExecutionSettings, TestCase};
use super::factory::CaseFactory;
use crate::common::Result;
use crate::drivers::DriverRegistry;
use crate::report::{ExecutionSummary, SuiteReport, TestCaseResult};
use crate::suite::TestSuiteDescription;

/// How the cases of a suite are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ExecutionMode {
    Sequential,
    Parallel { max_concurrency: usize },
}

impl ExecutionMode {
    /// Bounded-parallel mode; a width of zero is treated as one
    pub fn parallel(max_concurrency: usize) -> Self {
        Self::Parallel {
            max_concurrency: max_concurrency.max(1),
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential => write!(f, "sequential"),
            Self::Parallel { max_concurrency } => write!(f, "parallel (max {})", max_concurrency),
        }
    }
}

/// Sizes of the consecutive batches `total` cases are split into
pub fn plan_batches(total: usize, max_concurrency: usize) -> Vec<usize> {
    let width = max_concurrency.max(1);
    (0..total)
        .step_by(width)
        .map(|start| width.min(total - start))
        .collect()
}

/// Builds and executes suites against one driver registry
pub struct Orchestrator {
    factory: CaseFactory,
    settings: ExecutionSettings,
}

impl Orchestrator {
    pub fn new(registry: Arc<DriverRegistry>, settings: ExecutionSettings) -> Self {
        Self {
            factory: CaseFactory::new(registry),
            settings,
        }
    }

    /// Build every case of the suite; nothing runs if any case is invalid
    pub fn build(&self, suite: &TestSuiteDescription) -> Result<Vec<Box<dyn TestCase>>> {
        self.factory.build_suite(suite)
    }

    /// Build and run a suite
    pub async fn run_suite(
        &self,
        suite: &TestSuiteDescription,
        mode: ExecutionMode,
    ) -> Result<SuiteReport> {
        let cases = self.build(suite)?;
        Ok(self.run(&suite.name, cases, mode).await)
    }

    /// Run already built cases and aggregate their results
    pub async fn run(
        &self,
        suite: &str,
        cases: Vec<Box<dyn TestCase>>,
        mode: ExecutionMode,
    ) -> SuiteReport {
        let started_at = Utc::now();
        let clock = Instant::now();
        tracing::info!(suite, cases = cases.len(), mode = %mode, "Running suite");

        let (results, batches) = match mode {
            ExecutionMode::Sequential => {
                let batches = vec![1; cases.len()];
                (self.run_sequential(cases).await, batches)
            }
            ExecutionMode::Parallel { max_concurrency } => {
                let batches = plan_batches(cases.len(), max_concurrency);
                (self.run_parallel(cases, &batches).await, batches)
            }
        };

        let report = SuiteReport::new(
            suite.to_string(),
            ExecutionSummary { mode, batches },
            started_at,
            clock.elapsed(),
            results,
        );
        tracing::info!(
            suite,
            total = report.total,
            passed = report.passed,
            failed = report.failed,
            "Suite finished"
        );
        report
    }

    async fn run_sequential(&self, cases: Vec<Box<dyn TestCase>>) -> Vec<TestCaseResult> {
        let mut results = Vec::with_capacity(cases.len());
        for mut case in cases {
            results.push(execute_case(&mut *case, &self.settings).await);
        }
        results
    }

    async fn run_parallel(
        &self,
        cases: Vec<Box<dyn TestCase>>,
        batches: &[usize],
    ) -> Vec<TestCaseResult> {
        let results = Arc::new(Mutex::new(Vec::with_capacity(cases.len())));
        let mut pending = cases.into_iter();

        for (index, &size) in batches.iter().enumerate() {
            tracing::debug!(batch = index + 1, size, "Launching batch");

            let tasks: Vec<_> = pending
                .by_ref()
                .take(size)
                .map(|mut case| {
                    let id = case.header().id.clone();
                    let name = case.header().name.clone();
                    let settings = self.settings.clone();
                    let results = Arc::clone(&results);
                    let handle = tokio::spawn(async move {
                        let result = execute_case(&mut *case, &settings).await;
                        results.lock().await.push(result);
                    });
                    async move { (id, name, handle.await) }
                })
                .collect();

            for (id, name, joined) in join_all(tasks).await {
                if let Err(e) = joined {
                    tracing::error!(case = %id, error = %e, "Case task aborted");
                    results.lock().await.push(TestCaseResult::crashed(
                        id,
                        name,
                        format!("case task aborted: {}", e),
                    ));
                }
            }
        }

        match Arc::try_unwrap(results) {
            Ok(results) => results.into_inner(),
            Err(shared) => std::mem::take(&mut *shared.lock().await),
        }
    }
}
