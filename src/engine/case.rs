//! Test case lifecycle and the shared case executor
//!
//! Every case variant implements [`TestCase`]; [`execute_case`] drives the
//! hooks through Initialize, Run, Verify and Cleanup for each attempt and
//! applies the retry policy.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;

use super::step::{StepBinding, TestStep};
use super::verify;
use crate::common::config::EngineConfig;
use crate::common::{Error, Result};
use crate::report::{StepOutcome, TestCaseResult};
use crate::suite::{RetryPolicy, SpecRange, TestCaseDescription};

/// Identity and acceptance settings shared by every case variant
#[derive(Debug, Clone, PartialEq)]
pub struct CaseHeader {
    pub id: String,
    pub name: String,
    pub group: Option<String>,
    pub unit: Option<String>,
    pub spec: SpecRange,
    pub retry: RetryPolicy,
}

impl CaseHeader {
    pub fn from_description(desc: &TestCaseDescription) -> Self {
        Self {
            id: desc.id.clone(),
            name: desc.name.clone(),
            group: desc.group.clone(),
            unit: desc.unit.clone(),
            spec: desc.spec.clone(),
            retry: desc.retry,
        }
    }
}

/// Engine-wide execution settings
#[derive(Debug, Clone)]
pub struct ExecutionSettings {
    /// Fixed delay between a failed attempt and the next one
    pub retry_delay: Duration,
    /// Upper bound for Initialize + Run of one attempt
    pub case_timeout: Option<Duration>,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for ExecutionSettings {
    fn from(config: &EngineConfig) -> Self {
        Self {
            retry_delay: config.retry_delay(),
            case_timeout: config.case_timeout(),
        }
    }
}

/// Step history and measured value of a single attempt
#[derive(Debug, Default)]
pub struct AttemptContext {
    outcomes: Vec<StepOutcome>,
    measured: Option<String>,
}

impl AttemptContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outcomes(&self) -> &[StepOutcome] {
        &self.outcomes
    }

    pub fn measured(&self) -> Option<&str> {
        self.measured.as_deref()
    }

    pub fn set_measured(&mut self, value: impl Into<String>) {
        self.measured = Some(value.into());
    }

    /// Number following the highest step recorded so far
    pub fn next_number(&self) -> u32 {
        self.outcomes.iter().map(|o| o.step).max().unwrap_or(0) + 1
    }

    pub fn record(&mut self, outcome: StepOutcome) {
        self.outcomes.push(outcome);
    }

    /// Execute a bound step and record its outcome
    ///
    /// Returns the step value, or the error that aborts the attempt.
    pub async fn run(&mut self, step: &TestStep) -> Result<String> {
        let outcome = step.execute().await;
        let result = settle(&outcome, step.is_bound());
        self.record(outcome);
        result
    }

    /// Execute an ad-hoc driver call as the next numbered step
    pub async fn call(
        &mut self,
        binding: &StepBinding,
        device: &str,
        function: &str,
        parameters: &[String],
    ) -> Result<String> {
        let number = self.next_number();
        let outcome = match binding {
            StepBinding::Bound(handler) => match handler.execute(function, parameters).await {
                Ok(value) => StepOutcome::passed(number, device, function, value),
                Err(e) => StepOutcome::failed(number, device, function, e.to_string()),
            },
            StepBinding::Unbound { reason, .. } => {
                StepOutcome::failed(number, device, function, reason.clone())
            }
        };
        let result = settle(&outcome, matches!(binding, StepBinding::Bound(_)));
        self.record(outcome);
        result
    }

    fn into_parts(self) -> (Vec<StepOutcome>, Option<String>) {
        (self.outcomes, self.measured)
    }
}

fn settle(outcome: &StepOutcome, bound: bool) -> Result<String> {
    if outcome.success {
        return Ok(outcome.value.clone().unwrap_or_default());
    }
    let message = outcome.message.clone().unwrap_or_default();
    if bound {
        Err(Error::StepFailed {
            step: outcome.step,
            message,
        })
    } else {
        Err(Error::UnresolvedStep {
            step: outcome.step,
            message,
        })
    }
}

/// Lifecycle hooks of a test case
///
/// Hooks run in the order initialize, run, verify, cleanup. An error from
/// any of the first three ends the attempt early; cleanup runs regardless.
#[async_trait]
pub trait TestCase: Send {
    fn header(&self) -> &CaseHeader;

    /// Acquire or prepare resources
    async fn initialize(&mut self, _ctx: &mut AttemptContext) -> Result<()> {
        Ok(())
    }

    /// Perform the measurement; sets the measured value on the context
    async fn run(&mut self, ctx: &mut AttemptContext) -> Result<()>;

    /// Judge the attempt, by default against the case spec
    fn verify(&self, ctx: &AttemptContext) -> Result<()> {
        let header = self.header();
        verify::check(&header.spec, ctx.measured(), header.unit.as_deref())
    }

    /// Release resources; failures are recorded but never decide the verdict
    async fn cleanup(&mut self, _ctx: &mut AttemptContext) -> Result<()> {
        Ok(())
    }
}

/// Run a case to its final disposition, retrying per its policy
#[tracing::instrument(skip_all, fields(case = %case.header().id))]
pub async fn execute_case(case: &mut dyn TestCase, settings: &ExecutionSettings) -> TestCaseResult {
    let header = case.header().clone();
    let started_at = Utc::now();
    let clock = Instant::now();

    let mut attempt = 0;
    let (ctx, verdict) = loop {
        attempt += 1;
        let mut ctx = AttemptContext::new();
        let verdict = run_attempt(case, &mut ctx, settings.case_timeout).await;

        match &verdict {
            Err(e) if header.retry.allows_another(attempt) => {
                tracing::warn!(attempt, error = %e, "Attempt failed, retrying");
                tokio::time::sleep(settings.retry_delay).await;
            }
            _ => break (ctx, verdict),
        }
    };

    let elapsed = clock.elapsed();
    let finished_at =
        started_at + chrono::Duration::from_std(elapsed).unwrap_or_else(|_| chrono::Duration::zero());
    let (steps, measured_value) = ctx.into_parts();

    let (failure_kind, message) = match &verdict {
        Ok(()) => {
            tracing::info!(attempts = attempt, "Case passed");
            (None, None)
        }
        Err(e) => {
            tracing::warn!(attempts = attempt, kind = %e.kind(), error = %e, "Case failed");
            (Some(e.kind()), Some(e.to_string()))
        }
    };

    TestCaseResult {
        id: header.id,
        name: header.name,
        group: header.group,
        success: verdict.is_ok(),
        measured_value,
        unit: header.unit,
        failure_kind,
        message,
        started_at,
        finished_at,
        duration: elapsed,
        attempts: attempt,
        steps,
    }
}

async fn run_attempt(
    case: &mut dyn TestCase,
    ctx: &mut AttemptContext,
    timeout: Option<Duration>,
) -> Result<()> {
    let prepared = match timeout {
        Some(limit) => tokio::time::timeout(limit, prepare(case, ctx))
            .await
            .unwrap_or(Err(Error::TimedOut(limit))),
        None => prepare(case, ctx).await,
    };
    let verdict = prepared.and_then(|()| case.verify(ctx));

    let recorded = ctx.outcomes().len();
    if let Err(e) = case.cleanup(ctx).await {
        tracing::warn!(error = %e, "Cleanup failed");
        if ctx.outcomes().len() == recorded {
            let number = ctx.next_number();
            let message = Error::Cleanup(e.to_string()).to_string();
            ctx.record(StepOutcome::failed(number, "CASE", "cleanup", message));
        }
    }

    verdict
}

async fn prepare(case: &mut dyn TestCase, ctx: &mut AttemptContext) -> Result<()> {
    case.initialize(ctx).await?;
    case.run(ctx).await
}
