//! Inspector - test-sequence execution engine for hardware validation
//!
//! This library loads declarative test suites, executes their cases
//! against instrument drivers sequentially or in bounded parallel batches,
//! and aggregates the outcomes into a report.

pub mod cli;
pub mod commands;
pub mod common;
pub mod drivers;
pub mod engine;
pub mod report;
pub mod suite;

// Re-export commonly used types for tests
pub use common::{Error, FailureKind, Result};
pub use engine::{ExecutionMode, ExecutionSettings, Orchestrator};
pub use report::{StepOutcome, SuiteReport, TestCaseResult};
