//! Test execution engine
//!
//! Suite descriptions are turned into [`TestCase`]s by the [`CaseFactory`],
//! and the [`Orchestrator`] runs them sequentially or in bounded-parallel
//! batches, producing a [`SuiteReport`](crate::report::SuiteReport).

pub mod case;
pub mod cases;
pub mod factory;
pub mod orchestrator;
pub mod step;
pub mod verify;

pub use case::{execute_case, AttemptContext, CaseHeader, ExecutionSettings, TestCase};
pub use factory::{CaseFactory, CaseKind};
pub use orchestrator::{plan_batches, ExecutionMode, Orchestrator};
pub use step::{StepBinding, TestStep};
