//! Test suite descriptions
//!
//! The declarative input of the engine: suites, cases, steps, spec ranges
//! and retry policies, plus the loader that reads them from YAML or JSON.

mod loader;
mod model;

pub use loader::{load_suite, parse_suite, sample_suite, save_suite, SuiteFormat};
pub use model::*;
