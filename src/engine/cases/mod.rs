//! Test case variants

mod can_comm;
mod source_measure;
mod stepped;

pub use can_comm::CanCommCase;
pub use source_measure::{Quantity, SourceMeasureCase};
pub use stepped::SteppedCase;

use crate::common::{Error, Result};
use crate::suite::{ParamValue, TestCaseDescription};

/// Parameter lookup with case-insensitive keys
fn lookup<'a>(desc: &'a TestCaseDescription, key: &str) -> Option<&'a ParamValue> {
    desc.parameters
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v)
}

fn required_f64(desc: &TestCaseDescription, key: &str) -> Result<f64> {
    let value = lookup(desc, key)
        .ok_or_else(|| Error::invalid_case(&desc.id, format!("missing parameter '{}'", key)))?;
    number(desc, key, value)
}

fn optional_f64(desc: &TestCaseDescription, key: &str, default: f64) -> Result<f64> {
    lookup(desc, key).map_or(Ok(default), |v| number(desc, key, v))
}

fn optional_u64(desc: &TestCaseDescription, key: &str, default: u64) -> Result<u64> {
    match lookup(desc, key) {
        None => Ok(default),
        Some(v) => v.as_u64().ok_or_else(|| {
            Error::invalid_case(
                &desc.id,
                format!("parameter '{}' must be a non-negative integer, got '{}'", key, v),
            )
        }),
    }
}

fn required_text(desc: &TestCaseDescription, key: &str) -> Result<String> {
    lookup(desc, key)
        .map(|v| v.to_string())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| Error::invalid_case(&desc.id, format!("missing parameter '{}'", key)))
}

fn optional_text(desc: &TestCaseDescription, key: &str) -> Option<String> {
    lookup(desc, key).map(|v| v.to_string())
}

fn number(desc: &TestCaseDescription, key: &str, value: &ParamValue) -> Result<f64> {
    value.as_f64().filter(|v| v.is_finite()).ok_or_else(|| {
        Error::invalid_case(
            &desc.id,
            format!("parameter '{}' must be a number, got '{}'", key, value),
        )
    })
}

fn warn_ignored_steps(desc: &TestCaseDescription) {
    if !desc.steps.is_empty() {
        tracing::warn!(
            case = %desc.id,
            type_tag = %desc.type_tag,
            steps = desc.steps.len(),
            "Steps are ignored for parametric test types"
        );
    }
}
