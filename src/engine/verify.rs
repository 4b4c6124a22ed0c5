//! Spec-range verification
//!
//! A measured value passes when it and both bounds parse as numbers and
//! `min <= value <= max`. Otherwise the value must equal the textual form of
//! `min` exactly; an absent `min` or measurement compares as the empty
//! string. Every miss is a `Verification` error carrying a readable
//! explanation.

use crate::common::{Error, Result};
use crate::suite::SpecRange;

/// Check `measured` against `spec`
///
/// `unit` only decorates the failure message.
pub fn check(spec: &SpecRange, measured: Option<&str>, unit: Option<&str>) -> Result<()> {
    let unit = unit.unwrap_or("");

    let numeric = measured.and_then(|measured| {
        Some((
            measured,
            measured.trim().parse::<f64>().ok()?,
            spec.min.as_ref()?.as_f64()?,
            spec.max.as_ref()?.as_f64()?,
        ))
    });
    if let Some((measured, value, min, max)) = numeric {
        if value.is_nan() {
            return Err(Error::Verification(format!(
                "measured value '{}' is not a number",
                measured
            )));
        }
        return if min <= value && value <= max {
            Ok(())
        } else {
            Err(Error::Verification(format!(
                "measured {}{} outside [{}{}, {}{}]",
                measured, unit, min, unit, max, unit
            )))
        };
    }

    let expected = spec.min.as_ref().map(ToString::to_string).unwrap_or_default();
    match measured {
        Some(measured) if measured == expected => Ok(()),
        None if expected.is_empty() => Ok(()),
        Some(measured) => Err(Error::Verification(format!(
            "measured '{}{}' does not match expected '{}{}'",
            measured, unit, expected, unit
        ))),
        None => Err(Error::Verification(format!(
            "no measured value to compare against {}",
            spec
        ))),
    }
}
