//! Test suite description types
//!
//! Defines the data structures deserialized from suite files. These are
//! read-only once loaded; the engine builds its own runtime objects from
//! them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A complete test suite loaded from a YAML or JSON file
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TestSuiteDescription {
    /// Name of the suite
    pub name: String,
    /// Optional description of what the suite covers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Device under test
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Suite author
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Test cases in declaration order
    #[serde(default)]
    pub cases: Vec<TestCaseDescription>,
}

/// A single test case
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TestCaseDescription {
    /// Identifier, unique within the suite
    pub id: String,
    /// Display name
    pub name: String,
    /// Type tag selecting the case behavior (voltage, current, cancomm, standard)
    #[serde(rename = "type")]
    pub type_tag: String,
    /// Optional grouping label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Unit of the measured value (e.g. "V", "A")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Ordered steps (empty for parametric cases)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<StepDescription>,
    /// Acceptance criterion for the measured value
    #[serde(default, skip_serializing_if = "SpecRange::is_unbounded")]
    pub spec: SpecRange,
    /// Automatic retry policy
    #[serde(default)]
    pub retry: RetryPolicy,
    /// Type-specific parameters
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, ParamValue>,
}

/// A single step in a test case
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StepDescription {
    /// Sequence number; steps run in ascending order
    pub no: u32,
    /// Device class identifier (DMM, PSU, CAN, RELAY; case-insensitive)
    pub device: String,
    /// Function identifier, interpreted by the device driver
    pub function: String,
    /// Positional string parameters
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<String>,
    /// Whether this step's value is the case's measured value
    #[serde(default)]
    pub result_step: bool,
    /// Optional step-local pass/fail check
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compare: Option<StepComparison>,
}

/// Step-local comparison mode
///
/// Written as `compare: spec`, `compare: { equals: "true" }` or
/// `compare: { range: { min: 1, max: 2 } }`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum StepComparison {
    /// Check the step value against the case-level spec
    Spec(SpecKeyword),
    /// Step value must equal this exactly
    Equals { equals: ParamValue },
    /// Step value must lie within this range
    Range { range: SpecRange },
}

impl StepComparison {
    /// The `compare: spec` form
    pub fn case_spec() -> Self {
        Self::Spec(SpecKeyword::Spec)
    }
}

/// Keyword selecting the case-level spec
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SpecKeyword {
    Spec,
}

/// Inclusive acceptance range, or an exact-match value in `min`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct SpecRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<ParamValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<ParamValue>,
}

impl SpecRange {
    /// Numeric range `[min, max]`
    pub fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(ParamValue::Float(min)),
            max: Some(ParamValue::Float(max)),
        }
    }

    /// Exact-match criterion
    pub fn exact(value: impl Into<ParamValue>) -> Self {
        Self {
            min: Some(value.into()),
            max: None,
        }
    }

    /// True when neither bound is set
    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

impl fmt::Display for SpecRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.min, &self.max) {
            (Some(min), Some(max)) => write!(f, "{}~{}", min, max),
            (Some(min), None) => write!(f, "=={}", min),
            (None, Some(max)) => write!(f, "~{}", max),
            (None, None) => write!(f, "none"),
        }
    }
}

/// Automatic retry policy
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Whether failed attempts are retried
    #[serde(default)]
    pub enabled: bool,
    /// Retries after the first attempt (total attempts = max_retries + 1)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            max_retries: default_max_retries(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}

impl RetryPolicy {
    /// Retry enabled with the given number of retries
    pub fn retries(max_retries: u32) -> Self {
        Self {
            enabled: true,
            max_retries,
        }
    }

    /// Whether another attempt may follow attempt number `attempt` (1-based)
    pub fn allows_another(&self, attempt: u32) -> bool {
        self.enabled && attempt <= self.max_retries
    }
}

/// A typed scalar parameter value
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    /// Numeric view; text is parsed, booleans are not numbers
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Bool(_) => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Integer(i) => u64::try_from(*i).ok(),
            Self::Float(f) if f.fract() == 0.0 && *f >= 0.0 => Some(*f as u64),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(v) => write!(f, "{}", v),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stepped_case() {
        let yaml = r#"
id: M001
name: Current measurement
type: standard
unit: A
spec: { min: 0.01, max: "0.1" }
steps:
  - no: 1
    device: dmm
    function: MeasureDCCurrent
    parameters: ["0"]
    result_step: true
  - no: 2
    device: RELAY
    function: set
    parameters: ["1", "on"]
    compare: { equals: "true" }
"#;
        let case: TestCaseDescription = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(case.type_tag, "standard");
        assert_eq!(case.steps.len(), 2);
        assert!(case.steps[0].result_step);
        assert_eq!(case.spec.min, Some(ParamValue::Float(0.01)));
        assert_eq!(case.spec.max, Some(ParamValue::Text("0.1".into())));
        assert_eq!(
            case.steps[1].compare,
            Some(StepComparison::Equals {
                equals: ParamValue::Text("true".into())
            })
        );
        assert!(!case.retry.enabled);
    }

    #[test]
    fn test_parse_spec_comparison_unit_variant() {
        let step: StepDescription = serde_yaml::from_str(
            "{ no: 3, device: CAN, function: ReadValue, parameters: [SOC], compare: spec }",
        )
        .unwrap();
        assert_eq!(step.compare, Some(StepComparison::case_spec()));
    }

    #[test]
    fn test_parse_parametric_case_json() {
        let json = r#"{
            "id": "V001",
            "name": "Basic voltage output",
            "type": "Voltage",
            "retry": { "enabled": true, "max_retries": 2 },
            "parameters": { "targetVoltage": 12.0, "durationMs": 500, "enableLog": true }
        }"#;
        let case: TestCaseDescription = serde_json::from_str(json).unwrap();
        assert!(case.steps.is_empty());
        assert_eq!(case.retry, RetryPolicy::retries(2));
        assert_eq!(case.parameters["targetVoltage"].as_f64(), Some(12.0));
        assert_eq!(case.parameters["durationMs"], ParamValue::Integer(500));
        assert_eq!(case.parameters["enableLog"].as_bool(), Some(true));
    }

    #[test]
    fn test_retry_allows_another() {
        let policy = RetryPolicy::retries(2);
        assert!(policy.allows_another(1));
        assert!(policy.allows_another(2));
        assert!(!policy.allows_another(3));
        assert!(!RetryPolicy::default().allows_another(1));
    }

    #[test]
    fn test_retry_default_max() {
        let policy: RetryPolicy = serde_yaml::from_str("enabled: true").unwrap();
        assert_eq!(policy.max_retries, 3);
    }

    #[test]
    fn test_spec_display() {
        assert_eq!(SpecRange::between(0.5, 1.5).to_string(), "0.5~1.5");
        assert_eq!(SpecRange::exact("OK").to_string(), "==OK");
        assert_eq!(SpecRange::default().to_string(), "none");
    }
}
