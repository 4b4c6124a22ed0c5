//! Suite file loading and saving
//!
//! YAML (`.yaml`/`.yml`) and JSON (`.json`) are both accepted; anything else
//! is parsed as YAML, which is a superset of JSON.

use std::collections::BTreeMap;
use std::path::Path;

use crate::common::{paths, Error, Result};

use super::model::{
    ParamValue, RetryPolicy, SpecRange, StepComparison, StepDescription, TestCaseDescription,
    TestSuiteDescription,
};

/// On-disk format of a suite file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuiteFormat {
    Yaml,
    Json,
}

impl SuiteFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => SuiteFormat::Json,
            _ => SuiteFormat::Yaml,
        }
    }
}

/// Load a suite description from a file
pub fn load_suite(path: &Path) -> Result<TestSuiteDescription> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.display().to_string(),
        error: e.to_string(),
    })?;

    let suite = parse_suite(&content, SuiteFormat::from_path(path)).map_err(|e| {
        Error::Config(format!(
            "Failed to parse test suite '{}': {}",
            path.display(),
            e
        ))
    })?;

    tracing::info!(
        suite = %suite.name,
        cases = suite.cases.len(),
        path = %path.display(),
        "Loaded test suite"
    );
    Ok(suite)
}

/// Parse suite text in the given format
pub fn parse_suite(content: &str, format: SuiteFormat) -> Result<TestSuiteDescription> {
    let suite: TestSuiteDescription = match format {
        SuiteFormat::Json => serde_json::from_str(content)?,
        SuiteFormat::Yaml => serde_yaml::from_str(content)?,
    };
    Ok(suite)
}

/// Write a suite description to a file
pub fn save_suite(path: &Path, suite: &TestSuiteDescription) -> Result<()> {
    let content = match SuiteFormat::from_path(path) {
        SuiteFormat::Json => serde_json::to_string_pretty(suite)?,
        SuiteFormat::Yaml => serde_yaml::to_string(suite)?,
    };
    paths::ensure_parent_dir(path)?;
    std::fs::write(path, content).map_err(|e| Error::FileWrite {
        path: path.display().to_string(),
        error: e.to_string(),
    })
}

/// Sample BMS suite covering every case type
pub fn sample_suite() -> TestSuiteDescription {
    fn params(entries: &[(&str, ParamValue)]) -> BTreeMap<String, ParamValue> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn dmm_current(no: u32, result_step: bool) -> StepDescription {
        StepDescription {
            no,
            device: "DMM".to_string(),
            function: "MeasureDCCurrent".to_string(),
            parameters: vec!["0".to_string()],
            result_step,
            compare: None,
        }
    }

    let mut cases = vec![
        TestCaseDescription {
            id: "V001".to_string(),
            name: "Basic voltage output".to_string(),
            type_tag: "voltage".to_string(),
            group: Some("Power".to_string()),
            unit: Some("V".to_string()),
            steps: Vec::new(),
            spec: SpecRange::default(),
            retry: RetryPolicy::retries(2),
            parameters: params(&[
                ("targetVoltage", 12.0.into()),
                ("durationMs", 500i64.into()),
                ("tolerance", 0.2.into()),
            ]),
        },
        TestCaseDescription {
            id: "V002".to_string(),
            name: "Low voltage output".to_string(),
            type_tag: "voltage".to_string(),
            group: Some("Power".to_string()),
            unit: Some("V".to_string()),
            steps: Vec::new(),
            spec: SpecRange::default(),
            retry: RetryPolicy::default(),
            parameters: params(&[
                ("targetVoltage", 3.3.into()),
                ("durationMs", 300i64.into()),
                ("tolerance", 0.1.into()),
            ]),
        },
        TestCaseDescription {
            id: "C001".to_string(),
            name: "Basic current output".to_string(),
            type_tag: "current".to_string(),
            group: Some("Power".to_string()),
            unit: Some("A".to_string()),
            steps: Vec::new(),
            spec: SpecRange::default(),
            retry: RetryPolicy::retries(3),
            parameters: params(&[
                ("targetCurrent", 5.0.into()),
                ("durationMs", 500i64.into()),
                ("tolerance", 0.1.into()),
            ]),
        },
        TestCaseDescription {
            id: "CAN001".to_string(),
            name: "BMS status request".to_string(),
            type_tag: "cancomm".to_string(),
            group: Some("Communication".to_string()),
            unit: None,
            steps: Vec::new(),
            spec: SpecRange::default(),
            retry: RetryPolicy::retries(2),
            parameters: params(&[
                ("canID", "0x18FF50E5".into()),
                ("messageData", "03 22 F0 05 00 00 00 00".into()),
                ("timeoutMs", 200i64.into()),
            ]),
        },
        TestCaseDescription {
            id: "M001".to_string(),
            name: "BMS current measurement with relay".to_string(),
            type_tag: "standard".to_string(),
            group: Some("BMS Test".to_string()),
            unit: Some("A".to_string()),
            steps: vec![
                dmm_current(1, false),
                StepDescription {
                    no: 2,
                    device: "RELAY".to_string(),
                    function: "Set".to_string(),
                    parameters: vec!["1".to_string(), "on".to_string()],
                    result_step: false,
                    compare: Some(StepComparison::Equals {
                        equals: "true".into(),
                    }),
                },
                dmm_current(3, true),
                StepDescription {
                    no: 4,
                    device: "RELAY".to_string(),
                    function: "Set".to_string(),
                    parameters: vec!["1".to_string(), "off".to_string()],
                    result_step: false,
                    compare: None,
                },
            ],
            spec: SpecRange::between(0.01, 0.1),
            retry: RetryPolicy::default(),
            parameters: BTreeMap::new(),
        },
    ];

    for (no, min) in [(2u32, 0.02), (3, 0.03)] {
        cases.push(TestCaseDescription {
            id: format!("M00{}", no),
            name: format!("BMS current measurement {}", no),
            type_tag: "standard".to_string(),
            group: Some("BMS Test".to_string()),
            unit: Some("A".to_string()),
            steps: vec![dmm_current(1, true)],
            spec: SpecRange::between(min, 0.1),
            retry: RetryPolicy::default(),
            parameters: BTreeMap::new(),
        });
    }

    TestSuiteDescription {
        name: "BMS functional suite".to_string(),
        description: Some(
            "Voltage, current and communication checks for the BMS".to_string(),
        ),
        model: Some("TEST".to_string()),
        author: None,
        cases,
    }
}
