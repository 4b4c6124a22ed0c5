//! Test case factory
//!
//! Turns case descriptions into runnable cases. All validation happens
//! here, before anything executes: an unknown type tag, a missing
//! parameter or a duplicate identifier rejects the whole suite.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::case::TestCase;
use super::cases::{CanCommCase, Quantity, SourceMeasureCase, SteppedCase};
use crate::common::{Error, Result};
use crate::drivers::DriverRegistry;
use crate::suite::{TestCaseDescription, TestSuiteDescription};

/// Test types understood by the factory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseKind {
    Voltage,
    Current,
    CanComm,
    Standard,
}

impl CaseKind {
    pub const ALL: [CaseKind; 4] = [
        CaseKind::Voltage,
        CaseKind::Current,
        CaseKind::CanComm,
        CaseKind::Standard,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CaseKind::Voltage => "voltage",
            CaseKind::Current => "current",
            CaseKind::CanComm => "cancomm",
            CaseKind::Standard => "standard",
        }
    }
}

impl fmt::Display for CaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaseKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "voltage" => Ok(CaseKind::Voltage),
            "current" => Ok(CaseKind::Current),
            "cancomm" => Ok(CaseKind::CanComm),
            "standard" => Ok(CaseKind::Standard),
            _ => Err(Error::UnsupportedTestType(s.to_string())),
        }
    }
}

/// Builds cases bound to one driver registry
#[derive(Debug, Clone)]
pub struct CaseFactory {
    registry: Arc<DriverRegistry>,
}

impl CaseFactory {
    pub fn new(registry: Arc<DriverRegistry>) -> Self {
        Self { registry }
    }

    /// Create the case variant selected by the description's type tag
    pub fn create(&self, desc: &TestCaseDescription) -> Result<Box<dyn TestCase>> {
        let kind: CaseKind = desc.type_tag.parse()?;
        let registry = self.registry.as_ref();

        let case: Box<dyn TestCase> = match kind {
            CaseKind::Voltage => Box::new(SourceMeasureCase::from_description(
                desc,
                Quantity::Voltage,
                registry,
            )?),
            CaseKind::Current => Box::new(SourceMeasureCase::from_description(
                desc,
                Quantity::Current,
                registry,
            )?),
            CaseKind::CanComm => Box::new(CanCommCase::from_description(desc, registry)?),
            CaseKind::Standard => Box::new(SteppedCase::from_description(desc, registry)?),
        };

        tracing::debug!(case = %desc.id, kind = %kind, "Created test case");
        Ok(case)
    }

    /// Create every case of a suite, in declaration order
    pub fn build_suite(&self, suite: &TestSuiteDescription) -> Result<Vec<Box<dyn TestCase>>> {
        let mut ids = BTreeSet::new();
        let mut cases = Vec::with_capacity(suite.cases.len());

        for desc in &suite.cases {
            if !ids.insert(desc.id.as_str()) {
                return Err(Error::DuplicateCaseId(desc.id.clone()));
            }
            cases.push(self.create(desc)?);
        }

        tracing::info!(suite = %suite.name, cases = cases.len(), "Suite built");
        Ok(cases)
    }
}
