//! Error types for the inspector
//!
//! Every error maps onto a [`FailureKind`], the class that ends up in the
//! report when a test case fails because of it.

use std::io;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the inspector
#[derive(Error, Debug)]
pub enum Error {
    // === Suite Build Errors ===
    #[error("Unsupported test type '{0}'. Supported types: voltage, current, cancomm, standard")]
    UnsupportedTestType(String),

    #[error("Unknown device class '{0}'. Known classes: DMM, PSU, CAN, RELAY")]
    UnknownDeviceClass(String),

    #[error("No driver registered for device class {0}")]
    DriverNotRegistered(String),

    #[error("Duplicate test case id '{0}' in suite")]
    DuplicateCaseId(String),

    #[error("Test case '{case}' declares step number {step} more than once")]
    DuplicateStepNumber { case: String, step: u32 },

    #[error("Test case '{case}': {message}")]
    InvalidCase { case: String, message: String },

    // === Driver Errors ===
    #[error("{device} does not support function '{function}'")]
    UnsupportedOperation { device: String, function: String },

    #[error("Invalid parameter for {function}: {message}")]
    InvalidParameter { function: String, message: String },

    #[error("{device} error: {message}")]
    Device { device: String, message: String },

    // === Execution Errors ===
    #[error("Step {step} failed: {message}")]
    StepFailed { step: u32, message: String },

    #[error("Step {step} is not executable: {message}")]
    UnresolvedStep { step: u32, message: String },

    #[error("Verification failed: {0}")]
    Verification(String),

    #[error("Cleanup failed: {0}")]
    Cleanup(String),

    #[error("Attempt timed out after {} seconds", .0.as_secs_f64())]
    TimedOut(Duration),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    #[error("Failed to write file '{path}': {error}")]
    FileWrite { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an unsupported operation error
    pub fn unsupported(device: &str, function: &str) -> Self {
        Self::UnsupportedOperation {
            device: device.to_string(),
            function: function.to_string(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(function: &str, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            function: function.to_string(),
            message: message.into(),
        }
    }

    /// Create a device-reported error
    pub fn device(device: &str, message: impl Into<String>) -> Self {
        Self::Device {
            device: device.to_string(),
            message: message.into(),
        }
    }

    /// Create an invalid test case error
    pub fn invalid_case(case: &str, message: impl Into<String>) -> Self {
        Self::InvalidCase {
            case: case.to_string(),
            message: message.into(),
        }
    }

    /// Failure class this error is reported under
    pub fn kind(&self) -> FailureKind {
        match self {
            Error::UnsupportedTestType(_)
            | Error::UnknownDeviceClass(_)
            | Error::DriverNotRegistered(_)
            | Error::DuplicateCaseId(_)
            | Error::DuplicateStepNumber { .. }
            | Error::InvalidCase { .. }
            | Error::UnresolvedStep { .. }
            | Error::Config(_)
            | Error::ConfigParse(_) => FailureKind::Configuration,
            Error::Verification(_) => FailureKind::Verification,
            Error::Cleanup(_) => FailureKind::Cleanup,
            Error::TimedOut(_) => FailureKind::TimedOut,
            Error::Internal(_) => FailureKind::Internal,
            _ => FailureKind::StepExecution,
        }
    }
}

/// Failure taxonomy recorded on failed test case results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Unknown device class, unknown test type, malformed case
    Configuration,
    /// A driver reported a failure while running a step
    StepExecution,
    /// Measured value out of spec or not comparable
    Verification,
    /// Cleanup failed (never decides pass/fail on its own)
    Cleanup,
    /// Initialize/Run exceeded the per-attempt timeout
    TimedOut,
    /// The case task itself crashed
    Internal,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration => write!(f, "configuration"),
            Self::StepExecution => write!(f, "step-execution"),
            Self::Verification => write!(f, "verification"),
            Self::Cleanup => write!(f, "cleanup"),
            Self::TimedOut => write!(f, "timed-out"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            Error::UnknownDeviceClass("SCOPE".into()).kind(),
            FailureKind::Configuration
        );
        assert_eq!(
            Error::StepFailed { step: 2, message: "boom".into() }.kind(),
            FailureKind::StepExecution
        );
        assert_eq!(
            Error::unsupported("DMM", "fly").kind(),
            FailureKind::StepExecution
        );
        assert_eq!(
            Error::TimedOut(Duration::from_secs(3)).kind(),
            FailureKind::TimedOut
        );
    }

    #[test]
    fn test_timed_out_message() {
        let err = Error::TimedOut(Duration::from_millis(1500));
        assert_eq!(err.to_string(), "Attempt timed out after 1.5 seconds");
    }
}
