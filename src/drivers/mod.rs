//! Instrument drivers
//!
//! A driver is the only thing the engine needs from an instrument or bus
//! integration: it receives a function identifier plus positional string
//! parameters and returns a string-encoded value. The drivers shipped here
//! simulate the instruments of a BMS test bench.

pub mod can;
pub mod dmm;
pub mod psu;
pub mod registry;
pub mod relay;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;

use crate::common::{Error, Result};

pub use registry::DriverRegistry;

/// Device classes known to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DeviceClass {
    /// Digital multimeter
    Dmm,
    /// Programmable voltage/current source
    Psu,
    /// CAN bus interface
    Can,
    /// Relay board
    Relay,
}

impl DeviceClass {
    pub const ALL: [DeviceClass; 4] = [
        DeviceClass::Dmm,
        DeviceClass::Psu,
        DeviceClass::Can,
        DeviceClass::Relay,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceClass::Dmm => "DMM",
            DeviceClass::Psu => "PSU",
            DeviceClass::Can => "CAN",
            DeviceClass::Relay => "RELAY",
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceClass {
    type Err = Error;

    /// Device classes are case-insensitive
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DMM" => Ok(DeviceClass::Dmm),
            "PSU" => Ok(DeviceClass::Psu),
            "CAN" => Ok(DeviceClass::Can),
            "RELAY" => Ok(DeviceClass::Relay),
            _ => Err(Error::UnknownDeviceClass(s.to_string())),
        }
    }
}

/// Step execution capability of one device class
#[async_trait]
pub trait StepHandler: Send + Sync {
    /// Device class this handler serves
    fn device_class(&self) -> DeviceClass;

    /// Function identifiers understood by `execute`, for listings
    fn functions(&self) -> &'static [&'static str];

    /// Execute `function` (case-insensitive) with positional parameters
    ///
    /// Unrecognized functions fail with `Error::UnsupportedOperation`.
    async fn execute(&self, function: &str, parameters: &[String]) -> Result<String>;
}

/// Simulated instrument latency
#[derive(Debug, Clone, Copy)]
pub struct Latency {
    scale: f64,
}

impl Latency {
    pub fn new(scale: f64) -> Self {
        Self {
            scale: scale.max(0.0),
        }
    }

    /// No delay at all
    pub fn none() -> Self {
        Self { scale: 0.0 }
    }

    /// Sleep for `ms` milliseconds, scaled
    pub async fn pause(&self, ms: u64) {
        if self.scale == 0.0 || ms == 0 {
            return;
        }
        let scaled = Duration::from_secs_f64(ms as f64 * self.scale / 1000.0);
        tokio::time::sleep(scaled).await;
    }
}

/// Fixed-point text encoding used for every numeric driver value
pub fn format_value(value: f64, decimals: usize) -> String {
    format!("{:.*}", decimals, value)
}

/// Positional parameter `index`, named `name` in error messages
fn param<'a>(
    function: &str,
    parameters: &'a [String],
    index: usize,
    name: &str,
) -> Result<&'a str> {
    parameters.get(index).map(|s| s.trim()).ok_or_else(|| {
        Error::invalid_parameter(
            function,
            format!("missing {} (parameter {})", name, index + 1),
        )
    })
}

fn param_f64(function: &str, parameters: &[String], index: usize, name: &str) -> Result<f64> {
    let raw = param(function, parameters, index, name)?;
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| {
            Error::invalid_parameter(function, format!("{} '{}' is not a number", name, raw))
        })
}

fn param_switch(function: &str, parameters: &[String], index: usize, name: &str) -> Result<bool> {
    let raw = param(function, parameters, index, name)?;
    match raw.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" | "close" | "closed" => Ok(true),
        "off" | "false" | "0" | "open" => Ok(false),
        _ => Err(Error::invalid_parameter(
            function,
            format!("{} '{}' is not on/off", name, raw),
        )),
    }
}
