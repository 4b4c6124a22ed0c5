//! Simulated programmable voltage/current source
//!
//! The simulator keeps no setpoint state, so a single instance can be shared
//! by concurrently running cases. Readback functions take the nominal value
//! as a parameter and return it with up to ±0.1 of noise.

use async_trait::async_trait;
use rand::Rng;

use super::{format_value, param_f64, param_switch, DeviceClass, Latency, StepHandler};
use crate::common::{Error, Result};

const READBACK_NOISE: f64 = 0.1;

pub struct SimulatedPsu {
    latency: Latency,
}

impl SimulatedPsu {
    pub fn new(latency: Latency) -> Self {
        Self { latency }
    }

    fn readback(nominal: f64) -> String {
        let noise = rand::thread_rng().gen_range(-READBACK_NOISE..=READBACK_NOISE);
        format_value(nominal + noise, 4)
    }
}

#[async_trait]
impl StepHandler for SimulatedPsu {
    fn device_class(&self) -> DeviceClass {
        DeviceClass::Psu
    }

    fn functions(&self) -> &'static [&'static str] {
        &[
            "SetVoltage",
            "SetCurrent",
            "Output",
            "MeasureVoltage",
            "MeasureCurrent",
        ]
    }

    async fn execute(&self, function: &str, parameters: &[String]) -> Result<String> {
        match function.to_ascii_lowercase().as_str() {
            "setvoltage" | "setcurrent" => {
                let level = param_f64(function, parameters, 0, "level")?;
                if level < 0.0 {
                    return Err(Error::invalid_parameter(
                        function,
                        format!("level {} must not be negative", level),
                    ));
                }
                self.latency.pause(500).await;
                Ok("true".to_string())
            }
            "output" => {
                let on = param_switch(function, parameters, 0, "state")?;
                self.latency.pause(if on { 200 } else { 100 }).await;
                Ok("true".to_string())
            }
            "measurevoltage" | "measurecurrent" => {
                let nominal = param_f64(function, parameters, 0, "nominal")?;
                self.latency.pause(50).await;
                Ok(Self::readback(nominal))
            }
            _ => Err(Error::unsupported(DeviceClass::Psu.as_str(), function)),
        }
    }
}
