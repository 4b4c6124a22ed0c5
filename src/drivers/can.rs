//! Simulated CAN bus interface

use async_trait::async_trait;
use rand::Rng;

use super::{format_value, param, param_f64, DeviceClass, Latency, StepHandler};
use crate::common::{Error, Result};

/// Canned response frame returned by the simulated ECU
pub const SIMULATED_RESPONSE: &str = "53 4F 43 3A 38 35";

/// Request/response simulator with a configurable drop rate
pub struct SimulatedCan {
    latency: Latency,
    drop_rate: f64,
}

impl SimulatedCan {
    pub fn new(latency: Latency, drop_rate: f64) -> Self {
        Self {
            latency,
            drop_rate: drop_rate.clamp(0.0, 1.0),
        }
    }
}

#[async_trait]
impl StepHandler for SimulatedCan {
    fn device_class(&self) -> DeviceClass {
        DeviceClass::Can
    }

    fn functions(&self) -> &'static [&'static str] {
        &["Open", "Close", "SendMessage", "ReadValue", "Request"]
    }

    async fn execute(&self, function: &str, parameters: &[String]) -> Result<String> {
        match function.to_ascii_lowercase().as_str() {
            "open" => {
                self.latency.pause(300).await;
                Ok("true".to_string())
            }
            "close" => {
                self.latency.pause(100).await;
                Ok("true".to_string())
            }
            "sendmessage" => {
                param(function, parameters, 0, "message id")?;
                self.latency.pause(50).await;
                Ok("true".to_string())
            }
            "readvalue" => {
                param(function, parameters, 0, "signal name")?;
                let value = rand::thread_rng().gen_range(10.0..15.0);
                Ok(format_value(value, 2))
            }
            "request" => {
                let id = param(function, parameters, 0, "message id")?;
                param(function, parameters, 1, "message data")?;
                let timeout_ms = param_f64(function, parameters, 2, "timeout")?.max(0.0) as u64;

                self.latency.pause(100).await;
                let (wait_ms, dropped) = {
                    let mut rng = rand::thread_rng();
                    let wait = if timeout_ms > 50 {
                        rng.gen_range(50..timeout_ms)
                    } else {
                        timeout_ms
                    };
                    (wait, rng.gen_bool(self.drop_rate))
                };
                self.latency.pause(wait_ms).await;

                if dropped {
                    Err(Error::device(
                        DeviceClass::Can.as_str(),
                        format!("no response to {} within {} ms", id, timeout_ms),
                    ))
                } else {
                    Ok(SIMULATED_RESPONSE.to_string())
                }
            }
            _ => Err(Error::unsupported(DeviceClass::Can.as_str(), function)),
        }
    }
}
