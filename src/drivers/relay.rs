//! Simulated relay board

use async_trait::async_trait;

use super::{param_f64, param_switch, DeviceClass, Latency, StepHandler};
use crate::common::{Error, Result};

pub struct SimulatedRelay {
    latency: Latency,
}

impl SimulatedRelay {
    pub fn new(latency: Latency) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl StepHandler for SimulatedRelay {
    fn device_class(&self) -> DeviceClass {
        DeviceClass::Relay
    }

    fn functions(&self) -> &'static [&'static str] {
        &["Set", "Reset"]
    }

    async fn execute(&self, function: &str, parameters: &[String]) -> Result<String> {
        match function.to_ascii_lowercase().as_str() {
            "set" => {
                let channel = param_f64(function, parameters, 0, "channel")?;
                if channel < 1.0 || channel.fract() != 0.0 {
                    return Err(Error::invalid_parameter(
                        function,
                        format!("channel {} is not a relay number", channel),
                    ));
                }
                let closed = param_switch(function, parameters, 1, "state")?;
                tracing::debug!(
                    channel = channel as u32,
                    state = if closed { "on" } else { "off" },
                    "Relay switched"
                );
                self.latency.pause(20).await;
                Ok("true".to_string())
            }
            "reset" => {
                self.latency.pause(20).await;
                Ok("true".to_string())
            }
            _ => Err(Error::unsupported(DeviceClass::Relay.as_str(), function)),
        }
    }
}
