//! Simulated digital multimeter

use async_trait::async_trait;
use rand::Rng;

use super::{format_value, DeviceClass, Latency, StepHandler};
use crate::common::{Error, Result};

/// Reads a DC voltage of 3.0–3.7 V or a DC current of 10–100 mA
pub struct SimulatedDmm {
    latency: Latency,
}

impl SimulatedDmm {
    pub fn new(latency: Latency) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl StepHandler for SimulatedDmm {
    fn device_class(&self) -> DeviceClass {
        DeviceClass::Dmm
    }

    fn functions(&self) -> &'static [&'static str] {
        &["MeasureDCVoltage", "MeasureDCCurrent"]
    }

    async fn execute(&self, function: &str, _parameters: &[String]) -> Result<String> {
        let range = match function.to_ascii_lowercase().as_str() {
            "measuredcvoltage" => 3.0..3.7,
            "measuredccurrent" => 0.01..0.1,
            _ => return Err(Error::unsupported(DeviceClass::Dmm.as_str(), function)),
        };

        self.latency.pause(50).await;
        let reading = rand::thread_rng().gen_range(range);
        Ok(format_value(reading, 4))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_measure_current_in_range() {
        let dmm = SimulatedDmm::new(Latency::none());
        for _ in 0..20 {
            let value: f64 = dmm
                .execute("MeasureDCCurrent", &["0".to_string()])
                .await
                .unwrap()
                .parse()
                .unwrap();
            assert!((0.01..=0.1).contains(&value), "{} out of range", value);
        }
    }

    #[tokio::test]
    async fn test_measure_voltage_fixed_point() {
        let dmm = SimulatedDmm::new(Latency::none());
        let value = dmm.execute("measuredcvoltage", &[]).await.unwrap();
        assert_eq!(value.split('.').nth(1).map(str::len), Some(4));
    }

    #[tokio::test]
    async fn test_unknown_function() {
        let dmm = SimulatedDmm::new(Latency::none());
        let err = dmm.execute("MeasureResistance", &[]).await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperation { .. }));
    }
}
