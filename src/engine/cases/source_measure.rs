//! Voltage and current source-and-measure cases

use std::time::Duration;

use async_trait::async_trait;

use super::{optional_f64, optional_u64, required_f64, warn_ignored_steps};
use crate::common::Result;
use crate::drivers::{DeviceClass, DriverRegistry};
use crate::engine::case::{AttemptContext, CaseHeader, TestCase};
use crate::engine::step::StepBinding;
use crate::suite::{SpecRange, TestCaseDescription};

/// Quantity driven by the source and read back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    Voltage,
    Current,
}

impl Quantity {
    fn target_key(self) -> &'static str {
        match self {
            Quantity::Voltage => "targetVoltage",
            Quantity::Current => "targetCurrent",
        }
    }

    fn default_tolerance(self) -> f64 {
        match self {
            Quantity::Voltage => 0.1,
            Quantity::Current => 0.05,
        }
    }

    fn set_function(self) -> &'static str {
        match self {
            Quantity::Voltage => "SetVoltage",
            Quantity::Current => "SetCurrent",
        }
    }

    fn measure_function(self) -> &'static str {
        match self {
            Quantity::Voltage => "MeasureVoltage",
            Quantity::Current => "MeasureCurrent",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Quantity::Voltage => "V",
            Quantity::Current => "A",
        }
    }
}

/// Drive the source to a target, dwell, then read the output back
///
/// Without an explicit spec the case passes within `target ± tolerance`.
#[derive(Debug)]
pub struct SourceMeasureCase {
    header: CaseHeader,
    quantity: Quantity,
    target: f64,
    dwell: Duration,
    channel: u64,
    source: StepBinding,
}

impl SourceMeasureCase {
    pub fn from_description(
        desc: &TestCaseDescription,
        quantity: Quantity,
        registry: &DriverRegistry,
    ) -> Result<Self> {
        warn_ignored_steps(desc);

        let target = required_f64(desc, quantity.target_key())?;
        let tolerance = optional_f64(desc, "tolerance", quantity.default_tolerance())?.abs();
        let dwell = Duration::from_millis(optional_u64(desc, "durationMs", 0)?);
        let channel = optional_u64(desc, "channel", 1)?;

        let mut header = CaseHeader::from_description(desc);
        if header.spec.is_unbounded() {
            header.spec = SpecRange::between(target - tolerance, target + tolerance);
        }
        if header.unit.is_none() {
            header.unit = Some(quantity.unit().to_string());
        }

        Ok(Self {
            header,
            quantity,
            target,
            dwell,
            channel,
            source: StepBinding::resolve(registry, DeviceClass::Psu.as_str()),
        })
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    async fn psu(&self, ctx: &mut AttemptContext, function: &str, args: &[String]) -> Result<String> {
        ctx.call(&self.source, DeviceClass::Psu.as_str(), function, args)
            .await
    }
}

#[async_trait]
impl TestCase for SourceMeasureCase {
    fn header(&self) -> &CaseHeader {
        &self.header
    }

    async fn initialize(&mut self, ctx: &mut AttemptContext) -> Result<()> {
        self.psu(ctx, "Output", &["on".to_string(), self.channel.to_string()])
            .await?;
        Ok(())
    }

    async fn run(&mut self, ctx: &mut AttemptContext) -> Result<()> {
        let target = self.target.to_string();
        self.psu(
            ctx,
            self.quantity.set_function(),
            &[target.clone(), self.channel.to_string()],
        )
        .await?;

        if !self.dwell.is_zero() {
            tracing::debug!(dwell_ms = self.dwell.as_millis() as u64, "Holding output");
            tokio::time::sleep(self.dwell).await;
        }

        let measured = self
            .psu(ctx, self.quantity.measure_function(), &[target])
            .await?;
        ctx.set_measured(measured);
        Ok(())
    }

    async fn cleanup(&mut self, ctx: &mut AttemptContext) -> Result<()> {
        self.psu(ctx, "Output", &["off".to_string(), self.channel.to_string()])
            .await?;
        Ok(())
    }
}
