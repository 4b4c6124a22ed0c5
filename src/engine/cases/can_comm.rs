//! CAN request/response case

use async_trait::async_trait;

use super::{optional_text, optional_u64, required_text, warn_ignored_steps};
use crate::common::{Error, Result};
use crate::drivers::{DeviceClass, DriverRegistry};
use crate::engine::case::{AttemptContext, CaseHeader, TestCase};
use crate::engine::step::StepBinding;
use crate::engine::verify;
use crate::suite::{SpecRange, TestCaseDescription};

const DEFAULT_TIMEOUT_MS: u64 = 200;

/// Send one request frame and judge the response
#[derive(Debug)]
pub struct CanCommCase {
    header: CaseHeader,
    can_id: String,
    data: String,
    timeout_ms: u64,
    expected: Option<String>,
    bus: StepBinding,
}

impl CanCommCase {
    pub fn from_description(desc: &TestCaseDescription, registry: &DriverRegistry) -> Result<Self> {
        warn_ignored_steps(desc);

        Ok(Self {
            header: CaseHeader::from_description(desc),
            can_id: required_text(desc, "canID")?,
            data: required_text(desc, "messageData")?,
            timeout_ms: optional_u64(desc, "timeoutMs", DEFAULT_TIMEOUT_MS)?,
            expected: optional_text(desc, "expectedResponse"),
            bus: StepBinding::resolve(registry, DeviceClass::Can.as_str()),
        })
    }

    async fn can(&self, ctx: &mut AttemptContext, function: &str, args: &[String]) -> Result<String> {
        ctx.call(&self.bus, DeviceClass::Can.as_str(), function, args)
            .await
    }
}

#[async_trait]
impl TestCase for CanCommCase {
    fn header(&self) -> &CaseHeader {
        &self.header
    }

    async fn initialize(&mut self, ctx: &mut AttemptContext) -> Result<()> {
        self.can(ctx, "Open", &[]).await?;
        Ok(())
    }

    async fn run(&mut self, ctx: &mut AttemptContext) -> Result<()> {
        let args = [
            self.can_id.clone(),
            self.data.clone(),
            self.timeout_ms.to_string(),
        ];
        let response = self.can(ctx, "Request", &args).await?;
        tracing::debug!(can_id = %self.can_id, response = %response, "CAN response");
        ctx.set_measured(response);
        Ok(())
    }

    /// Case spec first, then the expected response, then any non-empty answer
    fn verify(&self, ctx: &AttemptContext) -> Result<()> {
        let unit = self.header.unit.as_deref();
        if !self.header.spec.is_unbounded() {
            return verify::check(&self.header.spec, ctx.measured(), unit);
        }
        if let Some(expected) = &self.expected {
            return verify::check(&SpecRange::exact(expected.as_str()), ctx.measured(), unit);
        }
        match ctx.measured() {
            Some(response) if !response.trim().is_empty() => Ok(()),
            _ => Err(Error::Verification(format!(
                "empty response to {}",
                self.can_id
            ))),
        }
    }

    async fn cleanup(&mut self, ctx: &mut AttemptContext) -> Result<()> {
        self.can(ctx, "Close", &[]).await?;
        Ok(())
    }
}
