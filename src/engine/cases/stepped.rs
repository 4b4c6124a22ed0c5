//! Step-list driven case

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::common::{Error, Result};
use crate::drivers::DriverRegistry;
use crate::engine::case::{AttemptContext, CaseHeader, TestCase};
use crate::engine::step::TestStep;
use crate::suite::TestCaseDescription;

/// Runs its steps in ascending number order, stopping at the first failure
///
/// The value of the last result step that ran is the measured value.
#[derive(Debug)]
pub struct SteppedCase {
    header: CaseHeader,
    steps: Vec<TestStep>,
}

impl SteppedCase {
    pub fn from_description(desc: &TestCaseDescription, registry: &DriverRegistry) -> Result<Self> {
        if desc.steps.is_empty() {
            return Err(Error::invalid_case(&desc.id, "standard test case has no steps"));
        }

        let mut seen = BTreeSet::new();
        for step in &desc.steps {
            if !seen.insert(step.no) {
                return Err(Error::DuplicateStepNumber {
                    case: desc.id.clone(),
                    step: step.no,
                });
            }
        }

        let mut steps: Vec<TestStep> = desc
            .steps
            .iter()
            .map(|step| TestStep::bind(step.clone(), registry, &desc.spec))
            .collect();
        steps.sort_by_key(TestStep::number);

        Ok(Self {
            header: CaseHeader::from_description(desc),
            steps,
        })
    }

    pub fn steps(&self) -> &[TestStep] {
        &self.steps
    }
}

#[async_trait]
impl TestCase for SteppedCase {
    fn header(&self) -> &CaseHeader {
        &self.header
    }

    async fn run(&mut self, ctx: &mut AttemptContext) -> Result<()> {
        for step in &self.steps {
            let value = ctx.run(step).await?;
            if step.is_result_step() {
                ctx.set_measured(value);
            }
        }
        Ok(())
    }
}
