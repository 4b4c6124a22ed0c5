//! Test steps
//!
//! A step is a step description bound to the handler of its device class.
//! Binding happens once at suite-build time; a step whose device class does
//! not resolve is kept as an unresolved binding so that only its own case
//! fails when it is reached.

use std::sync::Arc;

use super::verify;
use crate::drivers::{DriverRegistry, StepHandler};
use crate::report::StepOutcome;
use crate::suite::{SpecRange, StepComparison, StepDescription};

/// Handler binding of a step
#[derive(Clone)]
pub enum StepBinding {
    Bound(Arc<dyn StepHandler>),
    Unbound { device: String, reason: String },
}

impl StepBinding {
    /// Resolve `device` against the registry, logging a diagnostic on failure
    pub fn resolve(registry: &DriverRegistry, device: &str) -> Self {
        match registry.resolve(device) {
            Ok(handler) => Self::Bound(handler),
            Err(e) => {
                tracing::warn!(device, error = %e, "Step bound to an unresolved device class");
                Self::Unbound {
                    device: device.to_string(),
                    reason: e.to_string(),
                }
            }
        }
    }
}

impl std::fmt::Debug for StepBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bound(handler) => f
                .debug_tuple("Bound")
                .field(&handler.device_class())
                .finish(),
            Self::Unbound { device, reason } => f
                .debug_struct("Unbound")
                .field("device", device)
                .field("reason", reason)
                .finish(),
        }
    }
}

/// An executable step
#[derive(Debug, Clone)]
pub struct TestStep {
    description: StepDescription,
    binding: StepBinding,
    check: Option<SpecRange>,
}

impl TestStep {
    /// Bind a step description
    ///
    /// `case_spec` is what a `compare: spec` step is checked against.
    pub fn bind(
        description: StepDescription,
        registry: &DriverRegistry,
        case_spec: &SpecRange,
    ) -> Self {
        let binding = StepBinding::resolve(registry, &description.device);
        let check = description.compare.as_ref().map(|compare| match compare {
            StepComparison::Spec(_) => case_spec.clone(),
            StepComparison::Equals { equals } => SpecRange::exact(equals.clone()),
            StepComparison::Range { range } => range.clone(),
        });
        Self {
            description,
            binding,
            check,
        }
    }

    pub fn number(&self) -> u32 {
        self.description.no
    }

    pub fn device(&self) -> &str {
        &self.description.device
    }

    pub fn function(&self) -> &str {
        &self.description.function
    }

    pub fn is_result_step(&self) -> bool {
        self.description.result_step
    }

    pub fn is_bound(&self) -> bool {
        matches!(self.binding, StepBinding::Bound(_))
    }

    pub fn binding(&self) -> &StepBinding {
        &self.binding
    }

    /// Run the step through its handler
    ///
    /// Never fails: handler errors, unresolved bindings and step-local
    /// comparison misses all come back as a failed outcome.
    pub async fn execute(&self) -> StepOutcome {
        let desc = &self.description;
        let handler = match &self.binding {
            StepBinding::Bound(handler) => handler,
            StepBinding::Unbound { reason, .. } => {
                return StepOutcome::failed(desc.no, &desc.device, &desc.function, reason.clone());
            }
        };

        tracing::debug!(
            step = desc.no,
            device = %desc.device,
            function = %desc.function,
            "Executing step"
        );

        let value = match handler.execute(&desc.function, &desc.parameters).await {
            Ok(value) => value,
            Err(e) => {
                return StepOutcome::failed(desc.no, &desc.device, &desc.function, e.to_string());
            }
        };

        match &self.check {
            Some(spec) => match verify::check(spec, Some(&value), None) {
                Ok(()) => StepOutcome::passed(desc.no, &desc.device, &desc.function, value),
                Err(e) => StepOutcome::failed(desc.no, &desc.device, &desc.function, e.to_string())
                    .with_value(value),
            },
            None => StepOutcome::passed(desc.no, &desc.device, &desc.function, value),
        }
    }
}
