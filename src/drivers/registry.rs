//! Driver registry
//!
//! Maps each device class to the handler that executes its steps. The
//! registry is built once at startup and is read-only afterwards, so it is
//! shared between concurrently running cases behind an `Arc` without locking.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::can::SimulatedCan;
use super::dmm::SimulatedDmm;
use super::psu::SimulatedPsu;
use super::relay::SimulatedRelay;
use super::{DeviceClass, Latency, StepHandler};
use crate::common::config::SimulationConfig;
use crate::common::{Error, Result};

#[derive(Default, Clone)]
pub struct DriverRegistry {
    handlers: BTreeMap<DeviceClass, Arc<dyn StepHandler>>,
}

impl DriverRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with a simulator for every device class
    pub fn simulated(config: &SimulationConfig) -> Self {
        let latency = Latency::new(config.latency_scale);
        let mut registry = Self::new();
        registry.register(Arc::new(SimulatedDmm::new(latency)));
        registry.register(Arc::new(SimulatedPsu::new(latency)));
        registry.register(Arc::new(SimulatedCan::new(latency, config.can_drop_rate)));
        registry.register(Arc::new(SimulatedRelay::new(latency)));
        registry
    }

    /// Register a handler under its own device class
    ///
    /// Returns the handler it replaced, if any.
    pub fn register(&mut self, handler: Arc<dyn StepHandler>) -> Option<Arc<dyn StepHandler>> {
        self.handlers.insert(handler.device_class(), handler)
    }

    /// Look up the handler of a known device class
    pub fn get(&self, class: DeviceClass) -> Option<Arc<dyn StepHandler>> {
        self.handlers.get(&class).cloned()
    }

    /// Resolve a device class identifier (case-insensitive) to its handler
    pub fn resolve(&self, device: &str) -> Result<Arc<dyn StepHandler>> {
        let class: DeviceClass = device.parse()?;
        self.get(class)
            .ok_or_else(|| Error::DriverNotRegistered(class.to_string()))
    }

    /// Registered device classes, in a stable order
    pub fn classes(&self) -> impl Iterator<Item = DeviceClass> + '_ {
        self.handlers.keys().copied()
    }

    /// Registered handlers, in a stable order
    pub fn handlers(&self) -> impl Iterator<Item = &Arc<dyn StepHandler>> + '_ {
        self.handlers.values()
    }
}

impl std::fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("classes", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}
