//! # Session
//!
//! Counters and the gate registry for one simulation, passed explicitly to
//! every gate constructor instead of living in global state.

use crate::config::SimulationConfig;
use crate::error::Result;
use crate::gates::{Gate, GateId, GateRegistry};
use crate::wiring::Wiring;

/// Monotonic counters used while building gates.
#[derive(Debug, Clone, Default)]
pub struct Counters {
    next_gate: u64,
    probe_cursor: usize,
    next_input: u64,
    next_output: u64,
}

impl Counters {
    pub fn next_gate_id(&mut self) -> GateId {
        let id = GateId::new(self.next_gate);
        self.next_gate += 1;
        id
    }

    pub fn next_probe_marker(&mut self, config: &SimulationConfig) -> String {
        if config.probe_markers.is_empty() {
            return String::new();
        }
        let marker = config.probe_markers[self.probe_cursor % config.probe_markers.len()].clone();
        self.probe_cursor += 1;
        marker
    }

    pub fn next_input_name(&mut self, config: &SimulationConfig) -> String {
        let name = format!("{}{}", config.input_prefix, self.next_input);
        self.next_input += 1;
        name
    }

    pub fn next_output_name(&mut self, config: &SimulationConfig) -> String {
        let name = format!("{}{}", config.output_prefix, self.next_output);
        self.next_output += 1;
        name
    }
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    pub(crate) config: SimulationConfig,
    pub(crate) counters: Counters,
    pub(crate) registry: GateRegistry,
}

impl Session {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            counters: Counters::default(),
            registry: GateRegistry::default(),
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn registry(&self) -> &GateRegistry {
        &self.registry
    }

    pub(crate) fn build_gate(&mut self, type_name: &str, arg: Option<&str>, wiring: &mut Wiring) -> Result<Gate> {
        let Session {
            config,
            counters,
            registry,
        } = self;
        registry.build(type_name, arg, counters, config, wiring)
    }
}
