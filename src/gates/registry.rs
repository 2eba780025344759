//! # Gate Registry
//!
//! Maps gate type names to builders. Consumed by interactive "add gate"
//! actions, by blueprints, and by compound templates rebuilding their interior.

use super::builtin::Builtin;
use super::gate::Gate;
use crate::compound::CompoundTemplate;
use crate::config::SimulationConfig;
use crate::error::{CircuitError, Result};
use crate::session::Counters;
use crate::wiring::Wiring;
use indexmap::IndexMap;
use std::sync::Arc;

/// One registry entry.
#[derive(Debug, Clone)]
pub enum GateBuilder {
    Builtin(Builtin),
    /// A type created by packing a circuit
    Compound(Arc<CompoundTemplate>),
}

#[derive(Debug, Clone)]
pub struct GateRegistry {
    builders: IndexMap<String, GateBuilder>,
}

impl Default for GateRegistry {
    fn default() -> Self {
        let builders = Builtin::ALL
            .iter()
            .map(|b| (b.type_name().to_string(), GateBuilder::Builtin(*b)))
            .collect();
        Self { builders }
    }
}

impl GateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.builders.contains_key(type_name)
    }

    pub fn get(&self, type_name: &str) -> Option<&GateBuilder> {
        self.builders.get(type_name)
    }

    /// Registered type names, built-ins first, in registration order.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.builders.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.builders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }

    /// Register a packed circuit as a buildable type.
    pub fn register_compound(&mut self, template: Arc<CompoundTemplate>) -> Result<()> {
        if self.contains(template.name()) {
            return Err(CircuitError::GateTypeExists(template.name().to_string()));
        }
        tracing::debug!("[REGISTRY] Registered compound type '{}'", template.name());
        self.builders
            .insert(template.name().to_string(), GateBuilder::Compound(template));
        Ok(())
    }

    /// Build a new gate of the named type.
    ///
    /// Compound types create their interior edges on `wiring`; the caller owns
    /// the returned gate and must dispose its edges if it is discarded.
    pub(crate) fn build(
        &self,
        type_name: &str,
        arg: Option<&str>,
        counters: &mut Counters,
        config: &SimulationConfig,
        wiring: &mut Wiring,
    ) -> Result<Gate> {
        match self.builders.get(type_name) {
            Some(GateBuilder::Builtin(builtin)) => Ok(builtin.build(arg, counters, config)),
            Some(GateBuilder::Compound(template)) => {
                CompoundTemplate::instantiate(template, self, counters, config, wiring)
            }
            None => Err(CircuitError::UnknownGateType(type_name.to_string())),
        }
    }
}
