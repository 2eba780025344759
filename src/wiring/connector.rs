//! # Connectors
//!
//! A connector is one named pin on a gate. Its state is never stored: it is
//! derived from the edges attached to it on the [`Wiring`] board.

use super::edge::{EdgeId, Wiring};
use crate::error::{CircuitError, Result};
use crate::gates::GateId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of a gate a connector sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Input,
    Output,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Input => write!(f, "input"),
            Side::Output => write!(f, "output"),
        }
    }
}

/// Address of a single pin: owning gate, side and position in the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PinRef {
    pub gate: GateId,
    pub side: Side,
    pub index: usize,
}

impl PinRef {
    pub fn input(gate: GateId, index: usize) -> Self {
        Self {
            gate,
            side: Side::Input,
            index,
        }
    }

    pub fn output(gate: GateId, index: usize) -> Self {
        Self {
            gate,
            side: Side::Output,
            index,
        }
    }
}

impl fmt::Display for PinRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}[{}]", self.gate, self.side, self.index)
    }
}

/// A single named pin.
#[derive(Debug, Clone)]
pub struct Connector {
    pin: PinRef,
    name: String,
}

impl Connector {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn side(&self) -> Side {
        self.pin.side
    }

    pub fn pin(&self) -> PinRef {
        self.pin
    }

    pub fn edges<'w>(&self, wiring: &'w Wiring) -> &'w [EdgeId] {
        wiring.edges_at(self.pin)
    }

    pub fn state(&self, wiring: &Wiring) -> bool {
        wiring.state(self.pin)
    }
}

/// The ordered pins on one side of a gate. Fixed when the gate is built.
#[derive(Debug, Clone)]
pub struct ConnectorCollection {
    gate: GateId,
    side: Side,
    connectors: Vec<Connector>,
}

impl ConnectorCollection {
    pub fn new<S: AsRef<str>>(gate: GateId, side: Side, names: &[S]) -> Self {
        let connectors = names
            .iter()
            .enumerate()
            .map(|(index, name)| Connector {
                pin: PinRef { gate, side, index },
                name: name.as_ref().to_string(),
            })
            .collect();
        Self {
            gate,
            side,
            connectors,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn len(&self) -> usize {
        self.connectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Connector> {
        self.connectors.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Connector> {
        self.connectors.iter()
    }

    /// Look a connector up by name.
    pub fn find(&self, name: &str) -> Option<&Connector> {
        self.connectors.iter().find(|c| c.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.connectors.iter().map(|c| c.name.clone()).collect()
    }

    pub fn pins(&self) -> impl Iterator<Item = PinRef> + '_ {
        self.connectors.iter().map(|c| c.pin)
    }

    /// Snapshot of every connector's state, in collection order.
    pub fn to_bool_vector(&self, wiring: &Wiring) -> Vec<bool> {
        self.connectors.iter().map(|c| wiring.state(c.pin)).collect()
    }

    /// Push values onto the output pins. Input collections are read-only.
    pub fn from_bool_vector(&self, wiring: &mut Wiring, values: &[bool]) -> Result<()> {
        if self.side == Side::Input {
            return Err(CircuitError::ReadOnlyCollection);
        }
        for (connector, value) in self.connectors.iter().zip(values) {
            wiring.set_output_state(connector.pin, *value)?;
        }
        Ok(())
    }

    /// Set a pin's state regardless of side. Only compound evaluation uses this.
    pub fn force(&self, wiring: &mut Wiring, index: usize, value: bool) -> Result<()> {
        let pin = self.pin_at(index)?;
        wiring.force(pin, value);
        Ok(())
    }

    /// Direct positional read.
    pub fn read(&self, wiring: &Wiring, index: usize) -> Result<bool> {
        Ok(wiring.state(self.pin_at(index)?))
    }

    pub(crate) fn pin_at(&self, index: usize) -> Result<PinRef> {
        self.connectors
            .get(index)
            .map(|c| c.pin)
            .ok_or(CircuitError::PinNotFound {
                gate: self.gate,
                side: self.side,
                index,
            })
    }
}
