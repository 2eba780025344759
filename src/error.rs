//! # Circuit Errors
//!
//! A single error enum for every recoverable failure the engine reports.

use crate::gates::GateId;
use crate::wiring::{EdgeId, PinRef, Side};
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, CircuitError>;

/// Errors reported by wiring, blueprint resolution and packing.
///
/// None of these leave the circuit half-modified: every operation that can
/// fail validates before it mutates.
#[derive(Debug, Error)]
pub enum CircuitError {
    /// Only output-to-input connections are legal
    #[error("illegal connection: {from} connector cannot drive {to} connector")]
    IllegalConnection { from: Side, to: Side },

    #[error("edge {0:?} is already connected to an input")]
    EdgeAlreadyConnected(EdgeId),

    /// Input connectors are driven by their edges only
    #[error("cannot write state to input connector {0}")]
    ReadOnlyInput(PinRef),

    #[error("cannot write values to an input collection")]
    ReadOnlyCollection,

    #[error("connector {pin} is not an {expected} connector")]
    WrongSide { pin: PinRef, expected: Side },

    #[error("edge not found: {0:?}")]
    EdgeNotFound(EdgeId),

    #[error("gate not found: {0}")]
    GateNotFound(GateId),

    #[error("gate {gate} has no {side} connector at index {index}")]
    PinNotFound { gate: GateId, side: Side, index: usize },

    #[error("gate {gate} has no {side} connector named '{name}'")]
    NamedPinNotFound { gate: GateId, side: Side, name: String },

    #[error("unknown gate type: '{0}'")]
    UnknownGateType(String),

    #[error("in connection '{connection}': expected '<gate>[:<port>] to <gate>[:<port>]'")]
    MalformedConnection { connection: String },

    #[error("in connection '{connection}': gate '{gate}' is not defined")]
    UndeclaredGate { connection: String, gate: String },

    #[error("in connection '{connection}': gate '{gate}' does not have {side} '{port}'")]
    PortNotFound {
        connection: String,
        gate: String,
        side: Side,
        port: String,
    },

    /// Packing needs at least one Input or Output boundary gate
    #[error("cannot pack: the circuit has no input or output gates")]
    NoBoundaryGates,

    #[error("gate type '{0}' is already registered")]
    GateTypeExists(String),

    #[error("gate {0} is not a compound gate")]
    NotCompound(GateId),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl CircuitError {
    /// Whether this is a wiring failure (bad pairing, unknown reference, read-only write).
    pub fn is_wiring_error(&self) -> bool {
        matches!(
            self,
            CircuitError::IllegalConnection { .. }
                | CircuitError::EdgeAlreadyConnected(_)
                | CircuitError::ReadOnlyInput(_)
                | CircuitError::ReadOnlyCollection
                | CircuitError::WrongSide { .. }
                | CircuitError::EdgeNotFound(_)
                | CircuitError::GateNotFound(_)
                | CircuitError::PinNotFound { .. }
                | CircuitError::NamedPinNotFound { .. }
                | CircuitError::UnknownGateType(_)
                | CircuitError::MalformedConnection { .. }
                | CircuitError::UndeclaredGate { .. }
                | CircuitError::PortNotFound { .. }
        )
    }

    /// Whether a pack/unpack request was refused.
    pub fn is_packing_refusal(&self) -> bool {
        matches!(
            self,
            CircuitError::NoBoundaryGates
                | CircuitError::GateTypeExists(_)
                | CircuitError::NotCompound(_)
        )
    }
}

impl From<serde_json::Error> for CircuitError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
