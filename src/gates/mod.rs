//! # Gates
//!
//! Gate structure, built-in gate logic and the builder registry.

mod builtin;
mod gate;
mod registry;

pub use builtin::{Builtin, GateKind, ProbeInterval, ProbeState};
pub use gate::{BoundaryRole, EvalContext, Gate, GateId, GateSpec, Trigger};
pub use registry::{GateBuilder, GateRegistry};
