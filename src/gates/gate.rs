//! # Gate
//!
//! A gate owns its two connector collections, a private state record and
//! the logic that runs once per tick.

use super::builtin::GateKind;
use crate::compound::CompoundGate;
use crate::error::Result;
use crate::presenter::Presenter;
use crate::wiring::{ConnectorCollection, EdgeId, PinRef, Side, Wiring};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Session-unique gate identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GateId(u64);

impl GateId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for GateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gate-{}", self.0)
    }
}

/// Marks a gate as an external input or output of a sub-circuit being packed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundaryRole {
    Input,
    Output,
}

/// How a gate was built: registry type name plus optional argument.
///
/// Compound templates store these to rebuild fresh copies of a packed circuit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateSpec {
    pub type_name: String,
    pub arg: Option<String>,
}

impl GateSpec {
    pub fn new(type_name: impl Into<String>, arg: Option<String>) -> Self {
        Self {
            type_name: type_name.into(),
            arg,
        }
    }
}

/// A user action delivered to a gate between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Flip a switch
    Toggle,
    /// Hold a button down
    Press,
    /// Let a button go
    Release,
}

/// Everything a gate's logic may touch during one evaluation.
pub struct EvalContext<'a> {
    pub(crate) wiring: &'a mut Wiring,
    pub(crate) presenter: &'a mut dyn Presenter,
    /// Wall-clock milliseconds, sampled once per tick.
    pub now_ms: u64,
}

impl<'a> EvalContext<'a> {
    pub fn new(wiring: &'a mut Wiring, presenter: &'a mut dyn Presenter, now_ms: u64) -> Self {
        Self {
            wiring,
            presenter,
            now_ms,
        }
    }
}

/// A gate on the board.
///
/// Gates are only built through the registry of the circuit that owns them,
/// which keeps ids unique and pin counts matched to the gate kind. Outside
/// code cannot assemble one by hand:
///
/// ```compile_fail
/// use latchwork::{Circuit, Session, Wiring};
///
/// let mut session = Session::default();
/// let mut wiring = Wiring::new();
/// let gate = session.build_gate("And", None, &mut wiring).unwrap();
/// Circuit::new().insert_gate(gate);
/// ```
#[derive(Debug)]
pub struct Gate {
    id: GateId,
    name: String,
    info: Option<String>,
    spec: GateSpec,
    inputs: ConnectorCollection,
    outputs: ConnectorCollection,
    boundary: Option<BoundaryRole>,
    kind: GateKind,
}

impl Gate {
    pub(crate) fn new<S: AsRef<str>>(
        id: GateId,
        spec: GateSpec,
        name: impl Into<String>,
        inputs: &[S],
        outputs: &[S],
        kind: GateKind,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            info: None,
            spec,
            inputs: ConnectorCollection::new(id, Side::Input, inputs),
            outputs: ConnectorCollection::new(id, Side::Output, outputs),
            boundary: None,
            kind,
        }
    }

    pub(crate) fn with_info(mut self, info: impl Into<String>) -> Self {
        self.info = Some(info.into());
        self
    }

    pub(crate) fn with_boundary(mut self, role: BoundaryRole) -> Self {
        self.boundary = Some(role);
        self
    }

    pub fn id(&self) -> GateId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Text of the gate's info pill (clock rate, probe marker, counter value).
    pub fn info(&self) -> Option<&str> {
        self.info.as_deref()
    }

    pub fn spec(&self) -> &GateSpec {
        &self.spec
    }

    pub fn inputs(&self) -> &ConnectorCollection {
        &self.inputs
    }

    pub fn outputs(&self) -> &ConnectorCollection {
        &self.outputs
    }

    pub fn boundary(&self) -> Option<BoundaryRole> {
        self.boundary
    }

    pub fn kind(&self) -> &GateKind {
        &self.kind
    }

    pub fn as_compound(&self) -> Option<&CompoundGate> {
        match &self.kind {
            GateKind::Compound(compound) => Some(compound),
            _ => None,
        }
    }

    pub fn collection(&self, side: Side) -> &ConnectorCollection {
        match side {
            Side::Input => &self.inputs,
            Side::Output => &self.outputs,
        }
    }

    /// Every pin on both sides, inputs first.
    pub fn pins(&self) -> impl Iterator<Item = PinRef> + '_ {
        self.inputs.pins().chain(self.outputs.pins())
    }

    /// Evaluate the gate once.
    ///
    /// Outputs are snapshotted, not zeroed, so logic may leave them untouched.
    /// New output values reach every attached edge immediately, so gates later
    /// in the same tick see them.
    pub fn run(&mut self, cx: &mut EvalContext<'_>) -> Result<()> {
        let inputs = self.inputs.to_bool_vector(cx.wiring);
        let mut outputs = self.outputs.to_bool_vector(cx.wiring);

        let Gate { id, name, info, kind, .. } = self;
        kind.evaluate(*id, name, info, &inputs, &mut outputs, cx)?;

        self.outputs.from_bool_vector(cx.wiring, &outputs)
    }

    /// Apply a user trigger. Returns false if this gate does not react to it.
    pub fn trigger(&mut self, trigger: Trigger) -> bool {
        self.kind.trigger(trigger)
    }

    /// Destroy every edge attached to this gate, recursing into packed interiors.
    pub(crate) fn dispose_edges(&self, wiring: &mut Wiring) -> Vec<EdgeId> {
        let mut disposed: Vec<EdgeId> = self.pins().flat_map(|pin| wiring.dispose_at(pin)).collect();
        if let GateKind::Compound(compound) = &self.kind {
            for gate in compound.interior() {
                disposed.extend(gate.dispose_edges(wiring));
            }
        }
        disposed
    }

    /// Split a compound gate into its own pins and its packed state.
    pub(crate) fn into_compound(self) -> std::result::Result<(Vec<PinRef>, Box<CompoundGate>), Gate> {
        match self.kind {
            GateKind::Compound(compound) => {
                let pins = self.inputs.pins().chain(self.outputs.pins()).collect();
                Ok((pins, compound))
            }
            kind => Err(Gate { kind, ..self }),
        }
    }
}
