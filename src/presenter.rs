//! # Presenter
//!
//! The boundary to whatever draws the circuit. The engine only ever asks for
//! a redraw or reports that something went away; geometry stays outside.
//!
//! Disposal is permanent. Detachment means the gate or edge still exists but
//! is now held inside a compound gate; it comes back through a redraw when
//! the compound is unpacked.

use crate::gates::GateId;
use crate::wiring::EdgeId;

pub trait Presenter {
    fn redraw_gate(&mut self, _gate: GateId) {}

    fn redraw_edge(&mut self, _edge: EdgeId) {}

    fn gate_disposed(&mut self, _gate: GateId) {}

    fn edge_disposed(&mut self, _edge: EdgeId) {}

    fn gate_detached(&mut self, _gate: GateId) {}

    fn edge_detached(&mut self, _edge: EdgeId) {}
}

/// Presenter that draws nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPresenter;

impl Presenter for NullPresenter {}
