//! # Edges and the Wiring Board
//!
//! Every edge lives in one arena. Connectors refer to edges by `EdgeId`; a
//! disposed edge's id simply stops resolving, so ids behave like weak
//! references. The board also keeps the per-pin attachment lists, which lets
//! an edge be detached from both of its ends without touching the gates.

use super::connector::{PinRef, Side};
use crate::error::{CircuitError, Result};
use slotmap::{new_key_type, SlotMap};
use std::collections::HashMap;

new_key_type! {
    /// Unique identifier for a wire
    pub struct EdgeId;
}

/// A directed wire from one output pin to at most one input pin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    start: PinRef,
    end: Option<PinRef>,
    value: bool,
}

impl Edge {
    fn new(start: PinRef) -> Self {
        debug_assert_eq!(start.side, Side::Output, "edge must start at an output pin");
        Self {
            start,
            end: None,
            value: false,
        }
    }

    pub fn start(&self) -> PinRef {
        self.start
    }

    pub fn end(&self) -> Option<PinRef> {
        self.end
    }

    /// Current signal carried by the wire.
    pub fn value(&self) -> bool {
        self.value
    }

    /// An edge without an end is still being drawn and carries nothing downstream.
    pub fn is_pending(&self) -> bool {
        self.end.is_none()
    }
}

/// Owner of every edge in a circuit, including edges between packed gates.
#[derive(Debug, Default)]
pub struct Wiring {
    edges: SlotMap<EdgeId, Edge>,
    attached: HashMap<PinRef, Vec<EdgeId>>,
}

impl Wiring {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.edges.iter()
    }

    /// Edges attached to a pin, in attachment order.
    pub fn edges_at(&self, pin: PinRef) -> &[EdgeId] {
        self.attached.get(&pin).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Start a new edge at an output pin. The edge has no end yet.
    pub fn new_edge(&mut self, from: PinRef) -> Result<EdgeId> {
        if from.side != Side::Output {
            return Err(CircuitError::IllegalConnection {
                from: from.side,
                to: Side::Input,
            });
        }
        let id = self.edges.insert(Edge::new(from));
        self.attached.entry(from).or_default().push(id);
        tracing::debug!("[WIRING] Edge {:?} started at {}", id, from);
        Ok(id)
    }

    /// Attach the free end of a pending edge to an input pin.
    pub fn end_edge(&mut self, id: EdgeId, to: PinRef) -> Result<()> {
        let edge = self.edges.get_mut(id).ok_or(CircuitError::EdgeNotFound(id))?;
        if to.side != Side::Input {
            return Err(CircuitError::IllegalConnection {
                from: Side::Output,
                to: to.side,
            });
        }
        if edge.end.is_some() {
            return Err(CircuitError::EdgeAlreadyConnected(id));
        }
        edge.end = Some(to);
        self.attached.entry(to).or_default().push(id);
        tracing::debug!("[WIRING] Edge {:?} connected {} -> {}", id, edge.start, to);
        Ok(())
    }

    /// Remove an edge from a pin's attachment list. No-op if it is not there.
    pub fn remove_edge(&mut self, pin: PinRef, id: EdgeId) {
        if let Some(list) = self.attached.get_mut(&pin) {
            list.retain(|e| *e != id);
            if list.is_empty() {
                self.attached.remove(&pin);
            }
        }
    }

    /// Broadcast a value onto every edge leaving an output pin.
    pub fn set_output_state(&mut self, pin: PinRef, value: bool) -> Result<()> {
        if pin.side == Side::Input {
            return Err(CircuitError::ReadOnlyInput(pin));
        }
        if let Some(list) = self.attached.get(&pin) {
            for id in list {
                if let Some(edge) = self.edges.get_mut(*id) {
                    if edge.start == pin {
                        edge.value = value;
                    }
                }
            }
        }
        Ok(())
    }

    /// OR over every edge ending at an input pin.
    pub fn read_input_state(&self, pin: PinRef) -> Result<bool> {
        if pin.side != Side::Input {
            return Err(CircuitError::WrongSide {
                pin,
                expected: Side::Input,
            });
        }
        Ok(self.edges_at(pin).iter().any(|id| {
            self.edges
                .get(*id)
                .map(|e| e.end == Some(pin) && e.value)
                .unwrap_or(false)
        }))
    }

    /// Side-agnostic state of a pin: OR over every attached edge.
    pub fn state(&self, pin: PinRef) -> bool {
        self.edges_at(pin).iter().any(|id| {
            self.edges
                .get(*id)
                .map(|e| e.value && (e.start == pin || e.end == Some(pin)))
                .unwrap_or(false)
        })
    }

    /// Set every edge attached to a pin, whatever its side.
    pub fn force(&mut self, pin: PinRef, value: bool) {
        if let Some(list) = self.attached.get(&pin) {
            for id in list {
                if let Some(edge) = self.edges.get_mut(*id) {
                    edge.value = value;
                }
            }
        }
    }

    /// Destroy an edge and detach it from both ends. Idempotent.
    pub fn dispose(&mut self, id: EdgeId) -> Option<Edge> {
        let edge = self.edges.remove(id)?;
        self.remove_edge(edge.start, id);
        if let Some(end) = edge.end {
            self.remove_edge(end, id);
        }
        tracing::debug!("[WIRING] Edge {:?} disposed", id);
        Some(edge)
    }

    /// Destroy every edge attached to a pin. Returns the disposed ids.
    pub fn dispose_at(&mut self, pin: PinRef) -> Vec<EdgeId> {
        let ids = self.attached.remove(&pin).unwrap_or_default();
        ids.into_iter()
            .filter(|id| self.dispose(*id).is_some())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gates::GateId;

    fn pin(gate: u64, side: Side, index: usize) -> PinRef {
        PinRef {
            gate: GateId::new(gate),
            side,
            index,
        }
    }

    fn wire(w: &mut Wiring, from: PinRef, to: PinRef) -> EdgeId {
        let id = w.new_edge(from).unwrap();
        w.end_edge(id, to).unwrap();
        id
    }

    #[test]
    fn input_state_is_or_of_incoming_edges() {
        let a = pin(1, Side::Output, 0);
        let b = pin(2, Side::Output, 0);
        let input = pin(3, Side::Input, 0);

        for edges in 0..=2usize {
            for bits in 0..(1u8 << edges) {
                let mut w = Wiring::new();
                let sources = [a, b];
                for (i, src) in sources.iter().take(edges).enumerate() {
                    wire(&mut w, *src, input);
                    w.set_output_state(*src, bits & (1 << i) != 0).unwrap();
                }
                let expected = bits != 0;
                assert_eq!(w.read_input_state(input).unwrap(), expected, "{edges} edges, bits {bits:b}");
            }
        }
    }

    #[test]
    fn writing_to_input_fails_without_mutation() {
        let mut w = Wiring::new();
        let out = pin(1, Side::Output, 0);
        let input = pin(2, Side::Input, 0);
        let id = wire(&mut w, out, input);
        w.set_output_state(out, true).unwrap();

        let err = w.set_output_state(input, false).unwrap_err();
        assert!(matches!(err, CircuitError::ReadOnlyInput(p) if p == input));
        assert!(w.edge(id).unwrap().value());
    }

    #[test]
    fn only_output_to_input_is_legal() {
        let mut w = Wiring::new();
        assert!(w.new_edge(pin(1, Side::Input, 0)).is_err());

        let id = w.new_edge(pin(1, Side::Output, 0)).unwrap();
        let err = w.end_edge(id, pin(2, Side::Output, 0)).unwrap_err();
        assert!(matches!(err, CircuitError::IllegalConnection { .. }));
        assert!(w.edge(id).unwrap().is_pending());

        w.end_edge(id, pin(2, Side::Input, 0)).unwrap();
        let err = w.end_edge(id, pin(3, Side::Input, 0)).unwrap_err();
        assert!(matches!(err, CircuitError::EdgeAlreadyConnected(_)));
    }

    #[test]
    fn pending_edge_contributes_nothing() {
        let mut w = Wiring::new();
        let out = pin(1, Side::Output, 0);
        let input = pin(2, Side::Input, 0);
        let _pending = w.new_edge(out).unwrap();
        w.set_output_state(out, true).unwrap();
        assert!(!w.read_input_state(input).unwrap());
        assert!(w.state(out));
    }

    #[test]
    fn dispose_detaches_both_ends_and_is_idempotent() {
        let mut w = Wiring::new();
        let out = pin(1, Side::Output, 0);
        let input = pin(2, Side::Input, 0);
        let id = wire(&mut w, out, input);

        assert!(w.dispose(id).is_some());
        assert!(w.dispose(id).is_none());
        assert!(w.edges_at(out).is_empty());
        assert!(w.edges_at(input).is_empty());
        w.remove_edge(out, id);
        assert!(w.is_empty());
    }

    #[test]
    fn force_sets_edges_on_either_side() {
        let mut w = Wiring::new();
        let out = pin(1, Side::Output, 0);
        let input = pin(2, Side::Input, 0);
        let id = wire(&mut w, out, input);
        w.force(input, true);
        assert!(w.edge(id).unwrap().value());
        w.force(out, false);
        assert!(!w.read_input_state(input).unwrap());
    }
}
