//! # Circuit
//!
//! The ordered list of top-level gates, the wiring board they share, and the
//! session that builds new gates.
//!
//! ## Evaluation order
//!
//! One [`Circuit::tick`] runs every top-level gate exactly once, in list order.
//! Outputs written by a gate are visible to every gate after it in the same
//! tick; gates before it see them on the next tick. No topological sort is
//! attempted, so feedback loops such as latches settle over a few ticks
//! instead of recursing.

use crate::config::SimulationConfig;
use crate::error::{CircuitError, Result};
use crate::gates::{BoundaryRole, EvalContext, Gate, GateId, GateRegistry, Trigger};
use crate::presenter::{NullPresenter, Presenter};
use crate::session::Session;
use crate::time::{SystemClock, TimeSource};
use crate::wiring::{Edge, EdgeId, PinRef, Side, Wiring};

pub struct Circuit {
    pub(crate) gates: Vec<Gate>,
    pub(crate) wiring: Wiring,
    pub(crate) session: Session,
    pub(crate) presenter: Box<dyn Presenter>,
    time: Box<dyn TimeSource>,
    ticks: u64,
}

impl Default for Circuit {
    fn default() -> Self {
        Self::new()
    }
}

impl Circuit {
    pub fn new() -> Self {
        Self::with_session(Session::default())
    }

    pub fn with_config(config: SimulationConfig) -> Self {
        Self::with_session(Session::new(config))
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            gates: Vec::new(),
            wiring: Wiring::new(),
            session,
            presenter: Box::new(NullPresenter),
            time: Box::new(SystemClock),
            ticks: 0,
        }
    }

    pub fn with_time_source(mut self, time: impl TimeSource + 'static) -> Self {
        self.time = Box::new(time);
        self
    }

    pub fn with_presenter(mut self, presenter: impl Presenter + 'static) -> Self {
        self.presenter = Box::new(presenter);
        self
    }

    // ── Queries ──────────────────────────────────────

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn registry(&self) -> &GateRegistry {
        &self.session.registry
    }

    /// Top-level gates in evaluation order.
    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    pub fn gate_ids(&self) -> Vec<GateId> {
        self.gates.iter().map(Gate::id).collect()
    }

    pub fn gate(&self, id: GateId) -> Option<&Gate> {
        self.gates.iter().find(|g| g.id() == id)
    }

    pub fn wiring(&self) -> &Wiring {
        &self.wiring
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.wiring.edge(id)
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.wiring.iter()
    }

    /// Number of completed ticks.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn input_state(&self, gate: GateId, index: usize) -> Result<bool> {
        let pin = self.pin(gate, Side::Input, index)?;
        self.wiring.read_input_state(pin)
    }

    pub fn output_state(&self, gate: GateId, index: usize) -> Result<bool> {
        let pin = self.pin(gate, Side::Output, index)?;
        Ok(self.wiring.state(pin))
    }

    /// Resolve a pin on a top-level gate.
    pub fn pin(&self, gate: GateId, side: Side, index: usize) -> Result<PinRef> {
        self.require(gate)?.collection(side).pin_at(index)
    }

    /// Resolve a pin by name, or the first pin on that side when `name` is `None`.
    pub fn named_pin(&self, gate: GateId, side: Side, name: Option<&str>) -> Result<PinRef> {
        let collection = self.require(gate)?.collection(side);
        match name {
            Some(name) => collection
                .find(name)
                .map(|c| c.pin())
                .ok_or_else(|| CircuitError::NamedPinNotFound {
                    gate,
                    side,
                    name: name.to_string(),
                }),
            None => collection.pin_at(0),
        }
    }

    pub(crate) fn position(&self, id: GateId) -> Result<usize> {
        self.gates
            .iter()
            .position(|g| g.id() == id)
            .ok_or(CircuitError::GateNotFound(id))
    }

    fn require(&self, id: GateId) -> Result<&Gate> {
        self.gate(id).ok_or(CircuitError::GateNotFound(id))
    }

    // ── Gates ──────────────────────────────────────

    /// Build a gate from the registry and append it to the top level.
    pub fn add_gate(&mut self, type_name: &str, arg: Option<&str>) -> Result<GateId> {
        let gate = self.session.build_gate(type_name, arg, &mut self.wiring)?;
        tracing::debug!("[CIRCUIT] Added '{}' as {}", type_name, gate.id());
        Ok(self.insert_gate(gate))
    }

    /// Append an already built gate to the top level.
    pub(crate) fn insert_gate(&mut self, gate: Gate) -> GateId {
        let id = gate.id();
        self.gates.push(gate);
        self.presenter.redraw_gate(id);
        id
    }

    /// Permanently destroy a top-level gate and every edge attached to it.
    pub fn remove_gate(&mut self, id: GateId) -> Result<()> {
        let index = self.position(id)?;
        let gate = self.gates.remove(index);
        self.destroy(gate);
        tracing::debug!("[CIRCUIT] Removed {}", id);
        Ok(())
    }

    /// Destroy every gate.
    pub fn clear(&mut self) {
        let gates = std::mem::take(&mut self.gates);
        tracing::info!("[CIRCUIT] Clearing {} gates", gates.len());
        for gate in gates {
            self.destroy(gate);
        }
    }

    pub(crate) fn destroy(&mut self, gate: Gate) {
        for edge in gate.dispose_edges(&mut self.wiring) {
            self.presenter.edge_disposed(edge);
        }
        notify_disposed(&gate, self.presenter.as_mut());
    }

    /// Deliver a user trigger to a top-level switch or button.
    pub fn trigger(&mut self, id: GateId, trigger: Trigger) -> Result<bool> {
        let index = self.position(id)?;
        let applied = self.gates[index].trigger(trigger);
        if applied {
            self.presenter.redraw_gate(id);
        } else {
            tracing::warn!("[CIRCUIT] {} ignores {:?}", id, trigger);
        }
        Ok(applied)
    }

    /// Drive a top-level input boundary gate from outside.
    pub fn drive_input(&mut self, id: GateId, value: bool) -> Result<()> {
        let gate = self.require(id)?;
        if gate.boundary() != Some(BoundaryRole::Input) {
            return Err(CircuitError::WrongSide {
                pin: PinRef::output(id, 0),
                expected: Side::Input,
            });
        }
        let pin = gate.outputs().pin_at(0)?;
        self.wiring.force(pin, value);
        Ok(())
    }

    /// Read the value arriving at a top-level output boundary gate.
    pub fn read_output(&self, id: GateId) -> Result<bool> {
        let gate = self.require(id)?;
        if gate.boundary() != Some(BoundaryRole::Output) {
            return Err(CircuitError::WrongSide {
                pin: PinRef::input(id, 0),
                expected: Side::Output,
            });
        }
        gate.inputs().read(&self.wiring, 0)
    }

    // ── Edges ──────────────────────────────────────

    /// Wire an output pin to an input pin. Both are validated before the edge exists.
    pub fn connect(&mut self, from: PinRef, to: PinRef) -> Result<EdgeId> {
        if from.side != Side::Output || to.side != Side::Input {
            return Err(CircuitError::IllegalConnection {
                from: from.side,
                to: to.side,
            });
        }
        self.pin(from.gate, from.side, from.index)?;
        self.pin(to.gate, to.side, to.index)?;

        let edge = self.wiring.new_edge(from)?;
        self.wiring.end_edge(edge, to)?;
        self.presenter.redraw_edge(edge);
        Ok(edge)
    }

    /// Wire two gates by port name, defaulting to the first output and first input.
    pub fn connect_ports(
        &mut self,
        from: GateId,
        from_port: Option<&str>,
        to: GateId,
        to_port: Option<&str>,
    ) -> Result<EdgeId> {
        let from = self.named_pin(from, Side::Output, from_port)?;
        let to = self.named_pin(to, Side::Input, to_port)?;
        self.connect(from, to)
    }

    /// Start drawing an edge from an output pin.
    pub fn begin_edge(&mut self, from: PinRef) -> Result<EdgeId> {
        self.pin(from.gate, from.side, from.index)?;
        let edge = self.wiring.new_edge(from)?;
        self.presenter.redraw_edge(edge);
        Ok(edge)
    }

    /// Finish drawing an edge. A failed finish disposes the pending edge.
    pub fn finish_edge(&mut self, edge: EdgeId, to: PinRef) -> Result<()> {
        let result = self
            .pin(to.gate, to.side, to.index)
            .and_then(|_| self.wiring.end_edge(edge, to));
        match result {
            Ok(()) => {
                self.presenter.redraw_edge(edge);
                Ok(())
            }
            Err(e) => {
                if self.wiring.edge(edge).is_some_and(Edge::is_pending) {
                    self.delete_edge(edge);
                }
                tracing::warn!("[CIRCUIT] Edge {:?} rejected: {}", edge, e);
                Err(e)
            }
        }
    }

    /// Delete an edge. Idempotent.
    pub fn delete_edge(&mut self, edge: EdgeId) -> bool {
        let removed = self.wiring.dispose(edge).is_some();
        if removed {
            self.presenter.edge_disposed(edge);
        }
        removed
    }

    // ── Simulation ──────────────────────────────────────

    /// Advance the simulation by one step
    ///
    /// Samples the time source once, then runs every top-level gate exactly
    /// once in list order. A gate sees outputs written earlier in the same
    /// tick; outputs of gates after it arrive on the next tick.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Every gate ran and the tick counter advanced
    /// * `Err(CircuitError)` - A gate failed to evaluate; later gates did not run
    ///
    /// # Examples
    ///
    /// ```rust
    /// use latchwork::Circuit;
    ///
    /// let mut circuit = Circuit::new();
    /// let lamp = circuit.add_gate("Lamp", None)?;
    /// let one = circuit.add_gate("True", None)?;
    /// circuit.connect_ports(one, None, lamp, None)?;
    ///
    /// // The lamp runs before its source, so it lights one tick late
    /// circuit.tick()?;
    /// assert_eq!(circuit.gate(lamp).and_then(|g| g.kind().is_lit()), Some(false));
    /// circuit.tick()?;
    /// assert_eq!(circuit.gate(lamp).and_then(|g| g.kind().is_lit()), Some(true));
    /// # Ok::<(), latchwork::CircuitError>(())
    /// ```
    pub fn tick(&mut self) -> Result<()> {
        let now_ms = self.time.now_ms();
        let mut cx = EvalContext::new(&mut self.wiring, self.presenter.as_mut(), now_ms);
        for gate in &mut self.gates {
            gate.run(&mut cx)?;
        }
        self.ticks += 1;
        Ok(())
    }

    /// Ask the presenter to redraw every gate and edge.
    pub fn redraw(&mut self) {
        for gate in &self.gates {
            self.presenter.redraw_gate(gate.id());
        }
        for (edge, _) in self.wiring.iter() {
            self.presenter.redraw_edge(edge);
        }
    }
}

fn notify_disposed(gate: &Gate, presenter: &mut dyn Presenter) {
    if let Some(compound) = gate.as_compound() {
        for inner in compound.interior() {
            notify_disposed(inner, presenter);
        }
    }
    presenter.gate_disposed(gate.id());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_gates_see_outputs_in_the_same_tick() {
        let mut circuit = Circuit::new();
        let one = circuit.add_gate("True", None).unwrap();
        let not = circuit.add_gate("Not", None).unwrap();
        circuit.connect_ports(one, None, not, None).unwrap();
        let lamp = circuit.add_gate("Lamp", None).unwrap();
        circuit.connect_ports(not, None, lamp, None).unwrap();

        circuit.tick().unwrap();
        assert!(circuit.input_state(not, 0).unwrap());
        assert!(!circuit.input_state(lamp, 0).unwrap());
    }

    #[test]
    fn earlier_gates_see_outputs_next_tick() {
        let mut circuit = Circuit::new();
        let lamp = circuit.add_gate("Lamp", None).unwrap();
        let one = circuit.add_gate("True", None).unwrap();
        circuit.connect_ports(one, None, lamp, None).unwrap();

        circuit.tick().unwrap();
        assert_eq!(circuit.gate(lamp).unwrap().kind().is_lit(), Some(false));
        circuit.tick().unwrap();
        assert_eq!(circuit.gate(lamp).unwrap().kind().is_lit(), Some(true));
    }

    #[test]
    fn boolean_gates_on_forced_sources() {
        let cases: [(&str, fn(bool, bool) -> bool); 3] = [
            ("And", |a: bool, b: bool| a && b),
            ("Or", |a: bool, b: bool| a || b),
            ("Xor", |a: bool, b: bool| a != b),
        ];
        for (kind, f) in cases {
            for a in [false, true] {
                for b in [false, true] {
                    let mut circuit = Circuit::new();
                    let ia = circuit.add_gate("Input", Some("a")).unwrap();
                    let ib = circuit.add_gate("Input", Some("b")).unwrap();
                    let gate = circuit.add_gate(kind, None).unwrap();
                    let out = circuit.add_gate("Output", Some("y")).unwrap();
                    circuit.connect_ports(ia, None, gate, Some("A")).unwrap();
                    circuit.connect_ports(ib, None, gate, Some("B")).unwrap();
                    circuit.connect_ports(gate, None, out, None).unwrap();

                    circuit.drive_input(ia, a).unwrap();
                    circuit.drive_input(ib, b).unwrap();
                    circuit.tick().unwrap();
                    assert_eq!(circuit.read_output(out).unwrap(), f(a, b), "{kind}({a}, {b})");
                }
            }
        }
    }

    #[test]
    fn illegal_pairings_create_no_edge() {
        let mut circuit = Circuit::new();
        let a = circuit.add_gate("And", None).unwrap();
        let b = circuit.add_gate("And", None).unwrap();

        let err = circuit
            .connect(PinRef::output(a, 0), PinRef::output(b, 0))
            .unwrap_err();
        assert!(matches!(err, CircuitError::IllegalConnection { .. }));
        let err = circuit
            .connect(PinRef::input(a, 0), PinRef::input(b, 0))
            .unwrap_err();
        assert!(err.is_wiring_error());
        assert!(circuit.connect(PinRef::output(a, 0), PinRef::input(b, 5)).is_err());
        assert!(circuit.wiring().is_empty());
    }

    #[test]
    fn failed_finish_disposes_the_pending_edge() {
        let mut circuit = Circuit::new();
        let a = circuit.add_gate("Switch", None).unwrap();
        let b = circuit.add_gate("Switch", None).unwrap();
        let edge = circuit.begin_edge(PinRef::output(a, 0)).unwrap();
        assert!(circuit.edge(edge).unwrap().is_pending());

        assert!(circuit.finish_edge(edge, PinRef::output(b, 0)).is_err());
        assert!(circuit.edge(edge).is_none());
        assert!(circuit.wiring().edges_at(PinRef::output(a, 0)).is_empty());
    }

    #[test]
    fn pending_edges_are_skipped_during_ticks() {
        let mut circuit = Circuit::new();
        let one = circuit.add_gate("True", None).unwrap();
        let lamp = circuit.add_gate("Lamp", None).unwrap();
        circuit.begin_edge(PinRef::output(one, 0)).unwrap();
        circuit.tick().unwrap();
        assert!(circuit.output_state(one, 0).unwrap());
        assert!(!circuit.input_state(lamp, 0).unwrap());
    }

    #[test]
    fn removing_a_gate_disposes_edges_on_both_ends() {
        let mut circuit = Circuit::new();
        let s = circuit.add_gate("Switch", None).unwrap();
        let n = circuit.add_gate("Not", None).unwrap();
        let l = circuit.add_gate("Lamp", None).unwrap();
        circuit.connect_ports(s, None, n, None).unwrap();
        circuit.connect_ports(n, None, l, None).unwrap();

        circuit.remove_gate(n).unwrap();
        assert!(circuit.wiring().is_empty());
        assert!(circuit.wiring().edges_at(PinRef::output(s, 0)).is_empty());
        assert!(matches!(circuit.remove_gate(n), Err(CircuitError::GateNotFound(_))));
        assert_eq!(circuit.gate_ids(), vec![s, l]);
    }

    #[test]
    fn unknown_port_name_is_reported_by_name() {
        let mut circuit = Circuit::new();
        let s = circuit.add_gate("Switch", None).unwrap();
        let l = circuit.add_gate("Lamp", None).unwrap();
        let err = circuit.connect_ports(s, None, l, Some("Q")).unwrap_err();
        assert!(matches!(
            err,
            CircuitError::NamedPinNotFound { gate, side: Side::Input, ref name } if gate == l && name == "Q"
        ));
        assert!(err.is_wiring_error());
        assert!(err.to_string().contains("'Q'"));
        assert!(circuit.wiring().is_empty());
    }

    #[test]
    fn delete_edge_is_idempotent() {
        let mut circuit = Circuit::new();
        let s = circuit.add_gate("Switch", None).unwrap();
        let l = circuit.add_gate("Lamp", None).unwrap();
        let edge = circuit.connect_ports(s, None, l, None).unwrap();
        assert!(circuit.delete_edge(edge));
        assert!(!circuit.delete_edge(edge));
    }

    #[test]
    fn clear_removes_everything() {
        let mut circuit = Circuit::new();
        let s = circuit.add_gate("Switch", None).unwrap();
        let l = circuit.add_gate("Lamp", None).unwrap();
        circuit.connect_ports(s, None, l, None).unwrap();
        circuit.clear();
        assert!(circuit.gates().is_empty());
        assert!(circuit.wiring().is_empty());
    }

    #[test]
    fn triggers_reach_switches_only() {
        let mut circuit = Circuit::new();
        let s = circuit.add_gate("Switch", None).unwrap();
        let a = circuit.add_gate("And", None).unwrap();
        assert!(circuit.trigger(s, Trigger::Toggle).unwrap());
        assert!(!circuit.trigger(a, Trigger::Toggle).unwrap());
    }
}
