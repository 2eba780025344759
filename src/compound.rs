//! # Compound Gates
//!
//! Packing collapses every top-level gate of a circuit into one compound
//! gate. The interior gates are moved, not copied: their connectors and the
//! edges between them stay on the wiring board untouched, so unpacking hands
//! back the exact same gates and edges.
//!
//! ## Evaluation
//!
//! Each tick a compound gate
//! 1. forces its input values onto the output pin of each interior Input gate,
//! 2. runs every interior gate once, in retained order,
//! 3. reads the input pin of each interior Output gate as its own outputs.
//!
//! Compound gates are ordinary gates, so packing nests.

use crate::circuit::Circuit;
use crate::config::SimulationConfig;
use crate::error::{CircuitError, Result};
use crate::gates::{BoundaryRole, EvalContext, Gate, GateId, GateKind, GateRegistry, GateSpec};
use crate::session::Counters;
use crate::wiring::{EdgeId, Wiring};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// The packed state of a compound gate.
#[derive(Debug)]
pub struct CompoundGate {
    interior: Vec<Gate>,
    input_boundary: Vec<usize>,
    output_boundary: Vec<usize>,
    template: Arc<CompoundTemplate>,
}

impl CompoundGate {
    /// Wrap `interior` into a new compound gate named after its type.
    ///
    /// Pin names mirror the boundary gates' names, in interior order.
    pub(crate) fn assemble(id: GateId, interior: Vec<Gate>, template: Arc<CompoundTemplate>) -> Gate {
        let boundary = |role: BoundaryRole| -> Vec<usize> {
            interior
                .iter()
                .enumerate()
                .filter(|(_, g)| g.boundary() == Some(role))
                .map(|(i, _)| i)
                .collect()
        };
        let input_boundary = boundary(BoundaryRole::Input);
        let output_boundary = boundary(BoundaryRole::Output);
        debug_assert!(
            !input_boundary.is_empty() || !output_boundary.is_empty(),
            "compound gate without boundary gates"
        );

        let input_names: Vec<String> = input_boundary.iter().map(|i| interior[*i].name().to_string()).collect();
        let output_names: Vec<String> = output_boundary.iter().map(|i| interior[*i].name().to_string()).collect();

        let spec = GateSpec::new(template.name(), None);
        let name = template.name().to_string();
        let compound = CompoundGate {
            interior,
            input_boundary,
            output_boundary,
            template,
        };
        Gate::new(id, spec, name, &input_names, &output_names, GateKind::Compound(Box::new(compound)))
    }

    /// Packed gates in evaluation order.
    pub fn interior(&self) -> &[Gate] {
        &self.interior
    }

    pub fn input_gates(&self) -> impl Iterator<Item = &Gate> {
        self.input_boundary.iter().map(|i| &self.interior[*i])
    }

    pub fn output_gates(&self) -> impl Iterator<Item = &Gate> {
        self.output_boundary.iter().map(|i| &self.interior[*i])
    }

    pub fn template(&self) -> &Arc<CompoundTemplate> {
        &self.template
    }

    pub(crate) fn into_interior(self) -> Vec<Gate> {
        self.interior
    }

    pub(crate) fn evaluate(
        &mut self,
        inputs: &[bool],
        outputs: &mut [bool],
        cx: &mut EvalContext<'_>,
    ) -> Result<()> {
        for (value, index) in inputs.iter().zip(&self.input_boundary) {
            self.interior[*index].outputs().force(cx.wiring, 0, *value)?;
        }
        for gate in &mut self.interior {
            gate.run(cx)?;
        }
        for (slot, index) in outputs.iter_mut().zip(&self.output_boundary) {
            *slot = self.interior[*index].inputs().read(cx.wiring, 0)?;
        }
        Ok(())
    }
}

/// A wire between two interior gates, by interior position and pin index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateWire {
    pub from: (usize, usize),
    pub to: (usize, usize),
}

/// Recipe for building fresh copies of a packed circuit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundTemplate {
    name: String,
    gates: Vec<GateSpec>,
    wires: Vec<TemplateWire>,
}

impl CompoundTemplate {
    /// Record the gate specs and interior connections of `gates`.
    pub(crate) fn capture(name: &str, gates: &[Gate], wiring: &Wiring) -> Self {
        let position: HashMap<GateId, usize> = gates.iter().enumerate().map(|(i, g)| (g.id(), i)).collect();

        let mut wires = Vec::new();
        for (from_gate, gate) in gates.iter().enumerate() {
            for pin in gate.outputs().pins() {
                for edge in wiring.edges_at(pin) {
                    let Some(end) = wiring.edge(*edge).and_then(|e| e.end()) else {
                        continue;
                    };
                    if let Some(to_gate) = position.get(&end.gate) {
                        wires.push(TemplateWire {
                            from: (from_gate, pin.index),
                            to: (*to_gate, end.index),
                        });
                    }
                }
            }
        }

        Self {
            name: name.to_string(),
            gates: gates.iter().map(|g| g.spec().clone()).collect(),
            wires,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn gates(&self) -> &[GateSpec] {
        &self.gates
    }

    pub fn wires(&self) -> &[TemplateWire] {
        &self.wires
    }

    /// Build a fresh, independently stateful compound gate of this type.
    pub(crate) fn instantiate(
        template: &Arc<Self>,
        registry: &GateRegistry,
        counters: &mut Counters,
        config: &SimulationConfig,
        wiring: &mut Wiring,
    ) -> Result<Gate> {
        let mut interior: Vec<Gate> = Vec::with_capacity(template.gates.len());
        let built = template.build_interior(&mut interior, registry, counters, config, wiring);
        if let Err(e) = built {
            for gate in &interior {
                gate.dispose_edges(wiring);
            }
            return Err(e);
        }

        let id = counters.next_gate_id();
        tracing::debug!("[PACK] Instantiated '{}' as {}", template.name, id);
        Ok(CompoundGate::assemble(id, interior, Arc::clone(template)))
    }

    fn build_interior(
        &self,
        interior: &mut Vec<Gate>,
        registry: &GateRegistry,
        counters: &mut Counters,
        config: &SimulationConfig,
        wiring: &mut Wiring,
    ) -> Result<()> {
        for spec in &self.gates {
            let gate = registry.build(&spec.type_name, spec.arg.as_deref(), counters, config, wiring)?;
            interior.push(gate);
        }
        for wire in &self.wires {
            let from = interior[wire.from.0].outputs().pin_at(wire.from.1)?;
            let to = interior[wire.to.0].inputs().pin_at(wire.to.1)?;
            let edge = wiring.new_edge(from)?;
            wiring.end_edge(edge, to)?;
        }
        Ok(())
    }
}

/// Every edge touching one of `gates`, each listed once.
fn edges_touching(gates: &[Gate], wiring: &Wiring) -> Vec<EdgeId> {
    let mut seen = HashSet::new();
    gates
        .iter()
        .flat_map(|g| g.pins().collect::<Vec<_>>())
        .flat_map(|pin| wiring.edges_at(pin).to_vec())
        .filter(|edge| seen.insert(*edge))
        .collect()
}

impl Circuit {
    /// Collapse every top-level gate into one compound gate of a new type
    ///
    /// The gates are detached, not destroyed, and keep their wiring. The new
    /// gate's input pins are named after the Input boundary gates and its
    /// output pins after the Output boundary gates, in list order. The type is
    /// registered so later `add_gate` calls build fresh copies.
    ///
    /// # Arguments
    ///
    /// * `type_name` - Name of the new gate type, and of the compound gate itself
    ///
    /// # Returns
    ///
    /// * `Ok(GateId)` - The compound gate, now the only top-level gate
    /// * `Err(CircuitError::NoBoundaryGates)` - No Input or Output gate; nothing changed
    /// * `Err(CircuitError::GateTypeExists)` - `type_name` is taken; nothing changed
    ///
    /// # Examples
    ///
    /// ```rust
    /// use latchwork::Circuit;
    ///
    /// let mut circuit = Circuit::new();
    /// let a = circuit.add_gate("Input", Some("a"))?;
    /// let not = circuit.add_gate("Not", None)?;
    /// let y = circuit.add_gate("Output", Some("y"))?;
    /// circuit.connect_ports(a, None, not, None)?;
    /// circuit.connect_ports(not, None, y, None)?;
    ///
    /// let inverter = circuit.pack("Inverter")?;
    /// let gate = circuit.gate(inverter).unwrap();
    /// assert_eq!(gate.inputs().names(), vec!["a"]);
    /// assert_eq!(gate.outputs().names(), vec!["y"]);
    /// assert!(circuit.registry().contains("Inverter"));
    /// # Ok::<(), latchwork::CircuitError>(())
    /// ```
    pub fn pack(&mut self, type_name: &str) -> Result<GateId> {
        if !self.gates.iter().any(|g| g.boundary().is_some()) {
            tracing::warn!("[PACK] Refused to pack '{}': no input or output gates", type_name);
            return Err(CircuitError::NoBoundaryGates);
        }
        if self.session.registry.contains(type_name) {
            tracing::warn!("[PACK] Refused to pack '{}': type already exists", type_name);
            return Err(CircuitError::GateTypeExists(type_name.to_string()));
        }

        let template = Arc::new(CompoundTemplate::capture(type_name, &self.gates, &self.wiring));
        self.session.registry.register_compound(Arc::clone(&template))?;

        let interior = std::mem::take(&mut self.gates);
        for edge in edges_touching(&interior, &self.wiring) {
            self.presenter.edge_detached(edge);
        }
        for gate in &interior {
            self.presenter.gate_detached(gate.id());
        }

        let id = self.session.counters.next_gate_id();
        let gate = CompoundGate::assemble(id, interior, template);
        tracing::info!(
            "[PACK] Packed {} gates into '{}' ({} inputs, {} outputs)",
            gate.as_compound().map(|c| c.interior().len()).unwrap_or(0),
            type_name,
            gate.inputs().len(),
            gate.outputs().len()
        );
        Ok(self.insert_gate(gate))
    }

    /// Restore the interior of a top-level compound gate in its place
    ///
    /// Interior gates come back with the same ids, and the edges between them
    /// with the same ids and values. Edges wired to the compound gate itself
    /// are disposed. The packed type stays registered.
    ///
    /// # Arguments
    ///
    /// * `id` - A top-level compound gate
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<GateId>)` - The restored gates, in their retained order
    /// * `Err(CircuitError::GateNotFound)` - `id` is not a top-level gate
    /// * `Err(CircuitError::NotCompound)` - `id` is an ordinary gate
    ///
    /// # Examples
    ///
    /// ```rust
    /// use latchwork::Circuit;
    ///
    /// let mut circuit = Circuit::new();
    /// let a = circuit.add_gate("Input", Some("a"))?;
    /// let y = circuit.add_gate("Output", Some("y"))?;
    /// circuit.connect_ports(a, None, y, None)?;
    ///
    /// let wire = circuit.pack("Wire")?;
    /// assert_eq!(circuit.unpack(wire)?, vec![a, y]);
    /// assert_eq!(circuit.gate_ids(), vec![a, y]);
    /// assert_eq!(circuit.wiring().len(), 1);
    /// # Ok::<(), latchwork::CircuitError>(())
    /// ```
    pub fn unpack(&mut self, id: GateId) -> Result<Vec<GateId>> {
        let index = self.position(id)?;
        if self.gates[index].as_compound().is_none() {
            return Err(CircuitError::NotCompound(id));
        }

        let gate = self.gates.remove(index);
        let (pins, compound) = match gate.into_compound() {
            Ok(parts) => parts,
            Err(gate) => {
                self.gates.insert(index, gate);
                return Err(CircuitError::NotCompound(id));
            }
        };
        for pin in pins {
            for edge in self.wiring.dispose_at(pin) {
                self.presenter.edge_disposed(edge);
            }
        }
        self.presenter.gate_disposed(id);

        let interior = compound.into_interior();
        let restored: Vec<GateId> = interior.iter().map(Gate::id).collect();
        for edge in edges_touching(&interior, &self.wiring) {
            self.presenter.redraw_edge(edge);
        }
        self.gates.splice(index..index, interior);
        for gate in &restored {
            self.presenter.redraw_gate(*gate);
        }

        tracing::info!("[PACK] Unpacked {} into {} gates", id, restored.len());
        Ok(restored)
    }
}
