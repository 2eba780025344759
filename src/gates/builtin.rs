//! # Built-in Gates
//!
//! The per-gate state record and the logic of every built-in gate kind.
//!
//! Each kind is a function of its inputs plus its own private state. Clock
//! and probe gates read wall-clock time from the evaluation context, never
//! the tick count.

use super::gate::{BoundaryRole, EvalContext, Gate, GateId, GateSpec, Trigger};
use crate::compound::CompoundGate;
use crate::config::SimulationConfig;
use crate::error::Result;
use crate::session::Counters;

const NO_PINS: &[&str] = &[];

/// State record of a gate, tagged by kind.
#[derive(Debug)]
pub enum GateKind {
    Label,
    And,
    Or,
    Not,
    Xor,
    True,
    Switch { on: bool },
    Button { pressed: bool },
    Clock { period_ms: u64 },
    Probe(ProbeState),
    Lamp { lit: bool },
    Counter { high: bool, count: u64 },
    Input,
    Output,
    Compound(Box<CompoundGate>),
}

/// A finished high or low run measured by a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeInterval {
    pub level: bool,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Default)]
pub struct ProbeState {
    pub marker: String,
    high_since: Option<u64>,
    low_since: Option<u64>,
    last_interval: Option<ProbeInterval>,
}

impl ProbeState {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            ..Self::default()
        }
    }

    pub fn last_interval(&self) -> Option<ProbeInterval> {
        self.last_interval
    }

    fn observe(&mut self, name: &str, level: bool, now_ms: u64) {
        if level && self.high_since.is_none() {
            self.high_since = Some(now_ms);
        } else if !level {
            if let Some(since) = self.high_since.take() {
                self.finish(name, true, now_ms.saturating_sub(since));
            }
        }

        if !level && self.low_since.is_none() {
            self.low_since = Some(now_ms);
        } else if level {
            if let Some(since) = self.low_since.take() {
                self.finish(name, false, now_ms.saturating_sub(since));
            }
        }
    }

    fn finish(&mut self, name: &str, level: bool, duration_ms: u64) {
        tracing::info!(
            gate = name,
            marker = %self.marker,
            level,
            duration_ms,
            "[PROBE] {} {} {} for {}ms",
            name,
            self.marker,
            if level { "on" } else { "off" },
            duration_ms
        );
        self.last_interval = Some(ProbeInterval { level, duration_ms });
    }
}

impl GateKind {
    pub(crate) fn evaluate(
        &mut self,
        id: GateId,
        name: &str,
        info: &mut Option<String>,
        inputs: &[bool],
        outputs: &mut [bool],
        cx: &mut EvalContext<'_>,
    ) -> Result<()> {
        match self {
            // Boundary and label gates are addressable only
            GateKind::Label | GateKind::Input | GateKind::Output => {}
            GateKind::And => outputs[0] = inputs[0] && inputs[1],
            GateKind::Or => outputs[0] = inputs[0] || inputs[1],
            GateKind::Not => outputs[0] = !inputs[0],
            GateKind::Xor => outputs[0] = inputs[0] != inputs[1],
            GateKind::True => outputs[0] = true,
            GateKind::Switch { on } => outputs[0] = *on,
            GateKind::Button { pressed } => outputs[0] = *pressed,
            GateKind::Clock { period_ms } => {
                outputs[0] = cx.now_ms % *period_ms < *period_ms / 2;
            }
            GateKind::Probe(probe) => {
                probe.observe(name, inputs[0], cx.now_ms);
                outputs[0] = inputs[0];
            }
            GateKind::Lamp { lit } => {
                if inputs[0] != *lit {
                    *lit = inputs[0];
                    cx.presenter.redraw_gate(id);
                }
            }
            GateKind::Counter { high, count } => {
                if inputs[0] != *high {
                    *high = inputs[0];
                    if *high {
                        *count += 1;
                        *info = Some(count.to_string());
                        cx.presenter.redraw_gate(id);
                    }
                }
            }
            GateKind::Compound(compound) => compound.evaluate(inputs, outputs, cx)?,
        }
        Ok(())
    }

    pub(crate) fn trigger(&mut self, trigger: Trigger) -> bool {
        match (self, trigger) {
            (GateKind::Switch { on }, Trigger::Toggle) => {
                *on = !*on;
                true
            }
            (GateKind::Button { pressed }, Trigger::Press) => {
                *pressed = true;
                true
            }
            (GateKind::Button { pressed }, Trigger::Release) => {
                *pressed = false;
                true
            }
            _ => false,
        }
    }

    pub fn is_lit(&self) -> Option<bool> {
        match self {
            GateKind::Lamp { lit } => Some(*lit),
            _ => None,
        }
    }

    pub fn count(&self) -> Option<u64> {
        match self {
            GateKind::Counter { count, .. } => Some(*count),
            _ => None,
        }
    }

    pub fn switch_state(&self) -> Option<bool> {
        match self {
            GateKind::Switch { on } => Some(*on),
            GateKind::Button { pressed } => Some(*pressed),
            _ => None,
        }
    }

    pub fn probe(&self) -> Option<&ProbeState> {
        match self {
            GateKind::Probe(probe) => Some(probe),
            _ => None,
        }
    }
}

/// The built-in entries of the gate registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Label,
    And,
    Or,
    Not,
    Xor,
    Switch,
    Button,
    True,
    Clock1Hz,
    Clock2Hz,
    Clock5Hz,
    Probe,
    Lamp,
    Counter,
    Input,
    Output,
}

impl Builtin {
    pub const ALL: [Builtin; 16] = [
        Builtin::Label,
        Builtin::And,
        Builtin::Or,
        Builtin::Not,
        Builtin::Xor,
        Builtin::Switch,
        Builtin::Button,
        Builtin::True,
        Builtin::Clock1Hz,
        Builtin::Clock2Hz,
        Builtin::Clock5Hz,
        Builtin::Probe,
        Builtin::Lamp,
        Builtin::Counter,
        Builtin::Input,
        Builtin::Output,
    ];

    /// Registry name.
    pub fn type_name(self) -> &'static str {
        match self {
            Builtin::Label => "Label",
            Builtin::And => "And",
            Builtin::Or => "Or",
            Builtin::Not => "Not",
            Builtin::Xor => "Xor",
            Builtin::Switch => "Switch",
            Builtin::Button => "Button",
            Builtin::True => "True",
            Builtin::Clock1Hz => "1Hz Clock",
            Builtin::Clock2Hz => "2Hz Clock",
            Builtin::Clock5Hz => "5Hz Clock",
            Builtin::Probe => "Probe",
            Builtin::Lamp => "Lamp",
            Builtin::Counter => "Counter",
            Builtin::Input => "Input",
            Builtin::Output => "Output",
        }
    }

    pub(crate) fn build(
        self,
        arg: Option<&str>,
        counters: &mut Counters,
        config: &SimulationConfig,
    ) -> Gate {
        let id = counters.next_gate_id();
        let spec = GateSpec::new(self.type_name(), arg.map(str::to_string));
        let source = |name: &str, kind: GateKind| Gate::new(id, spec.clone(), name, NO_PINS, &["A"], kind);
        let binary = |name: &str, kind: GateKind| Gate::new(id, spec.clone(), name, &["A", "B"], &["C"], kind);

        match self {
            Builtin::Label => Gate::new(id, spec.clone(), arg.unwrap_or("Label"), NO_PINS, NO_PINS, GateKind::Label),
            Builtin::And => binary("AND", GateKind::And),
            Builtin::Or => binary("OR", GateKind::Or),
            Builtin::Xor => binary("XOR", GateKind::Xor),
            Builtin::Not => Gate::new(id, spec.clone(), "NOT", &["A"], &["B"], GateKind::Not),
            Builtin::Switch => source("Switch", GateKind::Switch { on: false }),
            Builtin::Button => source("Button", GateKind::Button { pressed: false }),
            Builtin::True => source("1", GateKind::True),
            Builtin::Clock1Hz => source("Clock", GateKind::Clock { period_ms: 1000 }).with_info("1Hz"),
            Builtin::Clock2Hz => source("Clock", GateKind::Clock { period_ms: 500 }).with_info("2Hz"),
            Builtin::Clock5Hz => source("Clock", GateKind::Clock { period_ms: 200 }).with_info("5Hz"),
            Builtin::Probe => {
                let marker = counters.next_probe_marker(config);
                Gate::new(id, spec.clone(), "Probe", &["A"], &["B"], GateKind::Probe(ProbeState::new(marker.clone())))
                    .with_info(marker)
            }
            Builtin::Lamp => Gate::new(id, spec.clone(), "Lamp", &["A"], NO_PINS, GateKind::Lamp { lit: false }),
            Builtin::Counter => {
                Gate::new(id, spec.clone(), "Counter", &["A"], NO_PINS, GateKind::Counter { high: false, count: 0 })
                    .with_info("0")
            }
            // The spec records the resolved label, so rebuilt copies get the same pin name
            Builtin::Input => {
                let label = arg.map(str::to_string).unwrap_or_else(|| counters.next_input_name(config));
                let spec = GateSpec::new(self.type_name(), Some(label.clone()));
                Gate::new(id, spec, label.clone(), NO_PINS, &[label.as_str()], GateKind::Input)
                    .with_info("In")
                    .with_boundary(BoundaryRole::Input)
            }
            Builtin::Output => {
                let label = arg.map(str::to_string).unwrap_or_else(|| counters.next_output_name(config));
                let spec = GateSpec::new(self.type_name(), Some(label.clone()));
                Gate::new(id, spec, label.clone(), &[label.as_str()], NO_PINS, GateKind::Output)
                    .with_info("Out")
                    .with_boundary(BoundaryRole::Output)
            }
        }
    }
}
