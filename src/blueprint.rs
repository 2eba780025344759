//! # Blueprints
//!
//! Declarative circuit construction: a table of named gates plus a list of
//! textual connections of the form `"<gate>[:<port>] to <gate>[:<port>]"`.
//! A missing port means the first output on the left and the first input on
//! the right.
//!
//! Loading is all-or-nothing. Connections are parsed, gates are built outside
//! the circuit, and every connection is resolved before a single edge is
//! created or a single gate becomes live.

use crate::circuit::Circuit;
use crate::error::{CircuitError, Result};
use crate::gates::{Gate, GateId};
use crate::wiring::{PinRef, Side};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One entry of the declaration table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GateDecl {
    Type(String),
    WithArgs {
        #[serde(rename = "type")]
        type_name: String,
        #[serde(default)]
        args: Vec<String>,
    },
}

impl GateDecl {
    pub fn type_name(&self) -> &str {
        match self {
            GateDecl::Type(t) => t,
            GateDecl::WithArgs { type_name, .. } => type_name,
        }
    }

    pub fn arg(&self) -> Option<&str> {
        match self {
            GateDecl::Type(_) => None,
            GateDecl::WithArgs { args, .. } => args.first().map(String::as_str),
        }
    }
}

/// A declarative circuit description.
///
/// ```rust
/// use latchwork::{Blueprint, Circuit};
///
/// let blueprint = Blueprint::new()
///     .gate("one", "True")
///     .gate("not", "Not")
///     .gate("lamp", "Lamp")
///     .connect("one to not")
///     .connect("not:B to lamp:A");
///
/// let mut circuit = Circuit::new();
/// let gates = circuit.load_blueprint(&blueprint).unwrap();
/// assert_eq!(gates.len(), 3);
/// assert_eq!(circuit.wiring().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blueprint {
    pub declaration: IndexMap<String, GateDecl>,
    #[serde(default)]
    pub connections: Vec<String>,
}

impl Blueprint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn gate(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.declaration.insert(name.into(), GateDecl::Type(type_name.into()));
        self
    }

    pub fn gate_with(
        mut self,
        name: impl Into<String>,
        type_name: impl Into<String>,
        arg: impl Into<String>,
    ) -> Self {
        self.declaration.insert(
            name.into(),
            GateDecl::WithArgs {
                type_name: type_name.into(),
                args: vec![arg.into()],
            },
        );
        self
    }

    pub fn connect(mut self, connection: impl Into<String>) -> Self {
        self.connections.push(connection.into());
        self
    }
}

/// A parsed connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSpec {
    pub from_gate: String,
    pub from_port: Option<String>,
    pub to_gate: String,
    pub to_port: Option<String>,
}

impl FromStr for ConnectionSpec {
    type Err = CircuitError;

    fn from_str(connection: &str) -> Result<Self> {
        let malformed = || CircuitError::MalformedConnection {
            connection: connection.to_string(),
        };
        let (from, to) = connection.split_once(" to ").ok_or_else(malformed)?;
        if to.contains(" to ") {
            return Err(malformed());
        }

        let endpoint = |side: &str| -> Result<(String, Option<String>)> {
            let (gate, port) = match side.split_once(':') {
                Some((gate, port)) => (gate, Some(port.to_string())),
                None => (side, None),
            };
            if gate.is_empty() {
                return Err(malformed());
            }
            Ok((gate.to_string(), port))
        };
        let (from_gate, from_port) = endpoint(from)?;
        let (to_gate, to_port) = endpoint(to)?;

        Ok(Self {
            from_gate,
            from_port,
            to_gate,
            to_port,
        })
    }
}

fn resolve_port(
    connection: &str,
    gates: &IndexMap<String, Gate>,
    gate_name: &str,
    side: Side,
    port: Option<&str>,
) -> Result<PinRef> {
    let gate = gates.get(gate_name).ok_or_else(|| CircuitError::UndeclaredGate {
        connection: connection.to_string(),
        gate: gate_name.to_string(),
    })?;
    let collection = gate.collection(side);
    let found = match port {
        Some(name) => collection.find(name),
        None => collection.get(0),
    };
    found.map(|c| c.pin()).ok_or_else(|| CircuitError::PortNotFound {
        connection: connection.to_string(),
        gate: gate_name.to_string(),
        side,
        port: port.unwrap_or("<first>").to_string(),
    })
}

impl Circuit {
    /// Build and wire every gate of a blueprint, appending them in declaration order
    ///
    /// Connections are parsed and resolved against gates staged outside the
    /// circuit; nothing becomes live until every connection resolves. On any
    /// error the circuit and its session counters are left exactly as they were.
    ///
    /// # Arguments
    ///
    /// * `blueprint` - Gate declarations plus connection strings
    ///
    /// # Returns
    ///
    /// * `Ok(IndexMap<String, GateId>)` - Each declared name mapped to its new gate
    /// * `Err(CircuitError)` - The first malformed or unresolvable connection, or an unknown gate type
    ///
    /// # Examples
    ///
    /// ```rust
    /// use latchwork::{Blueprint, Circuit, CircuitError};
    ///
    /// let blueprint = Blueprint::new()
    ///     .gate("s", "Switch")
    ///     .gate("l", "Lamp")
    ///     .connect("s to ghost");
    ///
    /// let mut circuit = Circuit::new();
    /// let err = circuit.load_blueprint(&blueprint).unwrap_err();
    /// assert!(matches!(err, CircuitError::UndeclaredGate { .. }));
    /// assert!(circuit.gates().is_empty());
    /// ```
    pub fn load_blueprint(&mut self, blueprint: &Blueprint) -> Result<IndexMap<String, GateId>> {
        tracing::info!(
            "[BLUEPRINT] Loading {} gates, {} connections",
            blueprint.declaration.len(),
            blueprint.connections.len()
        );

        let counters = self.session.counters.clone();
        let mut staged: IndexMap<String, Gate> = IndexMap::new();
        let links = match self.stage_blueprint(blueprint, &mut staged) {
            Ok(links) => links,
            Err(e) => {
                for gate in staged.values() {
                    gate.dispose_edges(&mut self.wiring);
                }
                self.session.counters = counters;
                tracing::warn!("[BLUEPRINT] Rejected: {}", e);
                return Err(e);
            }
        };

        for (from, to) in links {
            let edge = self.wiring.new_edge(from)?;
            self.wiring.end_edge(edge, to)?;
            self.presenter.redraw_edge(edge);
        }

        let ids: IndexMap<String, GateId> = staged.iter().map(|(name, g)| (name.clone(), g.id())).collect();
        for gate in staged.into_values() {
            self.insert_gate(gate);
        }
        tracing::info!("[BLUEPRINT] Loaded {} gates", ids.len());
        Ok(ids)
    }

    fn stage_blueprint(
        &mut self,
        blueprint: &Blueprint,
        staged: &mut IndexMap<String, Gate>,
    ) -> Result<Vec<(PinRef, PinRef)>> {
        let connections = blueprint
            .connections
            .iter()
            .map(|c| c.parse::<ConnectionSpec>().map(|spec| (c.as_str(), spec)))
            .collect::<Result<Vec<_>>>()?;

        for (name, decl) in &blueprint.declaration {
            let gate = self
                .session
                .build_gate(decl.type_name(), decl.arg(), &mut self.wiring)?;
            staged.insert(name.clone(), gate);
        }

        let staged: &IndexMap<String, Gate> = staged;
        connections
            .iter()
            .map(|(connection, spec)| {
                let from = resolve_port(
                    connection,
                    staged,
                    &spec.from_gate,
                    Side::Output,
                    spec.from_port.as_deref(),
                )?;
                let to = resolve_port(connection, staged, &spec.to_gate, Side::Input, spec.to_port.as_deref())?;
                Ok((from, to))
            })
            .collect()
    }
}
