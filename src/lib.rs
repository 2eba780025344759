//! # Latchwork
//!
//! Tick-driven digital logic circuit engine.
//!
//! Gates expose input and output pins; edges carry one boolean from an output
//! pin to an input pin. A circuit advances in discrete ticks, running each
//! gate once in list order, so feedback loops such as latches settle over a
//! few ticks instead of recursing. Circuits can be built from JSON blueprints
//! and packed into reusable compound gates.
//!
//! ## Quick Start
//!
//! ```rust
//! use latchwork::{Blueprint, Circuit, Trigger};
//!
//! let blueprint = Blueprint::new()
//!     .gate("switch", "Switch")
//!     .gate("not", "Not")
//!     .gate("lamp", "Lamp")
//!     .connect("switch to not")
//!     .connect("not to lamp");
//!
//! let mut circuit = Circuit::new();
//! let gates = circuit.load_blueprint(&blueprint)?;
//!
//! circuit.tick()?;
//! assert_eq!(circuit.gate(gates["lamp"]).and_then(|g| g.kind().is_lit()), Some(true));
//!
//! circuit.trigger(gates["switch"], Trigger::Toggle)?;
//! circuit.tick()?;
//! assert_eq!(circuit.gate(gates["lamp"]).and_then(|g| g.kind().is_lit()), Some(false));
//! # Ok::<(), latchwork::CircuitError>(())
//! ```
//!
//! ## Architecture
//!
//! 1. **Wiring** - Arena of edges plus a pin adjacency index; a pin's state is
//!    the OR of its edges
//! 2. **Gates** - Pin collections plus a per-kind state record
//! 3. **Circuit** - Ordered top-level gates and the tick loop
//! 4. **Compound** - Pack the circuit into one gate, unpack it back
//! 5. **Blueprint** - Declarative, all-or-nothing construction
//! 6. **Scheduler** - Fixed-rate ticking on the calling thread

pub mod blueprint;
pub mod circuit;
pub mod compound;
pub mod config;
pub mod error;
pub mod gates;
pub mod presenter;
pub mod scheduler;
pub mod session;
pub mod time;
pub mod wiring;

pub use blueprint::{Blueprint, ConnectionSpec, GateDecl};
pub use circuit::Circuit;
pub use compound::{CompoundGate, CompoundTemplate, TemplateWire};
pub use config::SimulationConfig;
pub use error::{CircuitError, Result};
pub use gates::{
    BoundaryRole, Builtin, EvalContext, Gate, GateBuilder, GateId, GateKind, GateRegistry, GateSpec,
    ProbeInterval, ProbeState, Trigger,
};
pub use presenter::{NullPresenter, Presenter};
pub use scheduler::{Scheduler, StopHandle};
pub use session::{Counters, Session};
pub use time::{ManualTime, SystemClock, TimeSource};
pub use wiring::{Connector, ConnectorCollection, Edge, EdgeId, PinRef, Side, Wiring};
