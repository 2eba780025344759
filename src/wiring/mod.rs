//! # Wiring
//!
//! Connectors (pins), the collections that group them on a gate, and the
//! edges that carry one boolean signal from an output pin to an input pin.

mod connector;
mod edge;

pub use connector::{Connector, ConnectorCollection, PinRef, Side};
pub use edge::{Edge, EdgeId, Wiring};
