//! # Simulation Configuration

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Tunables for a simulation session.
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```rust
/// use latchwork::SimulationConfig;
///
/// let config = SimulationConfig::from_json_str(r#"{ "tick_hz": 60 }"#).unwrap();
/// assert_eq!(config.tick_hz, 60);
/// assert_eq!(config.input_prefix, "in");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Scheduler cadence in ticks per second
    pub tick_hz: u32,
    /// Markers handed out to successive probe gates, cycling
    pub probe_markers: Vec<String>,
    /// Prefix for auto-named input gates (`in0`, `in1`, ...)
    pub input_prefix: String,
    /// Prefix for auto-named output gates
    pub output_prefix: String,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_hz: 120,
            probe_markers: ["🔴", "🟠", "🟡", "🟢", "🔵", "🟣", "🟤"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
            input_prefix: "in".to_string(),
            output_prefix: "out".to_string(),
        }
    }
}

impl SimulationConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
