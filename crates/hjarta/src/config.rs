//! Simulation configuration.
//!
//! ```json
//! { "fixed_timestep": 0.016666668, "teleport_threshold": 0.25 }
//! ```
//!
//! Every field is optional; missing ones take the defaults below.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::math::Vec3;

pub const DEFAULT_FIXED_TIMESTEP: f32 = 1.0 / 60.0;

/// Distance, beyond the expected physics displacement, at which a pose change
/// counts as a teleport and interpolation snaps.
pub const DEFAULT_TELEPORT_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seconds integrated by every fixed tick.
    pub fixed_timestep: f32,
    /// Delta used by [`State::step_default`](crate::State::step_default).
    pub default_delta: f32,
    /// Cap on the per-step remainder, in fixed intervals. Zero disables blending.
    pub max_accumulated_steps: u32,
    pub teleport_threshold: f32,
    /// Initial gravity. A `PhysicsWorld` component overrides it.
    pub gravity: Vec3,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            fixed_timestep: DEFAULT_FIXED_TIMESTEP,
            default_delta: DEFAULT_FIXED_TIMESTEP,
            max_accumulated_steps: 1,
            teleport_threshold: DEFAULT_TELEPORT_THRESHOLD,
            gravity: Vec3::new(0.0, -9.81, 0.0),
        }
    }
}

impl SimConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(ConfigError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_document_keeps_defaults() {
        let config = SimConfig::from_json_str(r#"{ "teleport_threshold": 2.0 }"#).unwrap();
        assert_eq!(config.teleport_threshold, 2.0);
        assert_eq!(config.fixed_timestep, DEFAULT_FIXED_TIMESTEP);
        assert_eq!(config.gravity, Vec3::new(0.0, -9.81, 0.0));
    }

    #[test]
    fn gravity_is_a_three_element_array() {
        let config = SimConfig::from_json_str(r#"{ "gravity": [0.0, -1.62, 0.0] }"#).unwrap();
        assert_eq!(config.gravity.y, -1.62);
    }

    #[test]
    fn malformed_document_is_a_config_error() {
        let err = SimConfig::from_json_str(r#"{ "fixed_timestep": "fast" }"#).unwrap_err();
        assert!(err.to_string().starts_with("invalid simulation config"));
    }
}
