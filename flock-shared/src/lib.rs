#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

use alloc::vec::Vec;

use flock_core::{
    Agent, FlockConfig, NeighborRadii, Oscillation, SpawnBounds, Vector3D, Weights,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest accepted agent count. Each step scans all pairs, so the cost
/// grows with the square of this.
pub const MAX_AGENTS: usize = 10_000;

/// Rejected flock settings
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },

    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: f64 },

    #[error("too many agents: {count} (at most {max})")]
    TooManyAgents { count: usize, max: usize },

    #[error("spawn bounds on {axis} are inverted: min {min} > max {max}")]
    InvertedBounds { axis: char, min: f32, max: f32 },

    #[cfg(feature = "std")]
    #[error("invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Flock simulation settings as exchanged with hosts (camelCase JSON).
///
/// Missing fields fall back to the defaults of `FlockConfig`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FlockSettings {
    pub count: usize,
    pub spawn_min: [f32; 3],
    pub spawn_max: [f32; 3],
    pub amplitude: [f32; 3],
    pub frequency: [f32; 3],
    pub alignment_radius: f32,
    pub cohesion_radius: f32,
    pub separation_radius: f32,
    pub alignment_weight: f32,
    pub cohesion_weight: f32,
    pub separation_weight: f32,
    pub phase_step: f64,
    /// Spawn seed; `None` means entropy-seeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for FlockSettings {
    fn default() -> Self {
        Self::from_config(&FlockConfig::default())
    }
}

impl FlockSettings {
    pub fn from_config(config: &FlockConfig) -> Self {
        Self {
            count: config.count,
            spawn_min: to_array(config.spawn_bounds.min),
            spawn_max: to_array(config.spawn_bounds.max),
            amplitude: to_array(config.oscillation.amplitude),
            frequency: to_array(config.oscillation.frequency),
            alignment_radius: config.neighbor_radii.alignment,
            cohesion_radius: config.neighbor_radii.cohesion,
            separation_radius: config.neighbor_radii.separation,
            alignment_weight: config.weights.alignment,
            cohesion_weight: config.weights.cohesion,
            separation_weight: config.weights.separation,
            phase_step: config.phase_step,
            seed: None,
        }
    }

    #[cfg(feature = "std")]
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: FlockSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.count > MAX_AGENTS {
            return Err(SettingsError::TooManyAgents {
                count: self.count,
                max: MAX_AGENTS,
            });
        }

        let vectors = [
            ("spawnMin", self.spawn_min),
            ("spawnMax", self.spawn_max),
            ("amplitude", self.amplitude),
            ("frequency", self.frequency),
        ];
        for (field, values) in vectors {
            if values.iter().any(|v| !v.is_finite()) {
                return Err(SettingsError::NonFinite { field });
            }
        }

        let scalars = [
            ("alignmentRadius", self.alignment_radius),
            ("cohesionRadius", self.cohesion_radius),
            ("separationRadius", self.separation_radius),
            ("alignmentWeight", self.alignment_weight),
            ("cohesionWeight", self.cohesion_weight),
            ("separationWeight", self.separation_weight),
        ];
        for (field, value) in scalars {
            non_negative(field, value as f64)?;
        }
        non_negative("phaseStep", self.phase_step)?;

        for (axis, (min, max)) in ['x', 'y', 'z']
            .into_iter()
            .zip(self.spawn_min.into_iter().zip(self.spawn_max))
        {
            if min > max {
                return Err(SettingsError::InvertedBounds { axis, min, max });
            }
        }

        Ok(())
    }

    /// Validated conversion into the simulator configuration.
    pub fn to_config(&self) -> Result<FlockConfig, SettingsError> {
        self.validate()?;

        Ok(FlockConfig {
            count: self.count,
            spawn_bounds: SpawnBounds::new(to_vector(self.spawn_min), to_vector(self.spawn_max)),
            oscillation: Oscillation {
                amplitude: to_vector(self.amplitude),
                frequency: to_vector(self.frequency),
            },
            neighbor_radii: NeighborRadii {
                alignment: self.alignment_radius,
                cohesion: self.cohesion_radius,
                separation: self.separation_radius,
            },
            weights: Weights {
                alignment: self.alignment_weight,
                cohesion: self.cohesion_weight,
                separation: self.separation_weight,
            },
            phase_step: self.phase_step,
        })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), SettingsError> {
    if !value.is_finite() {
        return Err(SettingsError::NonFinite { field });
    }
    if value < 0.0 {
        return Err(SettingsError::Negative { field, value });
    }
    Ok(())
}

fn to_array(v: Vector3D) -> [f32; 3] {
    [v.x, v.y, v.z]
}

fn to_vector(a: [f32; 3]) -> Vector3D {
    Vector3D::new(a[0], a[1], a[2])
}

/// Instance transform of one agent, as read by a host renderer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentTransform {
    pub index: usize,
    pub position: [f32; 3],
    /// Quaternion `[x, y, z, w]`
    pub rotation: [f32; 4],
}

impl AgentTransform {
    pub fn new(index: usize, agent: &Agent) -> Self {
        Self {
            index,
            position: to_array(agent.position),
            rotation: agent.orientation.quaternion(),
        }
    }
}

/// All agent transforms after a given frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub frame: u64,
    pub phase: f64,
    pub agents: Vec<AgentTransform>,
}

impl FrameSnapshot {
    pub fn capture(frame: u64, phase: f64, agents: &[Agent]) -> Self {
        Self {
            frame,
            phase,
            agents: agents
                .iter()
                .enumerate()
                .map(|(index, agent)| AgentTransform::new(index, agent))
                .collect(),
        }
    }

    pub fn all_finite(&self) -> bool {
        self.agents
            .iter()
            .all(|a| a.position.iter().all(|v| v.is_finite()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flock_core::Orientation;

    #[test]
    fn test_default_settings_match_config() {
        let settings = FlockSettings::default();
        let config = settings.to_config().unwrap();
        assert_eq!(config, FlockConfig::default());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings =
            FlockSettings::from_json(r#"{"count": 12, "cohesionWeight": 0.1, "seed": 4}"#)
                .unwrap();

        assert_eq!(settings.count, 12);
        assert_eq!(settings.cohesion_weight, 0.1);
        assert_eq!(settings.seed, Some(4));
        assert_eq!(settings.separation_radius, 2.0);
        assert_eq!(settings.phase_step, 0.005);
    }

    #[test]
    fn test_rejects_negative_radius() {
        let settings = FlockSettings {
            cohesion_radius: -1.0,
            ..FlockSettings::default()
        };

        match settings.validate() {
            Err(SettingsError::Negative { field, .. }) => assert_eq!(field, "cohesionRadius"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_non_finite() {
        let settings = FlockSettings {
            amplitude: [0.3, f32::NAN, 0.3],
            ..FlockSettings::default()
        };
        assert!(matches!(
            settings.to_config(),
            Err(SettingsError::NonFinite { field: "amplitude" })
        ));
    }

    #[test]
    fn test_rejects_too_many_agents() {
        let settings = FlockSettings::from_json(r#"{"count": 18446744073709551615}"#);
        assert!(matches!(
            settings,
            Err(SettingsError::TooManyAgents { max: MAX_AGENTS, .. })
        ));

        let at_limit = FlockSettings {
            count: MAX_AGENTS,
            ..FlockSettings::default()
        };
        assert!(at_limit.validate().is_ok());

        let over_limit = FlockSettings {
            count: MAX_AGENTS + 1,
            ..FlockSettings::default()
        };
        assert!(over_limit.to_config().is_err());
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        let settings = FlockSettings {
            spawn_min: [0.0, 3.0, 0.0],
            spawn_max: [1.0, 1.0, 1.0],
            ..FlockSettings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::InvertedBounds { axis: 'y', .. })
        ));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            FlockSettings::from_json("{\"count\": \"many\"}"),
            Err(SettingsError::Json(_))
        ));
    }

    #[test]
    fn test_settings_json_field_names() {
        let json = serde_json::to_string(&FlockSettings::default()).unwrap();
        assert!(json.contains("\"separationWeight\":0.02"));
        assert!(json.contains("\"spawnMin\":[-1.0,-5.0,-5.0]"));
        assert!(!json.contains("seed"));
    }

    #[test]
    fn test_snapshot_capture() {
        let agents = [
            Agent::new(Vector3D::new(1.0, 2.0, 3.0)),
            Agent {
                position: Vector3D::zero(),
                orientation: Orientation::from_yaw(core::f32::consts::PI),
            },
        ];
        let snapshot = FrameSnapshot::capture(7, 0.035, &agents);

        assert_eq!(snapshot.frame, 7);
        assert_eq!(snapshot.agents.len(), 2);
        assert_eq!(snapshot.agents[0].position, [1.0, 2.0, 3.0]);
        assert_eq!(snapshot.agents[0].rotation, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(snapshot.agents[1].index, 1);
        assert!((snapshot.agents[1].rotation[1] - 1.0).abs() < 1e-6);
        assert!(snapshot.all_finite());
    }
}
