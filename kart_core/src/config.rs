// kart_core/src/config.rs

use nalgebra::{Isometry3, Translation3, Vector3};
use serde::Deserialize;

use crate::{
    dynamics::KartParams,
    error::ConfigError,
    sensors::RaySensor,
    utils::serde_helpers::{self, yaw_from_deg},
};

// =========================================================================
// == Top-Level Scenario ==
// =========================================================================

/// # ScenarioConfig
/// The root of a `scenario.toml` file: one circuit, one kart, one agent.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)] // Fail if the TOML has fields not in our struct
pub struct ScenarioConfig {
    #[serde(default)] // Use default if the [simulation] section is missing
    pub simulation: SimulationSettings,

    #[serde(default)]
    pub kart: KartParams,

    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub track: TrackConfig,
}

impl ScenarioConfig {
    /// Runs every setup-time check. A scenario that passes can be turned into
    /// an agent and a world without further errors.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.simulation.validate()?;
        self.kart.validate()?;
        if self.track.checkpoints.len() < 2 {
            return Err(ConfigError::TooFewCheckpoints {
                count: self.track.checkpoints.len(),
            });
        }
        self.agent.validate(self.track.checkpoints.len())
    }

    /// Length of one physics tick in seconds.
    pub fn fixed_dt(&self) -> f64 {
        1.0 / self.simulation.physics_hz
    }
}

// =========================================================================
// == Simulation ==
// =========================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationSettings {
    /// Optional seed for the pseudo-random number generator for determinism.
    pub seed: Option<u64>,
    /// Fixed physics rate in Hz.
    #[serde(default = "default_physics_hz")]
    pub physics_hz: f64,
    /// Stop the run after this many seconds. Runs forever when absent.
    pub duration_seconds: Option<f64>,
}

fn default_physics_hz() -> f64 {
    50.0
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            seed: None,
            physics_hz: default_physics_hz(),
            duration_seconds: None,
        }
    }
}

impl SimulationSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.physics_hz > 0.0) {
            return Err(ConfigError::NonPositivePhysicsRate(self.physics_hz));
        }
        Ok(())
    }
}

// =========================================================================
// == Agent ==
// =========================================================================

/// Fixed for the agent's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
pub enum AgentMode {
    /// Random respawns, no out-of-bounds recovery.
    Training,
    /// Starts from a configured checkpoint and recovers from off-track excursions.
    #[default]
    Inferencing,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RewardConfig {
    /// Added once per threatening sensor reading when the episode ends.
    pub hit_penalty: f64,
    /// Granted for each checkpoint advance.
    pub pass_checkpoint_reward: f64,
    /// Scales velocity alignment every decision.
    pub towards_checkpoint_coefficient: f64,
    /// Scales local speed every decision.
    pub speed_coefficient: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            hit_penalty: -1.0,
            pass_checkpoint_reward: 1.0,
            towards_checkpoint_coefficient: 0.03,
            speed_coefficient: 0.02,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    #[serde(default)]
    pub mode: AgentMode,
    /// Starting checkpoint in `Inferencing` mode.
    #[serde(default)]
    pub initial_checkpoint_index: usize,
    /// Length of the downward out-of-bounds ray, cast from one meter above the kart.
    #[serde(default = "default_ground_cast_distance")]
    pub ground_cast_distance: f64,
    /// Physics ticks between two decisions.
    #[serde(default = "default_decision_period")]
    pub decision_period: u32,
    /// Where the distance sensors start, in the kart's body frame.
    #[serde(
        default = "default_sensor_mount",
        deserialize_with = "serde_helpers::vec3_from_array"
    )]
    pub sensor_mount: Vector3<f64>,
    #[serde(default)]
    pub rewards: RewardConfig,
    #[serde(default = "default_sensor_fan")]
    pub sensors: Vec<RaySensor>,
}

fn default_ground_cast_distance() -> f64 {
    1.0
}
fn default_decision_period() -> u32 {
    5
}
fn default_sensor_mount() -> Vector3<f64> {
    Vector3::new(0.5, 0.0, 0.2)
}

/// Five sensors: straight ahead, 30 degrees either side and both flanks.
pub fn default_sensor_fan() -> Vec<RaySensor> {
    [(0.0, 10.0, 2.0), (30.0, 8.0, 1.5), (-30.0, 8.0, 1.5), (90.0, 4.0, 0.6), (-90.0, 4.0, 0.6)]
        .into_iter()
        .map(|(angle_deg, ray_distance, hit_alert_distance)| {
            RaySensor::new(
                yaw_from_deg(angle_deg) * Vector3::x(),
                ray_distance,
                hit_alert_distance,
            )
        })
        .collect()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            mode: AgentMode::default(),
            initial_checkpoint_index: 0,
            ground_cast_distance: default_ground_cast_distance(),
            decision_period: default_decision_period(),
            sensor_mount: default_sensor_mount(),
            rewards: RewardConfig::default(),
            sensors: default_sensor_fan(),
        }
    }
}

impl AgentConfig {
    pub fn validate(&self, checkpoint_count: usize) -> Result<(), ConfigError> {
        if self.sensors.is_empty() {
            return Err(ConfigError::NoSensors);
        }
        for (index, sensor) in self.sensors.iter().enumerate() {
            sensor.validate(index)?;
        }
        if self.initial_checkpoint_index >= checkpoint_count {
            return Err(ConfigError::InitialCheckpointOutOfRange {
                index: self.initial_checkpoint_index,
                count: checkpoint_count,
            });
        }
        if self.decision_period == 0 {
            return Err(ConfigError::ZeroDecisionPeriod);
        }
        if !(self.ground_cast_distance > 0.0) {
            return Err(ConfigError::NonPositiveGroundCast(self.ground_cast_distance));
        }
        Ok(())
    }
}

// =========================================================================
// == Track ==
// =========================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrackConfig {
    /// Gates in racing order.
    #[serde(default)]
    pub checkpoints: Vec<VolumeConfig>,
    /// Solid obstacles the sensors react to.
    #[serde(default)]
    pub walls: Vec<VolumeConfig>,
    /// Ground tiles; tiles flagged `out_of_bounds` trigger recovery.
    #[serde(default)]
    pub ground: Vec<GroundTileConfig>,
}

/// An oriented box placed in the world.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VolumeConfig {
    #[serde(deserialize_with = "serde_helpers::vec3_from_array")]
    pub position: Vector3<f64>,
    /// Heading in degrees, counter-clockwise from +X around +Z.
    #[serde(default)]
    pub yaw_deg: f64,
    #[serde(deserialize_with = "serde_helpers::vec3_from_array")]
    pub half_extents: Vector3<f64>,
}

impl VolumeConfig {
    pub fn pose(&self) -> Isometry3<f64> {
        Isometry3::from_parts(Translation3::from(self.position), yaw_from_deg(self.yaw_deg))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroundTileConfig {
    #[serde(deserialize_with = "serde_helpers::vec3_from_array")]
    pub position: Vector3<f64>,
    #[serde(default)]
    pub yaw_deg: f64,
    #[serde(deserialize_with = "serde_helpers::vec3_from_array")]
    pub half_extents: Vector3<f64>,
    #[serde(default)]
    pub out_of_bounds: bool,
}

impl GroundTileConfig {
    pub fn pose(&self) -> Isometry3<f64> {
        Isometry3::from_parts(Translation3::from(self.position), yaw_from_deg(self.yaw_deg))
    }
}
