// kart_sim/src/simulation/core/spawn_requests.rs

use bevy::prelude::Component;
use kart_core::prelude::{AgentConfig, KartParams};
use nalgebra::Isometry3;

/// Temporary component carrying everything needed to build one kart. Removed
/// at the end of scene building.
#[derive(Component, Clone)]
pub struct SpawnKartRequest {
    pub start_pose: Isometry3<f64>,
    pub kart: KartParams,
    pub agent: AgentConfig,
}
