// kart_sim/src/lib.rs

use bevy::prelude::*;

// Import the plugins defined within the simulation crate.
use crate::simulation::core::simulation_setup::SimulationSetupPlugin;
use crate::simulation::plugins::agent::AgentPlugin;
use crate::simulation::plugins::input::manual::ManualInputPlugin;
use crate::simulation::plugins::track::TrackPlugin;
use crate::simulation::plugins::vehicles::kart::KartPlugin;

// This prelude is for convenience for other files WITHIN the kart_sim crate.
pub mod prelude;

// This module contains all the simulation-specific logic.
pub mod cli;
pub mod simulation;

/// The main plugin that brings together all the simulation parts.
/// `main.rs` inserts the `Scenario` and `Cli` resources, then adds this plugin.
pub struct KartSimulationPlugin;

impl Plugin for KartSimulationPlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<simulation::core::app_state::AppState>();
        app.add_plugins((
            // Core setup (rng, fixed timestep, system sets, kart shells).
            SimulationSetupPlugin,
            // Ground, walls, checkpoint triggers and the CheckpointTrack.
            TrackPlugin,
            // Kart body, input resolution and velocity integration.
            KartPlugin,
            // Perception, decisions, rewards and episodes.
            AgentPlugin,
            // Arrow keys, only when a keyboard exists.
            ManualInputPlugin,
        ));
    }
}
