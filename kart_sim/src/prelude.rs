// kart_sim/src/prelude.rs

// Re-export the entire Bevy prelude for convenience.
pub use bevy::prelude::*;

// Re-export the entire kart_core prelude so you can easily access
// pure types like `KartAgent`, `CheckpointTrack`, `DriveCommand`, etc.
pub use kart_core::prelude::*;

// Re-export common simulation-specific types for easy access in other plugins.
pub use crate::simulation::config::Scenario;
pub use crate::simulation::core::app_state::{AppState, SceneBuildSet, SimulationSet};
pub use crate::simulation::core::components::{
    ActiveCommand, Decider, DecisionClock, DrivingAgent, KartModel, SurfaceTag,
};
pub use crate::simulation::core::events::EpisodeFinished;
pub use crate::simulation::core::physics_bridge::{KartBody, TrackQueries};
pub use crate::simulation::core::spawn_requests::SpawnKartRequest;
