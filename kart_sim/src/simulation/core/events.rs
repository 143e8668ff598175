// kart_sim/src/simulation/core/events.rs

use bevy::prelude::{Entity, Event};
// Import the pure data struct from the core library
use kart_core::agent::EpisodeSummary;

/// Sent whenever an agent closes an episode.
#[derive(Event, Debug, Clone)]
pub struct EpisodeFinished {
    pub kart: Entity,
    pub summary: EpisodeSummary,
}
