// kart_sim/src/simulation/core/layers.rs

use avian3d::prelude::{LayerMask as AvianLayerMask, PhysicsLayer};
use kart_core::types::{LayerMask, SurfaceLayer};

#[derive(PhysicsLayer, Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameLayer {
    /// Walls and barriers. The only thing the distance sensors see.
    #[default]
    Obstacle,
    /// Drivable ground.
    Track,
    /// Ground outside the circuit.
    OutOfBounds,
    /// Checkpoint trigger volumes.
    Checkpoint,
    /// Kart bodies. Never hit by ray casts.
    Kart,
}

impl From<SurfaceLayer> for GameLayer {
    fn from(layer: SurfaceLayer) -> Self {
        match layer {
            SurfaceLayer::Obstacle => GameLayer::Obstacle,
            SurfaceLayer::Track => GameLayer::Track,
            SurfaceLayer::OutOfBounds => GameLayer::OutOfBounds,
            SurfaceLayer::Checkpoint => GameLayer::Checkpoint,
        }
    }
}

/// Layers a ray can hit. Checkpoint triggers are never ray targets.
const SOLID_SURFACES: [SurfaceLayer; 3] = [
    SurfaceLayer::Obstacle,
    SurfaceLayer::Track,
    SurfaceLayer::OutOfBounds,
];

/// Translates a core layer mask into Avian's bit layout for ray casts.
pub fn to_avian_mask(mask: LayerMask) -> AvianLayerMask {
    let bits = SOLID_SURFACES
        .into_iter()
        .filter(|layer| mask.contains(*layer))
        .fold(0, |bits, layer| bits | GameLayer::from(layer).to_bits());
    AvianLayerMask(bits)
}
