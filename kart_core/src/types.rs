// kart_core/src/types.rs

use serde::Deserialize;

// --- Core Identifier ---
/// A generic, framework-agnostic identifier for a collider.
/// In the Bevy sim, we use the bits of the Entity ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ColliderHandle(pub u64);

impl ColliderHandle {
    // A convenience method for use in the Bevy adapter crate.
    #[cfg(feature = "bevy")] // This will only compile if the "bevy" feature is enabled
    pub fn from_entity(entity: bevy_ecs::prelude::Entity) -> Self {
        Self(entity.to_bits())
    }

    #[cfg(feature = "bevy")]
    pub fn to_entity(self) -> bevy_ecs::prelude::Entity {
        bevy_ecs::prelude::Entity::from_bits(self.0)
    }
}

/// What a static collider represents to the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
pub enum SurfaceLayer {
    /// Walls, barriers and anything else the sensors should react to.
    #[default]
    Obstacle,
    /// Drivable ground.
    Track,
    /// Ground outside the circuit. Landing here triggers out-of-bounds recovery.
    OutOfBounds,
    /// Checkpoint trigger volumes. Never solid.
    Checkpoint,
}

impl SurfaceLayer {
    pub const fn bit(self) -> u32 {
        match self {
            SurfaceLayer::Obstacle => 1 << 0,
            SurfaceLayer::Track => 1 << 1,
            SurfaceLayer::OutOfBounds => 1 << 2,
            SurfaceLayer::Checkpoint => 1 << 3,
        }
    }
}

/// A set of `SurfaceLayer`s used to filter ray casts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const NONE: LayerMask = LayerMask(0);
    /// What the distance sensors see.
    pub const DETECTION: LayerMask = LayerMask(SurfaceLayer::Obstacle.bit());
    /// What the ground ray sees.
    pub const GROUND: LayerMask =
        LayerMask(SurfaceLayer::Track.bit() | SurfaceLayer::OutOfBounds.bit());

    pub fn contains(self, layer: SurfaceLayer) -> bool {
        self.0 & layer.bit() != 0
    }

    pub fn with(self, layer: SurfaceLayer) -> Self {
        LayerMask(self.0 | layer.bit())
    }
}

impl From<SurfaceLayer> for LayerMask {
    fn from(layer: SurfaceLayer) -> Self {
        LayerMask(layer.bit())
    }
}
