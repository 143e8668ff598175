// kart_sim/src/simulation/core/app_state.rs

use bevy::{ecs::schedule::SystemSet, prelude::States};

/// Defines the major phases of the application's lifecycle.
#[derive(States, Debug, Clone, Eq, PartialEq, Hash, Default)]
pub enum AppState {
    /// The initial state. The circuit and the karts are spawned from the
    /// scenario resource.
    #[default]
    SceneBuilding,

    /// The scene is built. The main simulation loop is now running.
    Running,
}

/// System sets to control the order of execution during the SceneBuilding state.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SceneBuildSet {
    /// Pass 1: Create kart shells and attach the spawn request component.
    CreateRequests,

    /// Pass 2: Spawn ground, walls and checkpoint triggers, and publish the
    /// checkpoint track.
    BuildTrack,

    /// Pass 3: Attach the vehicle dynamics and the command mailbox.
    ProcessVehicle,

    /// Pass 4: Build the agent, which needs the checkpoint track.
    ProcessAgent,

    /// Pass 5: Attach all physical bodies (RigidBody, Collider).
    Physics,

    /// Pass 6: Remove all temporary request components.
    Cleanup,
}

// =========================================================================
// == Main Simulation Sets (one fixed tick) ==
// =========================================================================

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// Checkpoint trigger events from the previous physics step, then
    /// out-of-bounds recovery.
    Triggers,
    /// Observation, decision and episode bookkeeping, every N ticks.
    Decision,
    /// Input resolution and velocity integration. Runs last, right before
    /// the physics step.
    Actuation,
}
