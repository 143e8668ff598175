// kart_core/src/prelude.rs

// --- Core Abstractions (The main contracts of the library) ---
pub use crate::decision::DecisionProvider;
pub use crate::input::{resolve_command, DriveCommand, InputSource};
pub use crate::physics::{PhysicsProvider, RayHit};
pub use crate::agent::Trainer;
pub use crate::types::{ColliderHandle, LayerMask, SurfaceLayer};

// --- Core Data Structures (The "nouns" of the library) ---
pub use crate::agent::{
    DiscreteAction, EpisodeEndReason, EpisodeSummary, KartAgent, Observation, TerminationLatch,
};
pub use crate::config::{AgentConfig, AgentMode, RewardConfig, ScenarioConfig};
pub use crate::dynamics::{KartDynamics, KartParams};
pub use crate::error::{ActionError, ConfigError};
pub use crate::sensors::{RaySensor, SensorReading};
pub use crate::track::{Checkpoint, CheckpointTrack};

// --- Concrete Implementations (Export common ones for convenience) ---
pub use crate::agent::{EpisodeLog, NullTrainer};
pub use crate::decision::{FixedDecision, ScriptedDecisions, SensorBalanceDriver};
pub use crate::env::{KartEnv, StepInfo, StepResult};
pub use crate::world::HeadlessWorld;
