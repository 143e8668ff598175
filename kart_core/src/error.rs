// kart_core/src/error.rs

use thiserror::Error;

/// Setup-time failures. None of these are recoverable at runtime; a scenario
/// that fails validation never produces an agent.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("a circuit needs at least 2 checkpoints, got {count}")]
    TooFewCheckpoints { count: usize },

    #[error("the agent has no distance sensors configured")]
    NoSensors,

    #[error("top_speed must be positive, got {0}")]
    NonPositiveTopSpeed(f64),

    #[error("reverse_speed must be positive, got {0}")]
    NonPositiveReverseSpeed(f64),

    #[error("sensor {index}: {reason}")]
    InvalidSensor { index: usize, reason: String },

    #[error("initial checkpoint index {index} is out of range for a track of {count} checkpoints")]
    InitialCheckpointOutOfRange { index: usize, count: usize },

    #[error("physics_hz must be positive, got {0}")]
    NonPositivePhysicsRate(f64),

    #[error("decision_period must be at least 1 tick")]
    ZeroDecisionPeriod,

    #[error("ground_cast_distance must be positive, got {0}")]
    NonPositiveGroundCast(f64),
}

/// A discrete action whose branch levels fall outside `[3, 2]`.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ActionError {
    #[error("turn level {0} is out of range (expected 0, 1 or 2)")]
    TurnLevelOutOfRange(i64),

    #[error("drive level {0} is out of range (expected 0 or 1)")]
    DriveLevelOutOfRange(i64),

    #[error("expected 2 action branches, got {0}")]
    WrongBranchCount(usize),
}
