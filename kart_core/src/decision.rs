// kart_core/src/decision.rs

use std::fmt::Debug;

use dyn_clone::DynClone;

use crate::{
    agent::{DiscreteAction, Observation},
    sensors::RaySensor,
};

/// Anything that turns an observation into a discrete action: a trained
/// policy behind a trainer bridge, a script, or a hand-written heuristic.
///
/// Implementations must answer synchronously.
pub trait DecisionProvider: DynClone + Debug + Send + Sync {
    fn decide(&mut self, observation: &Observation) -> DiscreteAction;
}

dyn_clone::clone_trait_object!(DecisionProvider);

/// Always returns the same action.
#[derive(Debug, Clone, Copy)]
pub struct FixedDecision(pub DiscreteAction);

impl DecisionProvider for FixedDecision {
    fn decide(&mut self, _observation: &Observation) -> DiscreteAction {
        self.0
    }
}

/// Cycles through a list of actions, one per decision.
#[derive(Debug, Clone)]
pub struct ScriptedDecisions {
    actions: Vec<DiscreteAction>,
    cursor: usize,
}

impl ScriptedDecisions {
    pub fn new(actions: Vec<DiscreteAction>) -> Self {
        Self { actions, cursor: 0 }
    }
}

impl DecisionProvider for ScriptedDecisions {
    fn decide(&mut self, _observation: &Observation) -> DiscreteAction {
        let Some(action) = self.actions.get(self.cursor).copied() else {
            return DiscreteAction::STRAIGHT;
        };
        self.cursor = (self.cursor + 1) % self.actions.len();
        action
    }
}

/// Full throttle, steering away from whichever side looks more crowded.
///
/// Each sensor contributes its free-space ratio (`distance / ray_distance`)
/// weighted by how far it points to the left. A positive balance means more
/// room on the left.
#[derive(Debug, Clone)]
pub struct SensorBalanceDriver {
    lateral: Vec<f64>,
    ranges: Vec<f64>,
    deadband: f64,
}

impl SensorBalanceDriver {
    pub fn new(sensors: &[RaySensor]) -> Self {
        Self {
            lateral: sensors
                .iter()
                .map(|s| s.direction.try_normalize(1.0e-9).map_or(0.0, |d| d.y))
                .collect(),
            ranges: sensors.iter().map(|s| s.ray_distance).collect(),
            deadband: 0.05,
        }
    }

    pub fn balance(&self, observation: &Observation) -> f64 {
        observation
            .sensor_readings
            .iter()
            .zip(self.lateral.iter().zip(&self.ranges))
            .map(|(reading, (lateral, range))| lateral * reading.distance / range)
            .sum()
    }
}

impl DecisionProvider for SensorBalanceDriver {
    fn decide(&mut self, observation: &Observation) -> DiscreteAction {
        let balance = self.balance(observation);
        if balance > self.deadband {
            DiscreteAction::LEFT
        } else if balance < -self.deadband {
            DiscreteAction::RIGHT
        } else {
            DiscreteAction::STRAIGHT
        }
    }
}
