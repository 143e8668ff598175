// kart_core/src/env.rs

//! A gym-style wrapper around one agent in a [`HeadlessWorld`].

use log::info;

pub use crate::agent::ACTION_BRANCHES;
use crate::{
    agent::{DiscreteAction, EpisodeEndReason, EpisodeSummary, KartAgent, Observation, Trainer},
    config::ScenarioConfig,
    decision::DecisionProvider,
    dynamics::KartDynamics,
    error::ConfigError,
    input::{resolve_command, DriveCommand, InputSource},
    physics::PhysicsProvider,
    world::HeadlessWorld,
};

/// Side information for one step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepInfo {
    pub checkpoint: usize,
    pub laps: u64,
    /// Checkpoint advances during this step.
    pub checkpoints_passed: u32,
    /// The kart was put back on the track during this step.
    pub recovered: bool,
    /// Set when `done` is.
    pub episode: Option<EpisodeSummary>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    /// When `done`, this is already the first observation of the next episode.
    pub observation: Observation,
    pub reward: f64,
    pub done: bool,
    pub info: StepInfo,
}

pub struct KartEnv {
    world: HeadlessWorld,
    kart: KartDynamics,
    agent: KartAgent,
    dt: f64,
    decision_period: u32,
    started: bool,
    fresh_episode: bool,
    ticks: u64,
}

impl KartEnv {
    pub fn new(config: &ScenarioConfig, trainer: Box<dyn Trainer>) -> Result<Self, ConfigError> {
        let (world, track) = HeadlessWorld::from_scenario(config)?;
        let kart = KartDynamics::new(config.kart.clone())?;
        let seed = config.simulation.seed.unwrap_or_else(rand::random);
        let agent = KartAgent::new(&config.agent, track, seed, trainer)?;

        Ok(Self {
            world,
            kart,
            agent,
            dt: config.fixed_dt(),
            decision_period: config.agent.decision_period,
            started: false,
            fresh_episode: false,
            ticks: 0,
        })
    }

    pub fn observation_size(&self) -> usize {
        self.agent.observation_size()
    }

    pub fn agent(&self) -> &KartAgent {
        &self.agent
    }

    pub fn world(&self) -> &HeadlessWorld {
        &self.world
    }

    /// Physics ticks simulated so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Starts a new episode and returns its first observation. An episode
    /// that is still running is closed as truncated.
    pub fn reset(&mut self) -> Observation {
        if !self.started {
            self.agent.start(&mut self.world);
            self.started = true;
        } else if !self.fresh_episode {
            self.agent.end_episode(EpisodeEndReason::Truncated, &mut self.world);
        }
        self.fresh_episode = true;
        self.agent.take_step_reward();
        self.agent.collect_observations(&self.world, &self.kart)
    }

    /// Applies `action`, then either closes a latched episode or simulates
    /// `decision_period` physics ticks.
    pub fn step(&mut self, action: DiscreteAction) -> StepResult {
        if !self.started {
            self.reset();
        }
        self.fresh_episode = false;
        self.agent.on_action_received(action, &self.world, &self.kart);

        let mut checkpoints_passed = 0;
        let mut recovered = false;
        let episode = self.agent.finish_pending_episode(&mut self.world);
        if let Some(summary) = &episode {
            info!(
                "episode {} finished: reward {:.3}, {} checkpoints, {} laps",
                summary.episode, summary.cumulative_reward, summary.checkpoints_passed, summary.laps
            );
            self.fresh_episode = true;
        } else {
            for _ in 0..self.decision_period {
                let (passed, recovered_now) = self.tick();
                checkpoints_passed += passed;
                recovered |= recovered_now;
            }
        }

        let reward = self.agent.take_step_reward();
        let observation = self.agent.collect_observations(&self.world, &self.kart);
        StepResult {
            observation,
            reward,
            done: episode.is_some(),
            info: StepInfo {
                checkpoint: self.agent.current_checkpoint(),
                laps: self.agent.laps(),
                checkpoints_passed,
                recovered,
                episode,
            },
        }
    }

    /// Runs `decider` from a fresh reset until the episode ends or
    /// `max_decisions` is reached, in which case it is truncated.
    pub fn run_episode(
        &mut self,
        decider: &mut dyn DecisionProvider,
        max_decisions: u64,
    ) -> EpisodeSummary {
        let mut observation = self.reset();
        for _ in 0..max_decisions {
            let result = self.step(decider.decide(&observation));
            if let Some(summary) = result.info.episode {
                return summary;
            }
            observation = result.observation;
        }

        let summary = self.agent.end_episode(EpisodeEndReason::Truncated, &mut self.world);
        self.fresh_episode = true;
        info!(
            "episode {} truncated after {max_decisions} decisions: reward {:.3}",
            summary.episode, summary.cumulative_reward
        );
        summary
    }

    /// One physics tick. Returns the number of checkpoint advances and
    /// whether out-of-bounds recovery kicked in.
    fn tick(&mut self) -> (u32, bool) {
        let sources: &mut [&mut dyn InputSource] = &mut [&mut self.agent];
        let command = resolve_command(sources).unwrap_or(DriveCommand::IDLE);

        let pose = self.world.pose();
        let velocity =
            self.kart
                .integrate(&self.world.linear_velocity(), &pose.rotation, &command, self.dt);
        self.world.set_linear_velocity(velocity);

        let mut passed = 0;
        for collider in self.world.advance(self.dt) {
            if self.agent.on_trigger_enter(collider) {
                passed += 1;
            }
        }
        let recovered = self.agent.recover_out_of_bounds(&mut self.world);
        self.ticks += 1;
        (passed, recovered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::NullTrainer;

    const CORRIDOR: &str = r#"
        [simulation]
        seed = 11

        [agent]
        decision_period = 5

        [[agent.sensors]]
        direction = [1.0, 0.0, 0.0]
        ray_distance = 10.0
        hit_alert_distance = 2.0

        [[track.checkpoints]]
        position = [0.0, 0.0, 0.5]
        half_extents = [0.5, 4.0, 1.0]

        [[track.checkpoints]]
        position = [10.0, 0.0, 0.5]
        half_extents = [0.5, 4.0, 1.0]

        [[track.checkpoints]]
        position = [20.0, 0.0, 0.5]
        half_extents = [0.5, 4.0, 1.0]
    "#;

    fn env() -> KartEnv {
        let config: ScenarioConfig = toml::from_str(CORRIDOR).unwrap();
        KartEnv::new(&config, Box::new(NullTrainer)).unwrap()
    }

    #[test]
    fn sizes_match_the_sensor_count() {
        let mut env = env();
        assert_eq!(env.observation_size(), 4);
        assert_eq!(env.reset().to_vector().len(), 4);
        assert_eq!(ACTION_BRANCHES, [3, 2]);
    }

    #[test]
    fn one_step_runs_one_decision_period() {
        let mut env = env();
        env.reset();
        let result = env.step(DiscreteAction::STRAIGHT);
        assert_eq!(env.ticks(), 5);
        assert!(!result.done);
        assert!(result.observation.was_accelerating);
        assert!(env.world().linear_velocity().x > 0.0);
    }

    #[test]
    fn driving_straight_passes_the_next_checkpoint() {
        let mut env = env();
        env.reset();
        let mut passed = 0;
        let mut total_reward = 0.0;
        for _ in 0..40 {
            let result = env.step(DiscreteAction::STRAIGHT);
            passed += result.info.checkpoints_passed;
            total_reward += result.reward;
        }
        assert_eq!(env.agent().current_checkpoint(), 2);
        assert_eq!(passed, 2);
        assert!(total_reward > 2.0);
    }

    #[test]
    fn reset_twice_truncates_only_a_started_episode() {
        let mut env = env();
        env.reset();
        env.reset();
        assert_eq!(env.agent().episode(), 0);
        env.step(DiscreteAction::STRAIGHT);
        env.reset();
        assert_eq!(env.agent().episode(), 1);
    }
}
