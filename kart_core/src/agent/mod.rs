// kart_core/src/agent/mod.rs

//! The driving agent: perception, action decoding, checkpoint progress,
//! reward shaping and episode boundaries.

pub mod episode;
pub mod observation;

pub use episode::{
    EpisodeEndReason, EpisodeLog, EpisodeSummary, NullTrainer, TerminationLatch, Trainer,
};
pub use observation::{DiscreteAction, Observation, ACTION_BRANCHES};

use log::debug;
use nalgebra::{Point3, Vector3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{
    config::{AgentConfig, AgentMode, RewardConfig},
    dynamics::KartDynamics,
    error::ConfigError,
    input::{DriveCommand, InputSource},
    physics::PhysicsProvider,
    sensors::RaySensor,
    track::CheckpointTrack,
    types::{ColliderHandle, LayerMask, SurfaceLayer},
    utils::math::{normalize_or_zero, up_axis},
};
use episode::EpisodeStats;

/// Height above the kart the out-of-bounds ray starts from.
const GROUND_CAST_LIFT: f64 = 1.0;

#[derive(Debug)]
pub struct KartAgent {
    mode: AgentMode,
    initial_checkpoint_index: usize,
    sensors: Vec<RaySensor>,
    sensor_mount: Vector3<f64>,
    ground_cast_distance: f64,
    rewards: RewardConfig,
    track: CheckpointTrack,

    checkpoint_index: usize,
    command: DriveCommand,
    latch: TerminationLatch,
    pending_reward: f64,
    step_reward: f64,
    stats: EpisodeStats,
    episodes_started: u64,

    rng: ChaCha8Rng,
    trainer: Box<dyn Trainer>,
}

impl KartAgent {
    pub fn new(
        config: &AgentConfig,
        track: CheckpointTrack,
        seed: u64,
        trainer: Box<dyn Trainer>,
    ) -> Result<Self, ConfigError> {
        config.validate(track.len())?;
        Ok(Self {
            mode: config.mode,
            initial_checkpoint_index: config.initial_checkpoint_index,
            sensors: config.sensors.clone(),
            sensor_mount: config.sensor_mount,
            ground_cast_distance: config.ground_cast_distance,
            rewards: config.rewards.clone(),
            track,
            checkpoint_index: 0,
            command: DriveCommand::IDLE,
            latch: TerminationLatch::Clear,
            pending_reward: 0.0,
            step_reward: 0.0,
            stats: EpisodeStats::default(),
            episodes_started: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
            trainer,
        })
    }

    // --- Accessors ---

    pub fn mode(&self) -> AgentMode {
        self.mode
    }

    pub fn current_checkpoint(&self) -> usize {
        self.checkpoint_index
    }

    pub fn command(&self) -> DriveCommand {
        self.command
    }

    pub fn track(&self) -> &CheckpointTrack {
        &self.track
    }

    pub fn sensors(&self) -> &[RaySensor] {
        &self.sensors
    }

    pub fn latch(&self) -> TerminationLatch {
        self.latch
    }

    pub fn termination_pending(&self) -> bool {
        self.latch == TerminationLatch::Pending
    }

    /// The hit penalty that will be applied if the episode ends now.
    pub fn pending_reward(&self) -> f64 {
        self.pending_reward
    }

    pub fn cumulative_reward(&self) -> f64 {
        self.stats.cumulative_reward
    }

    pub fn episode(&self) -> u64 {
        self.stats.episode
    }

    pub fn laps(&self) -> u64 {
        self.stats.laps
    }

    pub fn observation_size(&self) -> usize {
        Observation::vector_len(self.sensors.len())
    }

    // --- Rewards ---

    pub fn add_reward(&mut self, reward: f64) {
        self.stats.cumulative_reward += reward;
        self.step_reward += reward;
    }

    /// Returns the reward accumulated since the last call and resets it.
    pub fn take_step_reward(&mut self) -> f64 {
        std::mem::take(&mut self.step_reward)
    }

    // --- Episode lifecycle ---

    /// First episode. In `Inferencing` mode progress starts from the
    /// configured checkpoint.
    pub fn start(&mut self, physics: &mut dyn PhysicsProvider) {
        self.begin_episode(physics);
        if self.mode == AgentMode::Inferencing {
            self.checkpoint_index = self.initial_checkpoint_index;
        }
    }

    /// Opens a new episode. `Training` respawns at a random checkpoint other
    /// than the last one; `Inferencing` leaves the kart where it is.
    pub fn begin_episode(&mut self, physics: &mut dyn PhysicsProvider) {
        self.stats = EpisodeStats {
            episode: self.episodes_started,
            ..EpisodeStats::default()
        };
        self.episodes_started += 1;
        self.trainer.on_episode_begin(self.stats.episode);

        if self.mode == AgentMode::Inferencing {
            return;
        }

        // Progress is left alone; only trigger entries move it.
        let spawn = self.rng.gen_range(0..self.track.last_index());
        self.reset_to_checkpoint(spawn, physics);
        debug!("episode {} spawned at checkpoint {spawn}", self.stats.episode);
    }

    /// Ends the episode if a threatening reading latched termination since
    /// the last observation. The pending penalty is booked first, then the
    /// trainer is notified and the next episode begins.
    pub fn finish_pending_episode(
        &mut self,
        physics: &mut dyn PhysicsProvider,
    ) -> Option<EpisodeSummary> {
        if self.latch != TerminationLatch::Pending {
            return None;
        }
        self.latch = TerminationLatch::Terminated;
        let penalty = std::mem::take(&mut self.pending_reward);
        self.add_reward(penalty);
        let summary = self.end_episode(EpisodeEndReason::SensorHit, physics);
        self.latch = TerminationLatch::Clear;
        Some(summary)
    }

    /// Closes the active episode for `reason` and immediately begins the next.
    pub fn end_episode(
        &mut self,
        reason: EpisodeEndReason,
        physics: &mut dyn PhysicsProvider,
    ) -> EpisodeSummary {
        let summary = self.stats.summarize(reason);
        debug!(
            "episode {} ended ({reason:?}): reward {:.3}, {} decisions",
            summary.episode, summary.cumulative_reward, summary.decisions
        );
        self.trainer.on_episode_end(&summary);
        self.pending_reward = 0.0;
        self.latch = TerminationLatch::Clear;
        self.begin_episode(physics);
        summary
    }

    // --- Per-tick work ---

    /// Reads every sensor and builds the observation. Threatening readings
    /// book the hit penalty as pending and latch termination; both are
    /// recomputed from scratch on every call.
    pub fn collect_observations(
        &mut self,
        physics: &dyn PhysicsProvider,
        kart: &KartDynamics,
    ) -> Observation {
        let pose = physics.pose();
        let velocity = physics.linear_velocity();

        self.pending_reward = 0.0;
        self.latch = TerminationLatch::Clear;

        let origin = pose * Point3::from(self.sensor_mount);
        let mut sensor_readings = Vec::with_capacity(self.sensors.len());
        for sensor in &self.sensors {
            let direction = sensor.world_direction(&pose.rotation);
            let hit = physics.cast_ray(&origin, &direction, sensor.ray_distance, LayerMask::DETECTION);
            let reading = sensor.read_noisy(hit.map(|h| h.distance), &mut self.rng);
            if reading.threatening {
                self.pending_reward += self.rewards.hit_penalty;
                self.latch = TerminationLatch::Pending;
            }
            sensor_readings.push(reading);
        }

        Observation {
            local_speed: kart.local_speed(&velocity, &pose.rotation),
            velocity_alignment: self.velocity_alignment(physics),
            sensor_readings,
            was_accelerating: self.command.accelerate,
        }
    }

    /// Applies a decision and adds the shaping rewards.
    pub fn on_action_received(
        &mut self,
        action: DiscreteAction,
        physics: &dyn PhysicsProvider,
        kart: &KartDynamics,
    ) {
        self.command = action.to_command();
        self.stats.decisions += 1;

        let pose = physics.pose();
        let local_speed = kart.local_speed(&physics.linear_velocity(), &pose.rotation);
        let alignment = self.velocity_alignment(physics);
        self.add_reward(alignment * self.rewards.towards_checkpoint_coefficient);
        self.add_reward(local_speed * self.rewards.speed_coefficient);
    }

    /// Trigger-enter notification. Returns whether progress advanced.
    pub fn on_trigger_enter(&mut self, collider: ColliderHandle) -> bool {
        let Some(entered) = self.track.index_of(collider) else {
            debug!("trigger {collider:?} is not a registered checkpoint");
            return false;
        };
        if !self.track.is_advance(self.checkpoint_index, entered) {
            return false;
        }

        if entered == 0 && self.checkpoint_index == self.track.last_index() {
            self.stats.laps += 1;
            debug!("lap {} completed", self.stats.laps);
        }
        self.stats.checkpoints_passed += 1;
        self.checkpoint_index = entered;
        self.add_reward(self.rewards.pass_checkpoint_reward);
        true
    }

    /// `Inferencing` only: if the ground under the kart is out-of-bounds,
    /// put it back on the current checkpoint. The episode and its rewards
    /// are untouched. Returns whether a recovery happened.
    pub fn recover_out_of_bounds(&mut self, physics: &mut dyn PhysicsProvider) -> bool {
        if self.mode == AgentMode::Training {
            return false;
        }

        let origin =
            Point3::from(physics.pose().translation.vector) + up_axis().into_inner() * GROUND_CAST_LIFT;
        let down = -up_axis();
        let off_track = physics
            .cast_ray(&origin, &down, self.ground_cast_distance, LayerMask::GROUND)
            .is_some_and(|hit| hit.layer == SurfaceLayer::OutOfBounds);
        if off_track {
            debug!("out of bounds, back to checkpoint {}", self.checkpoint_index);
            self.reset_to_checkpoint(self.checkpoint_index, physics);
        }
        off_track
    }

    fn reset_to_checkpoint(&mut self, index: usize, physics: &mut dyn PhysicsProvider) {
        physics.set_pose(self.track.pose_of(index));
        physics.set_linear_velocity(Vector3::zeros());
        self.command = DriveCommand::IDLE;
    }

    fn velocity_alignment(&self, physics: &dyn PhysicsProvider) -> f64 {
        let position = Point3::from(physics.pose().translation.vector);
        let target = self.track.position_of(self.track.next_index(self.checkpoint_index));
        normalize_or_zero(&physics.linear_velocity()).dot(&normalize_or_zero(&(target - position)))
    }
}

impl InputSource for KartAgent {
    fn generate_input(&mut self) -> DriveCommand {
        self.command
    }
}
