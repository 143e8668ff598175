// kart_core/src/track.rs

use nalgebra::{Isometry3, Point3, Vector3};

use crate::{error::ConfigError, types::ColliderHandle};

/// A gate on the circuit. The pose's +X axis points in the racing direction.
#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint {
    pub index: usize,
    pub pose: Isometry3<f64>,
    /// Half size of the trigger volume in the checkpoint's own frame.
    pub half_extents: Vector3<f64>,
    /// The trigger collider that reports entries for this gate.
    pub collider: ColliderHandle,
}

impl Checkpoint {
    pub fn position(&self) -> Point3<f64> {
        Point3::from(self.pose.translation.vector)
    }
}

/// The ordered, cyclic list of checkpoints that defines a lap.
#[derive(Debug, Clone)]
pub struct CheckpointTrack {
    checkpoints: Vec<Checkpoint>,
}

impl CheckpointTrack {
    /// Builds the track in the given order. Each checkpoint's `index` is
    /// overwritten with its position in the list.
    pub fn new(mut checkpoints: Vec<Checkpoint>) -> Result<Self, ConfigError> {
        if checkpoints.len() < 2 {
            return Err(ConfigError::TooFewCheckpoints {
                count: checkpoints.len(),
            });
        }
        for (index, checkpoint) in checkpoints.iter_mut().enumerate() {
            checkpoint.index = index;
        }
        Ok(Self { checkpoints })
    }

    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    /// Always false; construction rejects short tracks.
    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.checkpoints.len() - 1
    }

    pub fn iter(&self) -> impl Iterator<Item = &Checkpoint> {
        self.checkpoints.iter()
    }

    /// Looks up which checkpoint owns `collider`. `None` is the "not found"
    /// sentinel for colliders that are not part of this track.
    pub fn index_of(&self, collider: ColliderHandle) -> Option<usize> {
        self.checkpoints
            .iter()
            .position(|checkpoint| checkpoint.collider == collider)
    }

    /// Whether entering `entered` while at `current` counts as progress.
    ///
    /// Any index ahead of the current one advances, so skipped gates are
    /// tolerated. Index 0 advances only from the last index (a completed lap).
    pub fn is_advance(&self, current: usize, entered: usize) -> bool {
        entered > current || (entered == 0 && current == self.last_index())
    }

    pub fn next_index(&self, index: usize) -> usize {
        (index + 1) % self.checkpoints.len()
    }

    /// Pose of checkpoint `index`, wrapping out-of-range indices.
    pub fn pose_of(&self, index: usize) -> Isometry3<f64> {
        self.checkpoints[index % self.checkpoints.len()].pose
    }

    pub fn position_of(&self, index: usize) -> Point3<f64> {
        self.checkpoints[index % self.checkpoints.len()].position()
    }
}
