// kart_core/src/world.rs

use std::collections::HashSet;

use nalgebra::{Isometry3, Point3, Unit, Vector3};

use crate::{
    config::ScenarioConfig,
    dynamics::align_heading,
    error::ConfigError,
    physics::{PhysicsProvider, RayHit},
    track::{Checkpoint, CheckpointTrack},
    types::{ColliderHandle, LayerMask, SurfaceLayer},
};

/// An oriented box that never moves.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticCollider {
    pub handle: ColliderHandle,
    pub pose: Isometry3<f64>,
    pub half_extents: Vector3<f64>,
    pub layer: SurfaceLayer,
}

impl StaticCollider {
    pub fn contains(&self, point: &Point3<f64>) -> bool {
        let local = self.pose.inverse_transform_point(point);
        (0..3).all(|axis| local[axis].abs() <= self.half_extents[axis])
    }

    /// Slab test in the box frame. A ray starting inside the box hits at 0.
    pub fn ray_entry(
        &self,
        origin: &Point3<f64>,
        direction: &Unit<Vector3<f64>>,
        max_distance: f64,
    ) -> Option<f64> {
        let o = self.pose.inverse_transform_point(origin);
        let d = self.pose.inverse_transform_vector(direction);

        let mut t_min = 0.0_f64;
        let mut t_max = max_distance;
        for axis in 0..3 {
            let half = self.half_extents[axis];
            if d[axis].abs() < 1.0e-12 {
                if o[axis].abs() > half {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / d[axis];
            let (t0, t1) = {
                let a = (-half - o[axis]) * inv;
                let b = (half - o[axis]) * inv;
                if a <= b { (a, b) } else { (b, a) }
            };
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }
        Some(t_min)
    }
}

/// A kinematic stand-in for a physics engine: one kart body moving at its
/// commanded velocity through a field of static boxes.
///
/// There is no gravity and no contact resolution; walls are only visible to
/// ray casts. Checkpoint triggers fire when the kart's origin enters their
/// volume, once per overlap.
#[derive(Debug, Clone)]
pub struct HeadlessWorld {
    pose: Isometry3<f64>,
    velocity: Vector3<f64>,
    colliders: Vec<StaticCollider>,
    overlapping: HashSet<ColliderHandle>,
    next_handle: u64,
}

impl HeadlessWorld {
    pub fn new(kart_pose: Isometry3<f64>) -> Self {
        Self {
            pose: kart_pose,
            velocity: Vector3::zeros(),
            colliders: Vec::new(),
            overlapping: HashSet::new(),
            next_handle: 1,
        }
    }

    /// Builds the circuit described by `config` and the matching checkpoint
    /// track. The kart starts on the agent's initial checkpoint.
    pub fn from_scenario(config: &ScenarioConfig) -> Result<(Self, CheckpointTrack), ConfigError> {
        config.validate()?;

        let start = &config.track.checkpoints[config.agent.initial_checkpoint_index];
        let mut world = Self::new(start.pose());

        for tile in &config.track.ground {
            let layer = if tile.out_of_bounds {
                SurfaceLayer::OutOfBounds
            } else {
                SurfaceLayer::Track
            };
            world.add_collider(tile.pose(), tile.half_extents, layer);
        }
        for wall in &config.track.walls {
            world.add_collider(wall.pose(), wall.half_extents, SurfaceLayer::Obstacle);
        }

        let checkpoints = config
            .track
            .checkpoints
            .iter()
            .enumerate()
            .map(|(index, gate)| Checkpoint {
                index,
                pose: gate.pose(),
                half_extents: gate.half_extents,
                collider: world.add_collider(gate.pose(), gate.half_extents, SurfaceLayer::Checkpoint),
            })
            .collect();

        Ok((world, CheckpointTrack::new(checkpoints)?))
    }

    pub fn add_collider(
        &mut self,
        pose: Isometry3<f64>,
        half_extents: Vector3<f64>,
        layer: SurfaceLayer,
    ) -> ColliderHandle {
        let handle = ColliderHandle(self.next_handle);
        self.next_handle += 1;
        self.colliders.push(StaticCollider {
            handle,
            pose,
            half_extents,
            layer,
        });
        handle
    }

    /// Moves the kart by one step and returns the checkpoint triggers it
    /// entered, in collider order.
    pub fn advance(&mut self, dt: f64) -> Vec<ColliderHandle> {
        self.pose.translation.vector += self.velocity * dt;
        self.pose.rotation = align_heading(&self.pose.rotation, &self.velocity);

        let position = Point3::from(self.pose.translation.vector);
        let mut entered = Vec::new();
        for collider in self.colliders.iter().filter(|c| c.layer == SurfaceLayer::Checkpoint) {
            if collider.contains(&position) {
                if self.overlapping.insert(collider.handle) {
                    entered.push(collider.handle);
                }
            } else {
                self.overlapping.remove(&collider.handle);
            }
        }
        entered
    }
}

impl PhysicsProvider for HeadlessWorld {
    fn linear_velocity(&self) -> Vector3<f64> {
        self.velocity
    }

    fn set_linear_velocity(&mut self, velocity: Vector3<f64>) {
        self.velocity = velocity;
    }

    fn pose(&self) -> Isometry3<f64> {
        self.pose
    }

    fn set_pose(&mut self, pose: Isometry3<f64>) {
        self.pose = pose;
    }

    fn cast_ray(
        &self,
        origin: &Point3<f64>,
        direction: &Unit<Vector3<f64>>,
        max_distance: f64,
        mask: LayerMask,
    ) -> Option<RayHit> {
        self.colliders
            .iter()
            .filter(|c| c.layer != SurfaceLayer::Checkpoint && mask.contains(c.layer))
            .filter_map(|c| {
                c.ray_entry(origin, direction, max_distance).map(|distance| RayHit {
                    distance,
                    collider: c.handle,
                    layer: c.layer,
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::serde_helpers::yaw_from_deg;
    use approx::assert_abs_diff_eq;
    use nalgebra::Translation3;

    fn at(x: f64, y: f64, z: f64) -> Isometry3<f64> {
        Isometry3::from_parts(Translation3::new(x, y, z), yaw_from_deg(0.0))
    }

    #[test]
    fn ray_hits_nearest_face_in_mask() {
        let mut world = HeadlessWorld::new(at(0.0, 0.0, 0.5));
        let near = world.add_collider(at(5.0, 0.0, 0.5), Vector3::new(0.5, 2.0, 1.0), SurfaceLayer::Obstacle);
        world.add_collider(at(8.0, 0.0, 0.5), Vector3::new(0.5, 2.0, 1.0), SurfaceLayer::Obstacle);

        let hit = world
            .cast_ray(&Point3::new(0.0, 0.0, 0.5), &Vector3::x_axis(), 10.0, LayerMask::DETECTION)
            .unwrap();
        assert_abs_diff_eq!(hit.distance, 4.5, epsilon = 1e-12);
        assert_eq!(hit.collider, near);
        assert_eq!(hit.layer, SurfaceLayer::Obstacle);

        // Out of range and wrong direction both miss.
        assert!(world
            .cast_ray(&Point3::new(0.0, 0.0, 0.5), &Vector3::x_axis(), 4.0, LayerMask::DETECTION)
            .is_none());
        assert!(world
            .cast_ray(&Point3::new(0.0, 0.0, 0.5), &-Vector3::x_axis(), 10.0, LayerMask::DETECTION)
            .is_none());
    }

    #[test]
    fn rotated_boxes_are_hit_on_their_own_faces() {
        let mut world = HeadlessWorld::new(at(0.0, 0.0, 0.0));
        let pose = Isometry3::from_parts(Translation3::new(5.0, 0.0, 0.0), yaw_from_deg(90.0));
        // After a quarter turn the long side faces the ray.
        world.add_collider(pose, Vector3::new(3.0, 0.5, 1.0), SurfaceLayer::Obstacle);
        let hit = world
            .cast_ray(&Point3::origin(), &Vector3::x_axis(), 10.0, LayerMask::DETECTION)
            .unwrap();
        assert_abs_diff_eq!(hit.distance, 4.5, epsilon = 1e-9);
    }

    #[test]
    fn triggers_and_other_layers_are_invisible_to_detection() {
        let mut world = HeadlessWorld::new(at(0.0, 0.0, 0.0));
        world.add_collider(at(3.0, 0.0, 0.0), Vector3::new(0.5, 2.0, 1.0), SurfaceLayer::Checkpoint);
        world.add_collider(at(0.0, 0.0, -0.5), Vector3::new(50.0, 50.0, 0.5), SurfaceLayer::Track);
        assert!(world
            .cast_ray(&Point3::origin(), &Vector3::x_axis(), 10.0, LayerMask::DETECTION)
            .is_none());

        let ground = world
            .cast_ray(&Point3::new(0.0, 0.0, 1.0), &-Vector3::z_axis(), 2.0, LayerMask::GROUND)
            .unwrap();
        assert_eq!(ground.layer, SurfaceLayer::Track);
        assert_abs_diff_eq!(ground.distance, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn checkpoint_entry_fires_once_per_overlap() {
        let mut world = HeadlessWorld::new(at(0.0, 0.0, 0.0));
        let gate = world.add_collider(at(1.0, 0.0, 0.0), Vector3::new(0.5, 2.0, 1.0), SurfaceLayer::Checkpoint);
        world.set_linear_velocity(Vector3::new(10.0, 0.0, 0.0));

        let mut entries = Vec::new();
        for _ in 0..30 {
            entries.extend(world.advance(0.02));
        }
        assert_eq!(entries, vec![gate]);
        assert_abs_diff_eq!(world.pose().translation.vector.x, 6.0, epsilon = 1e-9);
    }

    #[test]
    fn advancing_turns_the_nose_into_the_velocity() {
        let mut world = HeadlessWorld::new(at(0.0, 0.0, 0.0));
        world.set_linear_velocity(Vector3::new(0.0, 5.0, 0.0));
        world.advance(0.1);
        let forward = world.pose().rotation * Vector3::x();
        assert_abs_diff_eq!(forward, Vector3::y(), epsilon = 1e-12);
    }
}
