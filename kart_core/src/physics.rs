// kart_core/src/physics.rs

use nalgebra::{Isometry3, Point3, Unit, Vector3};

use crate::types::{ColliderHandle, LayerMask, SurfaceLayer};

/// The result of a single ray cast against the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub distance: f64,
    pub collider: ColliderHandle,
    pub layer: SurfaceLayer,
}

/// The contract between the agent and whatever simulates the kart's rigid body.
///
/// The Bevy adapter implements this on top of Avian3D; `HeadlessWorld`
/// implements it for fast, deterministic training. Trigger-enter
/// notifications are pushed into the agent by the caller rather than pulled
/// through this trait.
pub trait PhysicsProvider {
    fn linear_velocity(&self) -> Vector3<f64>;

    fn set_linear_velocity(&mut self, velocity: Vector3<f64>);

    /// The kart's pose in the world frame (ENU, Z up).
    fn pose(&self) -> Isometry3<f64>;

    /// Teleports the kart.
    fn set_pose(&mut self, pose: Isometry3<f64>);

    /// Casts a ray against every non-trigger collider whose layer is in
    /// `mask`, ignoring the kart itself. Returns the closest hit within
    /// `max_distance` (inclusive).
    fn cast_ray(
        &self,
        origin: &Point3<f64>,
        direction: &Unit<Vector3<f64>>,
        max_distance: f64,
        mask: LayerMask,
    ) -> Option<RayHit>;
}
