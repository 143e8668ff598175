// kart_sim/src/simulation/core/physics_bridge.rs

//! Implements the core `PhysicsProvider` contract on top of Avian.

use avian3d::prelude::{LinearVelocity, SpatialQuery, SpatialQueryFilter};
use bevy::{ecs::system::SystemParam, prelude::*};
use kart_core::prelude::{ColliderHandle, LayerMask, PhysicsProvider, RayHit};
use nalgebra::{Isometry3, Point3, Unit, Vector3};

use super::{
    components::SurfaceTag,
    layers::to_avian_mask,
    transforms::{
        bevy_transform_to_enu_iso, bevy_vector_to_enu_vector, enu_iso_to_bevy_transform,
        enu_vector_to_bevy_vector,
    },
};

/// Everything a ray cast needs: Avian's spatial queries plus the surface tag
/// of whatever was hit.
#[derive(SystemParam)]
pub struct TrackQueries<'w, 's> {
    spatial_query: SpatialQuery<'w, 's>,
    surfaces: Query<'w, 's, &'static SurfaceTag>,
}

/// One kart's rigid body, borrowed for the duration of a system.
pub struct KartBody<'a, 'w, 's> {
    pub entity: Entity,
    pub transform: &'a mut Transform,
    pub velocity: &'a mut LinearVelocity,
    pub queries: &'a TrackQueries<'w, 's>,
}

impl PhysicsProvider for KartBody<'_, '_, '_> {
    fn linear_velocity(&self) -> Vector3<f64> {
        bevy_vector_to_enu_vector(&self.velocity.0)
    }

    fn set_linear_velocity(&mut self, velocity: Vector3<f64>) {
        self.velocity.0 = enu_vector_to_bevy_vector(&velocity);
    }

    fn pose(&self) -> Isometry3<f64> {
        bevy_transform_to_enu_iso(self.transform)
    }

    fn set_pose(&mut self, pose: Isometry3<f64>) {
        let target = enu_iso_to_bevy_transform(&pose);
        self.transform.translation = target.translation;
        self.transform.rotation = target.rotation;
    }

    fn cast_ray(
        &self,
        origin: &Point3<f64>,
        direction: &Unit<Vector3<f64>>,
        max_distance: f64,
        mask: LayerMask,
    ) -> Option<RayHit> {
        let direction = Dir3::new(enu_vector_to_bevy_vector(direction)).ok()?;
        let filter =
            SpatialQueryFilter::from_mask(to_avian_mask(mask)).with_excluded_entities([self.entity]);

        let hit = self.queries.spatial_query.cast_ray(
            enu_vector_to_bevy_vector(&origin.coords),
            direction,
            max_distance as f32,
            true,
            &filter,
        )?;
        // Untagged colliders (other karts) are not part of the circuit.
        let surface = self.queries.surfaces.get(hit.entity).ok()?;

        Some(RayHit {
            distance: hit.distance as f64,
            collider: ColliderHandle::from_entity(hit.entity),
            layer: surface.0,
        })
    }
}
