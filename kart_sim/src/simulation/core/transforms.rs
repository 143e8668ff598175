// kart_sim/src/simulation/core/transforms.rs

//! The core library works in ENU (X east, Y north, Z up; a kart's nose is its
//! +X). Bevy is Y up with -Z into the screen. Everything crossing the boundary
//! goes through these helpers.

use bevy::prelude::{Quat as BevyQuat, Transform as BevyTransform, Vec3 as BevyVec3};
use nalgebra::{Isometry3, Quaternion, Translation3, UnitQuaternion, Vector3};
use std::f64::consts::FRAC_PI_2;

thread_local! {
    /// Rotation taking ENU basis vectors to their Bevy coordinates: a -90 degree
    /// turn about the shared X axis. ENU north (0,1,0) becomes Bevy (0,0,-1),
    /// ENU up (0,0,1) becomes Bevy (0,1,0).
    pub static Q_ENU_FRAME_TO_BEVY_FRAME: UnitQuaternion<f64> =
        UnitQuaternion::from_axis_angle(&Vector3::x_axis(), -FRAC_PI_2);
}

/// Converts a 3D coordinate vector from ENU to Bevy world.
pub fn enu_vector_to_bevy_vector(enu_vec: &Vector3<f64>) -> BevyVec3 {
    BevyVec3::new(
        enu_vec.x as f32,  // East -> Bevy X
        enu_vec.z as f32,  // ENU Up -> Bevy Y
        -enu_vec.y as f32, // ENU North -> Bevy -Z
    )
}

/// Converts a 3D coordinate vector from Bevy world to ENU.
pub fn bevy_vector_to_enu_vector(bevy_vec: &BevyVec3) -> Vector3<f64> {
    Vector3::new(
        bevy_vec.x as f64,  // Bevy X -> ENU East
        -bevy_vec.z as f64, // Bevy -Z -> ENU North
        bevy_vec.y as f64,  // Bevy Y -> ENU Up
    )
}

/// Converts a box's half extents (ENU body axes) into full Bevy cuboid lengths.
pub fn enu_half_extents_to_bevy_size(half_extents: &Vector3<f64>) -> BevyVec3 {
    BevyVec3::new(
        (2.0 * half_extents.x) as f32,
        (2.0 * half_extents.z) as f32,
        (2.0 * half_extents.y) as f32,
    )
}

/// Converts an object's orientation from ENU frame to Bevy world frame.
pub fn enu_quat_to_bevy_quat(enu_obj_quat: &UnitQuaternion<f64>) -> BevyQuat {
    // q_bevy = Q * q_enu * Q^-1
    let rot = Q_ENU_FRAME_TO_BEVY_FRAME.with(|q| *q * enu_obj_quat * q.inverse());

    BevyQuat::from_xyzw(
        rot.coords.x as f32,
        rot.coords.y as f32,
        rot.coords.z as f32,
        rot.coords.w as f32,
    )
}

/// Converts an object's orientation from Bevy world frame to ENU frame.
pub fn bevy_quat_to_enu_quat(bevy_obj_quat: &BevyQuat) -> UnitQuaternion<f64> {
    let bevy_q_f64 = UnitQuaternion::from_quaternion(Quaternion::new(
        bevy_obj_quat.w as f64, // nalgebra Quaternion::new is w,x,y,z
        bevy_obj_quat.x as f64,
        bevy_obj_quat.y as f64,
        bevy_obj_quat.z as f64,
    ));

    // q_enu = Q^-1 * q_bevy * Q
    Q_ENU_FRAME_TO_BEVY_FRAME.with(|q| q.inverse() * bevy_q_f64 * *q)
}

/// Converts a full pose (Isometry3) from ENU frame to Bevy Transform.
pub fn enu_iso_to_bevy_transform(enu_pose: &Isometry3<f64>) -> BevyTransform {
    BevyTransform {
        translation: enu_vector_to_bevy_vector(&enu_pose.translation.vector),
        rotation: enu_quat_to_bevy_quat(&enu_pose.rotation),
        scale: BevyVec3::ONE,
    }
}

/// Converts a Bevy Transform to a full pose (Isometry3) in the ENU frame.
pub fn bevy_transform_to_enu_iso(bevy_transform: &BevyTransform) -> Isometry3<f64> {
    Isometry3::from_parts(
        Translation3::from(bevy_vector_to_enu_vector(&bevy_transform.translation)),
        bevy_quat_to_enu_quat(&bevy_transform.rotation),
    )
}
