// kart_core/src/utils/serde_helpers.rs

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Deserializer};

/// `[x, y, z]` in the TOML file becomes a `Vector3<f64>`.
pub fn vec3_from_array<'de, D>(deserializer: D) -> Result<Vector3<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let arr: [f64; 3] = Deserialize::deserialize(deserializer)?;
    Ok(Vector3::new(arr[0], arr[1], arr[2]))
}

/// A heading in degrees, counter-clockwise around the up axis.
pub fn yaw_from_deg(yaw_deg: f64) -> UnitQuaternion<f64> {
    UnitQuaternion::from_axis_angle(&Vector3::z_axis(), yaw_deg.to_radians())
}
