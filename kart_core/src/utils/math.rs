// kart_core/src/utils/math.rs

use nalgebra::{Unit, Vector3};
use num_traits::Float;

/// Linear interpolation with `t` clamped to `[0, 1]`.
pub fn lerp<T: Float>(a: T, b: T, t: T) -> T {
    let t = t.max(T::zero()).min(T::one());
    a + (b - a) * t
}

/// Scales `v` down so its length does not exceed `max_length`.
pub fn clamp_magnitude(v: Vector3<f64>, max_length: f64) -> Vector3<f64> {
    let length_sq = v.norm_squared();
    if length_sq > max_length * max_length {
        v * (max_length / length_sq.sqrt())
    } else {
        v
    }
}

/// Unit vector in the direction of `v`, or zero when `v` is (nearly) zero.
pub fn normalize_or_zero(v: &Vector3<f64>) -> Vector3<f64> {
    v.try_normalize(1.0e-5).unwrap_or_else(Vector3::zeros)
}

/// World up axis (ENU, Z up).
pub fn up_axis() -> Unit<Vector3<f64>> {
    Vector3::z_axis()
}
