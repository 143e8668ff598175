// kart_core/src/dynamics.rs

use nalgebra::{Unit, UnitQuaternion, Vector3};
use serde::Deserialize;

use crate::{
    error::ConfigError,
    input::DriveCommand,
    utils::{
        math::{clamp_magnitude, lerp, up_axis},
        serde_helpers,
    },
};

/// Below this forward projection (m/s) the kart counts as stationary.
pub const LOCAL_SPEED_DEADBAND: f64 = 0.1;

/// Tuning parameters for the arcade kart model.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KartParams {
    /// Hard cap on the velocity magnitude, in m/s.
    #[serde(default = "default_top_speed")]
    pub top_speed: f64,
    /// Base acceleration in m/s^2 before the ramp is applied.
    #[serde(default = "default_accel")]
    pub accel: f64,
    /// Shapes the acceleration ramp. At rest the ramp is `accel_curve * 5`.
    #[serde(default = "default_accel_curve")]
    pub accel_curve: f64,
    /// Normaliser for `local_speed` when travelling backwards.
    #[serde(default = "default_reverse_speed")]
    pub reverse_speed: f64,
    /// Steering gain in degrees at full lock.
    #[serde(default = "default_steer")]
    pub steer: f64,
    /// Half size of the chassis box (forward, left, up), in meters.
    #[serde(
        default = "default_half_extents",
        deserialize_with = "serde_helpers::vec3_from_array"
    )]
    pub half_extents: Vector3<f64>,
}

fn default_top_speed() -> f64 {
    10.0
}
fn default_accel() -> f64 {
    5.0
}
fn default_accel_curve() -> f64 {
    4.0
}
fn default_reverse_speed() -> f64 {
    5.0
}
fn default_steer() -> f64 {
    5.0
}
fn default_half_extents() -> Vector3<f64> {
    Vector3::new(0.8, 0.5, 0.3)
}

impl Default for KartParams {
    fn default() -> Self {
        Self {
            top_speed: default_top_speed(),
            accel: default_accel(),
            accel_curve: default_accel_curve(),
            reverse_speed: default_reverse_speed(),
            steer: default_steer(),
            half_extents: default_half_extents(),
        }
    }
}

impl KartParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.top_speed > 0.0) {
            return Err(ConfigError::NonPositiveTopSpeed(self.top_speed));
        }
        if !(self.reverse_speed > 0.0) {
            return Err(ConfigError::NonPositiveReverseSpeed(self.reverse_speed));
        }
        Ok(())
    }
}

/// The kart's forward axis in the world frame. The body frame is +X forward,
/// +Y left, +Z up.
pub fn forward_axis(orientation: &UnitQuaternion<f64>) -> Vector3<f64> {
    orientation * Vector3::x()
}

/// The velocity integrator. It is the only writer of the rigid body's linear
/// velocity during a physics tick; the velocity itself is stored by whatever
/// physics provider owns the body.
#[derive(Debug, Clone)]
pub struct KartDynamics {
    params: KartParams,
}

impl KartDynamics {
    pub fn new(params: KartParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &KartParams {
        &self.params
    }

    /// Advances `velocity` by one fixed step under `command`.
    ///
    /// The result never exceeds `top_speed`. Braking accelerates backwards
    /// with the same coefficient and ramp as throttle.
    pub fn integrate(
        &self,
        velocity: &Vector3<f64>,
        orientation: &UnitQuaternion<f64>,
        command: &DriveCommand,
        dt: f64,
    ) -> Vector3<f64> {
        let p = &self.params;

        let accel_input = command.accel_input();
        let normalized_speed_sq = (velocity.norm() / p.top_speed).powi(2);
        let accel_ramp = lerp(p.accel_curve * 5.0, 1.0, normalized_speed_sq);

        // Positive turn is a clockwise (rightward) yaw, i.e. negative around +Z.
        let body_up = Unit::new_normalize(orientation * Vector3::z());
        let steer_rotation =
            UnitQuaternion::from_axis_angle(&body_up, -(command.turn * p.steer).to_radians());
        let direction = steer_rotation * forward_axis(orientation);

        let magnitude = accel_input * p.accel * accel_ramp;
        clamp_magnitude(velocity + direction * magnitude * dt, p.top_speed)
    }

    /// Signed, normalised speed along the forward axis.
    pub fn local_speed(&self, velocity: &Vector3<f64>, orientation: &UnitQuaternion<f64>) -> f64 {
        let dot = forward_axis(orientation).dot(velocity);
        if dot.abs() <= LOCAL_SPEED_DEADBAND {
            return 0.0;
        }

        let speed = velocity.norm();
        if dot < 0.0 {
            -speed / self.params.reverse_speed
        } else {
            speed / self.params.top_speed
        }
    }
}

/// Yaws the body so its nose follows the horizontal travel direction.
///
/// When the kart rolls backwards the nose points away from the velocity.
/// Below the local-speed deadband the orientation is returned unchanged.
pub fn align_heading(
    orientation: &UnitQuaternion<f64>,
    velocity: &Vector3<f64>,
) -> UnitQuaternion<f64> {
    let horizontal = Vector3::new(velocity.x, velocity.y, 0.0);
    if horizontal.norm() <= LOCAL_SPEED_DEADBAND {
        return *orientation;
    }

    let heading = if forward_axis(orientation).dot(&horizontal) < 0.0 {
        -horizontal
    } else {
        horizontal
    };
    UnitQuaternion::from_axis_angle(&up_axis(), heading.y.atan2(heading.x))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::serde_helpers::yaw_from_deg;
    use approx::assert_abs_diff_eq;

    fn scenario_kart() -> KartDynamics {
        KartDynamics::new(KartParams {
            top_speed: 10.0,
            accel: 5.0,
            accel_curve: 4.0,
            ..KartParams::default()
        })
        .unwrap()
    }

    const THROTTLE: DriveCommand = DriveCommand {
        accelerate: true,
        brake: false,
        turn: 0.0,
    };

    #[test]
    fn first_full_throttle_tick_from_rest_reaches_two_meters_per_second() {
        let kart = scenario_kart();
        let v = kart.integrate(
            &Vector3::zeros(),
            &UnitQuaternion::identity(),
            &THROTTLE,
            0.02,
        );
        // 5 * lerp(20, 1, 0) * 0.02
        assert_abs_diff_eq!(v.norm(), 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(v.x, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(v.y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn velocity_never_exceeds_top_speed() {
        let kart = scenario_kart();
        let mut v = Vector3::zeros();
        let orientation = yaw_from_deg(37.0);
        let commands = [
            THROTTLE,
            DriveCommand::new(true, false, 1.0),
            DriveCommand::new(false, true, -1.0),
            DriveCommand::new(true, false, -0.5),
        ];
        for tick in 0..2_000 {
            v = kart.integrate(&v, &orientation, &commands[(tick / 50) % commands.len()], 0.02);
            assert!(v.norm() <= 10.0 + 1e-9, "tick {tick}: |v| = {}", v.norm());
        }
    }

    #[test]
    fn ramp_tapers_near_top_speed() {
        let kart = scenario_kart();
        let near_top = Vector3::new(9.0, 0.0, 0.0);
        let v = kart.integrate(&near_top, &UnitQuaternion::identity(), &THROTTLE, 0.02);
        // ramp = lerp(20, 1, 0.81) = 4.61
        assert_abs_diff_eq!(v.x, 9.0 + 5.0 * 4.61 * 0.02, epsilon = 1e-9);
    }

    #[test]
    fn braking_uses_forward_coefficients() {
        let kart = scenario_kart();
        let v = kart.integrate(
            &Vector3::zeros(),
            &UnitQuaternion::identity(),
            &DriveCommand::new(false, true, 0.0),
            0.02,
        );
        assert_abs_diff_eq!(v.x, -2.0, epsilon = 1e-12);
    }

    #[test]
    fn positive_turn_pushes_velocity_to_the_right() {
        let kart = scenario_kart();
        let v = kart.integrate(
            &Vector3::zeros(),
            &UnitQuaternion::identity(),
            &DriveCommand::new(true, false, 1.0),
            0.02,
        );
        // Right of +X is -Y in a Z-up frame.
        assert!(v.y < 0.0);
        assert_abs_diff_eq!(v.y.atan2(v.x).to_degrees(), -5.0, epsilon = 1e-9);
    }

    #[test]
    fn no_input_leaves_velocity_untouched() {
        let kart = scenario_kart();
        let v0 = Vector3::new(3.0, -1.0, 0.0);
        let v = kart.integrate(&v0, &yaw_from_deg(90.0), &DriveCommand::IDLE, 0.02);
        assert_eq!(v, v0);
    }

    #[test]
    fn local_speed_respects_deadband() {
        let kart = scenario_kart();
        let identity = UnitQuaternion::identity();
        assert_eq!(kart.local_speed(&Vector3::new(0.1, 0.0, 0.0), &identity), 0.0);
        assert_eq!(kart.local_speed(&Vector3::new(-0.05, 0.0, 0.0), &identity), 0.0);
        // Sideways motion has no forward projection.
        assert_eq!(kart.local_speed(&Vector3::new(0.0, 8.0, 0.0), &identity), 0.0);
    }

    #[test]
    fn local_speed_normalises_by_direction() {
        let kart = scenario_kart();
        let identity = UnitQuaternion::identity();
        assert_abs_diff_eq!(kart.local_speed(&Vector3::new(5.0, 0.0, 0.0), &identity), 0.5);
        // Reverse normalises by reverse_speed (5).
        assert_abs_diff_eq!(kart.local_speed(&Vector3::new(-2.5, 0.0, 0.0), &identity), -0.5);
        // Magnitude uses the full speed, not the projection.
        let v = Vector3::new(3.0, 4.0, 0.0);
        assert_abs_diff_eq!(kart.local_speed(&v, &identity), 0.5);
    }

    #[test]
    fn rejects_non_positive_top_speed() {
        let params = KartParams {
            top_speed: 0.0,
            ..KartParams::default()
        };
        assert_eq!(
            KartDynamics::new(params).unwrap_err(),
            ConfigError::NonPositiveTopSpeed(0.0)
        );
    }

    #[test]
    fn heading_follows_travel_direction() {
        let aligned = align_heading(&UnitQuaternion::identity(), &Vector3::new(0.0, 3.0, 0.0));
        let forward = forward_axis(&aligned);
        assert_abs_diff_eq!(forward.y, 1.0, epsilon = 1e-12);

        // Rolling backwards keeps the nose opposite the velocity.
        let reversing = align_heading(&yaw_from_deg(10.0), &Vector3::new(-2.0, 0.0, 0.0));
        assert_abs_diff_eq!(forward_axis(&reversing).x, 1.0, epsilon = 1e-12);

        // Too slow to steer the body.
        let still = yaw_from_deg(45.0);
        assert_eq!(align_heading(&still, &Vector3::new(0.01, 0.0, 0.0)), still);
    }
}
