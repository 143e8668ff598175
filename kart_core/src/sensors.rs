// kart_core/src/sensors.rs

use nalgebra::{Unit, UnitQuaternion, Vector3};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::Deserialize;

use crate::{error::ConfigError, utils::serde_helpers};

/// A single distance sensor mounted on the kart.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RaySensor {
    /// Ray direction in the kart's body frame (+X forward, +Y left, +Z up).
    #[serde(deserialize_with = "serde_helpers::vec3_from_array")]
    pub direction: Vector3<f64>,
    /// Maximum range of the sensor. A miss reads as this value.
    pub ray_distance: f64,
    /// Hits strictly closer than this count as a collision.
    pub hit_alert_distance: f64,
    /// Standard deviation of Gaussian noise added to the reported distance.
    #[serde(default)]
    pub range_noise_stddev: f64,
}

/// What one sensor reported this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    /// The value exposed in the observation vector.
    pub distance: f64,
    pub hit: bool,
    /// The true hit distance was inside the alert threshold.
    pub threatening: bool,
}

impl RaySensor {
    pub fn new(direction: Vector3<f64>, ray_distance: f64, hit_alert_distance: f64) -> Self {
        Self {
            direction,
            ray_distance,
            hit_alert_distance,
            range_noise_stddev: 0.0,
        }
    }

    pub fn validate(&self, index: usize) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidSensor {
            index,
            reason: reason.to_string(),
        };
        if self.direction.try_normalize(1.0e-9).is_none() {
            return Err(invalid("direction must be non-zero"));
        }
        if !(self.ray_distance > 0.0) {
            return Err(invalid("ray_distance must be positive"));
        }
        if !(self.hit_alert_distance >= 0.0) || self.hit_alert_distance > self.ray_distance {
            return Err(invalid("hit_alert_distance must lie in [0, ray_distance]"));
        }
        if !(self.range_noise_stddev >= 0.0) {
            return Err(invalid("range_noise_stddev must be non-negative"));
        }
        Ok(())
    }

    /// The ray direction rotated into the world frame.
    pub fn world_direction(&self, orientation: &UnitQuaternion<f64>) -> Unit<Vector3<f64>> {
        Unit::new_normalize(orientation * self.direction)
    }

    /// Turns a raw cast result into a reading. `hit_distance` is `None` on a miss.
    pub fn read(&self, hit_distance: Option<f64>) -> SensorReading {
        match hit_distance {
            Some(distance) => SensorReading {
                distance,
                hit: true,
                threatening: distance < self.hit_alert_distance,
            },
            None => SensorReading {
                distance: self.ray_distance,
                hit: false,
                threatening: false,
            },
        }
    }

    /// Like [`RaySensor::read`], with range noise applied to the reported
    /// distance. Threat detection always uses the true distance.
    pub fn read_noisy<R: Rng + ?Sized>(&self, hit_distance: Option<f64>, rng: &mut R) -> SensorReading {
        let mut reading = self.read(hit_distance);
        if reading.hit && self.range_noise_stddev > 0.0 {
            if let Ok(noise) = Normal::new(0.0, self.range_noise_stddev) {
                reading.distance =
                    (reading.distance + noise.sample(rng)).clamp(0.0, self.ray_distance);
            }
        }
        reading
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn front_sensor() -> RaySensor {
        RaySensor::new(Vector3::x(), 10.0, 2.0)
    }

    #[test]
    fn close_hit_is_threatening_and_reports_distance() {
        let reading = front_sensor().read(Some(1.5));
        assert_eq!(reading.distance, 1.5);
        assert!(reading.hit);
        assert!(reading.threatening);
    }

    #[test]
    fn alert_threshold_is_strict() {
        assert!(!front_sensor().read(Some(2.0)).threatening);
        assert!(!front_sensor().read(Some(6.0)).threatening);
    }

    #[test]
    fn miss_reads_max_range() {
        let reading = front_sensor().read(None);
        assert_eq!(reading.distance, 10.0);
        assert!(!reading.hit);
        assert!(!reading.threatening);
    }

    #[test]
    fn noise_stays_in_range_and_keeps_true_threat() {
        let mut sensor = front_sensor();
        sensor.range_noise_stddev = 5.0;
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..200 {
            let reading = sensor.read_noisy(Some(1.0), &mut rng);
            assert!((0.0..=10.0).contains(&reading.distance));
            assert!(reading.threatening);
        }
        // Misses are never perturbed.
        assert_eq!(sensor.read_noisy(None, &mut rng).distance, 10.0);
    }

    #[test]
    fn world_direction_follows_body_yaw() {
        let left = RaySensor::new(Vector3::y(), 10.0, 2.0);
        let yawed = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), std::f64::consts::FRAC_PI_2);
        let dir = left.world_direction(&yawed);
        assert_abs_diff_eq!(dir.x, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn validation() {
        assert!(front_sensor().validate(0).is_ok());
        assert!(RaySensor::new(Vector3::zeros(), 10.0, 2.0).validate(0).is_err());
        assert!(RaySensor::new(Vector3::x(), 0.0, 0.0).validate(1).is_err());
        assert!(RaySensor::new(Vector3::x(), 5.0, 6.0).validate(2).is_err());
        let mut noisy = front_sensor();
        noisy.range_noise_stddev = -1.0;
        assert!(matches!(
            noisy.validate(3),
            Err(ConfigError::InvalidSensor { index: 3, .. })
        ));
    }
}
