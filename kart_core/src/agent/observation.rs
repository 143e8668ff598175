// kart_core/src/agent/observation.rs

use crate::{error::ActionError, input::DriveCommand, sensors::SensorReading};

/// Level counts of the two discrete action branches: turn, then drive.
pub const ACTION_BRANCHES: [usize; 2] = [3, 2];

/// Everything the decision maker sees for one decision.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Signed speed along the kart's nose, normalised by top or reverse speed.
    pub local_speed: f64,
    /// Cosine between the velocity and the direction to the next checkpoint.
    pub velocity_alignment: f64,
    pub sensor_readings: Vec<SensorReading>,
    /// The accelerate flag of the *previous* decision.
    pub was_accelerating: bool,
}

impl Observation {
    /// Length of the flat vector for a kart with `sensor_count` sensors.
    pub const fn vector_len(sensor_count: usize) -> usize {
        2 + sensor_count + 1
    }

    /// `[local_speed, velocity_alignment, sensor_0, .., sensor_n-1, was_accelerating]`
    pub fn to_vector(&self) -> Vec<f32> {
        let mut values = Vec::with_capacity(Self::vector_len(self.sensor_readings.len()));
        values.push(self.local_speed as f32);
        values.push(self.velocity_alignment as f32);
        values.extend(self.sensor_readings.iter().map(|r| r.distance as f32));
        values.push(if self.was_accelerating { 1.0 } else { 0.0 });
        values
    }

    /// True if any sensor reading is inside its alert threshold.
    pub fn is_threatened(&self) -> bool {
        self.sensor_readings.iter().any(|r| r.threatening)
    }
}

/// A validated two-branch discrete action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiscreteAction {
    turn_level: u8,
    drive_level: u8,
}

impl DiscreteAction {
    /// Full left, full throttle.
    pub const LEFT: DiscreteAction = DiscreteAction { turn_level: 0, drive_level: 1 };
    /// Straight ahead, full throttle.
    pub const STRAIGHT: DiscreteAction = DiscreteAction { turn_level: 1, drive_level: 1 };
    /// Full right, full throttle.
    pub const RIGHT: DiscreteAction = DiscreteAction { turn_level: 2, drive_level: 1 };

    /// `turn_level` in `{0, 1, 2}`, `drive_level` in `{0, 1}`.
    pub fn new(turn_level: i64, drive_level: i64) -> Result<Self, ActionError> {
        if !(0..ACTION_BRANCHES[0] as i64).contains(&turn_level) {
            return Err(ActionError::TurnLevelOutOfRange(turn_level));
        }
        if !(0..ACTION_BRANCHES[1] as i64).contains(&drive_level) {
            return Err(ActionError::DriveLevelOutOfRange(drive_level));
        }
        Ok(Self {
            turn_level: turn_level as u8,
            drive_level: drive_level as u8,
        })
    }

    /// Builds an action from a trainer's raw branch buffer.
    pub fn from_branches(branches: &[i64]) -> Result<Self, ActionError> {
        match branches {
            [turn, drive] => Self::new(*turn, *drive),
            _ => Err(ActionError::WrongBranchCount(branches.len())),
        }
    }

    /// Accelerate and brake are mutually exclusive; one of them is always set.
    pub fn to_command(&self) -> DriveCommand {
        let accelerate = self.drive_level >= 1;
        DriveCommand::new(accelerate, !accelerate, self.turn_level as f64 - 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_levels_into_commands() {
        let left_brake = DiscreteAction::new(0, 0).unwrap().to_command();
        assert!(!left_brake.accelerate);
        assert!(left_brake.brake);
        assert_eq!(left_brake.turn, -1.0);

        let right_throttle = DiscreteAction::new(2, 1).unwrap().to_command();
        assert!(right_throttle.accelerate);
        assert!(!right_throttle.brake);
        assert_eq!(right_throttle.turn, 1.0);

        assert_eq!(DiscreteAction::STRAIGHT.to_command().turn, 0.0);
    }

    #[test]
    fn rejects_out_of_range_levels() {
        assert_eq!(
            DiscreteAction::new(3, 0).unwrap_err(),
            ActionError::TurnLevelOutOfRange(3)
        );
        assert_eq!(
            DiscreteAction::new(1, -1).unwrap_err(),
            ActionError::DriveLevelOutOfRange(-1)
        );
        assert_eq!(
            DiscreteAction::from_branches(&[1]).unwrap_err(),
            ActionError::WrongBranchCount(1)
        );
        assert_eq!(
            DiscreteAction::from_branches(&[2, 0]).unwrap(),
            DiscreteAction::new(2, 0).unwrap()
        );
    }

    #[test]
    fn flattens_in_documented_order() {
        let observation = Observation {
            local_speed: 0.5,
            velocity_alignment: -0.25,
            sensor_readings: vec![
                SensorReading { distance: 1.5, hit: true, threatening: true },
                SensorReading { distance: 10.0, hit: false, threatening: false },
            ],
            was_accelerating: true,
        };
        assert_eq!(observation.to_vector(), vec![0.5, -0.25, 1.5, 10.0, 1.0]);
        assert_eq!(Observation::vector_len(2), 5);
        assert!(observation.is_threatened());
    }
}
