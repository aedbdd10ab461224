// src/drive/robot_drive.rs - Open-loop four motor drive
use super::filters::DriveSpeed;
use crate::hardware::SpeedController;
use crate::tools::{limit, sign};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorPosition {
    FrontLeft,
    RearLeft,
    FrontRight,
    RearRight,
}

impl MotorPosition {
    const fn index(self) -> usize {
        self as usize
    }
}

/// Drives two motors per side directly from stick values.
///
/// The right side is mounted mirrored, so its commands are negated before
/// they reach the motors. Inputs are squared (sign kept) unless disabled.
pub struct RobotDrive {
    motors: [Box<dyn SpeedController>; 4],
    inverted: [bool; 4],
    squared_inputs: bool,
}

impl RobotDrive {
    pub fn new(
        front_left: Box<dyn SpeedController>,
        rear_left: Box<dyn SpeedController>,
        front_right: Box<dyn SpeedController>,
        rear_right: Box<dyn SpeedController>,
    ) -> Self {
        Self {
            motors: [front_left, rear_left, front_right, rear_right],
            inverted: [false; 4],
            squared_inputs: true,
        }
    }

    pub fn set_squared_inputs(&mut self, squared: bool) {
        self.squared_inputs = squared;
    }

    pub fn set_inverted(&mut self, position: MotorPosition, inverted: bool) {
        self.inverted[position.index()] = inverted;
    }

    fn condition(&self, value: f64) -> f64 {
        let value = limit(value, -1.0, 1.0);
        if self.squared_inputs {
            sign(value) * value * value
        } else {
            value
        }
    }

    pub fn tank_drive(&mut self, left: f64, right: f64) {
        let speed = DriveSpeed::new(self.condition(left), self.condition(right));
        self.set_outputs(speed);
    }

    /// One stick: `move_value` forward/back, `rotate_value` turning.
    pub fn arcade_drive(&mut self, move_value: f64, rotate_value: f64) {
        let m = self.condition(move_value);
        let r = self.condition(rotate_value);
        let (left, right) = if m > 0.0 {
            if r > 0.0 {
                (m - r, m.max(r))
            } else {
                (m.max(-r), m + r)
            }
        } else if r > 0.0 {
            (-(-m).max(r), m + r)
        } else {
            (m - r, -(-m).max(-r))
        };
        self.set_outputs(DriveSpeed::new(left, right));
    }

    pub fn stop(&mut self) {
        self.set_outputs(DriveSpeed::STOPPED);
    }

    fn set_outputs(&mut self, speed: DriveSpeed) {
        let speed = speed.clamped();
        let commands = [speed.left, speed.left, -speed.right, -speed.right];
        for (i, motor) in self.motors.iter_mut().enumerate() {
            let command = if self.inverted[i] { -commands[i] } else { commands[i] };
            motor.set(command);
        }
    }

    /// Commands as (left, right) from the robot's point of view.
    pub fn outputs(&self) -> DriveSpeed {
        let read = |position: MotorPosition| {
            let value = self.motors[position.index()].get();
            if self.inverted[position.index()] { -value } else { value }
        };
        DriveSpeed::new(read(MotorPosition::FrontLeft), -read(MotorPosition::FrontRight))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::sim::SimMotor;

    fn drive() -> (RobotDrive, [SimMotor; 4]) {
        let motors = [SimMotor::new(), SimMotor::new(), SimMotor::new(), SimMotor::new()];
        let drive = RobotDrive::new(
            Box::new(motors[0].clone()),
            Box::new(motors[1].clone()),
            Box::new(motors[2].clone()),
            Box::new(motors[3].clone()),
        );
        (drive, motors)
    }

    #[test]
    fn test_tank_drive_negates_right_side() {
        let (mut drive, motors) = drive();
        drive.set_squared_inputs(false);
        drive.tank_drive(0.5, 0.25);
        assert_eq!(motors[0].get(), 0.5);
        assert_eq!(motors[1].get(), 0.5);
        assert_eq!(motors[2].get(), -0.25);
        assert_eq!(motors[3].get(), -0.25);
        assert_eq!(drive.outputs(), DriveSpeed::new(0.5, 0.25));
    }

    #[test]
    fn test_squared_inputs_keep_sign() {
        let (mut drive, motors) = drive();
        drive.tank_drive(-0.5, 2.0);
        assert_eq!(motors[0].get(), -0.25);
        assert_eq!(motors[2].get(), -1.0);
    }

    #[test]
    fn test_arcade_mixing() {
        let (mut drive, _) = drive();
        drive.set_squared_inputs(false);
        drive.arcade_drive(0.5, 0.0);
        assert_eq!(drive.outputs(), DriveSpeed::new(0.5, 0.5));
        drive.arcade_drive(0.0, 0.5);
        assert_eq!(drive.outputs(), DriveSpeed::new(-0.5, 0.5));
        drive.arcade_drive(0.6, 0.2);
        let out = drive.outputs();
        assert!((out.left - 0.4).abs() < 1e-12);
        assert_eq!(out.right, 0.6);
        drive.arcade_drive(-0.6, -0.2);
        let out = drive.outputs();
        assert!((out.left + 0.4).abs() < 1e-12);
        assert_eq!(out.right, -0.6);
    }

    #[test]
    fn test_inverted_motor_and_stop() {
        let (mut drive, motors) = drive();
        drive.set_squared_inputs(false);
        drive.set_inverted(MotorPosition::RearLeft, true);
        drive.tank_drive(0.5, 0.5);
        assert_eq!(motors[1].get(), -0.5);
        drive.stop();
        assert!(motors.iter().all(|m| m.get() == 0.0));
    }
}
