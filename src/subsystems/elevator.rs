// src/subsystems/elevator.rs - Ball conveyor
use crate::hardware::{DigitalInput, SpeedController};

/// Belt speed when moving up. The motor is mounted so that up is negative.
pub const DEFAULT_SPEED: f64 = -1.0;

/// Conveyor belt with a ball sensor at the bottom.
pub struct Elevator {
    motor: Box<dyn SpeedController>,
    bottom_sensor: Box<dyn DigitalInput>,
    speed: f64,
}

impl Elevator {
    pub fn new(motor: Box<dyn SpeedController>, bottom_sensor: Box<dyn DigitalInput>) -> Self {
        Self {
            motor,
            bottom_sensor,
            speed: DEFAULT_SPEED,
        }
    }

    pub fn is_ball_at_bottom(&self) -> bool {
        self.bottom_sensor.get()
    }

    pub fn move_up(&mut self) {
        self.motor.set(self.speed);
    }

    pub fn move_down(&mut self) {
        self.motor.set(-self.speed);
    }

    pub fn stop(&mut self) {
        self.motor.set(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::sim::{SimMotor, SimSwitch};

    #[test]
    fn test_directions() {
        let motor = SimMotor::new();
        let sensor = SimSwitch::default();
        let mut elevator = Elevator::new(Box::new(motor.clone()), Box::new(sensor.clone()));
        elevator.move_up();
        assert_eq!(motor.get(), -1.0);
        elevator.move_down();
        assert_eq!(motor.get(), 1.0);
        elevator.stop();
        assert_eq!(motor.get(), 0.0);
        assert!(!elevator.is_ball_at_bottom());
        sensor.set(true);
        assert!(elevator.is_ball_at_bottom());
    }
}
