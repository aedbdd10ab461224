// src/controllers/elevator.rs - Joystick buttons for the ball elevator
use super::{ControlError, Controller, Cycle};
use crate::hardware::input::joystick;
use crate::ports::UsbPort;

pub struct ElevatorController {
    port: UsbPort,
}

impl ElevatorController {
    pub fn new(port: UsbPort) -> Self {
        Self { port }
    }
}

impl Controller for ElevatorController {
    fn name(&self) -> &str {
        "elevator"
    }

    fn run(&mut self, cycle: &mut Cycle<'_>) -> Result<(), ControlError> {
        let stick = cycle.inputs.port(self.port);
        let up = stick.button(joystick::ELEVATOR_UP);
        let down = stick.button(joystick::ELEVATOR_DOWN);

        let elevator = cycle.components.elevator()?;
        match (up, down) {
            (true, false) => elevator.move_up(),
            (false, true) => elevator.move_down(),
            _ => elevator.stop(),
        }
        cycle.dashboard.log_flag("(ELEVATOR) Ball at bottom", elevator.is_ball_at_bottom());
        Ok(())
    }
}
