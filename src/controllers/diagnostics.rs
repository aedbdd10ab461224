// src/controllers/diagnostics.rs - Bench checks for single devices
use super::{ControlError, Controller, Cycle};
use crate::hardware::input::xbox;
use crate::hardware::{Axis, Encoder, SpeedController};
use crate::ports::UsbPort;

/// Drives one motor straight from a joystick's Y axis.
pub struct TestMotor {
    port: UsbPort,
    motor: Box<dyn SpeedController>,
    name: String,
}

impl TestMotor {
    pub fn new(port: UsbPort, motor: Box<dyn SpeedController>, name: impl Into<String>) -> Self {
        Self {
            port,
            motor,
            name: name.into(),
        }
    }
}

impl Controller for TestMotor {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&mut self, cycle: &mut Cycle<'_>) -> Result<(), ControlError> {
        let speed = cycle.inputs.port(self.port).axis(Axis::Y);
        cycle.dashboard.log_number(&self.name, speed);
        self.motor.set(speed);
        Ok(())
    }
}

/// Publishes raw rate and distance for a pair of encoders.
pub struct EncoderTest {
    left: Box<dyn Encoder>,
    right: Box<dyn Encoder>,
}

impl EncoderTest {
    pub fn new(left: Box<dyn Encoder>, right: Box<dyn Encoder>) -> Self {
        Self { left, right }
    }
}

impl Controller for EncoderTest {
    fn name(&self) -> &str {
        "encoder test"
    }

    fn run(&mut self, cycle: &mut Cycle<'_>) -> Result<(), ControlError> {
        cycle.dashboard.log_number("Left Encoder", self.left.rate());
        cycle.dashboard.log_number("Right Encoder", self.right.rate());
        cycle.dashboard.log_number("Left Encoder distance", self.left.distance());
        cycle.dashboard.log_number("Right Encoder distance", self.right.distance());
        Ok(())
    }
}

const GAMEPAD_AXES: [(Axis, &str); 7] = [
    (Axis::LeftX, "Left stick X"),
    (Axis::LeftY, "Left stick Y"),
    (Axis::Bumper, "Bumper"),
    (Axis::RightX, "Right stick X"),
    (Axis::RightY, "Right stick Y"),
    (Axis::DpadX, "X Dpad"),
    (Axis::DpadY, "Y Dpad"),
];

const GAMEPAD_BUTTONS: [(u8, &str); 10] = [
    (xbox::A, "Button A"),
    (xbox::B, "Button B"),
    (xbox::X, "Button X"),
    (xbox::Y, "Button Y"),
    (xbox::LEFT_BUMPER, "Left bumper"),
    (xbox::RIGHT_BUMPER, "Right bumper"),
    (xbox::BACK, "Back"),
    (xbox::START, "Start"),
    (xbox::LEFT_CLICK, "Left click"),
    (xbox::RIGHT_CLICK, "Right click"),
];

/// Mirrors every Xbox axis and button onto the dashboard.
pub struct GamepadTest {
    port: UsbPort,
}

impl GamepadTest {
    pub fn new(port: UsbPort) -> Self {
        Self { port }
    }
}

impl Controller for GamepadTest {
    fn name(&self) -> &str {
        "gamepad test"
    }

    fn run(&mut self, cycle: &mut Cycle<'_>) -> Result<(), ControlError> {
        let pad = cycle.inputs.port(self.port);
        for (axis, label) in GAMEPAD_AXES {
            cycle.dashboard.log_number(label, pad.axis(axis));
        }
        for (button, label) in GAMEPAD_BUTTONS {
            cycle.dashboard.log_flag(label, pad.button(button));
        }
        Ok(())
    }
}
