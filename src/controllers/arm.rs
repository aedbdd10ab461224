// src/controllers/arm.rs - Joystick buttons for the bridge arm
use super::{ControlError, Controller, Cycle};
use crate::dashboard::Dashboard;
use crate::hardware::input::joystick;
use crate::ports::UsbPort;

pub const RAW_POWER_LABEL: &str = "(ARM) Raw power <<";

/// Button 3 raises the arm and button 4 lowers it, both stopping at the
/// limits. Holding 5 and 6 together drives it at the dashboard raw power
/// for manual recovery. The limit guard runs after every command.
pub struct ArmController {
    port: UsbPort,
}

impl ArmController {
    pub fn new(dashboard: &mut Dashboard, port: UsbPort) -> Self {
        dashboard.put_string(RAW_POWER_LABEL, "0");
        Self { port }
    }
}

impl Controller for ArmController {
    fn name(&self) -> &str {
        "arm"
    }

    fn run(&mut self, cycle: &mut Cycle<'_>) -> Result<(), ControlError> {
        let stick = *cycle.inputs.port(self.port);
        let arm = cycle.components.arm()?;
        let (raw_a, raw_b) = joystick::ARM_RAW;
        if stick.button(joystick::ARM_UP) {
            arm.go_up();
        } else if stick.button(joystick::ARM_DOWN) {
            arm.go_down();
        } else if stick.button(raw_a) && stick.button(raw_b) {
            arm.set(cycle.dashboard.number(RAW_POWER_LABEL, 0.0));
        } else {
            arm.stop();
        }
        arm.enforce_limits();
        arm.log_status(cycle.dashboard);
        Ok(())
    }
}
