// src/controllers/mod.rs - Operator controllers run once per teleop cycle
//
// A controller reads the driver station snapshot and the dashboard, then
// commands one or more components. The robot owns every component and
// lends them to the controllers through `Cycle`.
pub mod arm;
pub mod diagnostics;
pub mod drive;
pub mod elevator;
pub mod pid_drive;
pub mod shooter;
pub mod switcher;

use crate::dashboard::Dashboard;
use crate::drive::{PidDrive, PidError, RobotDrive};
use crate::hardware::Inputs;
use crate::subsystems::{Elevator, GuardedArm, Shooter};
use thiserror::Error;

pub use arm::ArmController;
pub use diagnostics::{EncoderTest, GamepadTest, TestMotor};
pub use drive::{ArcadeJoystick, MinimalistDrive, SafetyMode, TankJoysticks, XboxDrive};
pub use elevator::ElevatorController;
pub use pid_drive::PidDriveController;
pub use shooter::ShooterController;
pub use switcher::ControllerSwitcher;

#[derive(Debug, Error, PartialEq)]
pub enum ControlError {
    #[error("{0} is not installed on this robot")]
    MissingComponent(&'static str),
    #[error("controller index {index} out of range (have {count})")]
    NoSuchController { index: i64, count: usize },
    #[error("PID error: {0}")]
    Pid(#[from] PidError),
}

/// Mechanisms shared between controllers.
#[derive(Default)]
pub struct Components {
    pub robot_drive: Option<RobotDrive>,
    pub pid_drive: Option<PidDrive>,
    pub elevator: Option<Elevator>,
    pub shooter: Option<Shooter>,
    pub arm: Option<GuardedArm>,
}

impl Components {
    pub fn robot_drive(&mut self) -> Result<&mut RobotDrive, ControlError> {
        self.robot_drive
            .as_mut()
            .ok_or(ControlError::MissingComponent("robot drive"))
    }

    pub fn pid_drive(&mut self) -> Result<&mut PidDrive, ControlError> {
        self.pid_drive
            .as_mut()
            .ok_or(ControlError::MissingComponent("PID drive"))
    }

    pub fn elevator(&mut self) -> Result<&mut Elevator, ControlError> {
        self.elevator
            .as_mut()
            .ok_or(ControlError::MissingComponent("elevator"))
    }

    pub fn shooter(&mut self) -> Result<&mut Shooter, ControlError> {
        self.shooter
            .as_mut()
            .ok_or(ControlError::MissingComponent("shooter"))
    }

    pub fn arm(&mut self) -> Result<&mut GuardedArm, ControlError> {
        self.arm.as_mut().ok_or(ControlError::MissingComponent("arm"))
    }

    /// Brings every drive to a standstill.
    pub fn stop_drives(&mut self, dashboard: &mut Dashboard) {
        if let Some(drive) = self.robot_drive.as_mut() {
            drive.stop();
        }
        if let Some(drive) = self.pid_drive.as_mut() {
            drive.tank_drive(0.0, 0.0, dashboard);
        }
    }
}

/// Everything a controller may touch during one cycle.
pub struct Cycle<'a> {
    pub inputs: &'a Inputs,
    pub dashboard: &'a mut Dashboard,
    pub components: &'a mut Components,
}

pub trait Controller: Send {
    fn name(&self) -> &str;
    fn run(&mut self, cycle: &mut Cycle<'_>) -> Result<(), ControlError>;
}
