// src/drive/pid_drive.rs - Closed-loop tank drive
use super::filters::DriveSpeed;
use super::pid::{INCREMENT_LIMIT, PidController, PidError, PidGains, PidLoop, Tread};
use crate::dashboard::Dashboard;
use crate::hardware::{Encoder, SpeedController};
use std::fmt;
use std::str::FromStr;

/// Stick inputs closer to zero than this are treated as zero.
pub const DEADBAND: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriveState {
    #[default]
    Manual,
    Straight,
    Halt,
}

impl FromStr for DriveState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(DriveState::Manual),
            "straight" => Ok(DriveState::Straight),
            "halt" => Ok(DriveState::Halt),
            other => Err(format!("unknown drive state '{}'", other)),
        }
    }
}

impl fmt::Display for DriveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriveState::Manual => write!(f, "Manual"),
            DriveState::Straight => write!(f, "Straight"),
            DriveState::Halt => write!(f, "Halt"),
        }
    }
}

/// Motors and encoders for a closed-loop drive.
pub struct PidDriveHardware {
    pub left_front: Box<dyn SpeedController>,
    pub left_back: Box<dyn SpeedController>,
    pub right_front: Box<dyn SpeedController>,
    pub right_back: Box<dyn SpeedController>,
    pub left_encoder: Box<dyn Encoder>,
    pub right_encoder: Box<dyn Encoder>,
}

/// Two independent velocity loops, one per side, selected between manual,
/// straight and halt behavior.
pub struct PidDrive {
    left: PidLoop,
    right: PidLoop,
    state: DriveState,
}

impl PidDrive {
    /// Builds both loops with the given gains, the small increment output
    /// range and the given encoder calibration, then enables them.
    pub fn new(
        hardware: PidDriveHardware,
        left_gains: PidGains,
        right_gains: PidGains,
        distance_per_pulse: f64,
        invert_encoders: bool,
    ) -> Result<Self, PidError> {
        let build = |gains: PidGains,
                     front: Box<dyn SpeedController>,
                     back: Box<dyn SpeedController>,
                     encoder: Box<dyn Encoder>|
         -> Result<PidLoop, PidError> {
            let mut controller = PidController::new(gains);
            controller.set_output_range(-INCREMENT_LIMIT, INCREMENT_LIMIT)?;
            Ok(PidLoop::new(controller, encoder, invert_encoders, Tread::new(front, back)))
        };
        let left = build(left_gains, hardware.left_front, hardware.left_back, hardware.left_encoder)?;
        let right = build(right_gains, hardware.right_front, hardware.right_back, hardware.right_encoder)?;
        let mut drive = Self {
            left,
            right,
            state: DriveState::Manual,
        };
        drive.calibrate_encoders(distance_per_pulse, distance_per_pulse);
        drive.enable();
        tracing::info!(
            "PID drive ready: left {:?}, right {:?}, {} per pulse",
            left_gains,
            right_gains,
            distance_per_pulse
        );
        Ok(drive)
    }

    pub fn enable(&mut self) {
        self.left.controller.enable();
        self.right.controller.enable();
    }

    pub fn disable(&mut self) {
        self.left.controller.disable();
        self.right.controller.disable();
    }

    pub fn is_enabled(&self) -> bool {
        self.left.controller.is_enabled() && self.right.controller.is_enabled()
    }

    /// Applies new gains: disable, set gains and continuous mode, re-enable.
    pub fn tune(&mut self, left: PidGains, right: PidGains) -> Result<(), PidError> {
        self.disable();
        let applied = self
            .left
            .controller
            .set_gains(left)
            .and_then(|()| self.right.controller.set_gains(right));
        self.left.controller.set_continuous(true);
        self.right.controller.set_continuous(true);
        self.enable();
        applied?;
        tracing::debug!("PID drive tuned: left {:?}, right {:?}", left, right);
        Ok(())
    }

    pub fn gains(&self) -> (PidGains, PidGains) {
        (self.left.controller.gains(), self.right.controller.gains())
    }

    pub fn calibrate_encoders(&mut self, left: f64, right: f64) {
        self.left.set_distance_per_pulse(left);
        self.right.set_distance_per_pulse(right);
    }

    pub fn set_state(&mut self, state: DriveState) {
        if state != self.state {
            tracing::info!("PID drive state {} -> {}", self.state, state);
        }
        self.state = state;
    }

    pub fn state(&self) -> DriveState {
        self.state
    }

    /// Current (left, right) setpoints.
    pub fn setpoints(&self) -> DriveSpeed {
        DriveSpeed::new(self.left.controller.setpoint(), self.right.controller.setpoint())
    }

    /// Sets both setpoints from stick input according to the drive state,
    /// runs one iteration of each loop, and publishes the result.
    pub fn tank_drive(&mut self, left: f64, right: f64, dashboard: &mut Dashboard) {
        let input = DriveSpeed::new(left, right).deadbanded(DEADBAND);
        let setpoint = match self.state {
            DriveState::Manual => input,
            DriveState::Straight => input.straightened(),
            DriveState::Halt => DriveSpeed::STOPPED,
        };
        self.left.controller.set_setpoint(setpoint.left);
        self.right.controller.set_setpoint(setpoint.right);

        let left_output = self.left.step();
        let right_output = self.right.step();

        dashboard.log_text("Current PID Drive state", self.state.to_string());
        dashboard.log_number("Input left", setpoint.left);
        dashboard.log_number("Input right", setpoint.right);
        dashboard.log_number("Output left", left_output);
        dashboard.log_number("Output right", right_output);
        dashboard.log_number("Left Encoder Rate", self.left.rate());
        dashboard.log_number("Right Encoder Rate", self.right.rate());
        dashboard.log_number("Tread left", self.left.tread_output());
        dashboard.log_number("Tread right", self.right.tread_output());
    }

    /// Current (left, right) tread outputs.
    pub fn tread_outputs(&self) -> DriveSpeed {
        DriveSpeed::new(self.left.tread_output(), self.right.tread_output())
    }

    pub fn distances(&self) -> (f64, f64) {
        (self.left.distance(), self.right.distance())
    }
}
