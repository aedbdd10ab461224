// src/controllers/pid_drive.rs - Xbox control of the closed-loop drive
use super::{ControlError, Controller, Cycle};
use crate::dashboard::Dashboard;
use crate::drive::{DriveState, PidGains};
use crate::hardware::input::xbox;
use crate::hardware::Axis;
use crate::ports::UsbPort;

pub const STATE_LABEL: &str = "PidDrive state";
pub const LEFT_DISTANCE_LABEL: &str = "Left encoder distance per pulse";
pub const RIGHT_DISTANCE_LABEL: &str = "Right encoder distance per pulse";

/// Dashboard labels for one side's gains.
struct GainLabels {
    p: &'static str,
    i: &'static str,
    d: &'static str,
}

const LEFT_GAINS: GainLabels = GainLabels {
    p: "Left P",
    i: "Left I",
    d: "Left D",
};

const RIGHT_GAINS: GainLabels = GainLabels {
    p: "Right P",
    i: "Right I",
    d: "Right D",
};

impl GainLabels {
    fn publish(&self, dashboard: &mut Dashboard, gains: PidGains) {
        dashboard.put_string(self.p, &format!("{:?}", gains.p));
        dashboard.put_string(self.i, &format!("{:?}", gains.i));
        dashboard.put_string(self.d, &format!("{:?}", gains.d));
    }

    fn read(&self, dashboard: &mut Dashboard, fallback: PidGains) -> PidGains {
        PidGains::new(
            dashboard.number(self.p, fallback.p),
            dashboard.number(self.i, fallback.i),
            dashboard.number(self.d, fallback.d),
        )
    }
}

/// Drives the PID drive from the Xbox sticks.
///
/// Holding A applies the gains and encoder calibration typed on the
/// dashboard. Holding B commands a stop. The drive state follows the
/// `PidDrive state` field, but only when its text changes, so an operator
/// edit is applied once.
pub struct PidDriveController {
    port: UsbPort,
    previous_command: String,
    left_defaults: PidGains,
    right_defaults: PidGains,
    distance_per_pulse: f64,
}

impl PidDriveController {
    pub fn new(
        dashboard: &mut Dashboard,
        port: UsbPort,
        left: PidGains,
        right: PidGains,
        distance_per_pulse: f64,
    ) -> Self {
        dashboard.put_string(STATE_LABEL, "manual");
        LEFT_GAINS.publish(dashboard, left);
        RIGHT_GAINS.publish(dashboard, right);
        let distance = format!("{:?}", distance_per_pulse);
        dashboard.put_string(LEFT_DISTANCE_LABEL, &distance);
        dashboard.put_string(RIGHT_DISTANCE_LABEL, &distance);
        Self {
            port,
            previous_command: "manual".to_string(),
            left_defaults: left,
            right_defaults: right,
            distance_per_pulse,
        }
    }

    fn try_tuning(&mut self, cycle: &mut Cycle<'_>) -> Result<(), ControlError> {
        if !cycle.inputs.port(self.port).button(xbox::A) {
            return Ok(());
        }
        let left = LEFT_GAINS.read(cycle.dashboard, self.left_defaults);
        let right = RIGHT_GAINS.read(cycle.dashboard, self.right_defaults);
        let left_distance = cycle.dashboard.number(LEFT_DISTANCE_LABEL, self.distance_per_pulse);
        let right_distance = cycle.dashboard.number(RIGHT_DISTANCE_LABEL, self.distance_per_pulse);

        let drive = cycle.components.pid_drive()?;
        drive.tune(left, right)?;
        drive.calibrate_encoders(left_distance, right_distance);
        Ok(())
    }

    fn try_set_state(&mut self, cycle: &mut Cycle<'_>) -> Result<(), ControlError> {
        let command = cycle.dashboard.string(STATE_LABEL).unwrap_or_default();
        if command == self.previous_command {
            return Ok(());
        }
        match command.parse::<DriveState>() {
            Ok(state) => cycle.components.pid_drive()?.set_state(state),
            Err(e) => tracing::warn!("Ignoring drive state command: {}", e),
        }
        self.previous_command = command;
        Ok(())
    }
}

impl Controller for PidDriveController {
    fn name(&self) -> &str {
        "PID drive"
    }

    fn run(&mut self, cycle: &mut Cycle<'_>) -> Result<(), ControlError> {
        self.try_tuning(cycle)?;
        self.try_set_state(cycle)?;

        let pad = *cycle.inputs.port(self.port);
        let (left, right) = if pad.button(xbox::B) {
            (0.0, 0.0)
        } else {
            (pad.axis(Axis::LeftY), pad.axis(Axis::RightY))
        };
        cycle.components.pid_drive()?.tank_drive(left, right, cycle.dashboard);
        Ok(())
    }
}
