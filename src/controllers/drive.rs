// src/controllers/drive.rs - Open-loop driving from joysticks and gamepads
use super::{ControlError, Controller, Cycle};
use crate::drive::{DriveSpeed, Shaper};
use crate::hardware::input::joystick;
use crate::hardware::Axis;
use crate::ports::UsbPort;
use crate::tools::coerce;

pub const SPEED_FACTOR_MIN: f64 = 0.3;
pub const SPEED_FACTOR_MAX: f64 = 1.0;

/// Maps a throttle lever onto the speed factor range. Lever forward (-1)
/// is full speed.
pub fn speed_factor(lever: f64) -> f64 {
    coerce(-lever, -1.0, 1.0, SPEED_FACTOR_MIN, SPEED_FACTOR_MAX)
}

fn shaped(cycle: &mut Cycle<'_>, speed: DriveSpeed) -> DriveSpeed {
    match Shaper::current(cycle.dashboard) {
        Some(curve) => speed.map(|v| curve.apply(v)),
        None => DriveSpeed::STOPPED,
    }
}

/// Tank drive with one flight joystick per side.
///
/// Pipeline per cycle: orientation, shaping, throttle speed factor,
/// optional straightening, truncation.
pub struct TankJoysticks {
    left: UsbPort,
    right: UsbPort,
    reversed: bool,
}

impl TankJoysticks {
    pub fn new(left: UsbPort, right: UsbPort) -> Self {
        Self {
            left,
            right,
            reversed: false,
        }
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    /// Computes this cycle's command without touching the drive.
    pub fn drive_speed(&mut self, cycle: &mut Cycle<'_>) -> DriveSpeed {
        let left = *cycle.inputs.port(self.left);
        let right = *cycle.inputs.port(self.right);
        let mut speed = DriveSpeed::new(left.axis(Axis::Y), right.axis(Axis::Y));

        if right.button(joystick::ORIENTATION_NORMAL) {
            self.reversed = false;
        } else if right.button(joystick::ORIENTATION_REVERSED) {
            self.reversed = true;
        }
        if self.reversed {
            speed = speed.reversed();
        }
        cycle.dashboard.log_text(
            "(TANK DRIVE) Driving orientation",
            if self.reversed { "Reversed" } else { "Normal" },
        );

        speed = shaped(cycle, speed);

        let factor = speed_factor(left.axis(Axis::Throttle));
        speed = speed.scaled(factor);
        cycle.dashboard.log_number("(TANK DRIVE) Speed factor", factor);

        if left.button(joystick::STRAIGHTEN) || right.button(joystick::STRAIGHTEN) {
            speed = speed.straightened();
        }
        let speed = speed.truncated();

        cycle.dashboard.log_number("(TANK DRIVE) Left speed", speed.left);
        cycle.dashboard.log_number("(TANK DRIVE) Right speed", speed.right);
        speed
    }
}

impl Controller for TankJoysticks {
    fn name(&self) -> &str {
        "tank joysticks"
    }

    fn run(&mut self, cycle: &mut Cycle<'_>) -> Result<(), ControlError> {
        let speed = self.drive_speed(cycle);
        cycle.components.robot_drive()?.tank_drive(speed.left, speed.right);
        Ok(())
    }
}

/// Arcade drive from a single twist joystick.
pub struct ArcadeJoystick {
    port: UsbPort,
}

impl ArcadeJoystick {
    pub fn new(port: UsbPort) -> Self {
        Self { port }
    }
}

impl Controller for ArcadeJoystick {
    fn name(&self) -> &str {
        "arcade joystick"
    }

    fn run(&mut self, cycle: &mut Cycle<'_>) -> Result<(), ControlError> {
        let stick = *cycle.inputs.port(self.port);
        let raw = DriveSpeed::new(stick.axis(Axis::Y), -stick.axis(Axis::Z));
        // left carries speed, right carries rotation
        let factor = speed_factor(stick.axis(Axis::Twist));
        let command = shaped(cycle, raw).scaled(factor);

        cycle.dashboard.log_number("(ARCADE DRIVE) Rotate", command.right);
        cycle.dashboard.log_number("(ARCADE DRIVE) Speed", command.left);
        cycle.dashboard.log_number("(ARCADE DRIVE) Speed factor", factor);

        cycle.components.robot_drive()?.arcade_drive(command.left, command.right);
        Ok(())
    }
}

/// Arcade drive from an Xbox pad: left stick moves, right stick turns.
pub struct XboxDrive {
    port: UsbPort,
}

impl XboxDrive {
    pub fn new(port: UsbPort) -> Self {
        Self { port }
    }
}

impl Controller for XboxDrive {
    fn name(&self) -> &str {
        "xbox drive"
    }

    fn run(&mut self, cycle: &mut Cycle<'_>) -> Result<(), ControlError> {
        let pad = cycle.inputs.port(self.port);
        let movement = pad.axis(Axis::LeftY);
        let rotation = pad.axis(Axis::RightX);
        cycle.components.robot_drive()?.arcade_drive(movement, rotation);
        Ok(())
    }
}

/// Holds the robot still while keeping the loop alive.
#[derive(Default)]
pub struct MinimalistDrive;

impl Controller for MinimalistDrive {
    fn name(&self) -> &str {
        "minimalist drive"
    }

    fn run(&mut self, cycle: &mut Cycle<'_>) -> Result<(), ControlError> {
        cycle.components.robot_drive()?.tank_drive(0.0, 0.0);
        Ok(())
    }
}

/// Tank drive gated by a second operator: the robot only moves while the
/// safety joystick's trigger and button 3 are both held.
pub struct SafetyMode {
    safety: UsbPort,
    tank: TankJoysticks,
}

impl SafetyMode {
    pub fn new(tank: TankJoysticks, safety: UsbPort) -> Self {
        Self { safety, tank }
    }
}

impl Controller for SafetyMode {
    fn name(&self) -> &str {
        "safety mode"
    }

    fn run(&mut self, cycle: &mut Cycle<'_>) -> Result<(), ControlError> {
        let safety = cycle.inputs.port(self.safety);
        let is_safe = safety.button(joystick::TRIGGER) && safety.button(joystick::STRAIGHTEN);
        cycle.dashboard.log_flag("(SAFETY MODE) Enabled", is_safe);
        if is_safe {
            self.tank.run(cycle)
        } else {
            cycle.components.robot_drive()?.stop();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::Components;
    use crate::dashboard::Dashboard;
    use crate::drive::RobotDrive;
    use crate::drive::shaping::{self, SHAPING_LABEL};
    use crate::hardware::sim::SimMotor;
    use crate::hardware::{InputState, Inputs};
    use crate::ports::{USB1, USB2, USB3};

    fn components() -> (Components, SimMotor, SimMotor) {
        let left = SimMotor::new();
        let right = SimMotor::new();
        let mut drive = RobotDrive::new(
            Box::new(left.clone()),
            Box::new(SimMotor::new()),
            Box::new(right.clone()),
            Box::new(SimMotor::new()),
        );
        drive.set_squared_inputs(false);
        let components = Components {
            robot_drive: Some(drive),
            ..Components::default()
        };
        (components, left, right)
    }

    fn dashboard(mode: i64) -> Dashboard {
        let mut dashboard = Dashboard::new();
        Shaper::register(&mut dashboard, mode, 0.94, 0.28);
        dashboard
    }

    fn sticks(left: InputState, right: InputState) -> Inputs {
        Inputs::default().with_port(USB1, left).with_port(USB2, right)
    }

    #[test]
    fn test_speed_factor_range() {
        assert_eq!(speed_factor(-1.0), 1.0);
        assert_eq!(speed_factor(1.0), 0.3);
        assert!((speed_factor(0.0) - 0.65).abs() < 1e-12);
    }

    #[test]
    fn test_tank_pipeline() {
        let (mut components, left_motor, right_motor) = components();
        let mut dashboard = dashboard(0);
        let full_throttle = InputState::default().with_axis(Axis::Throttle, -1.0);
        let inputs = sticks(
            full_throttle.with_axis(Axis::Y, 1.0),
            InputState::default().with_axis(Axis::Y, -0.5),
        );
        let mut tank = TankJoysticks::new(USB1, USB2);
        let mut cycle = Cycle {
            inputs: &inputs,
            dashboard: &mut dashboard,
            components: &mut components,
        };
        tank.run(&mut cycle).unwrap();
        // -0.5 squared is -0.25, then truncation lifts it towards 0.3..1
        let expected = -coerce(0.25, 0.05, 1.0, 0.3, 1.0);
        assert_eq!(left_motor.get(), 1.0);
        assert!((-right_motor.get() - expected).abs() < 1e-9);
        assert_eq!(dashboard.number("(TANK DRIVE) Speed factor", 0.0), 1.0);
    }

    #[test]
    fn test_tank_reverse_latches_and_straighten() {
        let (mut components, left_motor, right_motor) = components();
        let mut dashboard = dashboard(1);
        let mut tank = TankJoysticks::new(USB1, USB2);
        let left = InputState::default()
            .with_axis(Axis::Throttle, -1.0)
            .with_axis(Axis::Y, 1.0);
        let reverse = sticks(left, InputState::default().with_button(joystick::ORIENTATION_REVERSED));
        let mut cycle = Cycle {
            inputs: &reverse,
            dashboard: &mut dashboard,
            components: &mut components,
        };
        tank.run(&mut cycle).unwrap();
        assert!(tank.is_reversed());
        // Reversed: left side gets minus the right stick, right side minus the left
        assert_eq!(left_motor.get(), 0.0);
        assert!((right_motor.get() - 1.0).abs() < 1e-9);

        let straight = sticks(left.with_button(joystick::STRAIGHTEN), InputState::default());
        let mut cycle = Cycle {
            inputs: &straight,
            dashboard: &mut dashboard,
            components: &mut components,
        };
        tank.run(&mut cycle).unwrap();
        assert!(tank.is_reversed());
        assert!((left_motor.get() + right_motor.get()).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_shaping_mode_stops() {
        let (mut components, left_motor, _) = components();
        let mut dashboard = dashboard(0);
        dashboard.put_string(SHAPING_LABEL, "9");
        let inputs = sticks(InputState::default().with_axis(Axis::Y, 1.0), InputState::default());
        let mut cycle = Cycle {
            inputs: &inputs,
            dashboard: &mut dashboard,
            components: &mut components,
        };
        TankJoysticks::new(USB1, USB2).run(&mut cycle).unwrap();
        assert_eq!(left_motor.get(), 0.0);
    }

    #[test]
    fn test_safety_mode_requires_both_buttons() {
        let (mut components, left_motor, _) = components();
        let mut dashboard = dashboard(0);
        let mut safety = SafetyMode::new(TankJoysticks::new(USB1, USB2), USB3);
        let left = InputState::default()
            .with_axis(Axis::Throttle, -1.0)
            .with_axis(Axis::Y, 1.0);
        let trigger_only = sticks(left, InputState::default())
            .with_port(USB3, InputState::default().with_button(joystick::TRIGGER));
        let mut cycle = Cycle {
            inputs: &trigger_only,
            dashboard: &mut dashboard,
            components: &mut components,
        };
        safety.run(&mut cycle).unwrap();
        assert_eq!(left_motor.get(), 0.0);

        let both = trigger_only.with_port(
            USB3,
            InputState::default()
                .with_button(joystick::TRIGGER)
                .with_button(joystick::STRAIGHTEN),
        );
        let mut cycle = Cycle {
            inputs: &both,
            dashboard: &mut dashboard,
            components: &mut components,
        };
        safety.run(&mut cycle).unwrap();
        assert_eq!(left_motor.get(), 1.0);
    }

    #[test]
    fn test_arcade_and_xbox() {
        let (mut components, left_motor, right_motor) = components();
        let mut dashboard = dashboard(0);
        let stick = InputState::default()
            .with_axis(Axis::Y, 1.0)
            .with_axis(Axis::Twist, -1.0);
        let inputs = Inputs::default().with_port(USB3, stick);
        let mut cycle = Cycle {
            inputs: &inputs,
            dashboard: &mut dashboard,
            components: &mut components,
        };
        ArcadeJoystick::new(USB3).run(&mut cycle).unwrap();
        assert_eq!(left_motor.get(), 1.0);
        assert_eq!(right_motor.get(), -1.0);

        let pad = Inputs::default().with_port(USB1, InputState::default().with_axis(Axis::RightX, 0.5));
        let mut cycle = Cycle {
            inputs: &pad,
            dashboard: &mut dashboard,
            components: &mut components,
        };
        XboxDrive::new(USB1).run(&mut cycle).unwrap();
        assert_eq!(left_motor.get(), -0.5);
        assert_eq!(right_motor.get(), -0.5);
        assert_eq!(shaping::square(-0.5), -0.25);
    }

    #[test]
    fn test_missing_drive_is_an_error() {
        let mut components = Components::default();
        let mut dashboard = Dashboard::new();
        let inputs = Inputs::default();
        let mut cycle = Cycle {
            inputs: &inputs,
            dashboard: &mut dashboard,
            components: &mut components,
        };
        assert_eq!(
            MinimalistDrive.run(&mut cycle),
            Err(ControlError::MissingComponent("robot drive"))
        );
    }
}
