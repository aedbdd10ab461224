// src/controllers/shooter.rs - Twist joystick control of the shooter
use super::{ControlError, Controller, Cycle};
use crate::dashboard::Dashboard;
use crate::hardware::input::joystick;
use crate::hardware::{Axis, InputState};
use crate::ports::UsbPort;

/// Preset buttons in priority order with their dashboard fields and defaults.
const PRESETS: [(u8, &str, f64); 3] = [
    (joystick::SHOOTER_PRESET_1, "(SHOOTER) Preset 1 <<", 0.24),
    (joystick::SHOOTER_PRESET_2, "(SHOOTER) Preset 2 <<", 0.39),
    (joystick::SHOOTER_PRESET_3, "(SHOOTER) Preset 3 <<", 0.5),
];

/// Shooter modes, checked in order each cycle:
///
/// * a preset button spins the wheels at that preset's dashboard value
///   (a negative preset disables its button)
/// * button 2 spins them at the twist axis
/// * the trigger aims from the rangefinder
/// * otherwise the wheels stop
pub struct ShooterController {
    port: UsbPort,
}

impl ShooterController {
    pub fn new(dashboard: &mut Dashboard, port: UsbPort) -> Self {
        for (_, label, default) in PRESETS {
            dashboard.put_string(label, &default.to_string());
        }
        dashboard.log_number("(SHOOTER) Preset", 0.0);
        Self { port }
    }

    fn pressed_preset(stick: &InputState, dashboard: &mut Dashboard) -> Option<f64> {
        PRESETS
            .iter()
            .find(|(button, _, _)| stick.button(*button))
            .map(|(_, label, default)| dashboard.number(label, *default))
    }
}

impl Controller for ShooterController {
    fn name(&self) -> &str {
        "shooter"
    }

    fn run(&mut self, cycle: &mut Cycle<'_>) -> Result<(), ControlError> {
        let stick = *cycle.inputs.port(self.port);
        let throttle = stick.axis(Axis::Twist);
        let dashboard = &mut *cycle.dashboard;
        dashboard.log_number("(SHOOTER) Speed Factor", throttle);

        let shooter = cycle.components.shooter()?;
        dashboard.log_number("(ULTRASOUND) Distance", shooter.range_finder().from_wall_inches());
        dashboard.log_flag("(ULTRASOUND) In range", shooter.range_finder().is_in_shooting_range());

        if let Some(preset) = Self::pressed_preset(&stick, dashboard) {
            if preset >= 0.0 {
                shooter.set_speed_manually(preset);
                dashboard.log_number("(SHOOTER) Preset", preset);
            }
        } else if stick.button(joystick::SHOOTER_MANUAL) {
            shooter.set_speed_manually(throttle);
            dashboard.log_number("(SHOOTER) Manual", throttle);
        } else if stick.button(joystick::TRIGGER) {
            match shooter.set_speed_automatically() {
                Some(speed) => dashboard.log_number("(SHOOTER) Calculated", speed),
                None => dashboard.log_text("(SHOOTER) Calculated", "out of reach"),
            }
        } else {
            shooter.stop();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::Components;
    use crate::dashboard::Entry;
    use crate::hardware::sim::{SimAnalog, SimMotor};
    use crate::hardware::Inputs;
    use crate::ports::USB3;
    use crate::subsystems::{RangeFinder, Shooter, ShooterMotors};

    fn components() -> (Components, SimMotor, SimAnalog) {
        let bottom_right = SimMotor::new();
        let ultrasound = SimAnalog::default();
        let shooter = Shooter::new(
            ShooterMotors {
                top_left: Box::new(SimMotor::new()),
                top_right: Box::new(SimMotor::new()),
                bottom_left: Box::new(SimMotor::new()),
                bottom_right: Box::new(bottom_right.clone()),
            },
            RangeFinder::new(Box::new(ultrasound.clone())),
        );
        let components = Components {
            shooter: Some(shooter),
            ..Components::default()
        };
        (components, bottom_right, ultrasound)
    }

    fn run(
        controller: &mut ShooterController,
        components: &mut Components,
        dashboard: &mut Dashboard,
        stick: InputState,
    ) {
        let inputs = Inputs::default().with_port(USB3, stick);
        let mut cycle = Cycle {
            inputs: &inputs,
            dashboard,
            components,
        };
        controller.run(&mut cycle).unwrap();
    }

    #[test]
    fn test_presets_manual_and_idle() {
        let (mut components, wheel, _) = components();
        let mut dashboard = Dashboard::new();
        let mut controller = ShooterController::new(&mut dashboard, USB3);
        assert_eq!(dashboard.string("(SHOOTER) Preset 2 <<").as_deref(), Some("0.39"));

        let twist = InputState::default().with_axis(Axis::Twist, 0.7);
        run(&mut controller, &mut components, &mut dashboard, twist.with_button(joystick::SHOOTER_PRESET_2));
        assert_eq!(wheel.get(), 0.39);
        assert_eq!(dashboard.get("(SHOOTER) Preset"), Some(&Entry::Number(0.39)));

        // Preset 1 wins when several are held.
        let both = twist
            .with_button(joystick::SHOOTER_PRESET_3)
            .with_button(joystick::SHOOTER_PRESET_1);
        run(&mut controller, &mut components, &mut dashboard, both);
        assert_eq!(wheel.get(), 0.24);

        run(&mut controller, &mut components, &mut dashboard, twist.with_button(joystick::SHOOTER_MANUAL));
        assert_eq!(wheel.get(), 0.7);
        assert_eq!(dashboard.get("(SHOOTER) Speed Factor"), Some(&Entry::Number(0.7)));

        run(&mut controller, &mut components, &mut dashboard, twist);
        assert_eq!(wheel.get(), 0.0);
    }

    #[test]
    fn test_dashboard_preset_edits() {
        let (mut components, wheel, _) = components();
        let mut dashboard = Dashboard::new();
        let mut controller = ShooterController::new(&mut dashboard, USB3);
        let preset_3 = InputState::default().with_button(joystick::SHOOTER_PRESET_3);

        dashboard.apply_command("(SHOOTER) Preset 3 << = 0.8").unwrap();
        run(&mut controller, &mut components, &mut dashboard, preset_3);
        assert_eq!(wheel.get(), 0.8);

        // A negative preset leaves the wheels as they were.
        dashboard.apply_command("(SHOOTER) Preset 3 << = -1").unwrap();
        run(&mut controller, &mut components, &mut dashboard, preset_3);
        assert_eq!(wheel.get(), 0.8);
    }

    #[test]
    fn test_trigger_aims_from_range() {
        let (mut components, wheel, ultrasound) = components();
        let mut dashboard = Dashboard::new();
        let mut controller = ShooterController::new(&mut dashboard, USB3);
        let trigger = InputState::default().with_button(joystick::TRIGGER);

        ultrasound.set(288);
        run(&mut controller, &mut components, &mut dashboard, trigger);
        assert!(wheel.get() > 0.8 && wheel.get() < 0.9);
        assert_eq!(dashboard.get("(ULTRASOUND) Distance"), Some(&Entry::Number(144.0)));
        assert_eq!(dashboard.get("(ULTRASOUND) In range"), Some(&Entry::Flag(true)));

        ultrasound.set(40);
        run(&mut controller, &mut components, &mut dashboard, trigger);
        assert_eq!(wheel.get(), 0.0);
        assert_eq!(
            dashboard.get("(SHOOTER) Calculated"),
            Some(&Entry::Text("out of reach".to_string()))
        );
    }

    #[test]
    fn test_missing_shooter_is_reported() {
        let mut components = Components::default();
        let mut dashboard = Dashboard::new();
        let mut controller = ShooterController::new(&mut dashboard, USB3);
        let inputs = Inputs::default();
        let mut cycle = Cycle {
            inputs: &inputs,
            dashboard: &mut dashboard,
            components: &mut components,
        };
        assert_eq!(
            controller.run(&mut cycle),
            Err(ControlError::MissingComponent("shooter"))
        );
    }
}
