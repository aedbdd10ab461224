// src/robot/profiles.rs - Wiring for each robot the team has built
use crate::config::Config;
use crate::controllers::{
    ArcadeJoystick, ArmController, Components, Controller, ControllerSwitcher, ElevatorController,
    EncoderTest, GamepadTest, MinimalistDrive, PidDriveController, SafetyMode, ShooterController,
    TankJoysticks, TestMotor, XboxDrive,
};
use crate::dashboard::Dashboard;
use crate::drive::robot_drive::MotorPosition;
use crate::drive::{PidDrive, PidDriveHardware, PidError, RobotDrive};
use crate::hardware::{Hal, MotorKind};
use crate::ports::{
    ANALOG1, DIO1, DIO10, DIO2, DIO3, DIO4, DIO6, DIO7, DIO8, DIO9, PWM1, PWM10, PWM2, PWM3, PWM4,
    PWM5, PWM6, PWM7, PWM8, PWM9, USB1, USB2, USB3, USB4,
};
use crate::subsystems::{Elevator, GuardedArm, RangeFinder, Shooter, ShooterMotors};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which physical robot the program is wired for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RobotProfile {
    /// Competition robot: open-loop drive, shooter, elevator, bridge arm.
    Main,
    /// Practice chassis for drive and sensor bring-up.
    Prototype,
    /// Closed-loop drive test bed.
    Sideways,
}

impl RobotProfile {
    /// Profile selected by Cargo features at build time.
    pub const fn compiled_default() -> RobotProfile {
        if cfg!(feature = "main-robot") {
            RobotProfile::Main
        } else if cfg!(feature = "prototype-robot") {
            RobotProfile::Prototype
        } else {
            RobotProfile::Sideways
        }
    }

    /// Claims this profile's hardware from `hal` and builds its components
    /// and controllers.
    pub fn build(
        self,
        hal: &mut dyn Hal,
        config: &Config,
        dashboard: &mut Dashboard,
    ) -> Result<Assembly, PidError> {
        let assembly = match self {
            RobotProfile::Main => main_robot(hal, dashboard),
            RobotProfile::Prototype => prototype_robot(hal),
            RobotProfile::Sideways => sideways_robot(hal, config, dashboard)?,
        };
        tracing::info!(
            "{} robot wired: {} controllers",
            self,
            assembly.controllers.len()
        );
        Ok(assembly)
    }
}

impl fmt::Display for RobotProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RobotProfile::Main => write!(f, "main"),
            RobotProfile::Prototype => write!(f, "prototype"),
            RobotProfile::Sideways => write!(f, "sideways"),
        }
    }
}

/// Components and controllers produced by a profile.
pub struct Assembly {
    pub components: Components,
    pub controllers: Vec<Box<dyn Controller>>,
}

fn four_motor_drive(hal: &mut dyn Hal, kind: MotorKind) -> RobotDrive {
    RobotDrive::new(
        hal.speed_controller(kind, PWM1),
        hal.speed_controller(kind, PWM2),
        hal.speed_controller(kind, PWM3),
        hal.speed_controller(kind, PWM4),
    )
}

fn main_robot(hal: &mut dyn Hal, dashboard: &mut Dashboard) -> Assembly {
    let mut drive = four_motor_drive(hal, MotorKind::Jaguar);
    for position in [
        MotorPosition::FrontLeft,
        MotorPosition::RearLeft,
        MotorPosition::FrontRight,
        MotorPosition::RearRight,
    ] {
        drive.set_inverted(position, true);
    }
    let shooter = Shooter::new(
        ShooterMotors {
            top_left: hal.speed_controller(MotorKind::Jaguar, PWM5),
            top_right: hal.speed_controller(MotorKind::Jaguar, PWM6),
            bottom_left: hal.speed_controller(MotorKind::Jaguar, PWM7),
            bottom_right: hal.speed_controller(MotorKind::Jaguar, PWM8),
        },
        RangeFinder::new(hal.analog_input(ANALOG1)),
    );
    let elevator = Elevator::new(
        hal.speed_controller(MotorKind::Jaguar, PWM9),
        hal.digital_input(DIO1),
    );
    let arm = GuardedArm::new(
        hal.speed_controller(MotorKind::Jaguar, PWM10),
        hal.digital_input(DIO3),
        hal.digital_input(DIO2),
    );

    let drive_modes: Vec<Box<dyn Controller>> = vec![
        Box::new(TankJoysticks::new(USB1, USB2)),
        Box::new(SafetyMode::new(TankJoysticks::new(USB1, USB2), USB3)),
        Box::new(ArcadeJoystick::new(USB3)),
        Box::new(MinimalistDrive),
        Box::new(XboxDrive::new(USB4)),
    ];
    Assembly {
        components: Components {
            robot_drive: Some(drive),
            elevator: Some(elevator),
            shooter: Some(shooter),
            arm: Some(arm),
            ..Components::default()
        },
        controllers: vec![
            Box::new(ControllerSwitcher::new(dashboard, drive_modes)),
            Box::new(ShooterController::new(dashboard, USB3)),
            Box::new(ElevatorController::new(USB3)),
            Box::new(ArmController::new(dashboard, USB1)),
        ],
    }
}

fn prototype_robot(hal: &mut dyn Hal) -> Assembly {
    let drive = four_motor_drive(hal, MotorKind::Victor);
    let elevator_motor = hal.speed_controller(MotorKind::Victor, PWM5);
    let left_encoder = hal.encoder(DIO9, DIO10);
    let right_encoder = hal.encoder(DIO2, DIO4);
    Assembly {
        components: Components {
            robot_drive: Some(drive),
            ..Components::default()
        },
        controllers: vec![
            Box::new(XboxDrive::new(USB1)),
            Box::new(TestMotor::new(USB2, elevator_motor, "Elevator motor")),
            Box::new(EncoderTest::new(left_encoder, right_encoder)),
            Box::new(GamepadTest::new(USB1)),
        ],
    }
}

fn sideways_robot(
    hal: &mut dyn Hal,
    config: &Config,
    dashboard: &mut Dashboard,
) -> Result<Assembly, PidError> {
    let hardware = PidDriveHardware {
        left_front: hal.speed_controller(MotorKind::Jaguar, PWM1),
        left_back: hal.speed_controller(MotorKind::Jaguar, PWM2),
        right_front: hal.speed_controller(MotorKind::Jaguar, PWM3),
        right_back: hal.speed_controller(MotorKind::Jaguar, PWM4),
        left_encoder: hal.encoder(DIO6, DIO7),
        right_encoder: hal.encoder(DIO8, DIO9),
    };
    let pid = &config.pid;
    let pid_drive = PidDrive::new(
        hardware,
        pid.left,
        pid.right,
        pid.initial_distance_per_pulse,
        pid.invert_encoders,
    )?;
    let controller = PidDriveController::new(
        dashboard,
        USB1,
        pid.left,
        pid.right,
        pid.tuning_distance_per_pulse,
    );
    Ok(Assembly {
        components: Components {
            pid_drive: Some(pid_drive),
            ..Components::default()
        },
        controllers: vec![Box::new(controller)],
    })
}
