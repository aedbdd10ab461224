// src/drive/mod.rs - Drivetrain control
pub mod filters;
pub mod pid;
pub mod pid_drive;
pub mod robot_drive;
pub mod shaping;

pub use filters::DriveSpeed;
pub use pid::{PidError, PidGains};
pub use pid_drive::{DriveState, PidDrive, PidDriveHardware};
pub use robot_drive::RobotDrive;
pub use shaping::{Curve, Shaper};
