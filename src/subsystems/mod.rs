// src/subsystems/mod.rs - Mechanisms other than the drivetrain
pub mod arm;
pub mod elevator;
pub mod shooter;

pub use arm::GuardedArm;
pub use elevator::Elevator;
pub use shooter::{RangeFinder, Shooter, ShooterMotors};
