// src/drive/filters.rs - Per-cycle transforms on a pair of drive commands
use crate::tools::{coerce, limit, sign};
use serde::Serialize;

/// Below this magnitude `truncated` leaves a command untouched.
pub const TRUNCATE_DEADZONE: f64 = 0.05;
/// Smallest command that actually moves the robot.
pub const TRUNCATE_MIN_OUTPUT: f64 = 0.3;

/// Left/right motor commands, normally in `[-1, 1]`. Built fresh each cycle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct DriveSpeed {
    pub left: f64,
    pub right: f64,
}

impl DriveSpeed {
    pub const STOPPED: DriveSpeed = DriveSpeed { left: 0.0, right: 0.0 };

    pub fn new(left: f64, right: f64) -> Self {
        Self { left, right }
    }

    pub fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Self::new(f(self.left), f(self.right))
    }

    pub fn squared(self) -> Self {
        self.map(|v| sign(v) * v * v)
    }

    /// Drives the robot back-first: sides swap and flip sign.
    pub fn reversed(self) -> Self {
        Self::new(-self.right, -self.left)
    }

    pub fn scaled(self, factor: f64) -> Self {
        self.map(|v| v * factor)
    }

    pub fn average(&self) -> f64 {
        (self.left + self.right) / 2.0
    }

    /// Both sides get the average, so the robot tracks straight.
    pub fn straightened(self) -> Self {
        let average = self.average();
        Self::new(average, average)
    }

    /// Lifts commands outside the deadzone into the range that overcomes
    /// drivetrain friction.
    pub fn truncated(self) -> Self {
        self.map(|v| {
            if v.abs() > TRUNCATE_DEADZONE {
                sign(v) * coerce(v.abs(), TRUNCATE_DEADZONE, 1.0, TRUNCATE_MIN_OUTPUT, 1.0)
            } else {
                v
            }
        })
    }

    pub fn deadbanded(self, threshold: f64) -> Self {
        self.map(|v| if v.abs() < threshold { 0.0 } else { v })
    }

    pub fn clamped(self) -> Self {
        self.map(|v| limit(v, -1.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reversed_swaps_and_negates() {
        assert_eq!(DriveSpeed::new(0.2, -0.6).reversed(), DriveSpeed::new(0.6, -0.2));
    }

    #[test]
    fn test_straightened() {
        assert_eq!(DriveSpeed::new(0.6, 0.2).straightened(), DriveSpeed::new(0.4, 0.4));
    }

    #[test]
    fn test_truncated() {
        let speed = DriveSpeed::new(0.04, -1.0).truncated();
        assert_eq!(speed.left, 0.04);
        assert_eq!(speed.right, -1.0);
        let just_over = DriveSpeed::new(0.05 + 1e-9, 0.0).truncated();
        assert!((just_over.left - TRUNCATE_MIN_OUTPUT).abs() < 1e-6);
    }

    #[test]
    fn test_deadbanded() {
        let speed = DriveSpeed::new(0.15, -0.15).deadbanded(0.2);
        assert_eq!(speed, DriveSpeed::STOPPED);
        let speed = DriveSpeed::new(0.25, -0.2).deadbanded(0.2);
        assert_eq!(speed, DriveSpeed::new(0.25, -0.2));
    }

    #[test]
    fn test_squared_and_scaled() {
        let speed = DriveSpeed::new(-0.5, 0.5).squared().scaled(0.5);
        assert_eq!(speed, DriveSpeed::new(-0.125, 0.125));
        assert_eq!(DriveSpeed::new(1.5, -2.0).clamped(), DriveSpeed::new(1.0, -1.0));
    }
}
