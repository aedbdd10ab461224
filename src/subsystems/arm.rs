// src/subsystems/arm.rs - Bridge arm guarded by top and bottom limit switches
use crate::dashboard::Dashboard;
use crate::hardware::{DigitalInput, SpeedController};

/// Output used by the up and down commands.
pub const MOTOR_SPEED: f64 = 0.2;
/// Flips the arm if the motor is ever remounted.
pub const MOTOR_DIRECTION: f64 = 1.0;

/// Arm that lowers the bridge. `go_up`/`go_down` refuse to drive into a
/// closed limit, and [`GuardedArm::enforce_limits`] cuts the motor the cycle
/// either switch closes regardless of how the motor was commanded.
pub struct GuardedArm {
    motor: Box<dyn SpeedController>,
    top_limit: Box<dyn DigitalInput>,
    bottom_limit: Box<dyn DigitalInput>,
    limit_hit: bool,
}

impl GuardedArm {
    pub fn new(
        motor: Box<dyn SpeedController>,
        top_limit: Box<dyn DigitalInput>,
        bottom_limit: Box<dyn DigitalInput>,
    ) -> Self {
        let limit_hit = top_limit.get() || bottom_limit.get();
        Self {
            motor,
            top_limit,
            bottom_limit,
            limit_hit,
        }
    }

    pub fn is_at_top(&self) -> bool {
        self.top_limit.get()
    }

    pub fn is_at_bottom(&self) -> bool {
        self.bottom_limit.get()
    }

    pub fn go_up(&mut self) {
        if self.is_at_top() {
            self.motor.set(0.0);
        } else {
            self.motor.set(MOTOR_SPEED * MOTOR_DIRECTION);
        }
    }

    pub fn go_down(&mut self) {
        if self.is_at_bottom() {
            self.motor.set(0.0);
        } else {
            self.motor.set(-MOTOR_SPEED * MOTOR_DIRECTION);
        }
    }

    pub fn stop(&mut self) {
        self.motor.set(0.0);
    }

    /// Raw output. Only [`GuardedArm::enforce_limits`] protects this path.
    pub fn set(&mut self, value: f64) {
        self.motor.set(value);
    }

    pub fn motor_output(&self) -> f64 {
        self.motor.get()
    }

    /// Stops the motor when either switch goes from open to closed. While a
    /// switch stays closed the motor may be driven again so the operator
    /// can back off it; the guard re-arms once both switches open.
    pub fn enforce_limits(&mut self) -> bool {
        let hit = self.is_at_top() || self.is_at_bottom();
        let tripped = hit && !self.limit_hit;
        if tripped {
            tracing::warn!(
                "Arm {} limit reached, stopping motor",
                if self.is_at_top() { "top" } else { "bottom" }
            );
            self.stop();
        }
        self.limit_hit = hit;
        tripped
    }

    pub fn log_status(&self, dashboard: &mut Dashboard) {
        dashboard.log_flag("(ARM) Top limit", self.is_at_top());
        dashboard.log_flag("(ARM) Bottom limit", self.is_at_bottom());
        dashboard.log_number("(ARM) Motor speed", self.motor_output());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::sim::{SimMotor, SimSwitch};

    fn arm() -> (GuardedArm, SimMotor, SimSwitch, SimSwitch) {
        let motor = SimMotor::new();
        let top = SimSwitch::default();
        let bottom = SimSwitch::default();
        let arm = GuardedArm::new(
            Box::new(motor.clone()),
            Box::new(top.clone()),
            Box::new(bottom.clone()),
        );
        (arm, motor, top, bottom)
    }

    #[test]
    fn test_commands_respect_limits() {
        let (mut arm, motor, top, bottom) = arm();
        arm.go_up();
        assert_eq!(motor.get(), 0.2);
        arm.go_down();
        assert_eq!(motor.get(), -0.2);

        top.set(true);
        arm.go_up();
        assert_eq!(motor.get(), 0.0);
        arm.go_down();
        assert_eq!(motor.get(), -0.2);

        top.set(false);
        bottom.set(true);
        arm.go_down();
        assert_eq!(motor.get(), 0.0);
        arm.go_up();
        assert_eq!(motor.get(), 0.2);
    }

    #[test]
    fn test_limit_edge_cuts_raw_output_once() {
        let (mut arm, motor, top, bottom) = arm();
        arm.set(0.7);
        assert!(!arm.enforce_limits());
        assert_eq!(motor.get(), 0.7);

        top.set(true);
        assert!(arm.enforce_limits());
        assert_eq!(motor.get(), 0.0);

        // Still closed: the operator may back off.
        arm.set(-0.4);
        assert!(!arm.enforce_limits());
        assert_eq!(motor.get(), -0.4);

        // Re-arms after both switches open, then catches the bottom.
        top.set(false);
        assert!(!arm.enforce_limits());
        bottom.set(true);
        assert!(arm.enforce_limits());
        assert_eq!(motor.get(), 0.0);
    }

    #[test]
    fn test_starting_on_a_limit_does_not_trip() {
        let motor = SimMotor::new();
        let bottom = SimSwitch::default();
        bottom.set(true);
        let mut arm = GuardedArm::new(
            Box::new(motor.clone()),
            Box::new(SimSwitch::default()),
            Box::new(bottom.clone()),
        );
        arm.set(0.3);
        assert!(!arm.enforce_limits());
        assert_eq!(motor.get(), 0.3);
    }

    #[test]
    fn test_status_on_dashboard() {
        let (mut arm, _, top, _) = arm();
        let mut dashboard = Dashboard::new();
        top.set(true);
        arm.set(0.5);
        arm.log_status(&mut dashboard);
        assert_eq!(dashboard.string("(ARM) Top limit").as_deref(), Some("true"));
        assert_eq!(dashboard.string("(ARM) Bottom limit").as_deref(), Some("false"));
        assert_eq!(dashboard.string("(ARM) Motor speed").as_deref(), Some("0.5"));
    }
}
