// src/subsystems/shooter.rs - Four-wheel ball shooter and its ultrasound rangefinder
use crate::hardware::{AnalogInput, SpeedController};
use crate::tools::limit;

/// Inches per raw ultrasound count, from bench measurements.
pub const INCHES_PER_COUNT: f64 = 0.5;
/// Distance band from the wall that counts as standing in the key.
pub const SHOOTING_RANGE_INCHES: (f64, f64) = (140.0, 200.0);

/// Launch geometry, in inches and degrees.
pub const SHOOTER_ANGLE_DEGREES: f64 = 45.0;
pub const SHOOTER_HEIGHT: f64 = 50.0;
pub const BASKET_HEIGHT: f64 = 98.0;
/// Inches per second squared.
pub const GRAVITY: f64 = 386.4;
/// Ball exit velocity at full wheel speed, inches per second.
pub const MAX_INITIAL_VELOCITY: f64 = 336.0;
/// The top wheels spin slower than the bottom ones to put backspin on the ball.
pub const REDUCTION_FACTOR: f64 = 0.9;

/// Ultrasound sensor pointed at the driver station wall.
pub struct RangeFinder {
    sensor: Box<dyn AnalogInput>,
}

impl RangeFinder {
    pub fn new(sensor: Box<dyn AnalogInput>) -> Self {
        Self { sensor }
    }

    pub fn from_wall_raw(&self) -> i32 {
        self.sensor.average_value()
    }

    pub fn from_wall_inches(&self) -> f64 {
        f64::from(self.from_wall_raw()) * INCHES_PER_COUNT
    }

    /// Roughly inside the key. A robot at a sharp angle to the wall reads
    /// long.
    pub fn is_in_shooting_range(&self) -> bool {
        let (min, max) = SHOOTING_RANGE_INCHES;
        (min..=max).contains(&self.from_wall_inches())
    }
}

/// Wheel output needed to put a ball through the basket from `distance`
/// inches away, or `None` when no launch speed at the fixed angle reaches it.
///
/// Solves `h = d tan(a) - g d^2 / (2 v^2 cos^2(a))` for `v` and scales by
/// [`MAX_INITIAL_VELOCITY`]; speeds beyond the wheels' reach saturate at 1.0.
pub fn calculate_speed(distance: f64) -> Option<f64> {
    let height = BASKET_HEIGHT - SHOOTER_HEIGHT;
    let angle = SHOOTER_ANGLE_DEGREES.to_radians();
    let rise = distance * angle.tan() - height;
    if !distance.is_finite() || distance <= 0.0 || rise <= 0.0 {
        return None;
    }
    let velocity = (GRAVITY * distance * distance / (2.0 * rise * angle.cos().powi(2))).sqrt();
    Some(limit(velocity / MAX_INITIAL_VELOCITY, 0.0, 1.0))
}

pub struct ShooterMotors {
    pub top_left: Box<dyn SpeedController>,
    pub top_right: Box<dyn SpeedController>,
    pub bottom_left: Box<dyn SpeedController>,
    pub bottom_right: Box<dyn SpeedController>,
}

/// Two pairs of counter-rotating wheels. Left and right motors face each
/// other, so one of each pair runs reversed.
pub struct Shooter {
    motors: ShooterMotors,
    range_finder: RangeFinder,
}

impl Shooter {
    pub fn new(motors: ShooterMotors, range_finder: RangeFinder) -> Self {
        Self {
            motors,
            range_finder,
        }
    }

    pub fn range_finder(&self) -> &RangeFinder {
        &self.range_finder
    }

    /// Spins the wheels at `speed`, with the top pair slowed for backspin.
    pub fn set_speed_manually(&mut self, speed: f64) {
        let speed = limit(speed, -1.0, 1.0);
        let slow = speed * REDUCTION_FACTOR;
        self.motors.top_left.set(slow);
        self.motors.top_right.set(-slow);
        self.motors.bottom_left.set(-speed);
        self.motors.bottom_right.set(speed);
    }

    /// Aims from the rangefinder distance. Stops the wheels and returns
    /// `None` when the basket cannot be reached from here.
    pub fn set_speed_automatically(&mut self) -> Option<f64> {
        let distance = self.range_finder.from_wall_inches();
        match calculate_speed(distance) {
            Some(speed) => {
                self.set_speed_manually(speed);
                Some(speed)
            }
            None => {
                tracing::debug!("No shot from {:.1} in, holding shooter", distance);
                self.stop();
                None
            }
        }
    }

    pub fn stop(&mut self) {
        self.set_speed_manually(0.0);
    }
}
