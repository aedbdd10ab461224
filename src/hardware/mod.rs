// src/hardware/mod.rs - Hardware abstraction boundary
//
// Everything the robot touches physically goes through these traits. The
// real vendor layer lives outside this crate; `sim` provides an in-process
// implementation for running off-robot and for tests.
pub mod input;
pub mod sim;

use crate::ports::{AnalogChannel, DioChannel, PwmChannel};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::time::{Duration, Instant};

pub use input::{Axis, InputState, Inputs};

/// A motor controller accepting commands in `[-1.0, 1.0]`.
pub trait SpeedController: Send {
    fn set(&mut self, speed: f64);
    fn get(&self) -> f64;
}

/// A quadrature encoder.
pub trait Encoder: Send {
    /// Signed rate in distance units per second.
    fn rate(&self) -> f64;
    /// Cumulative distance since the last reset.
    fn distance(&self) -> f64;
    fn set_distance_per_pulse(&mut self, distance_per_pulse: f64);
    fn reset(&mut self);
}

/// A boolean sensor such as a limit switch.
pub trait DigitalInput: Send {
    fn get(&self) -> bool;
}

/// An analog sensor sampled by the analog breakout.
pub trait AnalogInput: Send {
    /// Oversampled and averaged raw reading, in ADC counts.
    fn average_value(&self) -> i32;
}

/// Which speed controller model is wired to a PWM channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MotorKind {
    Jaguar,
    Victor,
}

impl fmt::Display for MotorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotorKind::Jaguar => write!(f, "Jaguar"),
            MotorKind::Victor => write!(f, "Victor"),
        }
    }
}

/// Match phase as reported by the field controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldMode {
    Disabled,
    Autonomous,
    Teleop,
}

impl fmt::Display for FieldMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldMode::Disabled => write!(f, "disabled"),
            FieldMode::Autonomous => write!(f, "autonomous"),
            FieldMode::Teleop => write!(f, "teleop"),
        }
    }
}

/// The vendor hardware layer: device factories, driver station input,
/// field state and the output kill switch.
pub trait Hal: Send {
    fn speed_controller(&mut self, kind: MotorKind, channel: PwmChannel) -> Box<dyn SpeedController>;
    fn encoder(&mut self, a: DioChannel, b: DioChannel) -> Box<dyn Encoder>;
    fn digital_input(&mut self, channel: DioChannel) -> Box<dyn DigitalInput>;
    fn analog_input(&mut self, channel: AnalogChannel) -> Box<dyn AnalogInput>;

    /// Snapshot of every driver station input device.
    fn poll_inputs(&mut self, elapsed: Duration) -> Inputs;

    /// Current match phase, `None` once the match is over.
    fn field_mode(&mut self, elapsed: Duration) -> Option<FieldMode>;

    /// Advances the physical world by one loop period.
    fn step(&mut self, dt: Duration);

    /// Forces every speed controller to zero.
    fn disable_outputs(&mut self);
}

/// Liveness timer. If the control loop stops feeding it for longer than
/// the expiration window, all outputs must be disabled.
#[derive(Debug, Clone)]
pub struct Watchdog {
    expiration: Duration,
    enabled: bool,
    last_fed: Option<Instant>,
    trips: u64,
}

impl Watchdog {
    pub fn new(expiration: Duration) -> Self {
        Self {
            expiration,
            enabled: false,
            last_fed: None,
            trips: 0,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool, now: Instant) {
        if enabled && !self.enabled {
            self.last_fed = Some(now);
        }
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn expiration(&self) -> Duration {
        self.expiration
    }

    pub fn feed(&mut self, now: Instant) {
        self.last_fed = Some(now);
    }

    /// True when enabled and not fed within the expiration window.
    pub fn is_expired(&self, now: Instant) -> bool {
        match (self.enabled, self.last_fed) {
            (true, Some(last)) => now.saturating_duration_since(last) > self.expiration,
            (true, None) => true,
            (false, _) => false,
        }
    }

    /// Checks for expiry and records a trip. Returns true if the caller
    /// must disable outputs.
    pub fn check(&mut self, now: Instant) -> bool {
        if self.is_expired(now) {
            self.trips += 1;
            tracing::error!(
                "Watchdog expired after {:?} without a feed (trip #{})",
                self.expiration,
                self.trips
            );
            // Re-arm so a single stall reports once.
            self.last_fed = Some(now);
            true
        } else {
            false
        }
    }

    pub fn trips(&self) -> u64 {
        self.trips
    }
}
