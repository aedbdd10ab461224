// src/drive/pid.rs - Velocity loop for one side of the drivetrain
//
// Feedback flows EncoderSource -> PidController -> Tread. The controller
// output is an increment to the tread's running speed, so the output range
// is kept small.
use crate::hardware::{Encoder, SpeedController};
use crate::tools::limit;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use thiserror::Error;

/// Samples kept by [`EncoderSource`].
pub const HISTORY_CAPACITY: usize = 100;
/// Largest change a [`Tread`] accepts per cycle.
pub const INCREMENT_LIMIT: f64 = 0.03;

#[derive(Debug, Error, PartialEq)]
pub enum PidError {
    #[error("PID gains can only be changed while the loop is disabled")]
    Enabled,
    #[error("Invalid range: minimum {0} is not below maximum {1}")]
    Range(f64, f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct PidGains {
    #[serde(default = "default_p")]
    pub p: f64,
    #[serde(default)]
    pub i: f64,
    #[serde(default)]
    pub d: f64,
}

fn default_p() -> f64 { 0.4 }

impl Default for PidGains {
    fn default() -> Self {
        Self { p: default_p(), i: 0.0, d: 0.0 }
    }
}

impl PidGains {
    pub fn new(p: f64, i: f64, d: f64) -> Self {
        Self { p, i, d }
    }
}

/// Discrete PID controller evaluated once per control cycle.
#[derive(Debug, Clone)]
pub struct PidController {
    gains: PidGains,
    setpoint: f64,
    enabled: bool,
    continuous: bool,
    input_range: Option<(f64, f64)>,
    output_range: (f64, f64),
    total_error: f64,
    prev_error: f64,
    result: f64,
}

impl PidController {
    pub fn new(gains: PidGains) -> Self {
        Self {
            gains,
            setpoint: 0.0,
            enabled: false,
            continuous: false,
            input_range: None,
            output_range: (-1.0, 1.0),
            total_error: 0.0,
            prev_error: 0.0,
            result: 0.0,
        }
    }

    pub fn gains(&self) -> PidGains {
        self.gains
    }

    /// Replaces the gains. Rejected while enabled so a running integrator
    /// never sees a half-applied update.
    pub fn set_gains(&mut self, gains: PidGains) -> Result<(), PidError> {
        if self.enabled {
            return Err(PidError::Enabled);
        }
        self.gains = gains;
        Ok(())
    }

    pub fn set_continuous(&mut self, continuous: bool) {
        self.continuous = continuous;
    }

    pub fn is_continuous(&self) -> bool {
        self.continuous
    }

    /// Input range used to wrap the error when continuous.
    pub fn set_input_range(&mut self, min: f64, max: f64) -> Result<(), PidError> {
        if min >= max {
            return Err(PidError::Range(min, max));
        }
        self.input_range = Some((min, max));
        self.setpoint = limit(self.setpoint, min, max);
        Ok(())
    }

    pub fn set_output_range(&mut self, min: f64, max: f64) -> Result<(), PidError> {
        if min >= max {
            return Err(PidError::Range(min, max));
        }
        self.output_range = (min, max);
        Ok(())
    }

    pub fn output_range(&self) -> (f64, f64) {
        self.output_range
    }

    pub fn set_setpoint(&mut self, setpoint: f64) {
        self.setpoint = match self.input_range {
            Some((min, max)) => limit(setpoint, min, max),
            None => setpoint,
        };
    }

    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Stops the loop and zeroes its output.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.result = 0.0;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Last computed output.
    pub fn get(&self) -> f64 {
        self.result
    }

    pub fn error(&self) -> f64 {
        self.prev_error
    }

    pub fn reset(&mut self) {
        self.disable();
        self.prev_error = 0.0;
        self.total_error = 0.0;
    }

    /// Runs one iteration against `input`. Returns the bounded output, or
    /// 0.0 while disabled.
    pub fn calculate(&mut self, input: f64) -> f64 {
        if !self.enabled {
            return self.result;
        }
        let mut error = self.setpoint - input;
        if let (true, Some((min, max))) = (self.continuous, self.input_range) {
            let span = max - min;
            if error.abs() > span / 2.0 {
                error += if error > 0.0 { -span } else { span };
            }
        }

        let (min_out, max_out) = self.output_range;
        // The integral term saturates at the output bounds.
        if self.gains.i != 0.0 {
            let potential = (self.total_error + error) * self.gains.i;
            if potential >= max_out {
                self.total_error = max_out / self.gains.i;
            } else if potential <= min_out {
                self.total_error = min_out / self.gains.i;
            } else {
                self.total_error += error;
            }
        }

        let raw = self.gains.p * error
            + self.gains.i * self.total_error
            + self.gains.d * (error - self.prev_error);
        self.prev_error = error;
        self.result = limit(raw, min_out, max_out);
        self.result
    }
}

/// Moving average over the most recent encoder rates.
#[derive(Debug, Clone)]
pub struct EncoderSource {
    history: VecDeque<f64>,
    inverted: bool,
}

impl EncoderSource {
    pub fn new(inverted: bool) -> Self {
        Self {
            history: VecDeque::with_capacity(HISTORY_CAPACITY + 1),
            inverted,
        }
    }

    /// Records `rate` as the newest sample and returns the window mean.
    pub fn push_sample(&mut self, rate: f64) -> f64 {
        let rate = if self.inverted { -rate } else { rate };
        self.history.push_front(rate);
        if self.history.len() > HISTORY_CAPACITY {
            self.history.pop_back();
        }
        self.average()
    }

    /// Reads the encoder and returns the filtered rate.
    pub fn pid_get(&mut self, encoder: &dyn Encoder) -> f64 {
        self.push_sample(encoder.rate())
    }

    pub fn average(&self) -> f64 {
        if self.history.is_empty() {
            return 0.0;
        }
        self.history.iter().sum::<f64>() / self.history.len() as f64
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

/// Two paired motors on one side, driven from an accumulated speed.
pub struct Tread {
    front: Box<dyn SpeedController>,
    back: Box<dyn SpeedController>,
    current: f64,
}

impl Tread {
    pub fn new(front: Box<dyn SpeedController>, back: Box<dyn SpeedController>) -> Self {
        Self { front, back, current: 0.0 }
    }

    /// Nudges the running speed by `increment` and applies it to both motors.
    /// Non-finite increments are dropped.
    pub fn write(&mut self, increment: f64) {
        if !increment.is_finite() {
            tracing::warn!("Dropping non-finite tread increment {}", increment);
            return;
        }
        let increment = limit(increment, -INCREMENT_LIMIT, INCREMENT_LIMIT);
        self.current = limit(self.current + increment, -1.0, 1.0);
        self.front.set(self.current);
        self.back.set(self.current);
    }

    pub fn report(&self) -> f64 {
        self.current
    }
}

/// One side of the closed-loop drive.
pub struct PidLoop {
    pub controller: PidController,
    source: EncoderSource,
    encoder: Box<dyn Encoder>,
    tread: Tread,
    last_rate: f64,
}

impl PidLoop {
    pub fn new(controller: PidController, encoder: Box<dyn Encoder>, inverted: bool, tread: Tread) -> Self {
        Self {
            controller,
            source: EncoderSource::new(inverted),
            encoder,
            tread,
            last_rate: 0.0,
        }
    }

    /// Samples the encoder, runs the controller and writes to the tread.
    pub fn step(&mut self) -> f64 {
        self.last_rate = self.source.pid_get(self.encoder.as_ref());
        let output = self.controller.calculate(self.last_rate);
        if self.controller.is_enabled() {
            self.tread.write(output);
        }
        output
    }

    pub fn set_distance_per_pulse(&mut self, distance_per_pulse: f64) {
        self.encoder.set_distance_per_pulse(distance_per_pulse);
    }

    /// Filtered rate from the latest `step`.
    pub fn rate(&self) -> f64 {
        self.last_rate
    }

    pub fn tread_output(&self) -> f64 {
        self.tread.report()
    }

    pub fn distance(&self) -> f64 {
        self.encoder.distance()
    }
}
