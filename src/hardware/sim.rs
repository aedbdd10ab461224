// src/hardware/sim.rs - In-process hardware for running off-robot
//
// Motors and encoders share state through atomics so the HAL can advance
// the plant while the robot owns the device handles.
use super::{
    AnalogInput, DigitalInput, Encoder, FieldMode, Hal, InputState, Inputs, MotorKind, SpeedController,
};
use crate::config::{AnalogStep, InputStep, SimulationConfig, SwitchStep};
use crate::hardware::Axis;
use crate::ports::{AnalogChannel, DioChannel, PwmChannel};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU64, Ordering};
use tokio::time::Duration;

/// An `f64` cell that can be shared between a device handle and the plant.
#[derive(Debug, Clone, Default)]
pub struct SharedValue(Arc<AtomicU64>);

impl SharedValue {
    pub fn new(value: f64) -> Self {
        Self(Arc::new(AtomicU64::new(value.to_bits())))
    }

    pub fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub fn store(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, Default)]
pub struct SharedFlag(Arc<AtomicBool>);

impl SharedFlag {
    pub fn load(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn store(&self, value: bool) {
        self.0.store(value, Ordering::Relaxed);
    }
}

/// Simulated speed controller. Clones observe the same output.
#[derive(Debug, Clone, Default)]
pub struct SimMotor {
    output: SharedValue,
}

impl SimMotor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last commanded output, readable from any clone.
    pub fn get(&self) -> f64 {
        self.output.load()
    }
}

impl SpeedController for SimMotor {
    fn set(&mut self, speed: f64) {
        self.output.store(speed.clamp(-1.0, 1.0));
    }

    fn get(&self) -> f64 {
        self.output.load()
    }
}

#[derive(Debug, Clone)]
struct EncoderState {
    /// Pulses per second, signed.
    pulse_rate: SharedValue,
    pulses: SharedValue,
    distance_per_pulse: SharedValue,
}

impl Default for EncoderState {
    fn default() -> Self {
        Self {
            pulse_rate: SharedValue::new(0.0),
            pulses: SharedValue::new(0.0),
            distance_per_pulse: SharedValue::new(1.0),
        }
    }
}

/// Simulated quadrature encoder.
#[derive(Debug, Clone, Default)]
pub struct SimEncoder {
    state: EncoderState,
}

impl SimEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forces the raw pulse rate, bypassing the plant.
    pub fn set_pulse_rate(&self, pulses_per_second: f64) {
        self.state.pulse_rate.store(pulses_per_second);
    }
}

impl Encoder for SimEncoder {
    fn rate(&self) -> f64 {
        self.state.pulse_rate.load() * self.state.distance_per_pulse.load()
    }

    fn distance(&self) -> f64 {
        self.state.pulses.load() * self.state.distance_per_pulse.load()
    }

    fn set_distance_per_pulse(&mut self, distance_per_pulse: f64) {
        self.state.distance_per_pulse.store(distance_per_pulse);
    }

    fn reset(&mut self) {
        self.state.pulses.store(0.0);
    }
}

#[derive(Debug, Clone, Default)]
pub struct SimSwitch {
    value: SharedFlag,
}

impl SimSwitch {
    pub fn set(&self, value: bool) {
        self.value.store(value);
    }
}

impl DigitalInput for SimSwitch {
    fn get(&self) -> bool {
        self.value.load()
    }
}

/// Simulated analog sensor holding a raw ADC reading.
#[derive(Debug, Clone, Default)]
pub struct SimAnalog {
    value: Arc<AtomicI32>,
}

impl SimAnalog {
    pub fn set(&self, value: i32) {
        self.value.store(value, Ordering::Relaxed);
    }
}

impl AnalogInput for SimAnalog {
    fn average_value(&self) -> i32 {
        self.value.load(Ordering::Relaxed)
    }
}

struct LinkedEncoder {
    encoder: SimEncoder,
    motor: SimMotor,
}

/// Simulated vendor layer driven by `[simulation]` in the config file.
pub struct SimHal {
    config: SimulationConfig,
    motors: BTreeMap<PwmChannel, SimMotor>,
    encoders: Vec<LinkedEncoder>,
    switches: BTreeMap<DioChannel, SimSwitch>,
    analogs: BTreeMap<AnalogChannel, SimAnalog>,
    script: Vec<InputStep>,
    switch_script: Vec<SwitchStep>,
    analog_script: Vec<AnalogStep>,
    next_step: usize,
    next_switch: usize,
    next_analog: usize,
    inputs: Inputs,
    rng: StdRng,
}

impl SimHal {
    pub fn new(config: SimulationConfig) -> Self {
        let mut script = config.script.clone();
        script.sort_by_key(|step| step.at_ms);
        let mut switch_script = config.switches.clone();
        switch_script.sort_by_key(|step| step.at_ms);
        let mut analog_script = config.analog.clone();
        analog_script.sort_by_key(|step| step.at_ms);
        let rng = StdRng::seed_from_u64(config.seed);
        tracing::info!(
            "Simulated HAL: {} input steps, {} switch steps, {:.1}s autonomous, {:.1}s teleop",
            script.len(),
            switch_script.len(),
            config.autonomous_secs,
            config.teleop_secs
        );
        Self {
            config,
            motors: BTreeMap::new(),
            encoders: Vec::new(),
            switches: BTreeMap::new(),
            analogs: BTreeMap::new(),
            script,
            switch_script,
            analog_script,
            next_step: 0,
            next_switch: 0,
            next_analog: 0,
            inputs: Inputs::default(),
            rng,
        }
    }

    /// Handle to the motor on `channel`, creating it if nothing claimed it yet.
    pub fn motor(&mut self, channel: PwmChannel) -> SimMotor {
        self.motors.entry(channel).or_default().clone()
    }

    /// Handle to the switch on `channel`, creating it if nothing claimed it yet.
    pub fn switch(&mut self, channel: DioChannel) -> SimSwitch {
        self.switches.entry(channel).or_default().clone()
    }

    /// Handle to the analog sensor on `channel`, creating it if nothing claimed it yet.
    pub fn analog(&mut self, channel: AnalogChannel) -> SimAnalog {
        self.analogs.entry(channel).or_default().clone()
    }

    /// Replaces the live state of one driver station port.
    pub fn set_input(&mut self, port: crate::ports::UsbPort, state: InputState) {
        *self.inputs.port_mut(port) = state;
    }

    fn apply_script(&mut self, elapsed_ms: u64) {
        while let Some(step) = self.script.get(self.next_step) {
            if step.at_ms > elapsed_ms {
                break;
            }
            let mut state = InputState::default();
            for (name, value) in &step.axes {
                match name.parse::<Axis>() {
                    Ok(axis) => state.set_axis(axis, *value),
                    Err(e) => tracing::warn!("Ignoring scripted input: {}", e),
                }
            }
            for button in &step.buttons {
                state.set_button(*button, true);
            }
            tracing::debug!("Scripted input at {} ms on {}", step.at_ms, step.port);
            *self.inputs.port_mut(step.port) = state;
            self.next_step += 1;
        }
        while let Some(step) = self.switch_script.get(self.next_switch).copied() {
            if step.at_ms > elapsed_ms {
                break;
            }
            tracing::debug!("Switch {} -> {} at {} ms", step.channel, step.value, step.at_ms);
            self.switch(step.channel).set(step.value);
            self.next_switch += 1;
        }
        while let Some(step) = self.analog_script.get(self.next_analog).copied() {
            if step.at_ms > elapsed_ms {
                break;
            }
            tracing::debug!("Analog {} -> {} at {} ms", step.channel, step.value, step.at_ms);
            self.analog(step.channel).set(step.value);
            self.next_analog += 1;
        }
    }
}

impl Hal for SimHal {
    fn speed_controller(&mut self, kind: MotorKind, channel: PwmChannel) -> Box<dyn SpeedController> {
        tracing::debug!("Simulated {} on {}", kind, channel);
        Box::new(self.motor(channel))
    }

    fn encoder(&mut self, a: DioChannel, b: DioChannel) -> Box<dyn Encoder> {
        let encoder = SimEncoder::new();
        match self.config.encoder_links.iter().find(|link| link.encoder == a).copied() {
            Some(link) => {
                let motor = self.motor(link.motor);
                tracing::debug!("Simulated encoder on {}/{} follows {}", a, b, link.motor);
                self.encoders.push(LinkedEncoder {
                    encoder: encoder.clone(),
                    motor,
                });
            }
            None => tracing::warn!("Simulated encoder on {}/{} is not linked to a motor", a, b),
        }
        Box::new(encoder)
    }

    fn digital_input(&mut self, channel: DioChannel) -> Box<dyn DigitalInput> {
        Box::new(self.switch(channel))
    }

    fn analog_input(&mut self, channel: AnalogChannel) -> Box<dyn AnalogInput> {
        Box::new(self.analog(channel))
    }

    fn poll_inputs(&mut self, elapsed: Duration) -> Inputs {
        self.apply_script(elapsed.as_millis() as u64);
        self.inputs
    }

    fn field_mode(&mut self, elapsed: Duration) -> Option<FieldMode> {
        let secs = elapsed.as_secs_f64();
        let autonomous_end = self.config.autonomous_secs;
        let teleop_end = autonomous_end + self.config.teleop_secs;
        if secs < autonomous_end {
            Some(FieldMode::Autonomous)
        } else if secs < teleop_end {
            Some(FieldMode::Teleop)
        } else {
            None
        }
    }

    fn step(&mut self, dt: Duration) {
        let dt = dt.as_secs_f64();
        let alpha = (dt * 1000.0 / self.config.time_constant_ms).min(1.0);
        let direction = if self.config.encoders_reversed { -1.0 } else { 1.0 };
        for linked in &self.encoders {
            let target = direction * linked.motor.get() * self.config.max_pulse_rate;
            let state = &linked.encoder.state;
            let rate = state.pulse_rate.load();
            let mut next = rate + (target - rate) * alpha;
            if self.config.encoder_noise > 0.0 {
                next += self.config.encoder_noise * self.rng.random_range(-1.0..=1.0);
            }
            state.pulse_rate.store(next);
            state.pulses.store(state.pulses.load() + next * dt);
        }
    }

    fn disable_outputs(&mut self) {
        for motor in self.motors.values_mut() {
            motor.set(0.0);
        }
    }
}
