//! # Robot Configuration
//!
//! Everything that differs between practice sessions lives in one TOML file
//! (`robot.toml` by default). Every field has a default, so an empty file is
//! a valid configuration.
//!
//! ## Example: TOML Configuration
//!
//! ```toml
//! [robot]
//! profile = "sideways"
//! name = "Olympic"
//!
//! [control]
//! loop_period_ms = 10
//! watchdog_expiration_ms = 1000
//!
//! [pid.left]
//! p = 0.4
//!
//! [shaping]
//! mode = 3
//!
//! [dashboard]
//! "PidDrive state" = "straight"
//!
//! [simulation]
//! teleop_secs = 5.0
//!
//! [[simulation.script]]
//! at_ms = 0
//! port = 1
//! axes = { left_y = 0.6, right_y = 0.6 }
//! ```
//!
//! `[dashboard]` entries are written over the dashboard defaults after the
//! robot is built, so they behave exactly like operator edits.

// src/config.rs - Single configuration file
use crate::drive::pid::PidGains;
use crate::hardware::Axis;
use crate::ports::{AnalogChannel, DioChannel, PwmChannel, UsbPort, DIO2, DIO6, DIO8, DIO9, PWM1, PWM3};
use crate::robot::RobotProfile;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tokio::time::Duration;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub robot: RobotConfig,
    #[serde(default)]
    pub control: ControlConfig,
    #[serde(default)]
    pub pid: PidConfig,
    #[serde(default)]
    pub shaping: ShapingConfig,
    /// Initial operator overrides, keyed by dashboard label.
    #[serde(default)]
    pub dashboard: BTreeMap<String, String>,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Which wiring profile to run.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RobotConfig {
    /// Overrides the profile compiled in through Cargo features.
    #[serde(default)]
    pub profile: Option<RobotProfile>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Control loop timing.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ControlConfig {
    #[serde(default = "default_loop_period_ms")]
    pub loop_period_ms: u64,
    #[serde(default = "default_watchdog_expiration_ms")]
    pub watchdog_expiration_ms: u64,
    #[serde(default = "default_telemetry_interval_ms")]
    pub telemetry_interval_ms: u64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            loop_period_ms: default_loop_period_ms(),
            watchdog_expiration_ms: default_watchdog_expiration_ms(),
            telemetry_interval_ms: default_telemetry_interval_ms(),
        }
    }
}

impl ControlConfig {
    pub fn loop_period(&self) -> Duration {
        Duration::from_millis(self.loop_period_ms)
    }

    pub fn watchdog_expiration(&self) -> Duration {
        Duration::from_millis(self.watchdog_expiration_ms)
    }

    pub fn telemetry_interval(&self) -> Duration {
        Duration::from_millis(self.telemetry_interval_ms)
    }
}

/// Closed-loop drivetrain defaults. These seed the dashboard tuning fields.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PidConfig {
    #[serde(default)]
    pub left: PidGains,
    #[serde(default)]
    pub right: PidGains,
    /// Calibration applied when the drive is constructed.
    #[serde(default = "default_initial_distance_per_pulse")]
    pub initial_distance_per_pulse: f64,
    /// Calibration offered on the dashboard and applied on a tuning request.
    #[serde(default = "default_tuning_distance_per_pulse")]
    pub tuning_distance_per_pulse: f64,
    /// The drive encoders count backwards relative to forward motor commands.
    #[serde(default = "default_true")]
    pub invert_encoders: bool,
}

impl Default for PidConfig {
    fn default() -> Self {
        Self {
            left: PidGains::default(),
            right: PidGains::default(),
            initial_distance_per_pulse: default_initial_distance_per_pulse(),
            tuning_distance_per_pulse: default_tuning_distance_per_pulse(),
            invert_encoders: true,
        }
    }
}

/// Joystick shaping defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShapingConfig {
    #[serde(default)]
    pub mode: i64,
    #[serde(default = "default_bezier_a")]
    pub bezier_a: f64,
    #[serde(default = "default_bezier_b")]
    pub bezier_b: f64,
}

impl Default for ShapingConfig {
    fn default() -> Self {
        Self {
            mode: 0,
            bezier_a: default_bezier_a(),
            bezier_b: default_bezier_b(),
        }
    }
}

/// Simulated hardware: match schedule, drivetrain plant and scripted
/// driver station input.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub autonomous_secs: f64,
    #[serde(default = "default_teleop_secs")]
    pub teleop_secs: f64,
    /// Encoder pulses per second at full motor command.
    #[serde(default = "default_max_pulse_rate")]
    pub max_pulse_rate: f64,
    #[serde(default = "default_time_constant_ms")]
    pub time_constant_ms: f64,
    /// Amplitude of uniform rate noise, in pulses/s.
    #[serde(default)]
    pub encoder_noise: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_true")]
    pub encoders_reversed: bool,
    #[serde(default = "default_encoder_links")]
    pub encoder_links: Vec<EncoderLink>,
    #[serde(default)]
    pub script: Vec<InputStep>,
    #[serde(default)]
    pub switches: Vec<SwitchStep>,
    #[serde(default)]
    pub analog: Vec<AnalogStep>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            autonomous_secs: 0.0,
            teleop_secs: default_teleop_secs(),
            max_pulse_rate: default_max_pulse_rate(),
            time_constant_ms: default_time_constant_ms(),
            encoder_noise: 0.0,
            seed: default_seed(),
            encoders_reversed: true,
            encoder_links: default_encoder_links(),
            script: Vec::new(),
            switches: Vec::new(),
            analog: Vec::new(),
        }
    }
}

/// Ties a simulated encoder (by its A channel) to the motor that turns it.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct EncoderLink {
    pub encoder: DioChannel,
    pub motor: PwmChannel,
}

/// From `at_ms` on, the device on `port` reports exactly these values.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct InputStep {
    pub at_ms: u64,
    pub port: UsbPort,
    /// Axis name (`left_y`, `throttle`, ...) to value.
    #[serde(default)]
    pub axes: BTreeMap<String, f64>,
    #[serde(default)]
    pub buttons: Vec<u8>,
}

/// From `at_ms` on, the switch on `channel` reads `value`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct SwitchStep {
    pub at_ms: u64,
    pub channel: DioChannel,
    pub value: bool,
}

/// From `at_ms` on, the analog sensor on `channel` reads `value` ADC counts.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct AnalogStep {
    pub at_ms: u64,
    pub channel: AnalogChannel,
    pub value: i32,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let control = &self.control;
        if control.loop_period_ms == 0 {
            return Err(ConfigError::Invalid("control.loop_period_ms must be > 0".to_string()));
        }
        if control.telemetry_interval_ms == 0 {
            return Err(ConfigError::Invalid("control.telemetry_interval_ms must be > 0".to_string()));
        }
        if control.watchdog_expiration_ms <= control.loop_period_ms {
            return Err(ConfigError::Invalid(format!(
                "control.watchdog_expiration_ms ({}) must exceed the loop period ({})",
                control.watchdog_expiration_ms, control.loop_period_ms
            )));
        }
        let pid = &self.pid;
        for (side, gains) in [("left", &pid.left), ("right", &pid.right)] {
            for (term, value) in [("p", gains.p), ("i", gains.i), ("d", gains.d)] {
                require_finite(&format!("pid.{}.{}", side, term), value)?;
            }
        }
        require_finite("pid.initial_distance_per_pulse", pid.initial_distance_per_pulse)?;
        require_finite("pid.tuning_distance_per_pulse", pid.tuning_distance_per_pulse)?;
        require_finite("shaping.bezier_a", self.shaping.bezier_a)?;
        require_finite("shaping.bezier_b", self.shaping.bezier_b)?;

        let sim = &self.simulation;
        require_finite("simulation.autonomous_secs", sim.autonomous_secs)?;
        require_finite("simulation.teleop_secs", sim.teleop_secs)?;
        require_finite("simulation.max_pulse_rate", sim.max_pulse_rate)?;
        require_finite("simulation.time_constant_ms", sim.time_constant_ms)?;
        require_finite("simulation.encoder_noise", sim.encoder_noise)?;
        if sim.autonomous_secs < 0.0 || sim.teleop_secs < 0.0 {
            return Err(ConfigError::Invalid("simulation phase lengths must be >= 0".to_string()));
        }
        if sim.max_pulse_rate <= 0.0 {
            return Err(ConfigError::Invalid("simulation.max_pulse_rate must be > 0".to_string()));
        }
        if sim.time_constant_ms <= 0.0 {
            return Err(ConfigError::Invalid("simulation.time_constant_ms must be > 0".to_string()));
        }
        if sim.encoder_noise < 0.0 {
            return Err(ConfigError::Invalid("simulation.encoder_noise must be >= 0".to_string()));
        }
        for step in &sim.script {
            if let Some(name) = step.axes.keys().find(|name| name.parse::<Axis>().is_err()) {
                return Err(ConfigError::Invalid(format!(
                    "script step at {} ms names unknown axis '{}'",
                    step.at_ms, name
                )));
            }
            if let Some((name, _)) = step.axes.iter().find(|(_, value)| !value.is_finite()) {
                return Err(ConfigError::Invalid(format!(
                    "script step at {} ms sets axis '{}' to a non-finite value",
                    step.at_ms, name
                )));
            }
            if step.buttons.iter().any(|b| !(1..=32).contains(b)) {
                return Err(ConfigError::Invalid(format!(
                    "script step at {} ms has a button outside 1..=32",
                    step.at_ms
                )));
            }
        }
        Ok(())
    }
}

fn require_finite(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{} must be finite, got {}", field, value)))
    }
}

// Default value functions
fn default_loop_period_ms() -> u64 { 10 }
fn default_watchdog_expiration_ms() -> u64 { 1000 }
fn default_telemetry_interval_ms() -> u64 { 1000 }
fn default_initial_distance_per_pulse() -> f64 { 0.0003 }
fn default_tuning_distance_per_pulse() -> f64 { 0.00059 }
fn default_bezier_a() -> f64 { 0.940 }
fn default_bezier_b() -> f64 { 0.280 }
fn default_teleop_secs() -> f64 { 10.0 }
fn default_max_pulse_rate() -> f64 { 1700.0 }
fn default_time_constant_ms() -> f64 { 150.0 }
fn default_seed() -> u64 { 2012 }
fn default_true() -> bool { true }
fn default_encoder_links() -> Vec<EncoderLink> {
    vec![
        EncoderLink { encoder: DIO9, motor: PWM1 },
        EncoderLink { encoder: DIO2, motor: PWM3 },
        EncoderLink { encoder: DIO6, motor: PWM1 },
        EncoderLink { encoder: DIO8, motor: PWM3 },
    ]
}

/// Load and validate configuration from a TOML file at the given path.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| {
        tracing::error!("Failed to read config file '{}': {}", path.display(), e);
        ConfigError::Io(e)
    })?;
    let config: Config = toml::from_str(&contents).map_err(|e| {
        tracing::error!("Failed to parse config TOML: {}", e);
        ConfigError::Toml(e)
    })?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::USB1;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.control.loop_period_ms, 10);
        assert_eq!(config.control.watchdog_expiration_ms, 1000);
        assert_eq!(config.pid.left.p, 0.4);
        assert_eq!(config.pid.right.i, 0.0);
        assert_eq!(config.pid.initial_distance_per_pulse, 0.0003);
        assert_eq!(config.shaping.mode, 0);
        assert_eq!(config.shaping.bezier_a, 0.94);
        assert_eq!(config.simulation.encoder_links.len(), 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_file_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.control.loop_period_ms, 10);
        assert!(config.robot.profile.is_none());
    }

    #[test]
    fn test_load_config_success() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("robot.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(
            file,
            "[robot]\nprofile = 'prototype'\n[pid.left]\np = 0.25\n[dashboard]\n\"PidDrive state\" = \"halt\""
        )
        .unwrap();
        file.flush().unwrap();
        let config = load_config(&file_path).unwrap();
        assert_eq!(config.robot.profile, Some(RobotProfile::Prototype));
        assert_eq!(config.pid.left.p, 0.25);
        // Defaults for missing fields
        assert_eq!(config.pid.right.p, 0.4);
        assert_eq!(config.dashboard["PidDrive state"], "halt");
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent_robot.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("bad.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "not a valid toml").unwrap();
        file.flush().unwrap();
        let result = load_config(&file_path);
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_validation_rejects_short_watchdog() {
        let mut config = Config::default();
        config.control.watchdog_expiration_ms = 5;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_script_parsing() {
        let toml = r#"
        [simulation]
        teleop_secs = 2.5

        [[simulation.script]]
        at_ms = 100
        port = 1
        axes = { left_y = 0.6, right_y = 0.2 }
        buttons = [1]

        [[simulation.switches]]
        at_ms = 50
        channel = 1
        value = true

        [[simulation.analog]]
        at_ms = 0
        channel = 1
        value = 288
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        let step = &config.simulation.script[0];
        assert_eq!(step.port, USB1);
        assert_eq!(step.axes["left_y"], 0.6);
        assert_eq!(step.buttons, vec![1]);
        assert!(config.simulation.switches[0].value);
        assert_eq!(config.simulation.analog[0].value, 288);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_non_finite_numbers() {
        let cases = [
            "[simulation]\nencoder_noise = inf",
            "[simulation]\nteleop_secs = inf",
            "[simulation]\nautonomous_secs = nan",
            "[simulation]\nmax_pulse_rate = inf",
            "[simulation]\ntime_constant_ms = nan",
            "[pid.left]\np = nan",
            "[pid.right]\ni = -inf",
            "[pid.right]\nd = nan",
            "[pid]\ninitial_distance_per_pulse = nan",
            "[pid]\ntuning_distance_per_pulse = inf",
            "[shaping]\nbezier_b = nan",
            "[[simulation.script]]\nat_ms = 0\nport = 1\naxes = { left_y = nan }",
        ];
        for case in cases {
            let config: Config = toml::from_str(case).unwrap();
            match config.validate() {
                Err(ConfigError::Invalid(message)) => {
                    assert!(message.contains("finite"), "{}: {}", case, message)
                }
                other => panic!("{} was accepted: {:?}", case, other),
            }
        }
    }

    #[test]
    fn test_load_config_rejects_infinite_noise() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("noisy.toml");
        std::fs::write(&file_path, "[simulation]\nencoder_noise = inf\n").unwrap();
        assert!(matches!(load_config(&file_path), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validation_rejects_unknown_axis() {
        let toml = r#"
        [[simulation.script]]
        at_ms = 0
        port = 2
        axes = { sideways = 1.0 }
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
