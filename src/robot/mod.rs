// src/robot/mod.rs - Top-level robot: owns the hardware and runs the control loop
pub mod profiles;

pub use profiles::{Assembly, RobotProfile};

use crate::config::Config;
use crate::controllers::{ControlError, Components, Controller, Cycle};
use crate::dashboard::Dashboard;
use crate::drive::{PidError, Shaper};
use crate::hardware::{FieldMode, Hal, Watchdog};
use std::path::Path;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{Duration, Instant, MissedTickBehavior};

#[derive(Debug, Error)]
pub enum RobotError {
    #[error("PID error: {0}")]
    Pid(#[from] PidError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The whole robot. Every device, component and controller lives here and
/// is lent out for one cycle at a time.
pub struct Robot {
    profile: RobotProfile,
    hal: Box<dyn Hal>,
    dashboard: Dashboard,
    watchdog: Watchdog,
    components: Components,
    controllers: Vec<Box<dyn Controller>>,
    last_errors: Vec<Option<ControlError>>,
    loop_period: Duration,
    telemetry_interval: Duration,
    started: Instant,
    mode: Option<FieldMode>,
    cycles: u64,
    controller_errors: u64,
}

impl Robot {
    pub fn new(config: &Config, profile: RobotProfile, mut hal: Box<dyn Hal>) -> Result<Self, RobotError> {
        let mut dashboard = Dashboard::new();
        let shaping = &config.shaping;
        Shaper::register(&mut dashboard, shaping.mode, shaping.bezier_a, shaping.bezier_b);

        let Assembly {
            components,
            controllers,
        } = profile.build(hal.as_mut(), config, &mut dashboard)?;

        for (key, value) in &config.dashboard {
            tracing::info!("Dashboard override: {} = {}", key, value);
            dashboard.put_string(key, value);
        }

        let control = &config.control;
        Ok(Self {
            profile,
            hal,
            dashboard,
            watchdog: Watchdog::new(control.watchdog_expiration()),
            components,
            last_errors: controllers.iter().map(|_| None).collect(),
            controllers,
            loop_period: control.loop_period(),
            telemetry_interval: control.telemetry_interval(),
            started: Instant::now(),
            mode: None,
            cycles: 0,
            controller_errors: 0,
        })
    }

    pub fn profile(&self) -> RobotProfile {
        self.profile
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    pub fn dashboard_mut(&mut self) -> &mut Dashboard {
        &mut self.dashboard
    }

    pub fn components(&self) -> &Components {
        &self.components
    }

    pub fn mode(&self) -> Option<FieldMode> {
        self.mode
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn controller_errors(&self) -> u64 {
        self.controller_errors
    }

    pub fn watchdog_trips(&self) -> u64 {
        self.watchdog.trips()
    }

    /// One pass of the control loop. Returns the field mode the cycle ran
    /// in, `None` once the match is over.
    ///
    /// A cycle that finds the watchdog expired disables every output and
    /// commands nothing else; control resumes on the following cycle.
    pub fn run_cycle(&mut self, now: Instant) -> Option<FieldMode> {
        let elapsed = now.saturating_duration_since(self.started);
        let tripped = self.watchdog.check(now);
        if tripped {
            self.hal.disable_outputs();
        }

        let mode = self.hal.field_mode(elapsed);
        if mode != self.mode {
            self.enter_mode(mode, now);
        }

        match mode {
            Some(FieldMode::Teleop | FieldMode::Autonomous) if tripped => {
                tracing::warn!("Outputs held at zero for one cycle after watchdog expiry");
            }
            Some(FieldMode::Teleop) => {
                let inputs = self.hal.poll_inputs(elapsed);
                let mut cycle = Cycle {
                    inputs: &inputs,
                    dashboard: &mut self.dashboard,
                    components: &mut self.components,
                };
                for (index, controller) in self.controllers.iter_mut().enumerate() {
                    match controller.run(&mut cycle) {
                        Ok(()) => self.last_errors[index] = None,
                        Err(e) => {
                            self.controller_errors += 1;
                            // Report a persistent fault once, not every cycle.
                            if self.last_errors[index].as_ref() != Some(&e) {
                                tracing::warn!("Controller '{}' failed: {}", controller.name(), e);
                            }
                            self.last_errors[index] = Some(e);
                        }
                    }
                    self.watchdog.feed(now);
                }
            }
            Some(FieldMode::Autonomous) => {
                self.hal.poll_inputs(elapsed);
                self.components.stop_drives(&mut self.dashboard);
                self.watchdog.feed(now);
            }
            Some(FieldMode::Disabled) | None => self.hal.disable_outputs(),
        }

        self.hal.step(self.loop_period);
        self.cycles += 1;
        mode
    }

    fn enter_mode(&mut self, mode: Option<FieldMode>, now: Instant) {
        match mode {
            Some(mode) => tracing::info!("Entering {} mode", mode),
            None => tracing::info!("Match over after {} cycles", self.cycles),
        }
        if self.mode == Some(FieldMode::Teleop) {
            self.components.stop_drives(&mut self.dashboard);
        }
        let active = matches!(mode, Some(FieldMode::Autonomous | FieldMode::Teleop));
        self.watchdog.set_enabled(active, now);
        self.mode = mode;
    }

    /// Applies one operator edit such as `(CONTROLLER) << = 2`.
    pub fn handle_command(&mut self, command: &str) {
        match self.dashboard.apply_command(command) {
            Ok(()) => tracing::info!("Dashboard updated: {}", command.trim()),
            Err(e) => tracing::warn!("Ignoring dashboard command: {}", e),
        }
    }

    fn log_telemetry(&self) {
        match self.dashboard.to_json() {
            Ok(json) => tracing::debug!("Telemetry: {}", json),
            Err(e) => tracing::warn!("Failed to serialize telemetry: {}", e),
        }
    }

    /// Runs the control loop until the field schedule ends or a shutdown
    /// is signalled, then disables every output.
    pub async fn run(
        &mut self,
        mut commands: mpsc::Receiver<String>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        tracing::info!(
            "{} robot running: {:?} loop, watchdog {:?}",
            self.profile,
            self.loop_period,
            self.watchdog.expiration()
        );
        let mut interval = tokio::time::interval(self.loop_period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut telemetry = tokio::time::interval(self.telemetry_interval);
        telemetry.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut commands_open = true;

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Robot loop shutting down");
                    break;
                }
                command = commands.recv(), if commands_open => {
                    match command {
                        Some(command) => self.handle_command(&command),
                        None => {
                            tracing::debug!("Dashboard command channel closed");
                            commands_open = false;
                        }
                    }
                }
                _ = telemetry.tick() => {
                    self.log_telemetry();
                }
                now = interval.tick() => {
                    if self.run_cycle(now).is_none() {
                        break;
                    }
                }
            }
        }

        self.hal.disable_outputs();
        tracing::info!(
            "Robot stopped: {} cycles, {} watchdog trips, {} controller errors",
            self.cycles,
            self.watchdog.trips(),
            self.controller_errors
        );
    }

    /// Writes the current dashboard as pretty JSON.
    pub async fn write_snapshot(&self, path: impl AsRef<Path>) -> Result<(), RobotError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self.dashboard.snapshot())?;
        tokio::fs::write(path, json).await?;
        tracing::info!("Wrote dashboard snapshot to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{InputStep, SimulationConfig};
    use crate::dashboard::Entry;
    use crate::hardware::sim::SimHal;
    use crate::ports::{PWM1, USB1};
    use std::collections::BTreeMap;

    fn sideways_config(teleop_secs: f64) -> Config {
        Config {
            simulation: SimulationConfig {
                teleop_secs,
                script: vec![InputStep {
                    at_ms: 0,
                    port: USB1,
                    axes: BTreeMap::from([("left_y".to_string(), 0.6), ("right_y".to_string(), 0.6)]),
                    buttons: Vec::new(),
                }],
                ..SimulationConfig::default()
            },
            ..Config::default()
        }
    }

    fn robot(config: &Config, profile: RobotProfile) -> (Robot, crate::hardware::sim::SimMotor) {
        let mut hal = SimHal::new(config.simulation.clone());
        let left_front = hal.motor(PWM1);
        let robot = Robot::new(config, profile, Box::new(hal)).unwrap();
        (robot, left_front)
    }

    #[tokio::test(start_paused = true)]
    async fn test_teleop_cycles_drive_forward() {
        let config = sideways_config(5.0);
        let (mut robot, left_front) = robot(&config, RobotProfile::Sideways);
        let start = Instant::now();
        for i in 0..100u32 {
            let mode = robot.run_cycle(start + Duration::from_millis(10 * i as u64));
            assert_eq!(mode, Some(FieldMode::Teleop));
        }
        assert_eq!(robot.cycles(), 100);
        assert_eq!(robot.controller_errors(), 0);
        assert_eq!(robot.watchdog_trips(), 0);
        let tread = robot.components().pid_drive.as_ref().unwrap().tread_outputs();
        assert!(tread.left > 0.5, "tread left {}", tread.left);
        assert_eq!(left_front.get(), tread.left);
        assert_eq!(
            robot.dashboard().get("Current PID Drive state"),
            Some(&Entry::Text("Manual".to_string()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_autonomous_holds_drive_still() {
        let mut config = sideways_config(1.0);
        config.simulation.autonomous_secs = 1.0;
        let (mut robot, left_front) = robot(&config, RobotProfile::Sideways);
        let start = Instant::now();
        for i in 0..50u64 {
            assert_eq!(robot.run_cycle(start + Duration::from_millis(10 * i)), Some(FieldMode::Autonomous));
        }
        assert_eq!(left_front.get(), 0.0);
        assert_eq!(robot.run_cycle(start + Duration::from_millis(1000)), Some(FieldMode::Teleop));
        assert_eq!(robot.run_cycle(start + Duration::from_millis(2000)), None);
        assert_eq!(robot.mode(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watchdog_trips_on_stall() {
        let config = sideways_config(10.0);
        let (mut robot, left_front) = robot(&config, RobotProfile::Sideways);
        let start = Instant::now();
        robot.run_cycle(start);
        robot.run_cycle(start + Duration::from_millis(10));
        assert!(left_front.get() > 0.0);

        // The stalled cycle leaves the motors off even though the stick is held.
        robot.run_cycle(start + Duration::from_millis(1500));
        assert_eq!(robot.watchdog_trips(), 1);
        assert_eq!(left_front.get(), 0.0);
        assert_eq!(robot.cycles(), 3);

        robot.run_cycle(start + Duration::from_millis(1510));
        assert_eq!(robot.watchdog_trips(), 1);
        assert!(left_front.get() > 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watchdog_trip_holds_autonomous_outputs_off() {
        let mut config = sideways_config(1.0);
        config.simulation.autonomous_secs = 5.0;
        let (mut robot, left_front) = robot(&config, RobotProfile::Sideways);
        let start = Instant::now();
        robot.run_cycle(start);
        assert_eq!(robot.run_cycle(start + Duration::from_millis(2000)), Some(FieldMode::Autonomous));
        assert_eq!(robot.watchdog_trips(), 1);
        assert_eq!(left_front.get(), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_controller_errors_are_counted_not_fatal() {
        let config = Config::default();
        let (mut robot, _) = robot(&config, RobotProfile::Main);
        robot.handle_command("(CONTROLLER) << = 9");
        let start = Instant::now();
        for i in 0..3u64 {
            robot.run_cycle(start + Duration::from_millis(10 * i));
        }
        assert_eq!(robot.controller_errors(), 3);
        assert_eq!(robot.cycles(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dashboard_overrides_apply_after_build() {
        let mut config = Config::default();
        config
            .dashboard
            .insert("PidDrive state".to_string(), "halt".to_string());
        let (robot, _) = robot(&config, RobotProfile::Sideways);
        assert_eq!(robot.dashboard().string("PidDrive state").as_deref(), Some("halt"));
        assert_eq!(robot.dashboard().string("(SHAPING FUNCTION) <<").as_deref(), Some("0"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_ends_with_schedule() {
        let config = sideways_config(0.5);
        let (mut robot, left_front) = robot(&config, RobotProfile::Sideways);
        let (command_tx, command_rx) = mpsc::channel(8);
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
        command_tx
            .send("PidDrive state=straight".to_string())
            .await
            .unwrap();
        drop(command_tx);
        robot.run(command_rx, shutdown_rx).await;
        assert!(robot.cycles() >= 50);
        assert_eq!(robot.mode(), None);
        assert_eq!(left_front.get(), 0.0);
        assert_eq!(
            robot.components().pid_drive.as_ref().unwrap().state(),
            crate::drive::DriveState::Straight
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_shutdown() {
        let config = sideways_config(60.0);
        let (mut robot, _) = robot(&config, RobotProfile::Sideways);
        let (_command_tx, command_rx) = mpsc::channel(8);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        shutdown_tx.send(()).unwrap();
        robot.run(command_rx, shutdown_rx).await;
        assert!(robot.cycles() < 10);
    }
}
