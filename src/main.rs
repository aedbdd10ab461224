// src/main.rs - Runs the robot against the simulated HAL
use clap::Parser;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use tankbot_rs::config::{self, Config};
use tankbot_rs::hardware::sim::SimHal;
use tankbot_rs::robot::{Robot, RobotProfile};
use tokio::sync::{broadcast, mpsc};

const DEFAULT_CONFIG: &str = "robot.toml";

#[derive(Debug, Parser)]
#[command(name = "tankbot", version, about = "Tank-drive robot control loop")]
struct Args {
    /// Configuration file (defaults to ./robot.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Robot wiring; overrides the config file and the compiled default
    #[arg(short, long, value_enum)]
    profile: Option<RobotProfile>,

    /// Maximum log level
    #[arg(long, default_value = "info")]
    log_level: tracing::Level,

    /// Write the final dashboard snapshot here as JSON
    #[arg(long)]
    telemetry_out: Option<PathBuf>,
}

fn load(path: Option<&Path>) -> Result<Config, config::ConfigError> {
    match path {
        Some(path) => config::load_config(path),
        None if Path::new(DEFAULT_CONFIG).exists() => config::load_config(DEFAULT_CONFIG),
        None => {
            tracing::info!("No {} found, using built-in defaults", DEFAULT_CONFIG);
            Ok(Config::default())
        }
    }
}

/// Forwards operator `key=value` lines from stdin to the robot loop.
fn spawn_command_reader(tx: mpsc::Sender<String>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => {
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!("Failed to read operator command: {}", e);
                    break;
                }
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::info!("Starting tankbot {}", env!("CARGO_PKG_VERSION"));

    let config = load(args.config.as_deref()).map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        Box::new(e) as Box<dyn std::error::Error + Send + Sync + 'static>
    })?;

    let profile = args
        .profile
        .or(config.robot.profile)
        .unwrap_or_else(RobotProfile::compiled_default);
    tracing::info!(
        "Robot: {} ({} profile)",
        config.robot.name.as_deref().unwrap_or("Unnamed"),
        profile
    );
    tracing::info!(
        "Loop period {:?}, watchdog {:?}",
        config.control.loop_period(),
        config.control.watchdog_expiration()
    );

    let hal = SimHal::new(config.simulation.clone());
    let mut robot = match Robot::new(&config, profile, Box::new(hal)) {
        Ok(robot) => robot,
        Err(e) => {
            tracing::error!("Failed to build robot: {}", e);
            return Err(Box::new(e) as Box<dyn std::error::Error + Send + Sync + 'static>);
        }
    };

    let (command_tx, command_rx) = mpsc::channel(32);
    spawn_command_reader(command_tx);

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let ctrl_c_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Ctrl+C received, stopping robot");
                let _ = ctrl_c_tx.send(());
            }
            Err(e) => tracing::error!("Failed to listen for Ctrl+C: {}", e),
        }
    });

    robot.run(command_rx, shutdown_rx).await;
    drop(shutdown_tx);

    if let Some(path) = args.telemetry_out {
        robot.write_snapshot(&path).await?;
    }

    tracing::info!("Tankbot exited cleanly");
    Ok(())
}
