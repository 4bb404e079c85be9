mod bus; // broadcast outlet and single-slot inlet
mod clock;
mod config;
mod estimator;
mod odometry; // fixed-rate loop and sample logger
mod sample;
mod source; // simulated wheel-speed feed

use anyhow::Context;
use diffdrive_kinematics::WheelSpeeds;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::bus::Topic;
use crate::clock::{Clock, SystemClock};
use crate::estimator::OdometryEstimator;
use crate::sample::{FrameIds, OdometrySample};
use crate::source::WheelSpeedSource;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Odometry node starting.");

    let settings = config::load_config(config::config_path_from_args(std::env::args().skip(1)))
        .context("failed to load configuration")?;
    let drive = settings
        .kinematics()
        .context("invalid kinematic parameters")?;
    info!(
        wheel_distance = drive.wheel_distance(),
        axial_distance = drive.axial_distance(),
        alpha = drive.alpha(),
        "Kinematic parameters loaded"
    );

    let tick_period = settings.tick_period()?;

    let outlet: Topic<OdometrySample> = Topic::new(settings.odometry.topic_capacity);
    let logger_rx = outlet.subscribe();
    let (inlet_tx, inlet_rx) = bus::latest::<WheelSpeeds>();

    let _source = if settings.source.enabled {
        let source = WheelSpeedSource::from_settings(&settings.source, settings.source_period()?);
        Some(source.spawn(inlet_tx).context("failed to spawn wheel speed source")?)
    } else {
        warn!("Wheel speed source disabled; velocity will stay at zero.");
        None
    };

    let frames = FrameIds {
        frame_id: settings.odometry.frame_id.clone(),
        child_frame_id: settings.odometry.child_frame_id.clone(),
    };
    let clock = SystemClock;
    let estimator = OdometryEstimator::new(drive, frames, clock.now());

    tokio::try_join!(
        odometry::run_odometry_task(
            estimator,
            clock,
            inlet_rx,
            outlet,
            tick_period
        ),
        odometry::run_sample_logger(logger_rx),
    )?;

    info!("Odometry node finished.");
    Ok(())
}
