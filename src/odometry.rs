use std::sync::Arc;
use std::time::Duration;

use diffdrive_kinematics::WheelSpeeds;
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::bus::{LatestReceiver, Topic};
use crate::clock::Clock;
use crate::estimator::OdometryEstimator;
use crate::sample::OdometrySample;

/// Log one sample per this many at `info`; the rest go to `debug`.
const INFO_EVERY: u64 = 10;

/// Fixed-rate odometry loop.
///
/// Wheel-speed samples are applied as they arrive; every `period` the newest
/// pending sample is applied, the pose is integrated once and the result is
/// published. The estimator is owned by this task, so no locking is needed.
/// Runs until the process exits.
pub async fn run_odometry_task<C: Clock>(
    mut estimator: OdometryEstimator,
    clock: C,
    mut inlet: LatestReceiver<WheelSpeeds>,
    outlet: Topic<OdometrySample>,
    period: Duration,
) -> anyhow::Result<()> {
    info!(?period, drive = %estimator.drive(), "Odometry task started.");
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut inlet_open = true;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Some(speeds) = inlet.take_pending() {
                    estimator.on_wheel_speed_sample(speeds);
                }
                let sample = estimator.on_tick(clock.now());
                debug!(stamp = %sample.stamp, pose = %estimator.pose(), twist = %estimator.twist(), "Publishing odometry");
                outlet.publish(sample);
            }
            received = inlet.recv(), if inlet_open => {
                match received {
                    Some(speeds) => estimator.on_wheel_speed_sample(speeds),
                    None => {
                        warn!("Wheel speed inlet closed; holding the last velocity.");
                        inlet_open = false;
                    }
                }
            }
        }
    }
}

/// Downstream consumer of the odometry topic that reports the estimate.
pub async fn run_sample_logger(
    mut rx: broadcast::Receiver<Arc<OdometrySample>>,
) -> anyhow::Result<()> {
    let mut count: u64 = 0;
    loop {
        match rx.recv().await {
            Ok(sample) => {
                let pose = sample.planar_pose();
                let twist = sample.planar_twist();
                if count % INFO_EVERY == 0 {
                    info!(stamp = %sample.stamp, x = pose.x, y = pose.y, heading = pose.theta, vx = twist.vx, vth = twist.vth, "Odometry");
                } else {
                    debug!(stamp = %sample.stamp, x = pose.x, y = pose.y, heading = pose.theta, vx = twist.vx, vth = twist.vth, "Odometry");
                }
                count += 1;
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!("Odometry logger lagged by {} samples.", n);
            }
            Err(broadcast::error::RecvError::Closed) => {
                info!("Odometry topic closed; logger exiting.");
                return Ok(());
            }
        }
    }
}
