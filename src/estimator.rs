use diffdrive_kinematics::{DifferentialDrive, KinematicsError, Pose, Twist, WheelSpeeds};
use tracing::{debug, warn};

use crate::clock::Time;
use crate::sample::{FrameIds, OdometrySample};

/// Dead-reckoning odometry for a differential drive.
///
/// Wheel-speed samples overwrite the current twist; each tick integrates that
/// twist over the time since the previous tick and emits a sample. Both
/// entry points take `&mut self`, so whoever owns the estimator serializes
/// them.
#[derive(Debug, Clone)]
pub struct OdometryEstimator {
    drive: DifferentialDrive,
    frames: FrameIds,
    pose: Pose,
    twist: Twist,
    last_tick: Time,
}

impl OdometryEstimator {
    /// Starts at the origin, at rest, with `start` as the previous tick.
    pub fn new(drive: DifferentialDrive, frames: FrameIds, start: Time) -> Self {
        OdometryEstimator {
            drive,
            frames,
            pose: Pose::default(),
            twist: Twist::default(),
            last_tick: start,
        }
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn twist(&self) -> Twist {
        self.twist
    }

    pub fn drive(&self) -> &DifferentialDrive {
        &self.drive
    }

    /// Replaces the current twist with the one implied by `speeds`.
    pub fn on_wheel_speed_sample(&mut self, speeds: WheelSpeeds) {
        debug!(right = speeds.right, left = speeds.left, "Wheel speed sample received");
        self.twist = self.drive.forward_kinematics(speeds);
    }

    /// Integrates the current twist up to `now` and returns the new estimate.
    ///
    /// If `now` is earlier than the previous tick the step is skipped and the
    /// pose is reported unchanged; the tick time still moves to `now`.
    pub fn on_tick(&mut self, now: Time) -> OdometrySample {
        let dt = now.seconds_since(self.last_tick);
        match self.drive.integrate(self.pose, self.twist, dt) {
            Ok(pose) => self.pose = pose,
            Err(KinematicsError::NegativeTimeDelta(_)) => {
                warn!(
                    dt,
                    last_tick = %self.last_tick,
                    now = %now,
                    "Clock went backwards; skipping integration for this tick"
                );
            }
            Err(e) => warn!(error = %e, "Pose integration failed; keeping previous pose"),
        }
        self.last_tick = now;

        OdometrySample::new(now, &self.frames, self.pose, self.twist)
    }
}
