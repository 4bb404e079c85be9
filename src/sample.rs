//! Odometry output record: a stamped pose and twist, each with a 6×6
//! covariance over `(x, y, z, roll, pitch, yaw)` in row-major order.

use diffdrive_kinematics::{Pose, Quaternion, Twist};

use crate::clock::Time;

/// Covariance attached to every published pose.
///
/// Planar odometry is confident in x, y and yaw; z, roll and pitch are not
/// observed and get a huge variance so fusion filters ignore them.
pub const POSE_COVARIANCE: [f64; 36] = diagonal([1e-5, 1e-5, 1e12, 1e12, 1e12, 1e-3]);

/// Covariance attached to every published twist.
///
/// Deliberately the same matrix as [`POSE_COVARIANCE`]; downstream consumers
/// were tuned against that.
pub const TWIST_COVARIANCE: [f64; 36] = POSE_COVARIANCE;

const fn diagonal(d: [f64; 6]) -> [f64; 36] {
    let mut m = [0.0; 36];
    let mut i = 0;
    while i < 6 {
        m[i * 6 + i] = d[i];
        i += 1;
    }
    m
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Vector3 { x, y, z }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PoseWithCovariance {
    pub position: Vector3,
    pub orientation: Quaternion,
    pub covariance: [f64; 36],
}

#[derive(Debug, Clone, PartialEq)]
pub struct TwistWithCovariance {
    pub linear: Vector3,
    pub angular: Vector3,
    pub covariance: [f64; 36],
}

/// One estimate of position and velocity, produced fresh on every tick.
#[derive(Debug, Clone, PartialEq)]
pub struct OdometrySample {
    pub stamp: Time,
    /// Frame the pose is expressed in.
    pub frame_id: String,
    /// Frame the twist is expressed in.
    pub child_frame_id: String,
    pub pose: PoseWithCovariance,
    pub twist: TwistWithCovariance,
}

impl OdometrySample {
    pub fn new(stamp: Time, frames: &FrameIds, pose: Pose, twist: Twist) -> Self {
        OdometrySample {
            stamp,
            frame_id: frames.frame_id.clone(),
            child_frame_id: frames.child_frame_id.clone(),
            pose: PoseWithCovariance {
                position: Vector3::new(pose.x, pose.y, 0.0),
                orientation: Quaternion::from_yaw(pose.theta),
                covariance: POSE_COVARIANCE,
            },
            twist: TwistWithCovariance {
                linear: Vector3::new(twist.vx, twist.vy, 0.0),
                angular: Vector3::new(0.0, 0.0, twist.vth),
                covariance: TWIST_COVARIANCE,
            },
        }
    }

    /// Planar position of the sample. The heading is recovered from the
    /// quaternion and therefore lies in `[-PI, PI)`.
    pub fn planar_pose(&self) -> Pose {
        let q = &self.pose.orientation;
        let yaw = 2.0 * q.z.atan2(q.w);
        Pose::new(
            self.pose.position.x,
            self.pose.position.y,
            Pose::normalize_angle(yaw),
        )
    }

    pub fn planar_twist(&self) -> Twist {
        Twist {
            vx: self.twist.linear.x,
            vy: self.twist.linear.y,
            vth: self.twist.angular.z,
        }
    }
}

/// Names of the odometry frame and the robot base frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameIds {
    pub frame_id: String,
    pub child_frame_id: String,
}

impl Default for FrameIds {
    fn default() -> Self {
        FrameIds {
            frame_id: "odom".to_string(),
            child_frame_id: "base_footprint".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;
    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_covariance_layout() {
        let expected = [1e-5, 1e-5, 1e12, 1e12, 1e12, 1e-3];
        for row in 0..6 {
            for col in 0..6 {
                let value = POSE_COVARIANCE[row * 6 + col];
                if row == col {
                    assert_eq!(value, expected[row]);
                } else {
                    assert_eq!(value, 0.0);
                }
            }
        }
        assert_eq!(TWIST_COVARIANCE, POSE_COVARIANCE);
    }

    #[test]
    fn test_sample_fields() {
        let sample = OdometrySample::new(
            Time::new(5, 0),
            &FrameIds::default(),
            Pose::new(1.0, 2.0, PI / 2.0),
            Twist::new(0.5, 0.25),
        );
        assert_eq!(sample.frame_id, "odom");
        assert_eq!(sample.child_frame_id, "base_footprint");
        assert_eq!(sample.pose.position, Vector3::new(1.0, 2.0, 0.0));
        assert_eq!(sample.pose.orientation, Quaternion::from_yaw(PI / 2.0));
        assert_eq!(sample.twist.linear, Vector3::new(0.5, 0.0, 0.0));
        assert_eq!(sample.twist.angular, Vector3::new(0.0, 0.0, 0.25));
        assert_eq!(sample.pose.covariance, POSE_COVARIANCE);
        assert_eq!(sample.twist.covariance, POSE_COVARIANCE);
    }

    #[test]
    fn test_planar_pose_wraps_heading() {
        let sample = OdometrySample::new(
            Time::default(),
            &FrameIds::default(),
            Pose::new(0.0, 0.0, 2.0 * PI + 0.5),
            Twist::default(),
        );
        assert!((sample.planar_pose().theta - 0.5).abs() < EPSILON);
        assert_eq!(sample.planar_twist(), Twist::default());
    }
}
