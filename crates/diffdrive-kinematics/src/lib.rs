#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![doc = "A `no_std` library for 2D differential-drive odometry."]
#![doc = ""]
#![doc = "This crate provides the pose, twist and wheel-speed types, the wheel-speed"]
#![doc = "kinematic model and the first-order Euler step used to dead-reckon a pose."]

use core::f64::consts::PI;
use core::fmt;
use libm::{cos, sin};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod error;
pub use error::KinematicsError;

/// A 2‑D pose `(x, y, θ)` in meters and radians (θ measured counter‑clockwise
/// from the x‑axis in the odometry frame).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    /// Odometry‑frame x position (m).
    pub x: f64,
    /// Odometry‑frame y position (m).
    pub y: f64,
    /// Heading (rad). Accumulated without wrapping, so it may leave `[-PI, PI)`.
    pub theta: f64,
}

impl Pose {
    /// Construct a new pose.
    ///
    /// # Arguments
    ///
    /// * `x`: Odometry-frame x position in meters.
    /// * `y`: Odometry-frame y position in meters.
    /// * `theta`: Heading in radians.
    pub const fn new(x: f64, y: f64, theta: f64) -> Self {
        Pose { x, y, theta }
    }

    /// Normalize an angle to be within `[-PI, PI)`.
    ///
    /// Angles at `PI` will be normalized to `-PI`.
    ///
    /// # Arguments
    ///
    /// * `angle`: The angle in radians to normalize.
    ///
    /// # Returns
    ///
    /// The normalized angle in radians.
    pub fn normalize_angle(angle: f64) -> f64 {
        let a = angle % (2.0 * PI);
        if a >= PI {
            a - 2.0 * PI
        } else if a < -PI {
            a + 2.0 * PI
        } else {
            a
        }
    }

    /// The heading wrapped to `[-PI, PI)`.
    ///
    /// The stored `theta` is left untouched; this is a read-time view for display.
    pub fn heading(&self) -> f64 {
        Pose::normalize_angle(self.theta)
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(x: {:.2}, y: {:.2}, θ: {:.2} rad)", self.x, self.y, self.theta)
    }
}

/// A twist expressed in the robot base frame.
/// A twist represents the linear and angular velocities of the robot.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Twist {
    /// Linear x velocity (m/s) in the robot's base frame.
    pub vx: f64,
    /// Linear y velocity (m/s). Always zero for a differential drive.
    pub vy: f64,
    /// Angular z velocity (rad/s) around the robot's base frame z-axis.
    pub vth: f64,
}

impl Twist {
    /// Construct a new twist with no lateral component.
    ///
    /// # Arguments
    ///
    /// * `vx`: Linear velocity along the robot's x-axis (m/s).
    /// * `vth`: Angular velocity around the robot's z-axis (rad/s).
    pub const fn new(vx: f64, vth: f64) -> Self {
        Twist { vx, vy: 0.0, vth }
    }
}

impl fmt::Display for Twist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(vx: {:.2} m/s, vy: {:.2} m/s, ωz: {:.2} rad/s)",
            self.vx, self.vy, self.vth
        )
    }
}

/// Right and left wheel speeds as reported by the motor controller.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelSpeeds {
    /// Right wheel speed (m/s).
    pub right: f64,
    /// Left wheel speed (m/s).
    pub left: f64,
}

impl WheelSpeeds {
    /// Construct wheel speeds.
    ///
    /// # Arguments
    ///
    /// * `right`: Right wheel speed (m/s).
    /// * `left`: Left wheel speed (m/s).
    pub const fn new(right: f64, left: f64) -> Self {
        WheelSpeeds { right, left }
    }
}

impl fmt::Display for WheelSpeeds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(R: {:.2} m/s, L: {:.2} m/s)", self.right, self.left)
    }
}

/// Unit quaternion `(x, y, z, w)` describing a 3‑D orientation.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    /// x component.
    pub x: f64,
    /// y component.
    pub y: f64,
    /// z component.
    pub z: f64,
    /// Scalar component.
    pub w: f64,
}

impl Quaternion {
    /// The identity rotation.
    pub const IDENTITY: Quaternion = Quaternion { x: 0.0, y: 0.0, z: 0.0, w: 1.0 };

    /// Quaternion for a pure rotation of `yaw` radians about the z-axis.
    ///
    /// The yaw does not need to be normalized.
    pub fn from_yaw(yaw: f64) -> Self {
        let half = yaw * 0.5;
        Quaternion {
            x: 0.0,
            y: 0.0,
            z: sin(half),
            w: cos(half),
        }
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Quaternion::IDENTITY
    }
}

/// Differential‑drive kinematic model.
///
/// Holds the kinematic parameters of the drivetrain, which are fixed once the
/// model is built, and turns wheel speeds into a body twist.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "DriveParameters"))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifferentialDrive {
    /// Distance between the wheels (m).
    wheel_distance: f64,
    /// Axial distance (m).
    axial_distance: f64,
    /// Dimensionless angular scale factor.
    alpha: f64,
}

/// Unchecked wire form of [`DifferentialDrive`]; deserialization goes
/// through [`DifferentialDrive::new`].
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct DriveParameters {
    wheel_distance: f64,
    axial_distance: f64,
    alpha: f64,
}

#[cfg(feature = "serde")]
impl TryFrom<DriveParameters> for DifferentialDrive {
    type Error = KinematicsError;

    fn try_from(p: DriveParameters) -> Result<Self, Self::Error> {
        DifferentialDrive::new(p.wheel_distance, p.axial_distance, p.alpha)
    }
}

impl Default for DifferentialDrive {
    fn default() -> Self {
        DifferentialDrive {
            wheel_distance: 1.0,
            axial_distance: 1.0,
            alpha: 1.0,
        }
    }
}

impl DifferentialDrive {
    /// Construct a new differential‑drive model.
    ///
    /// # Arguments
    ///
    /// * `wheel_distance`: The distance between the two drive wheels in meters.
    /// * `axial_distance`: The axial distance in meters.
    /// * `alpha`: Scale factor applied to the angular velocity term.
    ///
    /// # Errors
    ///
    /// Returns `Err(KinematicsError::NonFiniteParameter)` if any parameter is NaN or infinite.
    /// Returns `Err(KinematicsError::DegenerateGeometry)` if `2 * wheel_distance + axial_distance` is zero.
    pub fn new(
        wheel_distance: f64,
        axial_distance: f64,
        alpha: f64,
    ) -> Result<Self, KinematicsError> {
        if !wheel_distance.is_finite() {
            return Err(KinematicsError::NonFiniteParameter("wheel_distance"));
        }
        if !axial_distance.is_finite() {
            return Err(KinematicsError::NonFiniteParameter("axial_distance"));
        }
        if !alpha.is_finite() {
            return Err(KinematicsError::NonFiniteParameter("alpha"));
        }
        if 2.0 * wheel_distance + axial_distance == 0.0 {
            return Err(KinematicsError::DegenerateGeometry(
                "2 * wheel_distance + axial_distance must be non-zero",
            ));
        }
        Ok(DifferentialDrive {
            wheel_distance,
            axial_distance,
            alpha,
        })
    }

    /// Returns the wheel distance.
    pub fn wheel_distance(&self) -> f64 {
        self.wheel_distance
    }

    /// Returns the axial distance.
    pub fn axial_distance(&self) -> f64 {
        self.axial_distance
    }

    /// Returns the angular scale factor.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Calculates the robot's body twist from the wheel speeds.
    ///
    /// `vx` is the mean of both wheels and `vth` is
    /// `4 * alpha * (right - vx) / (2 * wheel_distance + axial_distance)`.
    /// The lateral velocity is always zero. Inputs are not validated, so
    /// NaN or infinite speeds propagate into the result.
    ///
    /// # Arguments
    ///
    /// * `wheel_speeds`: The measured right and left wheel speeds.
    ///
    /// # Returns
    ///
    /// The resulting body twist.
    pub fn forward_kinematics(&self, wheel_speeds: WheelSpeeds) -> Twist {
        let vx = (wheel_speeds.right + wheel_speeds.left) / 2.0;
        let vth = (4.0 * self.alpha * (wheel_speeds.right - vx))
            / (2.0 * self.wheel_distance + self.axial_distance);

        Twist::new(vx, vth)
    }

    /// Integrates a body twist over `dt` seconds with a single Euler step.
    ///
    /// The twist is assumed constant over the interval and is rotated into
    /// the odometry frame using the heading at the start of the step. The
    /// heading is accumulated as-is and never wrapped. A zero `dt` returns
    /// the pose unchanged.
    ///
    /// # Arguments
    ///
    /// * `current_pose`: The robot's current pose `(x, y, theta)`.
    /// * `twist`: The body twist to apply.
    /// * `dt`: The time delta in seconds over which the twist is applied.
    ///
    /// # Errors
    ///
    /// Returns `Err(KinematicsError::NegativeTimeDelta)` if `dt` is negative.
    pub fn integrate(
        &self,
        current_pose: Pose,
        twist: Twist,
        dt: f64,
    ) -> Result<Pose, KinematicsError> {
        if dt < 0.0 {
            return Err(KinematicsError::NegativeTimeDelta("must be non-negative"));
        }
        if dt == 0.0 {
            return Ok(current_pose);
        }

        let (sin_th, cos_th) = (sin(current_pose.theta), cos(current_pose.theta));
        let delta_x = (twist.vx * cos_th - twist.vy * sin_th) * dt;
        let delta_y = (twist.vx * sin_th + twist.vy * cos_th) * dt;
        let delta_theta = twist.vth * dt;

        Ok(Pose {
            x: current_pose.x + delta_x,
            y: current_pose.y + delta_y,
            theta: current_pose.theta + delta_theta,
        })
    }

    /// Convenience function to integrate directly from wheel speeds.
    ///
    /// # Errors
    ///
    /// Returns `Err(KinematicsError::NegativeTimeDelta)` if `dt` is negative (propagated from `integrate`).
    pub fn integrate_wheel_speeds(
        &self,
        current_pose: Pose,
        wheel_speeds: WheelSpeeds,
        dt: f64,
    ) -> Result<Pose, KinematicsError> {
        let twist = self.forward_kinematics(wheel_speeds);
        self.integrate(current_pose, twist, dt)
    }
}

impl fmt::Display for DifferentialDrive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DifferentialDrive (W: {:.2} m, A: {:.2} m, α: {:.2})",
            self.wheel_distance, self.axial_distance, self.alpha
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_pose_normalization() {
        assert!((Pose::normalize_angle(0.0) - 0.0).abs() < EPSILON);
        assert!((Pose::normalize_angle(PI) - (-PI)).abs() < EPSILON); // PI maps to -PI for [-PI, PI)
        assert!((Pose::normalize_angle(-PI) - -PI).abs() < EPSILON);
        assert!((Pose::normalize_angle(2.5 * PI) - 0.5 * PI).abs() < EPSILON);
        assert!((Pose::normalize_angle(-2.5 * PI) - -0.5 * PI).abs() < EPSILON);
    }

    #[test]
    fn test_heading_does_not_touch_theta() {
        let pose = Pose::new(0.0, 0.0, 2.5 * PI);
        assert!((pose.heading() - 0.5 * PI).abs() < EPSILON);
        assert_eq!(pose.theta, 2.5 * PI);
    }

    #[test]
    fn test_default_parameters() {
        let drive = DifferentialDrive::default();
        assert_eq!(drive.wheel_distance(), 1.0);
        assert_eq!(drive.axial_distance(), 1.0);
        assert_eq!(drive.alpha(), 1.0);
    }

    #[test]
    fn test_constructor_accepts_negative_but_usable_geometry() {
        let drive = DifferentialDrive::new(-1.0, 3.0, 0.5).unwrap();
        assert_eq!(drive.wheel_distance(), -1.0);
        assert_eq!(drive.axial_distance(), 3.0);
        assert_eq!(drive.alpha(), 0.5);
    }

    #[test]
    fn test_constructor_degenerate_geometry() {
        let result = DifferentialDrive::new(0.5, -1.0, 1.0);
        assert!(matches!(result, Err(KinematicsError::DegenerateGeometry(_))));
        let zeros = DifferentialDrive::new(0.0, 0.0, 1.0);
        assert!(matches!(zeros, Err(KinematicsError::DegenerateGeometry(_))));
    }

    #[test]
    fn test_constructor_non_finite() {
        assert_eq!(
            DifferentialDrive::new(f64::NAN, 1.0, 1.0),
            Err(KinematicsError::NonFiniteParameter("wheel_distance"))
        );
        assert_eq!(
            DifferentialDrive::new(1.0, f64::INFINITY, 1.0),
            Err(KinematicsError::NonFiniteParameter("axial_distance"))
        );
        assert_eq!(
            DifferentialDrive::new(1.0, 1.0, f64::NEG_INFINITY),
            Err(KinematicsError::NonFiniteParameter("alpha"))
        );
    }

    #[test]
    fn test_forward_kinematics_matches_model() {
        let drive = DifferentialDrive::new(0.4, 0.3, 1.2).unwrap();
        for &(r, l) in &[(1.0, 1.0), (0.5, -0.5), (2.0, 0.25), (-1.5, 0.75), (0.0, 0.0)] {
            let twist = drive.forward_kinematics(WheelSpeeds::new(r, l));
            let vx = (r + l) / 2.0;
            let vth = 4.0 * 1.2 * (r - vx) / (2.0 * 0.4 + 0.3);
            assert!((twist.vx - vx).abs() < EPSILON);
            assert!((twist.vth - vth).abs() < EPSILON);
            assert_eq!(twist.vy, 0.0);
        }
    }

    #[test]
    fn test_forward_kinematics_straight() {
        let drive = DifferentialDrive::default();
        let twist = drive.forward_kinematics(WheelSpeeds::new(1.0, 1.0));
        assert!((twist.vx - 1.0).abs() < EPSILON);
        assert!((twist.vth - 0.0).abs() < EPSILON);
    }

    #[test]
    fn test_forward_kinematics_pivot_turn() {
        let drive = DifferentialDrive::default(); // W=1, A=1, alpha=1
        // vx = 0, vth = 4 * 1 * (0.3 - 0) / 3 = 0.4
        let twist = drive.forward_kinematics(WheelSpeeds::new(0.3, -0.3));
        assert!((twist.vx - 0.0).abs() < EPSILON);
        assert!((twist.vth - 0.4).abs() < EPSILON);
    }

    #[test]
    fn test_forward_kinematics_propagates_nan() {
        let drive = DifferentialDrive::default();
        let twist = drive.forward_kinematics(WheelSpeeds::new(f64::NAN, 1.0));
        assert!(twist.vx.is_nan());
        assert!(twist.vth.is_nan());
        assert_eq!(twist.vy, 0.0);
    }

    #[test]
    fn test_integrate_straight_no_rotation() {
        let drive = DifferentialDrive::default();
        let new_pose = drive
            .integrate(Pose::default(), Twist::new(1.0, 0.0), 1.0)
            .unwrap();
        assert!((new_pose.x - 1.0).abs() < EPSILON);
        assert!((new_pose.y - 0.0).abs() < EPSILON);
        assert!((new_pose.theta - 0.0).abs() < EPSILON);
    }

    #[test]
    fn test_integrate_pivot_turn_no_translation() {
        let drive = DifferentialDrive::default();
        let new_pose = drive
            .integrate(Pose::default(), Twist::new(0.0, PI / 2.0), 1.0)
            .unwrap();
        assert!((new_pose.x - 0.0).abs() < EPSILON);
        assert!((new_pose.y - 0.0).abs() < EPSILON);
        assert!((new_pose.theta - PI / 2.0).abs() < EPSILON);
    }

    #[test]
    fn test_integrate_heading_is_not_wrapped() {
        let drive = DifferentialDrive::default();
        let mut pose = Pose::default();
        for _ in 0..5 {
            pose = drive.integrate(pose, Twist::new(0.0, PI / 2.0), 1.0).unwrap();
        }
        // Five quarter turns accumulate to 2.5 * PI instead of wrapping back.
        assert!((pose.theta - 2.5 * PI).abs() < EPSILON);
    }

    #[test]
    fn test_integrate_uses_start_heading() {
        let drive = DifferentialDrive::default();
        let current_pose = Pose::new(1.0, 2.0, PI / 4.0);
        let new_pose = drive
            .integrate(current_pose, Twist::new(1.0, PI / 2.0), 0.5)
            .unwrap();
        // delta_x = delta_y = cos(PI/4) * 0.5 = sqrt(2)/4
        let expected = 2.0_f64.sqrt() / 4.0;
        assert!((new_pose.x - (1.0 + expected)).abs() < EPSILON);
        assert!((new_pose.y - (2.0 + expected)).abs() < EPSILON);
        assert!((new_pose.theta - PI / 2.0).abs() < EPSILON);
    }

    #[test]
    fn test_integrate_lateral_velocity_rotates_into_frame() {
        let drive = DifferentialDrive::default();
        let twist = Twist { vx: 0.0, vy: 1.0, vth: 0.0 };
        let new_pose = drive.integrate(Pose::new(0.0, 0.0, PI / 2.0), twist, 1.0).unwrap();
        assert!((new_pose.x - (-1.0)).abs() < EPSILON);
        assert!((new_pose.y - 0.0).abs() < EPSILON);
    }

    #[test]
    fn test_integrate_zero_dt_is_identity() {
        let drive = DifferentialDrive::default();
        let current_pose = Pose::new(3.0, -2.0, 7.0);
        for twist in [
            Twist::new(1.0, 1.0),
            Twist::new(-4.0, 0.0),
            Twist::new(f64::INFINITY, f64::NAN),
        ] {
            let new_pose = drive.integrate(current_pose, twist, 0.0).unwrap();
            assert_eq!(new_pose, current_pose);
        }
    }

    #[test]
    fn test_integrate_negative_dt() {
        let drive = DifferentialDrive::default();
        let result = drive.integrate(Pose::default(), Twist::new(1.0, 0.0), -0.1);
        assert!(matches!(result, Err(KinematicsError::NegativeTimeDelta("must be non-negative"))));
    }

    #[test]
    fn test_integrate_wheel_speeds_straight() {
        let drive = DifferentialDrive::default();
        let new_pose = drive
            .integrate_wheel_speeds(Pose::default(), WheelSpeeds::new(0.5, 0.5), 2.0)
            .unwrap();
        assert!((new_pose.x - 1.0).abs() < EPSILON);
        assert!((new_pose.y - 0.0).abs() < EPSILON);
        assert!((new_pose.theta - 0.0).abs() < EPSILON);
    }

    #[test]
    fn test_quaternion_from_yaw() {
        let q = Quaternion::from_yaw(0.0);
        assert_eq!(q, Quaternion::IDENTITY);

        let q = Quaternion::from_yaw(PI / 2.0);
        let half = (PI / 4.0).sin();
        assert!((q.z - half).abs() < EPSILON);
        assert!((q.w - half).abs() < EPSILON);
        assert_eq!(q.x, 0.0);
        assert_eq!(q.y, 0.0);

        // Unwrapped yaw yields the same rotation up to sign.
        let wrapped = Quaternion::from_yaw(PI / 2.0 + 2.0 * PI);
        assert!((wrapped.z + q.z).abs() < EPSILON);
        assert!((wrapped.w + q.w).abs() < EPSILON);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_validates_parameters() {
        let drive: DifferentialDrive =
            serde_json::from_str(r#"{"wheel_distance":0.6,"axial_distance":0.2,"alpha":0.9}"#)
                .unwrap();
        assert_eq!(drive, DifferentialDrive::new(0.6, 0.2, 0.9).unwrap());

        let degenerate = serde_json::from_str::<DifferentialDrive>(
            r#"{"wheel_distance":0.5,"axial_distance":-1.0,"alpha":1.0}"#,
        );
        assert!(degenerate.is_err());
    }
}
