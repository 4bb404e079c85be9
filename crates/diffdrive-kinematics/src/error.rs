//! Error types for the kinematics library.
//!
//! This module defines the errors returned when building the kinematic model
//! or integrating a pose.

use core::fmt;

/// Errors that can occur in kinematic calculations.
#[derive(Debug, Clone, PartialEq)]
pub enum KinematicsError {
    /// A kinematic parameter was NaN or infinite.
    NonFiniteParameter(&'static str),
    /// `2 * wheel_distance + axial_distance` is zero, which makes the angular
    /// velocity term a division by zero.
    DegenerateGeometry(&'static str),
    /// Error for negative time delta.
    /// This variant is returned when a negative time delta is used for pose updates.
    NegativeTimeDelta(&'static str),
}

impl fmt::Display for KinematicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KinematicsError::NonFiniteParameter(msg) => {
                write!(f, "Non-finite kinematic parameter: {}", msg)
            }
            KinematicsError::DegenerateGeometry(msg) => {
                write!(f, "Degenerate wheel geometry: {}", msg)
            }
            KinematicsError::NegativeTimeDelta(msg) => write!(f, "Negative time delta: {}", msg),
        }
    }
}

impl core::error::Error for KinematicsError {}
