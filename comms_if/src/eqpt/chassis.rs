//! # Chassis Equipment Data

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Readings from the drive sides and the inertial sensor.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct ChassisSens {
    /// Distance travelled by the left side since power on (motor rotations x gear ratio x wheel
    /// circumference).
    ///
    /// Units: meters
    pub left_distance_m: f64,

    /// Distance travelled by the right side since power on.
    ///
    /// Units: meters
    pub right_distance_m: f64,

    /// Left side ground speed.
    ///
    /// Units: meters/second
    pub left_velocity_ms: f64,

    /// Right side ground speed.
    ///
    /// Units: meters/second
    pub right_velocity_ms: f64,

    /// Inertial sensor reading, or `None` if the sensor is unavailable.
    pub imu: Option<ImuSens>,
}

/// Attitude reported by the inertial sensor.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct ImuSens {
    /// Chassis tilt about the axis perpendicular to the direction of travel. Positive when the
    /// nose is up.
    ///
    /// Units: degrees
    pub pitch_deg: f64,

    /// Chassis heading, counter-clockwise positive.
    ///
    /// Units: degrees
    pub yaw_deg: f64,
}

/// Demands sent to the drive sides.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct ChassisDems {
    /// Left side motor demand.
    ///
    /// Units: volts
    pub left_voltage: f64,

    /// Right side motor demand.
    ///
    /// Units: volts
    pub right_voltage: f64,

    /// Engage the brake idle mode on the drive motors.
    pub brake: bool,
}

/// A pose measurement from the vision system.
///
/// Samples are captured in the past and arrive asynchronously, the capture time is carried in
/// `timestamp_s` using the same time base as the control loop.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct VisionPose {
    /// Field frame x position.
    ///
    /// Units: meters
    pub x_m: f64,

    /// Field frame y position.
    ///
    /// Units: meters
    pub y_m: f64,

    /// Field frame heading, counter-clockwise from the x axis.
    ///
    /// Units: radians
    pub heading_rad: f64,

    /// Capture time of the image the pose was computed from.
    ///
    /// Units: seconds
    pub timestamp_s: f64,

    /// Confidence in the measurement, between 0 (ignore) and 1 (full trust).
    pub confidence: f64,
}
