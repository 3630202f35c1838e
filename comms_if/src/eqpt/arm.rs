//! # Arm Equipment Data

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A reading from a joint's absolute encoder.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct JointSens {
    /// Absolute angle of the joint, already wrapped about the joint's configured zero offset.
    ///
    /// Units: degrees, expected range [0, 360)
    pub angle_deg: f64,

    /// Angular velocity of the joint.
    ///
    /// Units: degrees/second
    pub velocity_degs: f64,
}

/// Voltage demands sent to the arm joint motors.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct ArmDems {
    /// Shoulder motor demand (sign already follows the motor mounting).
    ///
    /// Units: volts
    pub shoulder_voltage: f64,

    /// Elbow motor demand (sign already follows the motor mounting).
    ///
    /// Units: volts
    pub elbow_voltage: f64,
}
