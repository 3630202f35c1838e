//! Parameters structure for ChassisCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for chassis control.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    // ---- GEOMETRY ----
    /// Distance between the left and right wheel contact points.
    ///
    /// Units: meters
    pub track_width_m: f64,

    // ---- CAPABILITIES ----
    /// Forward speed at full stick.
    ///
    /// Units: meters/second
    pub max_velocity_ms: f64,

    /// Forward speed at full stick in slow mode.
    ///
    /// Units: meters/second
    pub slow_velocity_ms: f64,

    /// Rotation rate at full stick.
    ///
    /// Units: radians/second
    pub max_angular_velocity_rads: f64,

    /// Rotation rate at full stick in slow mode.
    ///
    /// Units: radians/second
    pub slow_angular_velocity_rads: f64,

    /// Limit on the change of the forward speed demand.
    ///
    /// Units: meters/second^2
    pub max_acceleration_mss: f64,

    /// Limit on the change of the rotation rate demand.
    ///
    /// Units: radians/second^2
    pub max_angular_acceleration_radss: f64,

    /// Bound on the per-side voltage.
    ///
    /// Units: volts
    pub max_voltage: f64,

    // ---- FEEDFORWARD ----
    /// Static friction voltage.
    ///
    /// Units: volts
    pub ks: f64,

    /// Velocity gain.
    ///
    /// Units: volts/(meters/second)
    pub kv: f64,

    /// Acceleration gain.
    ///
    /// Units: volts/(meters/second^2)
    pub ka: f64,

    // ---- FEEDBACK ----
    /// Proportional gain on the wheel speed error.
    ///
    /// Units: volts/(meters/second)
    pub k_p: f64,

    // ---- DISTANCE MOVES ----
    /// Cruise speed of a distance move.
    ///
    /// Units: meters/second
    pub distance_velocity_ms: f64,

    /// Acceleration of a distance move.
    ///
    /// Units: meters/second^2
    pub distance_acceleration_mss: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            track_width_m: 0.96679,
            max_velocity_ms: 5.0,
            slow_velocity_ms: 1.0,
            max_angular_velocity_rads: 8.0,
            slow_angular_velocity_rads: 2.0,
            max_acceleration_mss: 5.0,
            max_angular_acceleration_radss: 8.0,
            max_voltage: 10.0,
            ks: 0.15473,
            kv: 2.3007,
            ka: 0.22029,
            k_p: 0.011179,
            distance_velocity_ms: 1.5,
            distance_acceleration_mss: 1.0,
        }
    }
}
