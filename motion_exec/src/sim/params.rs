//! Parameters for the simulated plant

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    // ---- ARM ----
    /// Steady state joint speed per volt.
    ///
    /// Units: (degrees/second)/volt
    pub joint_gain_degs_per_v: f64,

    /// Units: seconds
    pub joint_time_const_s: f64,

    /// Units: degrees
    pub initial_shoulder_deg: f64,

    /// Units: degrees
    pub initial_elbow_deg: f64,

    // ---- CHASSIS ----
    /// Units: meters
    pub track_width_m: f64,

    /// Voltage needed to overcome static friction.
    ///
    /// Units: volts
    pub wheel_ks: f64,

    /// Units: volts/(meters/second)
    pub wheel_kv: f64,

    /// Units: seconds
    pub wheel_time_const_s: f64,

    /// Time constant of the wheels slowing with the brake engaged and no voltage.
    ///
    /// Units: seconds
    pub brake_time_const_s: f64,

    /// Initial chassis pose as `[x, y, heading]`.
    ///
    /// Units: meters, meters, radians
    pub initial_pose: [f64; 3],

    /// Report the inertial sensor readings. When false the chassis sensors carry no attitude.
    pub imu_available: bool,

    // ---- CHARGE STATION ----
    /// Field x position of the near edge of the station.
    ///
    /// Units: meters
    pub station_start_m: f64,

    /// Units: meters
    pub station_length_m: f64,

    /// Tilt of the station with the chassis at either end.
    ///
    /// Units: degrees
    pub station_max_pitch_deg: f64,

    /// Distance from the station centre over which the tilt goes from level to maximum.
    ///
    /// Units: meters
    pub station_balance_band_m: f64,

    /// Units: seconds
    pub station_time_const_s: f64,

    // ---- VISION ----
    pub vision_enabled: bool,

    /// Units: seconds
    pub vision_period_s: f64,

    /// Age of each sample when it is delivered.
    ///
    /// Units: seconds
    pub vision_latency_s: f64,

    pub vision_confidence: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            joint_gain_degs_per_v: 20.0,
            joint_time_const_s: 0.05,
            initial_shoulder_deg: 90.0,
            initial_elbow_deg: 10.0,
            track_width_m: 0.96679,
            wheel_ks: 0.15473,
            wheel_kv: 2.3007,
            wheel_time_const_s: 0.1,
            brake_time_const_s: 0.02,
            initial_pose: [0.0, 0.0, 0.0],
            imu_available: true,
            station_start_m: 2.0,
            station_length_m: 1.2,
            station_max_pitch_deg: 15.0,
            station_balance_band_m: 0.3,
            station_time_const_s: 0.3,
            vision_enabled: true,
            vision_period_s: 0.1,
            vision_latency_s: 0.06,
            vision_confidence: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_from_toml() {
        let p: Params =
            util::params::from_toml_str(include_str!("../../../params/sim.toml")).unwrap();

        assert_eq!(p.initial_shoulder_deg, Params::default().initial_shoulder_deg);
        assert!(p.imu_available);
    }
}
