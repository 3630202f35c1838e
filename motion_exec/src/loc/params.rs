//! # Localisation Parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the pose estimator
#[derive(Debug, Deserialize, Clone)]
pub struct Params {
    /// Distance between the left and right wheel contact points, used for the heading when the
    /// inertial sensor is unavailable.
    ///
    /// Units: meters
    pub track_width_m: f64,

    /// How far back the odometry history is kept. Vision samples older than this are dropped.
    ///
    /// Units: seconds
    pub history_window_s: f64,

    /// Fraction of the difference between a vision sample and the odometry estimate which is
    /// applied, before scaling by the sample's confidence.
    pub vision_weight: f64,

    /// Time without a fused vision sample after which the estimate is reported stale.
    ///
    /// Units: seconds
    pub stale_after_s: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            track_width_m: 0.96679,
            history_window_s: 1.5,
            vision_weight: 0.5,
            stale_after_s: 2.0,
        }
    }
}
