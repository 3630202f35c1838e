//! Parameters structure for BalanceCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the balance controller.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    /// Forward speed used on approach and while correcting.
    ///
    /// Units: meters/second
    pub balance_speed_ms: f64,

    /// Pitch below which the chassis is considered level.
    ///
    /// Units: degrees
    pub level_tolerance_deg: f64,

    /// Pitch at or above which the chassis is reported as on the platform (`Correcting`).
    ///
    /// Units: degrees
    pub on_platform_tolerance_deg: f64,

    /// Pitch rate at or above which the platform is considered to be still tipping.
    ///
    /// Units: degrees/second
    pub pitch_rate_threshold_degs: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            balance_speed_ms: 0.375,
            level_tolerance_deg: 2.0,
            on_platform_tolerance_deg: 10.0,
            pitch_rate_threshold_degs: 10.0,
        }
    }
}
