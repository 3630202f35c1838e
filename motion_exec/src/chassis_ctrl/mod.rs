//! Chassis control module
//!
//! Converts driver demands and straight-line distance moves into left and right side voltages
//! for the differential drive.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod kinematics;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use kinematics::*;
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during ChassisCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum ChassisCtrlError {
    #[error("Could not load the ChassisCtrl parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Cannot start a distance move without valid wheel distances")]
    NoOdometry,
}
