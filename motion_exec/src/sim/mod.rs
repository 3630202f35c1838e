//! # Simulated plant
//!
//! A simple model of the arm joints, the drive sides, the charge station and the vision system,
//! used to run the control loop without hardware. The models are first order and deliberately
//! crude, they only need to respond in the right direction with a plausible lag.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod plant;

pub use params::Params;
pub use plant::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur when creating the simulated plant.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("Could not load the simulation parameters: {0}")]
    ParamLoadError(util::params::LoadError),
}
