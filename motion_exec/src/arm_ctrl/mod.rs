//! Arm control module
//!
//! Closed-loop control of the two-joint arm. Each joint is driven by a profiled joint
//! controller, and every new setpoint is checked against the frame perimeter before it is
//! accepted.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod geometry;
mod joint_ctrl;
mod limits;
mod params;
pub mod perimeter_guard;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use geometry::*;
pub use joint_ctrl::*;
pub use limits::*;
pub use params::*;
pub use perimeter_guard::GuardVerdict;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during ArmCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum ArmCtrlError {
    #[error("Could not load the ArmCtrl parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Invalid ArmCtrl parameters: {0}")]
    InvalidParams(String),
}

/// Identifies one of the arm's joints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum JointId {
    Shoulder,
    Elbow,
}

impl std::fmt::Display for JointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JointId::Shoulder => write!(f, "shoulder"),
            JointId::Elbow => write!(f, "elbow"),
        }
    }
}
