//! # Arm control telecommands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A command that can be completed by arm control.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ArmCmd {
    /// Move both joints to one of the named target poses.
    Pose(ArmPose),

    /// Nudge the joint setpoints manually.
    ///
    /// Rates are normalised between -1 and +1 and are scaled by the jog rate of the arm.
    Manual {
        /// Shoulder jog rate, normalised.
        shoulder_rate: f64,

        /// Elbow jog rate, normalised.
        elbow_rate: f64,
    },

    /// Stop the arm, holding the joints at their current measured angles.
    Stop,
}

/// The named target poses of the arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArmPose {
    /// Folded inside the frame perimeter.
    Stow,

    /// Scoring on the middle row.
    Mid,

    /// Scoring on the high row.
    High,

    /// Picking up from the substation shelf.
    Substation,

    /// Picking up a cone from the ground.
    GroundCone,

    /// Picking up a cube from the ground.
    GroundCube,
}

/// Error produced when a pose name cannot be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("\"{0}\" is not a recognised arm pose")]
pub struct ArmPoseParseError(pub String);

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl ArmPose {
    /// All named poses.
    pub const ALL: [ArmPose; 6] = [
        ArmPose::Stow,
        ArmPose::Mid,
        ArmPose::High,
        ArmPose::Substation,
        ArmPose::GroundCone,
        ArmPose::GroundCube,
    ];

    /// The name used for this pose in scripts and logs.
    pub fn name(&self) -> &'static str {
        match self {
            ArmPose::Stow => "stow",
            ArmPose::Mid => "mid",
            ArmPose::High => "high",
            ArmPose::Substation => "substation",
            ArmPose::GroundCone => "ground-cone",
            ArmPose::GroundCube => "ground-cube",
        }
    }
}

impl fmt::Display for ArmPose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ArmPose {
    type Err = ArmPoseParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase().replace('_', "-");

        ArmPose::ALL
            .iter()
            .find(|p| p.name() == lower)
            .copied()
            .ok_or_else(|| ArmPoseParseError(s.to_string()))
    }
}
