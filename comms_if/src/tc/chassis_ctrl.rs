//! # Chassis control telecommands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A manouvre that can be completed by chassis control.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChassisCmd {
    /// Open-loop driver demand, as given by the sticks.
    ///
    /// All axes are normalised between -1 and +1 and scaled by the maximum (or slow) chassis
    /// speeds.
    Drive {
        /// Forward demand, positive is "forwards".
        forward: f64,

        /// Sideways demand. A differential chassis cannot strafe so this is ignored.
        strafe: f64,

        /// Rotation demand, positive turns to the left (right hand rule about Z+).
        rotation: f64,

        /// Use the slow speed limits instead of the maximum ones.
        slow: bool,
    },

    /// Drive straight for the given distance using a single trapezoidal profile.
    DriveDistance {
        /// The distance to travel in meters, negative values drive backwards.
        distance_m: f64,
    },

    /// Bring the chassis to a full stop.
    Stop,
}
