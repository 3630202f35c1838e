//! Differential drive kinematics

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Motion of the chassis as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ChassisSpeeds {
    /// Forward speed.
    ///
    /// Units: meters/second
    pub vx_ms: f64,

    /// Rotation rate, counter-clockwise positive.
    ///
    /// Units: radians/second
    pub omega_rads: f64,
}

/// Ground speed of each side of the chassis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct WheelSpeeds {
    /// Units: meters/second
    pub left_ms: f64,

    /// Units: meters/second
    pub right_ms: f64,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Inverse kinematics, chassis motion to side speeds.
pub fn to_wheel_speeds(speeds: &ChassisSpeeds, track_width_m: f64) -> WheelSpeeds {
    let half_track = 0.5 * track_width_m;

    WheelSpeeds {
        left_ms: speeds.vx_ms - speeds.omega_rads * half_track,
        right_ms: speeds.vx_ms + speeds.omega_rads * half_track,
    }
}

/// Forward kinematics, side speeds to chassis motion.
pub fn to_chassis_speeds(wheels: &WheelSpeeds, track_width_m: f64) -> ChassisSpeeds {
    ChassisSpeeds {
        vx_ms: 0.5 * (wheels.left_ms + wheels.right_ms),
        omega_rads: (wheels.right_ms - wheels.left_ms) / track_width_m,
    }
}

/// Scale both sides down equally so that neither exceeds `max_speed_ms`, keeping the ratio
/// between them (and so the turn radius) unchanged.
pub fn desaturate(wheels: &WheelSpeeds, max_speed_ms: f64) -> WheelSpeeds {
    let peak = wheels.left_ms.abs().max(wheels.right_ms.abs());

    if peak > max_speed_ms && peak > 0.0 {
        let scale = max_speed_ms / peak;
        WheelSpeeds {
            left_ms: wheels.left_ms * scale,
            right_ms: wheels.right_ms * scale,
        }
    } else {
        *wheels
    }
}
