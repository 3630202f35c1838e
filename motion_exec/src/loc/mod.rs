//! # Localisation module
//!
//! This module provides the chassis pose estimate, dead-reckoned from the wheel odometry and the
//! inertial heading, and corrected by delayed vision pose samples.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod estimator;
mod params;

pub use estimator::*;
pub use params::Params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use util::maths::wrap_pi;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The pose of the chassis in the field frame.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChassisPose {
    /// The position of the chassis centre.
    ///
    /// Units: meters
    pub position_m: Vector2<f64>,

    /// Heading, counter-clockwise from the field x axis, in `[-pi, pi)`.
    ///
    /// Units: radians
    pub heading_rad: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during localisation.
#[derive(Debug, thiserror::Error)]
pub enum LocError {
    #[error("Could not load the localisation parameters: {0}")]
    ParamLoadError(util::params::LoadError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for ChassisPose {
    fn default() -> Self {
        Self {
            position_m: Vector2::zeros(),
            heading_rad: 0.0,
        }
    }
}

impl ChassisPose {
    pub fn new(x_m: f64, y_m: f64, heading_rad: f64) -> Self {
        Self {
            position_m: Vector2::new(x_m, y_m),
            heading_rad: wrap_pi(heading_rad),
        }
    }

    /// Linear interpolation between two poses, the heading takes the shortest way round.
    pub fn lerp(&self, other: &ChassisPose, t: f64) -> ChassisPose {
        let dh = wrap_pi(other.heading_rad - self.heading_rad);

        ChassisPose {
            position_m: self.position_m + (other.position_m - self.position_m) * t,
            heading_rad: wrap_pi(self.heading_rad + dh * t),
        }
    }
}
