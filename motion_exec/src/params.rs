//! # Motion Executable Parameters
//!
//! This module provide parameters for the motion executable.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionExecParams {
    /// Sleep out the rest of each cycle so the loop runs in real time. When false cycles run
    /// back to back.
    pub real_time: bool,

    /// Run time when no script is given.
    ///
    /// Units: seconds
    pub default_duration_s: f64,

    /// Number of consecutive cycle overruns after which safe mode is entered.
    pub max_consec_cycle_overruns: u64,

    /// Write telemetry to the session archive.
    pub archive_tm: bool,
}

impl Default for MotionExecParams {
    fn default() -> Self {
        Self {
            real_time: true,
            default_duration_s: 15.0,
            max_consec_cycle_overruns: 50,
            archive_tm: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_from_toml() {
        let p: MotionExecParams =
            util::params::from_toml_str(include_str!("../../params/motion_exec.toml")).unwrap();

        assert!(p.real_time);
        assert_eq!(p.max_consec_cycle_overruns, MotionExecParams::default().max_consec_cycle_overruns);
    }
}
