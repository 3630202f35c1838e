//! # Telecommand module
//!
//! This module provides the command surface of the motion core. Telecommands are issued by the
//! binding layer (buttons, scripts) and are the only way external callers can change the state
//! of the controllers.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod arm_ctrl;
pub mod chassis_ctrl;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Internal
use arm_ctrl::ArmCmd;
use chassis_ctrl::ChassisCmd;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A telecommand, i.e. an instruction sent to the motion core by the binding layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Tc {
    /// Put the core into safe mode, all outputs are zeroed.
    MakeSafe,

    /// Leave safe mode.
    MakeUnsafe,

    /// A command for the arm.
    ArmCtrl(ArmCmd),

    /// A command for the chassis.
    ChassisCtrl(ChassisCmd),

    /// Begin the autonomous self-levelling behaviour.
    StartBalance,

    /// Interrupt the self-levelling behaviour.
    CancelBalance,
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum TcParseError {
    #[error("TC contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Tc {
    /// Parse a new TC from a JSON packet
    pub fn from_json(json_str: &str) -> Result<Self, TcParseError> {
        serde_json::from_str(json_str.trim()).map_err(TcParseError::InvalidJson)
    }

    /// Serialise the TC into a JSON packet
    pub fn to_json(&self) -> Result<String, TcParseError> {
        serde_json::to_string(self).map_err(TcParseError::InvalidJson)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use arm_ctrl::ArmPose;

    #[test]
    fn test_parse_unit_tcs() {
        assert_eq!(Tc::from_json("\"StartBalance\"").unwrap(), Tc::StartBalance);
        assert_eq!(Tc::from_json(" \"MakeSafe\" ").unwrap(), Tc::MakeSafe);
    }

    #[test]
    fn test_parse_arm_pose() {
        let tc = Tc::from_json(r#"{"ArmCtrl": {"Pose": "High"}}"#).unwrap();
        assert_eq!(tc, Tc::ArmCtrl(ArmCmd::Pose(ArmPose::High)));
    }

    #[test]
    fn test_parse_drive() {
        let tc = Tc::from_json(
            r#"{"ChassisCtrl": {"Drive": {"forward": 0.5, "strafe": 0.0, "rotation": -0.25, "slow": true}}}"#
        ).unwrap();

        match tc {
            Tc::ChassisCtrl(ChassisCmd::Drive { forward, rotation, slow, .. }) => {
                assert_eq!(forward, 0.5);
                assert_eq!(rotation, -0.25);
                assert!(slow);
            }
            _ => panic!("Expected a drive command, got {:?}", tc),
        }
    }

    #[test]
    fn test_parse_invalid() {
        assert!(Tc::from_json("{\"Fly\": 1}").is_err());
        assert!(Tc::from_json("not json").is_err());
    }
}
