//! Parameters structure for ArmCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::{ArmGeometry, JointLimits};
use crate::ctrl::{PidGains, ProfileConstraints};
use comms_if::tc::arm_ctrl::ArmPose;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for Arm control.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    /// How setpoint pairs are checked against the frame perimeter.
    pub guard_mode: GuardMode,

    /// Scale of the manual jog rates, a rate of 1 moves the setpoint at this speed.
    ///
    /// Units: degrees/second
    pub jog_rate_degs: f64,

    /// Tolerance used when deciding if the arm has reached its setpoints.
    ///
    /// Units: degrees
    pub at_target_tolerance_deg: f64,

    // ---- GEOMETRY ----
    pub geometry: ArmGeometry,

    // ---- JOINTS ----
    pub shoulder: JointParams,
    pub elbow: JointParams,

    // ---- POSES ----
    pub poses: PoseTable,
}

/// Parameters of a single profiled joint controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JointParams {
    /// Maximum angular velocity of the profile.
    ///
    /// Units: degrees/second
    pub max_velocity_degs: f64,

    /// Maximum angular acceleration of the profile.
    ///
    /// Units: degrees/second^2
    pub max_acceleration_degss: f64,

    /// Velocity feedforward gain.
    ///
    /// Units: volts/(degrees/second)
    pub kv: f64,

    /// Feedback gains acting on the error to the profiled position, in volts per degree.
    pub pid: PidGains,

    /// Bound on the output command.
    ///
    /// Units: volts
    pub max_voltage: f64,

    /// If true the motor is mounted so that positive voltage decreases the joint angle.
    #[serde(default)]
    pub inverted: bool,

    /// The joint's unreachable arc.
    pub limits: JointLimits,
}

/// The `(shoulder, elbow)` angles of each named pose, in degrees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoseTable {
    pub stow: [f64; 2],
    pub mid: [f64; 2],
    pub high: [f64; 2],
    pub substation: [f64; 2],
    pub ground_cone: [f64; 2],
    pub ground_cube: [f64; 2],
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// How a pose request is checked by the frame perimeter guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuardMode {
    /// Each joint is checked on its own, against the other joint's current angle. One joint
    /// may be accepted while the other is rejected.
    Sequential,

    /// The pair is checked as one candidate against the current pair, and either both joints
    /// are committed or neither is.
    Atomic,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            guard_mode: GuardMode::Sequential,
            jog_rate_degs: 45.0,
            at_target_tolerance_deg: 2.0,
            geometry: ArmGeometry::default(),
            shoulder: JointParams {
                max_velocity_degs: 90.0,
                max_acceleration_degss: 180.0,
                kv: 0.05,
                pid: PidGains {
                    k_p: 0.3,
                    k_i: 0.0,
                    k_d: 0.0,
                    integral_limit: 0.0,
                },
                max_voltage: 10.0,
                inverted: false,
                limits: JointLimits {
                    forbidden_min_deg: 200.0,
                    forbidden_max_deg: 340.0,
                },
            },
            elbow: JointParams {
                max_velocity_degs: 120.0,
                max_acceleration_degss: 240.0,
                kv: 0.05,
                pid: PidGains {
                    k_p: 0.3,
                    k_i: 0.0,
                    k_d: 0.0,
                    integral_limit: 0.0,
                },
                max_voltage: 10.0,
                inverted: false,
                limits: JointLimits {
                    forbidden_min_deg: 290.0,
                    forbidden_max_deg: 350.0,
                },
            },
            poses: PoseTable::default(),
        }
    }
}

impl Params {
    /// Check the parameters for values the controllers cannot work with.
    pub fn validate(&self) -> Result<(), String> {
        for (name, j) in [("shoulder", &self.shoulder), ("elbow", &self.elbow)].iter() {
            if !(j.max_velocity_degs > 0.0 && j.max_acceleration_degss > 0.0) {
                return Err(format!("{} profile limits must be positive", name));
            }
            if !(j.max_voltage > 0.0) {
                return Err(format!("{} max_voltage must be positive", name));
            }
            if !j.limits.is_valid() {
                return Err(format!("{} forbidden arc is malformed: {:?}", name, j.limits));
            }
        }

        for pose in ArmPose::ALL.iter() {
            let (s, e) = self.poses.get(*pose);
            if self.shoulder.limits.is_forbidden(s) || self.elbow.limits.is_forbidden(e) {
                return Err(format!("pose {} lies inside a forbidden arc", pose));
            }
        }

        Ok(())
    }
}

impl JointParams {
    /// The profile constraints of this joint.
    pub fn constraints(&self) -> ProfileConstraints {
        ProfileConstraints {
            max_velocity: self.max_velocity_degs,
            max_acceleration: self.max_acceleration_degss,
        }
    }
}

impl Default for PoseTable {
    fn default() -> Self {
        Self {
            stow: [90.0, 10.0],
            mid: [115.0, 75.0],
            high: [135.0, 100.0],
            substation: [100.0, 95.0],
            ground_cone: [45.0, 200.0],
            ground_cube: [40.0, 210.0],
        }
    }
}

impl PoseTable {
    /// Get the `(shoulder, elbow)` angles of a pose.
    pub fn get(&self, pose: ArmPose) -> (f64, f64) {
        let p = match pose {
            ArmPose::Stow => self.stow,
            ArmPose::Mid => self.mid,
            ArmPose::High => self.high,
            ArmPose::Substation => self.substation,
            ArmPose::GroundCone => self.ground_cone,
            ArmPose::GroundCube => self.ground_cube,
        };

        (p[0], p[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_valid() {
        assert_eq!(Params::default().validate(), Ok(()));
    }

    #[test]
    fn test_params_from_toml() {
        let p: Params = util::params::from_toml_str(include_str!("../../../params/arm_ctrl.toml"))
            .unwrap();

        assert_eq!(p.guard_mode, GuardMode::Sequential);
        assert_eq!(p.poses.get(ArmPose::Stow), (90.0, 10.0));
        assert_eq!(p.validate(), Ok(()));
    }
}
