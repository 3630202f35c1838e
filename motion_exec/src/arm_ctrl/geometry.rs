//! Arm geometry and forward kinematics

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Fixed dimensions of the arm and the thresholds of the frame perimeter envelope.
///
/// Lengths share a single unit (the perimeter threshold `safe_extension` is in the same unit),
/// the reference robot uses inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArmGeometry {
    /// Length of the link between the shoulder and elbow pivots.
    pub shoulder_length: f64,

    /// Length of the link between the elbow pivot and the end effector.
    pub elbow_length: f64,

    /// Shoulder angle above which the perimeter guard becomes active.
    ///
    /// Units: degrees
    pub danger_shoulder_deg: f64,

    /// Extension below which any move is accepted while the guard is active.
    pub safe_extension: f64,
}

/// Position of the end effector in the arm's plane, relative to the shoulder pivot.
///
/// Derived from the joint angles, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EndEffectorPosition {
    /// Forward extension
    pub x: f64,

    /// Height
    pub y: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for ArmGeometry {
    fn default() -> Self {
        Self {
            shoulder_length: 40.0,
            elbow_length: 34.0,
            danger_shoulder_deg: 105.0,
            safe_extension: 45.0,
        }
    }
}

impl ArmGeometry {
    /// Forward extension of the end effector for the given joint angles.
    ///
    /// The shoulder angle is measured from the rear of the robot, so its complement
    /// `180 - shoulder` is the angle of the first link from the forward axis. The elbow angle is
    /// relative to the first link.
    pub fn end_effector_x(&self, shoulder_deg: f64, elbow_deg: f64) -> f64 {
        let shoulder_comp_deg = 180.0 - shoulder_deg;

        let elbow_joint_x = shoulder_comp_deg.to_radians().cos() * self.shoulder_length;

        elbow_joint_x + (elbow_deg + shoulder_comp_deg).to_radians().cos() * self.elbow_length
    }

    /// Full position of the end effector for the given joint angles.
    pub fn end_effector_position(&self, shoulder_deg: f64, elbow_deg: f64) -> EndEffectorPosition {
        let shoulder_comp_deg = 180.0 - shoulder_deg;

        let elbow_joint_y = shoulder_comp_deg.to_radians().sin() * self.shoulder_length;

        EndEffectorPosition {
            x: self.end_effector_x(shoulder_deg, elbow_deg),
            y: elbow_joint_y
                + (elbow_deg + shoulder_comp_deg).to_radians().sin() * self.elbow_length,
        }
    }

    /// Total reach of the arm.
    pub fn reach(&self) -> f64 {
        self.shoulder_length + self.elbow_length
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_fully_extended_reference_pose() {
        let g = ArmGeometry::default();
        let x = g.end_effector_x(0.0, 0.0);

        // Both links are colinear, so the magnitude is the total reach
        assert!((x.abs() - g.reach()).abs() < EPSILON);
        assert!(g.end_effector_position(0.0, 0.0).y.abs() < EPSILON);
    }

    #[test]
    fn test_vertical_shoulder() {
        let g = ArmGeometry::default();
        let p = g.end_effector_position(90.0, 0.0);
        assert!(p.x.abs() < EPSILON);
        assert!((p.y - g.reach()).abs() < EPSILON);
    }

    #[test]
    fn test_monotonic_in_shoulder() {
        let g = ArmGeometry::default();
        let mut prev = g.end_effector_x(0.0, 0.0);

        for i in 1..=180 {
            let x = g.end_effector_x(i as f64, 0.0);
            assert!(x > prev, "x not increasing at shoulder = {}", i);

            // Continuity over one degree steps
            assert!((x - prev).abs() <= g.reach() * 1f64.to_radians() + EPSILON);
            prev = x;
        }
    }

    #[test]
    fn test_reference_pose_values() {
        let g = ArmGeometry::default();

        // Shoulder at 135, elbow at 100: first link 45 deg forward, second link 145 deg
        let expected = 45f64.to_radians().cos() * 40.0 + 145f64.to_radians().cos() * 34.0;
        assert!((g.end_effector_x(135.0, 100.0) - expected).abs() < EPSILON);
    }
}
