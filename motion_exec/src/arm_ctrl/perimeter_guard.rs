//! Frame perimeter guard
//!
//! Once the shoulder is raised past the danger angle the end effector can swing outside the
//! frame perimeter. While in that zone a move is only allowed if it retracts the end effector,
//! or if the resulting extension is already within the safe envelope. This is a monotonic "do
//! not extend further while elevated" rule, not a swept volume check.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use super::ArmGeometry;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The result of checking a candidate joint pair against the frame perimeter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GuardVerdict {
    Accept,
    Reject,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Check a candidate joint pair against the current joint pair.
///
/// All angles in degrees. The candidate is rejected only if all of these hold:
/// - the current shoulder angle is above `geometry.danger_shoulder_deg`,
/// - the candidate extension is not strictly less than the current extension,
/// - the candidate extension is not below `geometry.safe_extension`.
pub fn evaluate(
    geometry: &ArmGeometry,
    cand_shoulder_deg: f64,
    cand_elbow_deg: f64,
    cur_shoulder_deg: f64,
    cur_elbow_deg: f64,
) -> GuardVerdict {
    if cur_shoulder_deg <= geometry.danger_shoulder_deg {
        return GuardVerdict::Accept;
    }

    let cand_x = geometry.end_effector_x(cand_shoulder_deg, cand_elbow_deg);
    let cur_x = geometry.end_effector_x(cur_shoulder_deg, cur_elbow_deg);

    let retracting = cand_x < cur_x;
    let within_safe = cand_x < geometry.safe_extension;

    if !retracting && !within_safe {
        GuardVerdict::Reject
    } else {
        GuardVerdict::Accept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sweep() -> impl Iterator<Item = f64> {
        (0..36).map(|i| i as f64 * 10.0)
    }

    #[test]
    fn test_inactive_below_danger_angle() {
        let g = ArmGeometry::default();

        for cur_s in [0.0, 45.0, 90.0, 105.0].iter() {
            for cur_e in sweep() {
                for cand_s in sweep() {
                    for cand_e in sweep() {
                        assert_eq!(
                            evaluate(&g, cand_s, cand_e, *cur_s, cur_e),
                            GuardVerdict::Accept
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_active_above_danger_angle() {
        let g = ArmGeometry::default();

        for cur_s in [106.0, 120.0, 150.0, 180.0].iter() {
            for cur_e in sweep() {
                let cur_x = g.end_effector_x(*cur_s, cur_e);

                for cand_s in sweep() {
                    for cand_e in sweep() {
                        let cand_x = g.end_effector_x(cand_s, cand_e);
                        let verdict = evaluate(&g, cand_s, cand_e, *cur_s, cur_e);

                        if cand_x < cur_x {
                            assert_eq!(verdict, GuardVerdict::Accept);
                        }
                        if cand_x > cur_x && cand_x >= g.safe_extension {
                            assert_eq!(verdict, GuardVerdict::Reject);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_extending_from_high_pose() {
        let g = ArmGeometry::default();

        // From the high pose, straightening the elbow pushes the end effector out
        assert_eq!(evaluate(&g, 135.0, 10.0, 135.0, 100.0), GuardVerdict::Reject);

        // Lowering the shoulder retracts it
        assert_eq!(evaluate(&g, 90.0, 100.0, 135.0, 100.0), GuardVerdict::Accept);
    }
}
