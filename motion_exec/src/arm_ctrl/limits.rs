//! Joint reachable range

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The arc of a joint which cannot be reached, all angles in `[0, 360)`.
///
/// The forbidden arc is the open interval `(forbidden_min_deg, forbidden_max_deg)`, the
/// boundaries themselves are reachable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointLimits {
    /// Lower boundary of the forbidden arc.
    ///
    /// Units: degrees
    pub forbidden_min_deg: f64,

    /// Upper boundary of the forbidden arc.
    ///
    /// Units: degrees
    pub forbidden_max_deg: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl JointLimits {
    /// Check that the arc is well formed.
    pub fn is_valid(&self) -> bool {
        self.forbidden_min_deg >= 0.0
            && self.forbidden_max_deg < 360.0
            && self.forbidden_min_deg < self.forbidden_max_deg
    }

    /// True if the (normalised) angle lies strictly inside the forbidden arc.
    pub fn is_forbidden(&self, angle_deg: f64) -> bool {
        angle_deg > self.forbidden_min_deg && angle_deg < self.forbidden_max_deg
    }

    /// Snap a normalised angle inside the forbidden arc to the nearest boundary.
    ///
    /// Angles equidistant from both boundaries go to the lower one. Reachable angles are
    /// returned unchanged, so clamping is idempotent.
    pub fn clamp(&self, angle_deg: f64) -> f64 {
        if !self.is_forbidden(angle_deg) {
            return angle_deg;
        }

        if angle_deg - self.forbidden_min_deg <= self.forbidden_max_deg - angle_deg {
            self.forbidden_min_deg
        } else {
            self.forbidden_max_deg
        }
    }

    /// Map a normalised angle onto a continuous coordinate along the reachable arc.
    ///
    /// The reachable arc runs from the upper boundary, through zero, to the lower boundary.
    /// Angles at or above the upper boundary become negative, so the coordinate runs over
    /// `[forbidden_max_deg - 360, forbidden_min_deg]` and a straight path between any two
    /// coordinates never crosses the forbidden arc.
    pub fn unwrap(&self, angle_deg: f64) -> f64 {
        if angle_deg >= self.forbidden_max_deg {
            angle_deg - 360.0
        } else {
            angle_deg
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shoulder() -> JointLimits {
        JointLimits {
            forbidden_min_deg: 200.0,
            forbidden_max_deg: 340.0,
        }
    }

    #[test]
    fn test_clamp() {
        let l = shoulder();
        assert_eq!(l.clamp(100.0), 100.0);
        assert_eq!(l.clamp(200.0), 200.0);
        assert_eq!(l.clamp(210.0), 200.0);
        assert_eq!(l.clamp(330.0), 340.0);
        assert_eq!(l.clamp(270.0), 200.0);
        assert_eq!(l.clamp(350.0), 350.0);
    }

    #[test]
    fn test_clamp_idempotent() {
        let l = shoulder();
        for i in 0..3600 {
            let a = i as f64 * 0.1;
            let c = l.clamp(a);
            assert!(!l.is_forbidden(c));
            assert_eq!(l.clamp(c), c);
        }
    }

    #[test]
    fn test_unwrap() {
        let l = shoulder();
        assert_eq!(l.unwrap(0.0), 0.0);
        assert_eq!(l.unwrap(200.0), 200.0);
        assert_eq!(l.unwrap(340.0), -20.0);
        assert_eq!(l.unwrap(359.0), -1.0);

        // Ordering along the reachable arc is preserved
        assert!(l.unwrap(350.0) < l.unwrap(10.0));
        assert!(l.is_valid());
    }
}
