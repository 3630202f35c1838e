//! PID controller

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Gains of a PID controller, as found in the parameter files.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PidGains {
    /// Proportional gain
    pub k_p: f64,

    /// Integral gain
    #[serde(default)]
    pub k_i: f64,

    /// Dervative gain
    #[serde(default)]
    pub k_d: f64,

    /// Limit on the magnitude of the integral accumulation. Zero or negative values disable the
    /// integral term entirely.
    #[serde(default)]
    pub integral_limit: f64,
}

/// A PID controller stepped at an explicit period.
///
/// Unlike a wall-clock aware controller the tick period is passed into every call to `get`, so
/// that given identical inputs the controller produces identical outputs.
#[derive(Debug, Clone, Serialize)]
pub struct PidController {
    gains: PidGains,

    /// Previous error, `None` after a reset
    prev_error: Option<f64>,

    /// The integral accumulation
    integral: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PidController {
    /// Create a new controller with the given gains.
    pub fn new(gains: PidGains) -> Self {
        Self {
            gains,
            prev_error: None,
            integral: 0f64,
        }
    }

    /// Get the value of the controller for the given error.
    ///
    /// `dt_s` is the time since the previous call. If it is not strictly positive neither the
    /// integral nor the derivative terms are updated, only the proportional term is output.
    pub fn get(&mut self, error: f64, dt_s: f64) -> f64 {
        let dt = if dt_s.is_finite() && dt_s > 0.0 {
            Some(dt_s)
        } else {
            None
        };

        // Accumulate the integral term, bounded to prevent windup.
        if let Some(t) = dt {
            if self.gains.integral_limit > 0.0 {
                self.integral = (self.integral + error * t)
                    .max(-self.gains.integral_limit)
                    .min(self.gains.integral_limit);
            }
        }

        // Calculate the derivative. The first call after a reset has no previous error and so no
        // derivative, otherwise the step from zero produces a large kick.
        let deriv = match (self.prev_error, dt) {
            (Some(e), Some(t)) => (error - e) / t,
            _ => 0f64,
        };

        self.prev_error = Some(error);

        self.gains.k_p * error + self.gains.k_i * self.integral + self.gains.k_d * deriv
    }

    /// Clear the integral accumulation and the previous error.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = None;
    }

    /// The current integral accumulation.
    pub fn integral(&self) -> f64 {
        self.integral
    }

    /// The controller's gains.
    pub fn gains(&self) -> &PidGains {
        &self.gains
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn gains(k_p: f64, k_i: f64, k_d: f64, integral_limit: f64) -> PidGains {
        PidGains {
            k_p,
            k_i,
            k_d,
            integral_limit,
        }
    }

    #[test]
    fn test_proportional_only() {
        let mut pid = PidController::new(gains(2.0, 0.0, 0.0, 0.0));
        assert!((pid.get(1.5, 0.02) - 3.0).abs() < EPSILON);
        assert!((pid.get(-1.0, 0.02) - -2.0).abs() < EPSILON);
        assert_eq!(pid.integral(), 0.0);
    }

    #[test]
    fn test_integral_is_clamped() {
        let mut pid = PidController::new(gains(0.0, 1.0, 0.0, 0.5));

        // 100 ticks of error 1 at 20 ms would give 2.0 without the limit
        let mut out = 0.0;
        for _ in 0..100 {
            out = pid.get(1.0, 0.02);
        }

        assert!((pid.integral() - 0.5).abs() < EPSILON);
        assert!((out - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_derivative_and_reset() {
        let mut pid = PidController::new(gains(0.0, 0.0, 1.0, 0.0));

        // No derivative on the first sample
        assert_eq!(pid.get(1.0, 0.1), 0.0);
        assert!((pid.get(2.0, 0.1) - 10.0).abs() < EPSILON);

        pid.reset();
        assert_eq!(pid.get(5.0, 0.1), 0.0);
    }

    #[test]
    fn test_deterministic() {
        let g = gains(0.3, 0.1, 0.01, 10.0);
        let mut a = PidController::new(g);
        let mut b = PidController::new(g);

        for i in 0..50 {
            let e = (i as f64 * 0.3).sin();
            assert_eq!(a.get(e, 0.02), b.get(e, 0.02));
        }
    }

    #[test]
    fn test_zero_dt() {
        let mut pid = PidController::new(gains(1.0, 1.0, 1.0, 10.0));
        assert!((pid.get(2.0, 0.0) - 2.0).abs() < EPSILON);
        assert_eq!(pid.integral(), 0.0);
    }
}
