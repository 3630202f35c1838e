//! Trapezoidal motion profile

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use util::maths::sign;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Distance to the goal below which the profile is considered to have arrived.
const GOAL_TOLERANCE: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Velocity and acceleration bounds of a profile.
///
/// Units are those of the profiled quantity, e.g. degrees for a joint, meters for the chassis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileConstraints {
    /// Maximum magnitude of the profile's velocity
    ///
    /// Units: units/second
    pub max_velocity: f64,

    /// Maximum magnitude of the profile's acceleration
    ///
    /// Units: units/second^2
    pub max_acceleration: f64,
}

/// A point along the profile.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ProfileState {
    pub position: f64,
    pub velocity: f64,
}

/// A trapezoidal profile advanced one tick at a time toward a goal.
///
/// The goal may change between ticks, the profile continues from its current position and
/// velocity. The only memory is the current `ProfileState`.
#[derive(Debug, Clone, Serialize)]
pub struct TrapezoidProfile {
    constraints: ProfileConstraints,
    state: ProfileState,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TrapezoidProfile {
    /// Create a new profile starting from the given state.
    pub fn new(constraints: ProfileConstraints, initial: ProfileState) -> Self {
        Self {
            constraints,
            state: initial,
        }
    }

    /// The current point along the profile.
    pub fn state(&self) -> ProfileState {
        self.state
    }

    /// Restart the profile from a new state.
    pub fn reset(&mut self, state: ProfileState) {
        self.state = state;
    }

    /// True if the profile is stationary at the goal.
    pub fn is_finished(&self, goal: f64) -> bool {
        (goal - self.state.position).abs() <= GOAL_TOLERANCE && self.state.velocity == 0.0
    }

    /// Advance the profile by `dt_s` toward `goal`, returning the new state.
    ///
    /// The velocity is bounded by the maximum velocity and by the braking envelope
    /// `sqrt(2 a |d|)`, and changes by at most `a dt` per tick. If a tick would carry the
    /// profile past the goal it stops at the goal with zero velocity.
    ///
    /// The arrival step is exempt from the acceleration bound. On a normal arrival the dropped
    /// velocity is a few `a dt`, but a goal moved to just ahead of a fast moving profile stops
    /// it dead. The profile only generates setpoints, the step is absorbed by the feedback of
    /// whatever tracks it.
    pub fn calculate(&mut self, goal: f64, dt_s: f64) -> ProfileState {
        if !(dt_s > 0.0) || !goal.is_finite() {
            return self.state;
        }

        let ProfileConstraints {
            max_velocity,
            max_acceleration,
        } = self.constraints;

        let dist = goal - self.state.position;

        if dist.abs() <= GOAL_TOLERANCE && self.state.velocity == 0.0 {
            self.state.position = goal;
            return self.state;
        }

        // Velocity we would like to be at, the smaller of the cruise velocity and the velocity
        // from which we can still stop at the goal.
        let target_vel =
            sign(dist) * (2.0 * max_acceleration * dist.abs()).sqrt().min(max_velocity);

        let max_dv = max_acceleration * dt_s;
        let dv = (target_vel - self.state.velocity).max(-max_dv).min(max_dv);
        let velocity = self.state.velocity + dv;

        let position = self.state.position + 0.5 * (self.state.velocity + velocity) * dt_s;
        let remaining = goal - position;

        self.state = if remaining.abs() <= GOAL_TOLERANCE
            || sign(remaining) != sign(dist)
        {
            ProfileState {
                position: goal,
                velocity: 0.0,
            }
        } else {
            ProfileState { position, velocity }
        };

        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;
    const DT: f64 = 0.02;

    fn profile(start: f64) -> TrapezoidProfile {
        TrapezoidProfile::new(
            ProfileConstraints {
                max_velocity: 90.0,
                max_acceleration: 180.0,
            },
            ProfileState {
                position: start,
                velocity: 0.0,
            },
        )
    }

    #[test]
    fn test_reaches_goal_without_overshoot() {
        let mut p = profile(0.0);
        let mut prev = p.state();

        for _ in 0..500 {
            let s = p.calculate(100.0, DT);

            assert!(s.position <= 100.0 + EPSILON);
            assert!(s.position >= prev.position - EPSILON);
            assert!(s.velocity.abs() <= 90.0 + EPSILON);
            // Arrival is the only step allowed to drop the velocity faster than the limit
            if s.position != 100.0 {
                assert!((s.velocity - prev.velocity).abs() <= 180.0 * DT + EPSILON);
            }

            prev = s;
        }

        assert!(p.is_finished(100.0));
    }

    #[test]
    fn test_negative_direction() {
        let mut p = profile(10.0);
        for _ in 0..500 {
            let s = p.calculate(-20.0, DT);
            assert!(s.position >= -20.0 - EPSILON);
            assert!(s.velocity <= EPSILON);
        }
        assert_eq!(p.state().position, -20.0);
    }

    #[test]
    fn test_at_goal_is_stationary() {
        let mut p = profile(42.0);
        let s = p.calculate(42.0, DT);
        assert_eq!(s.position, 42.0);
        assert_eq!(s.velocity, 0.0);
    }

    #[test]
    fn test_goal_change_mid_move() {
        let mut p = profile(0.0);
        for _ in 0..20 {
            p.calculate(100.0, DT);
        }
        assert!(p.state().velocity > 0.0);

        // Reversing the goal decelerates before reversing
        let v0 = p.state().velocity;
        let s = p.calculate(-50.0, DT);
        assert!((v0 - s.velocity - 180.0 * DT).abs() < EPSILON);

        for _ in 0..1000 {
            p.calculate(-50.0, DT);
        }
        assert!(p.is_finished(-50.0));
    }

    #[test]
    fn test_goal_moved_just_ahead_stops_at_goal() {
        let mut p = profile(0.0);
        for _ in 0..50 {
            p.calculate(100.0, DT);
        }
        let before = p.state();
        assert!((before.velocity - 90.0).abs() < EPSILON);

        // Less than one tick of travel ahead, arrival stops at the goal rather than passing it
        let goal = before.position + 0.5;
        let s = p.calculate(goal, DT);
        assert_eq!(s.position, goal);
        assert_eq!(s.velocity, 0.0);
        assert!(p.is_finished(goal));
    }

    #[test]
    fn test_zero_dt_holds() {
        let mut p = profile(5.0);
        let s = p.calculate(50.0, 0.0);
        assert_eq!(s.position, 5.0);
        assert_eq!(s.velocity, 0.0);
    }
}
