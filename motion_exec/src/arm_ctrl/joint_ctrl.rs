//! Profiled joint controller
//!
//! One controller per physical joint. A requested setpoint is normalised, clamped out of the
//! joint's forbidden arc and checked against the frame perimeter before it is committed. Each
//! tick the controller advances a trapezoidal profile toward the committed setpoint and outputs
//! a voltage made of a velocity feedforward term and a PID correction on the error between the
//! profiled position and the measured angle.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace, warn};
use serde::Serialize;

// Internal
use super::{perimeter_guard, ArmGeometry, GuardVerdict, JointId, JointLimits, JointParams};
use crate::ctrl::{PidController, ProfileState, TrapezoidProfile};
use comms_if::eqpt::arm::JointSens;
use util::maths::normalize_deg;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Measured and commanded state of a joint.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct JointState {
    /// Last valid measured angle, in `[0, 360)`.
    ///
    /// Units: degrees
    pub measured_angle_deg: f64,

    /// Last valid measured angular velocity.
    ///
    /// Units: degrees/second
    pub measured_velocity_degs: f64,

    /// The committed setpoint, in `[0, 360)`.
    ///
    /// Units: degrees
    pub setpoint_deg: f64,
}

/// Output of one control step of a joint.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct JointOutput {
    /// Bounded actuator demand, zero on a fault.
    ///
    /// Units: volts
    pub voltage: f64,

    /// Profiled intermediate target, in `[0, 360)`.
    ///
    /// Units: degrees
    pub profile_position_deg: f64,

    /// Profiled velocity.
    ///
    /// Units: degrees/second
    pub profile_velocity_degs: f64,

    /// True if the sensor reading was missing or out of range, or if the output could not be
    /// computed.
    pub fault: bool,
}

/// A profiled position controller for one joint.
#[derive(Debug, Clone)]
pub struct JointCtrl {
    id: JointId,
    params: JointParams,

    state: JointState,

    /// Motion profile in unwrapped coordinates, `None` until seeded from a valid measurement.
    profile: Option<TrapezoidProfile>,

    pid: PidController,

    /// True while the sensor is faulty, used to log the fault only once.
    sensor_fault: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The result of a setpoint request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum SetpointResult {
    /// The setpoint was committed.
    Accepted {
        /// The committed setpoint.
        ///
        /// Units: degrees
        setpoint_deg: f64,

        /// True if the request was inside the forbidden arc and was snapped to its boundary.
        clamped: bool,
    },

    /// The request was refused and the previous setpoint is kept.
    Rejected {
        /// The setpoint which was refused, after normalisation and clamping.
        ///
        /// Units: degrees
        candidate_deg: f64,
    },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SetpointResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SetpointResult::Accepted { .. })
    }
}

impl JointCtrl {
    /// Create a new joint controller which assumes the joint is resting at `initial_angle_deg`.
    pub fn new(id: JointId, params: JointParams, initial_angle_deg: f64) -> Self {
        let initial = normalize_deg(initial_angle_deg);
        let pid = PidController::new(params.pid);

        Self {
            id,
            params,
            state: JointState {
                measured_angle_deg: initial,
                measured_velocity_degs: 0.0,
                setpoint_deg: initial,
            },
            profile: None,
            pid,
            sensor_fault: false,
        }
    }

    pub fn id(&self) -> JointId {
        self.id
    }

    pub fn state(&self) -> &JointState {
        &self.state
    }

    pub fn limits(&self) -> &JointLimits {
        &self.params.limits
    }

    /// The current profiled position in `[0, 360)`, or the measured angle if the profile has not
    /// been seeded.
    pub fn profile_position(&self) -> f64 {
        match self.profile {
            Some(ref p) => normalize_deg(p.state().position),
            None => self.state.measured_angle_deg,
        }
    }

    /// True if the last reading from the sensor was invalid.
    pub fn has_sensor_fault(&self) -> bool {
        self.sensor_fault
    }

    /// Normalise a raw request and snap it out of the forbidden arc.
    ///
    /// Returns the candidate and whether it was clamped, or `None` for non-finite requests.
    pub fn prepare_setpoint(&self, raw_deg: f64) -> Option<(f64, bool)> {
        if !raw_deg.is_finite() {
            return None;
        }

        let normalised = normalize_deg(raw_deg);
        let clamped = self.params.limits.clamp(normalised);

        Some((clamped, clamped != normalised))
    }

    /// Request a new setpoint for this joint.
    ///
    /// The request is normalised into `[0, 360)`, clamped out of the forbidden arc and then
    /// checked by the frame perimeter guard against this joint's measured angle and the other
    /// joint's current angle. A rejected request leaves the previous setpoint in place.
    pub fn request_setpoint(
        &mut self,
        raw_deg: f64,
        other_current_deg: f64,
        geometry: &ArmGeometry,
    ) -> SetpointResult {
        let (candidate, clamped) = match self.prepare_setpoint(raw_deg) {
            Some(c) => c,
            None => {
                warn!("{} setpoint {} rejected: not a finite angle", self.id, raw_deg);
                return SetpointResult::Rejected {
                    candidate_deg: raw_deg,
                };
            }
        };

        if clamped {
            debug!(
                "{} setpoint {:.2} clamped to {:.2} (forbidden arc)",
                self.id, raw_deg, candidate
            );
        }

        let current = self.state.measured_angle_deg;

        let verdict = match self.id {
            JointId::Shoulder => perimeter_guard::evaluate(
                geometry,
                candidate,
                other_current_deg,
                current,
                other_current_deg,
            ),
            JointId::Elbow => perimeter_guard::evaluate(
                geometry,
                other_current_deg,
                candidate,
                other_current_deg,
                current,
            ),
        };

        match verdict {
            GuardVerdict::Accept => {
                self.commit_setpoint(candidate);
                SetpointResult::Accepted {
                    setpoint_deg: candidate,
                    clamped,
                }
            }
            GuardVerdict::Reject => {
                warn!(
                    "{} setpoint {:.2} rejected by the frame perimeter guard, keeping {:.2}",
                    self.id, candidate, self.state.setpoint_deg
                );
                SetpointResult::Rejected {
                    candidate_deg: candidate,
                }
            }
        }
    }

    /// Commit an already prepared and checked setpoint.
    pub(crate) fn commit_setpoint(&mut self, setpoint_deg: f64) {
        self.state.setpoint_deg = setpoint_deg;
    }

    /// Set the setpoint to the measured angle and restart the profile from the next reading.
    ///
    /// Holding where the joint already is cannot extend the end effector, so no guard check is
    /// needed.
    pub fn hold(&mut self) {
        self.state.setpoint_deg = self.params.limits.clamp(self.state.measured_angle_deg);
        self.profile = None;
        self.pid.reset();
    }

    /// True if the measured angle is within `tolerance_deg` of the setpoint.
    pub fn at_setpoint(&self, tolerance_deg: f64) -> bool {
        let err = self.params.limits.unwrap(self.state.setpoint_deg)
            - self.params.limits.unwrap(self.state.measured_angle_deg);

        err.abs() <= tolerance_deg
    }

    /// Run one control step.
    ///
    /// `sens` is `None` if the sensor could not be read. Missing, non-finite or out of range
    /// readings produce a zero output and a fault, and the profile is re-seeded from the next
    /// valid reading.
    pub fn step(&mut self, sens: Option<JointSens>, dt_s: f64) -> JointOutput {
        let sens = match sens {
            Some(s) if Self::is_valid_reading(&s) => s,
            Some(s) => return self.fault(&format!("reading out of range: {:?}", s)),
            None => return self.fault("no reading"),
        };

        if self.sensor_fault {
            debug!("{} sensor recovered", self.id);
            self.sensor_fault = false;
        }

        self.state.measured_angle_deg = sens.angle_deg;
        self.state.measured_velocity_degs = sens.velocity_degs;

        let measured = self.params.limits.unwrap(sens.angle_deg);
        let goal = self.params.limits.unwrap(self.state.setpoint_deg);
        let constraints = self.params.constraints();

        let profile = self.profile.get_or_insert_with(|| {
            TrapezoidProfile::new(
                constraints,
                ProfileState {
                    position: measured,
                    velocity: 0.0,
                },
            )
        });

        let target = profile.calculate(goal, dt_s);

        let voltage =
            self.params.kv * target.velocity + self.pid.get(target.position - measured, dt_s);

        if !voltage.is_finite() {
            return self.fault("output is not finite");
        }

        let bounded = voltage
            .max(-self.params.max_voltage)
            .min(self.params.max_voltage);

        JointOutput {
            voltage: if self.params.inverted { -bounded } else { bounded },
            profile_position_deg: normalize_deg(target.position),
            profile_velocity_degs: target.velocity,
            fault: false,
        }
    }

    /// A valid reading is finite and its angle lies in `[0, 360)`.
    fn is_valid_reading(sens: &JointSens) -> bool {
        sens.angle_deg.is_finite()
            && sens.velocity_degs.is_finite()
            && sens.angle_deg >= 0.0
            && sens.angle_deg < 360.0
    }

    /// Fail safe: zero output, reset the feedback and drop the profile.
    fn fault(&mut self, reason: &str) -> JointOutput {
        if self.sensor_fault {
            trace!("{} sensor fault: {}", self.id, reason);
        } else {
            warn!("{} sensor fault: {}, output zeroed", self.id, reason);
            self.sensor_fault = true;
        }

        self.pid.reset();
        self.profile = None;

        JointOutput {
            voltage: 0.0,
            profile_position_deg: self.state.measured_angle_deg,
            profile_velocity_degs: 0.0,
            fault: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arm_ctrl::Params;

    const DT: f64 = 0.02;

    fn shoulder_at(angle: f64) -> JointCtrl {
        JointCtrl::new(JointId::Shoulder, Params::default().shoulder, angle)
    }

    fn reading(angle_deg: f64) -> Option<JointSens> {
        Some(JointSens {
            angle_deg,
            velocity_degs: 0.0,
        })
    }

    #[test]
    fn test_request_normalises_and_clamps() {
        let g = ArmGeometry::default();
        let mut j = shoulder_at(90.0);

        assert_eq!(
            j.request_setpoint(-270.0, 10.0, &g),
            SetpointResult::Accepted {
                setpoint_deg: 90.0,
                clamped: false
            }
        );
        assert_eq!(
            j.request_setpoint(250.0, 10.0, &g),
            SetpointResult::Accepted {
                setpoint_deg: 200.0,
                clamped: true
            }
        );
        assert_eq!(j.state().setpoint_deg, 200.0);
    }

    #[test]
    fn test_rejected_request_keeps_setpoint() {
        let g = ArmGeometry::default();

        // Elbow at 100 with the shoulder raised to 135, straightening the elbow extends
        let mut elbow = JointCtrl::new(JointId::Elbow, Params::default().elbow, 100.0);
        let r = elbow.request_setpoint(10.0, 135.0, &g);

        assert!(!r.is_accepted());
        assert_eq!(elbow.state().setpoint_deg, 100.0);

        // Non-finite requests are refused
        assert!(!elbow.request_setpoint(f64::NAN, 90.0, &g).is_accepted());
        assert_eq!(elbow.state().setpoint_deg, 100.0);
    }

    #[test]
    fn test_step_drives_toward_setpoint() {
        let g = ArmGeometry::default();
        let mut j = shoulder_at(90.0);
        j.request_setpoint(120.0, 10.0, &g);

        let out = j.step(reading(90.0), DT);
        assert!(!out.fault);
        assert!(out.voltage > 0.0);
        assert!(out.voltage <= 10.0);

        // Held position gives no output
        let mut k = shoulder_at(90.0);
        let out = k.step(reading(90.0), DT);
        assert_eq!(out.voltage, 0.0);
    }

    #[test]
    fn test_output_bounded() {
        let g = ArmGeometry::default();
        let mut j = shoulder_at(0.0);
        j.request_setpoint(180.0, 10.0, &g);

        // Measurement far from the profile saturates the output
        for _ in 0..200 {
            let out = j.step(reading(0.0), DT);
            assert!(out.voltage.abs() <= 10.0);
        }
        assert_eq!(j.step(reading(0.0), DT).voltage, 10.0);
    }

    #[test]
    fn test_inverted_mounting() {
        let g = ArmGeometry::default();
        let mut params = Params::default().shoulder;
        params.inverted = true;

        let mut j = JointCtrl::new(JointId::Shoulder, params, 90.0);
        j.request_setpoint(120.0, 10.0, &g);
        assert!(j.step(reading(90.0), DT).voltage < 0.0);
    }

    #[test]
    fn test_sensor_fault_fails_safe() {
        let g = ArmGeometry::default();
        let mut j = shoulder_at(90.0);
        j.request_setpoint(150.0, 10.0, &g);

        j.step(reading(90.0), DT);

        for bad in [None, reading(f64::NAN), reading(400.0), reading(-1.0)].iter() {
            let out = j.step(*bad, DT);
            assert!(out.fault);
            assert_eq!(out.voltage, 0.0);
            assert!(j.has_sensor_fault());
        }

        // The measured angle is the last valid one
        assert_eq!(j.state().measured_angle_deg, 90.0);

        // Recovery re-seeds the profile from the new reading, so the first output is small
        let out = j.step(reading(100.0), DT);
        assert!(!out.fault);
        assert!(!j.has_sensor_fault());
        assert!((out.profile_position_deg - 100.0).abs() < 1.0);
    }

    #[test]
    fn test_profile_avoids_forbidden_arc() {
        let g = ArmGeometry::default();

        // Shoulder from 350 to 10 must pass through 0, not through the forbidden arc
        let mut j = shoulder_at(350.0);
        j.request_setpoint(10.0, 10.0, &g);

        let mut angle = 350.0;
        for _ in 0..100 {
            let out = j.step(reading(angle), DT);
            assert!(!j.limits().is_forbidden(out.profile_position_deg));
            angle = out.profile_position_deg;
        }
        assert!((angle - 10.0).abs() < 1e-6);
        assert!(j.at_setpoint(0.5));
    }

    #[test]
    fn test_step_idempotent() {
        let g = ArmGeometry::default();
        let mut a = shoulder_at(90.0);
        let mut b = shoulder_at(90.0);
        a.request_setpoint(130.0, 10.0, &g);
        b.request_setpoint(130.0, 10.0, &g);

        for i in 0..50 {
            let r = reading(90.0 + i as f64 * 0.5);
            assert_eq!(a.step(r, DT), b.step(r, DT));
        }
    }

    #[test]
    fn test_hold() {
        let g = ArmGeometry::default();
        let mut j = shoulder_at(90.0);
        j.request_setpoint(150.0, 10.0, &g);
        j.step(reading(95.0), DT);

        j.hold();
        assert_eq!(j.state().setpoint_deg, 95.0);
        assert!(j.at_setpoint(0.1));
    }
}
