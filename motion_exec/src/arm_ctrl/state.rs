//! Implementations for the ArmCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

// Internal
use super::{
    perimeter_guard, ArmCtrlError, GuardMode, GuardVerdict, JointCtrl, JointId, JointOutput,
    Params, SetpointResult,
};
use comms_if::{
    eqpt::arm::{ArmDems, JointSens},
    tc::arm_ctrl::{ArmCmd, ArmPose},
};
use util::{module::State, params, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Arm control module state
#[derive(Debug, Clone)]
pub struct ArmCtrl {
    pub(crate) params: Params,

    pub(crate) shoulder: JointCtrl,

    pub(crate) elbow: JointCtrl,

    /// The command currently being executed, only manual jogging lasts longer than one cycle.
    pub(crate) current_cmd: Option<ArmCmd>,

    pub(crate) report: StatusReport,
}

/// Input data to Arm Control.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputData {
    /// The command to be executed, or `None` if there is no new command on this cycle.
    pub cmd: Option<ArmCmd>,

    /// Shoulder sensor reading, `None` if the sensor could not be read.
    pub shoulder: Option<JointSens>,

    /// Elbow sensor reading, `None` if the sensor could not be read.
    pub elbow: Option<JointSens>,

    /// Period of this cycle.
    ///
    /// Units: seconds
    pub dt_s: f64,
}

/// Status report for ArmCtrl processing.
#[derive(Clone, Copy, Default, Serialize, Deserialize, Debug, PartialEq)]
pub struct StatusReport {
    pub shoulder_rejected: bool,
    pub elbow_rejected: bool,
    pub shoulder_clamped: bool,
    pub elbow_clamped: bool,
    pub shoulder_fault: bool,
    pub elbow_fault: bool,

    /// Both joints are within the configured tolerance of their setpoints
    pub at_target: bool,
}

/// Outcome of a named pose request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PoseRequestReport {
    pub pose: ArmPose,
    pub shoulder: SetpointResult,
    pub elbow: SetpointResult,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for ArmCtrl {
    fn default() -> Self {
        Self::new(Params::default())
    }
}

impl State for ArmCtrl {
    type InitData = &'static str;
    type InitError = ArmCtrlError;

    type InputData = InputData;
    type OutputData = ArmDems;
    type StatusReport = StatusReport;
    type ProcError = ArmCtrlError;

    /// Initialise the ArmCtrl module.
    ///
    /// Expected init data is the path to the parameter file
    fn init(
        &mut self,
        init_data: Self::InitData,
        _session: &Session,
    ) -> Result<(), Self::InitError> {
        let params: Params = params::load(init_data).map_err(ArmCtrlError::ParamLoadError)?;

        *self = Self::try_new(params)?;

        info!("ArmCtrl guard mode: {:?}", self.params.guard_mode);

        Ok(())
    }

    /// Perform cyclic processing of Arm Control.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        // Clear the status report
        self.report = StatusReport::default();

        // Check to see if there's a new command
        if let Some(cmd) = input_data.cmd {
            debug!("New ArmCtrl ArmCmd::{:?}", cmd);

            match cmd {
                ArmCmd::Pose(pose) => {
                    self.request_pose(pose);
                    self.current_cmd = None;
                }
                ArmCmd::Manual { .. } => self.current_cmd = Some(cmd),
                ArmCmd::Stop => {
                    self.hold();
                    self.current_cmd = None;
                }
            }
        }

        // Manual jogging continues until another command arrives
        if let Some(ArmCmd::Manual {
            shoulder_rate,
            elbow_rate,
        }) = self.current_cmd
        {
            self.jog(shoulder_rate, elbow_rate, input_data.dt_s);
        }

        let shoulder = self.shoulder.step(input_data.shoulder, input_data.dt_s);
        let elbow = self.elbow.step(input_data.elbow, input_data.dt_s);

        self.report.shoulder_fault = shoulder.fault;
        self.report.elbow_fault = elbow.fault;
        self.report.at_target = self.at_target(self.params.at_target_tolerance_deg);

        Ok((Self::dems(&shoulder, &elbow), self.report))
    }
}

impl ArmCtrl {
    /// Create a new arm controller, assuming the arm starts in the stow pose.
    pub fn new(params: Params) -> Self {
        let (stow_s, stow_e) = params.poses.get(ArmPose::Stow);

        Self {
            shoulder: JointCtrl::new(JointId::Shoulder, params.shoulder.clone(), stow_s),
            elbow: JointCtrl::new(JointId::Elbow, params.elbow.clone(), stow_e),
            params,
            current_cmd: None,
            report: StatusReport::default(),
        }
    }

    /// Create a new arm controller after validating the parameters.
    pub fn try_new(params: Params) -> Result<Self, ArmCtrlError> {
        params.validate().map_err(ArmCtrlError::InvalidParams)?;
        Ok(Self::new(params))
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn shoulder(&self) -> &JointCtrl {
        &self.shoulder
    }

    pub fn elbow(&self) -> &JointCtrl {
        &self.elbow
    }

    /// Request both joints move to a named pose.
    ///
    /// How the pair is checked against the frame perimeter depends on the guard mode.
    pub fn request_pose(&mut self, pose: ArmPose) -> PoseRequestReport {
        let (shoulder_deg, elbow_deg) = self.params.poses.get(pose);

        let (shoulder, elbow) = match self.params.guard_mode {
            GuardMode::Sequential => self.request_sequential(shoulder_deg, elbow_deg),
            GuardMode::Atomic => self.request_atomic(shoulder_deg, elbow_deg),
        };

        self.record(JointId::Shoulder, &shoulder);
        self.record(JointId::Elbow, &elbow);

        if shoulder.is_accepted() && elbow.is_accepted() {
            info!("Arm moving to pose {}", pose);
        } else {
            warn!("Arm pose {} only partially accepted: {:?} {:?}", pose, shoulder, elbow);
        }

        PoseRequestReport {
            pose,
            shoulder,
            elbow,
        }
    }

    /// Nudge the setpoints by the given normalised rates.
    pub fn jog(&mut self, shoulder_rate: f64, elbow_rate: f64, dt_s: f64) {
        let scale = self.params.jog_rate_degs * dt_s;

        let shoulder_delta = shoulder_rate.max(-1.0).min(1.0) * scale;
        let elbow_delta = elbow_rate.max(-1.0).min(1.0) * scale;

        if shoulder_delta != 0.0 {
            let raw = self.shoulder.state().setpoint_deg + shoulder_delta;
            let elbow_current = self.elbow.state().measured_angle_deg;
            let r = self
                .shoulder
                .request_setpoint(raw, elbow_current, &self.params.geometry);
            self.record(JointId::Shoulder, &r);
        }

        if elbow_delta != 0.0 {
            let raw = self.elbow.state().setpoint_deg + elbow_delta;
            let shoulder_current = self.shoulder.state().measured_angle_deg;
            let r = self
                .elbow
                .request_setpoint(raw, shoulder_current, &self.params.geometry);
            self.record(JointId::Elbow, &r);
        }
    }

    /// Hold both joints at their measured angles.
    pub fn hold(&mut self) {
        self.shoulder.hold();
        self.elbow.hold();
    }

    /// Function called when entering or leaving safe mode.
    ///
    /// Must result in no motion of the arm, any manual jog is dropped.
    pub fn make_safe(&mut self) {
        self.current_cmd = None;
        self.hold();
    }

    /// True if both joints are within `tolerance_deg` of their setpoints.
    pub fn at_target(&self, tolerance_deg: f64) -> bool {
        self.shoulder.at_setpoint(tolerance_deg) && self.elbow.at_setpoint(tolerance_deg)
    }

    /// Each joint is checked on its own against the other joint's current angle.
    fn request_sequential(
        &mut self,
        shoulder_deg: f64,
        elbow_deg: f64,
    ) -> (SetpointResult, SetpointResult) {
        let shoulder_current = self.shoulder.state().measured_angle_deg;
        let elbow_current = self.elbow.state().measured_angle_deg;

        let shoulder =
            self.shoulder
                .request_setpoint(shoulder_deg, elbow_current, &self.params.geometry);
        let elbow = self
            .elbow
            .request_setpoint(elbow_deg, shoulder_current, &self.params.geometry);

        (shoulder, elbow)
    }

    /// The pair is checked as one candidate, both joints are committed or neither is.
    fn request_atomic(
        &mut self,
        shoulder_deg: f64,
        elbow_deg: f64,
    ) -> (SetpointResult, SetpointResult) {
        let (cand_s, clamped_s, cand_e, clamped_e) = match (
            self.shoulder.prepare_setpoint(shoulder_deg),
            self.elbow.prepare_setpoint(elbow_deg),
        ) {
            (Some((s, cs)), Some((e, ce))) => (s, cs, e, ce),
            _ => {
                warn!(
                    "Arm setpoint pair ({}, {}) rejected: not finite angles",
                    shoulder_deg, elbow_deg
                );
                return (
                    SetpointResult::Rejected {
                        candidate_deg: shoulder_deg,
                    },
                    SetpointResult::Rejected {
                        candidate_deg: elbow_deg,
                    },
                );
            }
        };

        let verdict = perimeter_guard::evaluate(
            &self.params.geometry,
            cand_s,
            cand_e,
            self.shoulder.state().measured_angle_deg,
            self.elbow.state().measured_angle_deg,
        );

        match verdict {
            GuardVerdict::Accept => {
                self.shoulder.commit_setpoint(cand_s);
                self.elbow.commit_setpoint(cand_e);
                (
                    SetpointResult::Accepted {
                        setpoint_deg: cand_s,
                        clamped: clamped_s,
                    },
                    SetpointResult::Accepted {
                        setpoint_deg: cand_e,
                        clamped: clamped_e,
                    },
                )
            }
            GuardVerdict::Reject => {
                warn!(
                    "Arm setpoint pair ({:.2}, {:.2}) rejected by the frame perimeter guard",
                    cand_s, cand_e
                );
                (
                    SetpointResult::Rejected {
                        candidate_deg: cand_s,
                    },
                    SetpointResult::Rejected {
                        candidate_deg: cand_e,
                    },
                )
            }
        }
    }

    /// Raise the status flags for a setpoint result.
    fn record(&mut self, id: JointId, result: &SetpointResult) {
        let (rejected, clamped) = match result {
            SetpointResult::Accepted { clamped, .. } => (false, *clamped),
            SetpointResult::Rejected { .. } => (true, false),
        };

        match id {
            JointId::Shoulder => {
                self.report.shoulder_rejected |= rejected;
                self.report.shoulder_clamped |= clamped;
            }
            JointId::Elbow => {
                self.report.elbow_rejected |= rejected;
                self.report.elbow_clamped |= clamped;
            }
        }
    }

    fn dems(shoulder: &JointOutput, elbow: &JointOutput) -> ArmDems {
        ArmDems {
            shoulder_voltage: shoulder.voltage,
            elbow_voltage: elbow.voltage,
        }
    }
}
