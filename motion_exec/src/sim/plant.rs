//! Implementation of the simulated plant

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use nalgebra::Vector2;
use std::collections::VecDeque;

// Internal
use super::{Params, SimError};
use crate::{arm_ctrl::JointId, data_store::SensorInputs, loc::ChassisPose};
use comms_if::eqpt::{
    arm::{ArmDems, JointSens},
    chassis::{ChassisDems, ChassisSens, ImuSens, VisionPose},
};
use util::maths::{normalize_deg, sign, wrap_pi};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The simulated robot and its surroundings.
#[derive(Debug, Clone)]
pub struct SimPlant {
    params: Params,

    /// Units: seconds
    time_s: f64,

    shoulder: SimJoint,
    elbow: SimJoint,

    left: SimSide,
    right: SimSide,

    /// True pose of the chassis
    pose: ChassisPose,

    /// True pitch of the chassis, positive nose up
    ///
    /// Units: degrees
    pitch_deg: f64,

    /// Past true poses, used to produce delayed vision samples
    pose_history: VecDeque<(f64, ChassisPose)>,

    next_vision_s: f64,

    vision_outbox: Vec<VisionPose>,
}

#[derive(Debug, Clone)]
struct SimJoint {
    angle_deg: f64,
    velocity_degs: f64,
    connected: bool,
}

#[derive(Debug, Clone, Default)]
struct SimSide {
    distance_m: f64,
    velocity_ms: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for SimPlant {
    fn default() -> Self {
        Self::new(Params::default())
    }
}

impl SimPlant {
    pub fn new(params: Params) -> Self {
        let pose = ChassisPose::new(
            params.initial_pose[0],
            params.initial_pose[1],
            params.initial_pose[2],
        );

        Self {
            time_s: 0.0,
            shoulder: SimJoint::new(params.initial_shoulder_deg),
            elbow: SimJoint::new(params.initial_elbow_deg),
            left: SimSide::default(),
            right: SimSide::default(),
            pose,
            pitch_deg: 0.0,
            pose_history: vec![(0.0, pose)].into_iter().collect(),
            next_vision_s: params.vision_latency_s.max(0.0),
            vision_outbox: Vec::new(),
            params,
        }
    }

    /// Load the parameters from the given file in the params directory.
    pub fn from_params_file(path: &str) -> Result<Self, SimError> {
        let params = util::params::load(path).map_err(SimError::ParamLoadError)?;
        Ok(Self::new(params))
    }

    pub fn time_s(&self) -> f64 {
        self.time_s
    }

    pub fn true_pose(&self) -> &ChassisPose {
        &self.pose
    }

    pub fn true_pitch_deg(&self) -> f64 {
        self.pitch_deg
    }

    pub fn joint_angle_deg(&self, joint: JointId) -> f64 {
        match joint {
            JointId::Shoulder => self.shoulder.angle_deg,
            JointId::Elbow => self.elbow.angle_deg,
        }
    }

    /// Simulate a disconnected encoder, the joint reports no reading while disconnected.
    pub fn set_joint_connected(&mut self, joint: JointId, connected: bool) {
        match joint {
            JointId::Shoulder => self.shoulder.connected = connected,
            JointId::Elbow => self.elbow.connected = connected,
        }
    }

    pub fn set_imu_available(&mut self, available: bool) {
        self.params.imu_available = available;
    }

    pub fn imu_available(&self) -> bool {
        self.params.imu_available
    }

    /// The sensor readings for the current state.
    pub fn sens(&self) -> SensorInputs {
        SensorInputs {
            shoulder: self.shoulder.sens(),
            elbow: self.elbow.sens(),
            chassis: ChassisSens {
                left_distance_m: self.left.distance_m,
                right_distance_m: self.right.distance_m,
                left_velocity_ms: self.left.velocity_ms,
                right_velocity_ms: self.right.velocity_ms,
                imu: if self.params.imu_available {
                    Some(ImuSens {
                        pitch_deg: self.pitch_deg,
                        yaw_deg: self.pose.heading_rad.to_degrees(),
                    })
                } else {
                    None
                },
            },
        }
    }

    /// Vision samples produced since the last call.
    pub fn take_vision(&mut self) -> Vec<VisionPose> {
        std::mem::take(&mut self.vision_outbox)
    }

    /// Advance the plant by `dt_s` with the given demands applied.
    pub fn step(&mut self, arm_dems: &ArmDems, chassis_dems: &ChassisDems, dt_s: f64) {
        if !(dt_s > 0.0) {
            return;
        }

        self.time_s += dt_s;

        // Arm
        let joint_alpha = lag_alpha(dt_s, self.params.joint_time_const_s);
        let gain = self.params.joint_gain_degs_per_v;
        self.shoulder
            .step(gain * arm_dems.shoulder_voltage, joint_alpha, dt_s);
        self.elbow.step(gain * arm_dems.elbow_voltage, joint_alpha, dt_s);

        // Drive sides
        self.step_side(true, chassis_dems.left_voltage, chassis_dems.brake, dt_s);
        self.step_side(false, chassis_dems.right_voltage, chassis_dems.brake, dt_s);

        // Chassis pose, midpoint integration of the unicycle model
        let v = 0.5 * (self.left.velocity_ms + self.right.velocity_ms);
        let omega = (self.right.velocity_ms - self.left.velocity_ms) / self.params.track_width_m;
        let mid_heading = self.pose.heading_rad + 0.5 * omega * dt_s;
        self.pose.position_m += Vector2::new(mid_heading.cos(), mid_heading.sin()) * v * dt_s;
        self.pose.heading_rad = wrap_pi(self.pose.heading_rad + omega * dt_s);

        // Charge station
        let target_pitch_deg = self.station_pitch_deg(self.pose.position_m.x);
        self.pitch_deg += (target_pitch_deg - self.pitch_deg)
            * lag_alpha(dt_s, self.params.station_time_const_s);

        // History for vision
        self.pose_history.push_back((self.time_s, self.pose));
        let keep_from_s = self.time_s - self.params.vision_latency_s - 1.0;
        while let Some((t, _)) = self.pose_history.front() {
            if *t < keep_from_s {
                self.pose_history.pop_front();
            } else {
                break;
            }
        }

        self.produce_vision();
    }

    fn step_side(&mut self, left: bool, voltage: f64, brake: bool, dt_s: f64) {
        let target_ms = if voltage.abs() > self.params.wheel_ks {
            (voltage - self.params.wheel_ks * sign(voltage)) / self.params.wheel_kv
        } else {
            0.0
        };

        let tau = if brake && voltage == 0.0 {
            self.params.brake_time_const_s
        } else {
            self.params.wheel_time_const_s
        };
        let alpha = lag_alpha(dt_s, tau);

        let side = if left { &mut self.left } else { &mut self.right };
        side.velocity_ms += (target_ms - side.velocity_ms) * alpha;
        side.distance_m += side.velocity_ms * dt_s;
    }

    /// Steady state pitch of the chassis at the given field x position.
    fn station_pitch_deg(&self, x_m: f64) -> f64 {
        let p = &self.params;
        let end_m = p.station_start_m + p.station_length_m;

        if x_m < p.station_start_m || x_m > end_m || p.station_balance_band_m <= 0.0 {
            return 0.0;
        }

        // Nose up before the centre, the near edge is down
        let centre_m = p.station_start_m + 0.5 * p.station_length_m;
        let frac = ((centre_m - x_m) / p.station_balance_band_m).max(-1.0).min(1.0);

        p.station_max_pitch_deg * frac
    }

    fn produce_vision(&mut self) {
        if !self.params.vision_enabled || self.time_s < self.next_vision_s {
            return;
        }

        let capture_s = self.time_s - self.params.vision_latency_s;

        let captured = self
            .pose_history
            .iter()
            .rev()
            .find(|(t, _)| *t <= capture_s)
            .copied();

        if let Some((t, pose)) = captured {
            debug!("Sim vision sample captured at {:.3} s", t);

            self.vision_outbox.push(VisionPose {
                x_m: pose.position_m.x,
                y_m: pose.position_m.y,
                heading_rad: pose.heading_rad,
                timestamp_s: t,
                confidence: self.params.vision_confidence,
            });
        }

        while self.next_vision_s <= self.time_s {
            self.next_vision_s += self.params.vision_period_s.max(1e-3);
        }
    }
}

impl SimJoint {
    fn new(angle_deg: f64) -> Self {
        Self {
            angle_deg: normalize_deg(angle_deg),
            velocity_degs: 0.0,
            connected: true,
        }
    }

    fn step(&mut self, target_degs: f64, alpha: f64, dt_s: f64) {
        self.velocity_degs += (target_degs - self.velocity_degs) * alpha;
        self.angle_deg = normalize_deg(self.angle_deg + self.velocity_degs * dt_s);
    }

    fn sens(&self) -> Option<JointSens> {
        if self.connected {
            Some(JointSens {
                angle_deg: self.angle_deg,
                velocity_degs: self.velocity_degs,
            })
        } else {
            None
        }
    }
}

/// Fraction of the gap a first order lag closes in one step.
fn lag_alpha(dt_s: f64, time_const_s: f64) -> f64 {
    if time_const_s > 0.0 {
        (dt_s / time_const_s).min(1.0)
    } else {
        1.0
    }
}
