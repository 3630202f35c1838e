//! Implementations for the ChassisCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace, warn};
use serde::Serialize;

// Internal
use super::{desaturate, to_wheel_speeds, ChassisCtrlError, ChassisSpeeds, Params, WheelSpeeds};
use crate::ctrl::{ProfileConstraints, ProfileState, TrapezoidProfile};
use comms_if::{
    eqpt::chassis::{ChassisDems, ChassisSens},
    tc::chassis_ctrl::ChassisCmd,
};
use util::{maths::sign, module::State, params, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Chassis control module state
#[derive(Debug, Clone)]
pub struct ChassisCtrl {
    params: Params,

    mode: Mode,

    /// Speed demand after slew limiting
    commanded: ChassisSpeeds,

    /// Side speeds demanded on the previous cycle, used for the acceleration feedforward
    prev_wheels: WheelSpeeds,

    /// True while the wheel sensors are faulty, used to log the fault only once.
    sensor_fault: bool,

    report: StatusReport,
}

/// Input data to chassis control.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputData {
    /// The command to be executed, or `None` if there is no new command on this cycle.
    pub cmd: Option<ChassisCmd>,

    /// A speed demand which takes precedence over any command while present.
    pub speed_override: Option<SpeedOverride>,

    /// Wheel sensor data for this cycle.
    pub sens: ChassisSens,

    /// Period of this cycle.
    ///
    /// Units: seconds
    pub dt_s: f64,
}

/// A straight line speed demand from an autonomous behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SpeedOverride {
    /// Forward speed.
    ///
    /// Units: meters/second
    pub vx_ms: f64,

    /// Engage the brake idle mode.
    pub brake: bool,
}

/// Status report for ChassisCtrl processing.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct StatusReport {
    /// The wheel sensor data was invalid, output zeroed.
    pub sensor_fault: bool,

    /// The speed override was applied.
    pub overridden: bool,

    /// The driver demand was reduced by the acceleration limits.
    pub slew_limited: bool,

    /// Distance left on the current distance move, zero if there is none.
    ///
    /// Units: meters
    pub distance_remaining_m: f64,

    /// A distance move completed on this cycle.
    pub distance_complete: bool,

    /// Forward speed demand after limiting.
    ///
    /// Units: meters/second
    pub commanded_vx_ms: f64,

    /// Rotation rate demand after limiting.
    ///
    /// Units: radians/second
    pub commanded_omega_rads: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Current activity of the chassis.
#[derive(Debug, Clone)]
pub enum Mode {
    Stopped,

    /// Following a driver speed demand.
    Drive(ChassisSpeeds),

    /// Following a straight line profile, positions are travelled distance from the start.
    DriveDistance {
        start_m: f64,
        goal_m: f64,
        profile: TrapezoidProfile,
    },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for ChassisCtrl {
    fn default() -> Self {
        Self::new(Params::default())
    }
}

impl State for ChassisCtrl {
    type InitData = &'static str;
    type InitError = ChassisCtrlError;

    type InputData = InputData;
    type OutputData = ChassisDems;
    type StatusReport = StatusReport;
    type ProcError = ChassisCtrlError;

    /// Initialise the ChassisCtrl module.
    ///
    /// Expected init data is the path to the parameter file
    fn init(
        &mut self,
        init_data: Self::InitData,
        _session: &Session,
    ) -> Result<(), Self::InitError> {
        let params = params::load(init_data).map_err(ChassisCtrlError::ParamLoadError)?;
        *self = Self::new(params);

        Ok(())
    }

    /// Perform cyclic processing of chassis control.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        self.report = StatusReport::default();

        let sens_valid = Self::is_valid_sens(&input_data.sens);
        let brake = input_data
            .speed_override
            .map(|o| o.brake)
            .unwrap_or(false);

        if let Some(cmd) = input_data.cmd {
            debug!("New ChassisCtrl ChassisCmd::{:?}", cmd);
            self.apply_cmd(&cmd, &input_data.sens);
        }

        if !sens_valid {
            if self.sensor_fault {
                trace!("Chassis wheel sensor fault: {:?}", input_data.sens);
            } else {
                warn!("Chassis wheel sensor fault, output zeroed: {:?}", input_data.sens);
                self.sensor_fault = true;
            }

            self.commanded = ChassisSpeeds::default();
            self.prev_wheels = WheelSpeeds::default();
            self.report.sensor_fault = true;

            return Ok((
                ChassisDems {
                    left_voltage: 0.0,
                    right_voltage: 0.0,
                    brake,
                },
                self.report,
            ));
        }

        self.sensor_fault = false;

        let dt_s = input_data.dt_s;

        self.commanded = match input_data.speed_override {
            Some(o) => {
                self.report.overridden = true;
                ChassisSpeeds {
                    vx_ms: o.vx_ms,
                    omega_rads: 0.0,
                }
            }
            None => self.target_speeds(&input_data.sens, dt_s),
        };

        self.report.commanded_vx_ms = self.commanded.vx_ms;
        self.report.commanded_omega_rads = self.commanded.omega_rads;

        let wheels = desaturate(
            &to_wheel_speeds(&self.commanded, self.params.track_width_m),
            self.params.max_velocity_ms,
        );

        let left_voltage = self.side_voltage(
            wheels.left_ms,
            self.prev_wheels.left_ms,
            input_data.sens.left_velocity_ms,
            dt_s,
        );
        let right_voltage = self.side_voltage(
            wheels.right_ms,
            self.prev_wheels.right_ms,
            input_data.sens.right_velocity_ms,
            dt_s,
        );

        self.prev_wheels = wheels;

        Ok((
            ChassisDems {
                left_voltage,
                right_voltage,
                brake,
            },
            self.report,
        ))
    }
}

impl ChassisCtrl {
    pub fn new(params: Params) -> Self {
        Self {
            params,
            mode: Mode::Stopped,
            commanded: ChassisSpeeds::default(),
            prev_wheels: WheelSpeeds::default(),
            sensor_fault: false,
            report: StatusReport::default(),
        }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    /// Stop the chassis immediately, dropping any slew state.
    pub fn stop(&mut self) {
        self.mode = Mode::Stopped;
        self.commanded = ChassisSpeeds::default();
        self.prev_wheels = WheelSpeeds::default();
    }

    /// Function called when entering safe mode.
    ///
    /// Must result in no motion of the vehicle
    pub fn make_safe(&mut self) {
        self.stop();
    }

    /// Scale normalised driver inputs into chassis speeds.
    ///
    /// A differential chassis cannot strafe so `strafe` is ignored.
    pub fn driver_speeds(&self, forward: f64, rotation: f64, slow: bool) -> ChassisSpeeds {
        let (v_max, w_max) = if slow {
            (self.params.slow_velocity_ms, self.params.slow_angular_velocity_rads)
        } else {
            (self.params.max_velocity_ms, self.params.max_angular_velocity_rads)
        };

        let clamp_unit = |x: f64| if x.is_finite() { x.max(-1.0).min(1.0) } else { 0.0 };

        ChassisSpeeds {
            vx_ms: clamp_unit(forward) * v_max,
            omega_rads: clamp_unit(rotation) * w_max,
        }
    }

    /// Begin a straight line move of `distance_m` from the current wheel distances.
    pub fn start_distance(
        &mut self,
        distance_m: f64,
        sens: &ChassisSens,
    ) -> Result<(), ChassisCtrlError> {
        if !Self::is_valid_sens(sens) || !distance_m.is_finite() {
            return Err(ChassisCtrlError::NoOdometry);
        }

        let constraints = ProfileConstraints {
            max_velocity: self.params.distance_velocity_ms,
            max_acceleration: self.params.distance_acceleration_mss,
        };

        info!("Chassis driving {:.3} m", distance_m);

        self.mode = Mode::DriveDistance {
            start_m: Self::mean_distance(sens),
            goal_m: distance_m,
            profile: TrapezoidProfile::new(
                constraints,
                ProfileState {
                    position: 0.0,
                    velocity: 0.0,
                },
            ),
        };

        Ok(())
    }

    fn apply_cmd(&mut self, cmd: &ChassisCmd, sens: &ChassisSens) {
        match *cmd {
            ChassisCmd::Drive {
                forward,
                strafe,
                rotation,
                slow,
            } => {
                if strafe != 0.0 {
                    trace!("Strafe demand {} ignored by the differential chassis", strafe);
                }
                self.mode = Mode::Drive(self.driver_speeds(forward, rotation, slow));
            }
            ChassisCmd::DriveDistance { distance_m } => {
                if let Err(e) = self.start_distance(distance_m, sens) {
                    warn!("Distance move of {} m refused: {}", distance_m, e);
                    self.stop();
                }
            }
            ChassisCmd::Stop => self.stop(),
        }
    }

    /// Speed demand from the current mode.
    fn target_speeds(&mut self, sens: &ChassisSens, dt_s: f64) -> ChassisSpeeds {
        let mut complete = false;

        let target = match self.mode {
            Mode::Stopped => self.slew(ChassisSpeeds::default(), dt_s),
            Mode::Drive(demand) => self.slew(demand, dt_s),
            Mode::DriveDistance {
                start_m,
                goal_m,
                ref mut profile,
            } => {
                let state = profile.calculate(goal_m, dt_s);
                let travelled = Self::mean_distance(sens) - start_m;

                self.report.distance_remaining_m = goal_m - travelled;
                complete = profile.is_finished(goal_m);

                ChassisSpeeds {
                    vx_ms: state.velocity,
                    omega_rads: 0.0,
                }
            }
        };

        if complete {
            info!("Chassis distance move complete");
            self.report.distance_complete = true;
            self.mode = Mode::Stopped;
        }

        target
    }

    /// Move the commanded speeds toward the demand within the acceleration limits.
    fn slew(&mut self, demand: ChassisSpeeds, dt_s: f64) -> ChassisSpeeds {
        let dv_max = self.params.max_acceleration_mss * dt_s.max(0.0);
        let dw_max = self.params.max_angular_acceleration_radss * dt_s.max(0.0);

        let dv = demand.vx_ms - self.commanded.vx_ms;
        let dw = demand.omega_rads - self.commanded.omega_rads;

        if dv.abs() > dv_max || dw.abs() > dw_max {
            self.report.slew_limited = true;
        }

        ChassisSpeeds {
            vx_ms: self.commanded.vx_ms + dv.max(-dv_max).min(dv_max),
            omega_rads: self.commanded.omega_rads + dw.max(-dw_max).min(dw_max),
        }
    }

    /// Feedforward plus proportional feedback voltage for one side.
    fn side_voltage(&self, speed_ms: f64, prev_speed_ms: f64, measured_ms: f64, dt_s: f64) -> f64 {
        let accel = if dt_s > 0.0 {
            (speed_ms - prev_speed_ms) / dt_s
        } else {
            0.0
        };

        let v = self.params.ks * sign(speed_ms)
            + self.params.kv * speed_ms
            + self.params.ka * accel
            + self.params.k_p * (speed_ms - measured_ms);

        v.max(-self.params.max_voltage).min(self.params.max_voltage)
    }

    fn mean_distance(sens: &ChassisSens) -> f64 {
        0.5 * (sens.left_distance_m + sens.right_distance_m)
    }

    fn is_valid_sens(sens: &ChassisSens) -> bool {
        sens.left_distance_m.is_finite()
            && sens.right_distance_m.is_finite()
            && sens.left_velocity_ms.is_finite()
            && sens.right_velocity_ms.is_finite()
    }
}
