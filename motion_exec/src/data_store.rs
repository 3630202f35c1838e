//! # Data Store
//!
//! The data store owns one instance of each control module and the data passed between them, and
//! runs them in order once per control cycle. It is the only way external callers (the
//! telecommand processor, the executable) act on the controllers.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{error, info, warn};

// Internal
use crate::{
    arm_ctrl::{self, ArmCtrl},
    balance_ctrl::{self, BalanceCtrl, BalanceOutput},
    chassis_ctrl::{self, ChassisCtrl, SpeedOverride},
    loc::{self, ChassisPose, PoseEstimator},
};
use comms_if::{
    eqpt::{
        arm::{ArmDems, JointSens},
        chassis::{ChassisDems, ChassisSens, VisionPose},
    },
    tc::{
        arm_ctrl::{ArmCmd, ArmPose},
        chassis_ctrl::ChassisCmd,
    },
};
use util::{archive::Archiver, module::State};

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// Gives the reason the robot has been put into safe mode
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum SafeModeCause {
    MakeSafeTc,
    ModuleError,
    CycleOverrun,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// All sensor readings for one cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct SensorInputs {
    /// `None` if the shoulder encoder could not be read
    pub shoulder: Option<JointSens>,

    /// `None` if the elbow encoder could not be read
    pub elbow: Option<JointSens>,

    pub chassis: ChassisSens,
}

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// Control time, the sum of the cycle periods so far
    ///
    /// Units: seconds
    pub time_s: f64,

    // Safe mode variables
    /// Determines if the robot is in safe mode.
    pub safe: bool,

    /// Gives the reason for the robot being in safe mode.
    pub safe_cause: Option<SafeModeCause>,

    /// The inertial sensor was unavailable at startup. Its readings are ignored for the rest of
    /// the session.
    pub imu_init_fault: bool,

    // ArmCtrl
    pub arm_ctrl: ArmCtrl,
    pub arm_ctrl_input: arm_ctrl::InputData,
    pub arm_ctrl_output: ArmDems,
    pub arm_ctrl_status_rpt: arm_ctrl::StatusReport,

    // Localisation
    pub pose_estimator: PoseEstimator,
    pub pose: ChassisPose,
    pub loc_status_rpt: loc::StatusReport,

    // BalanceCtrl
    pub balance_ctrl: BalanceCtrl,
    pub balance_output: BalanceOutput,
    pub balance_status_rpt: balance_ctrl::StatusReport,

    // ChassisCtrl
    pub chassis_ctrl: ChassisCtrl,
    pub chassis_ctrl_input: chassis_ctrl::InputData,
    pub chassis_ctrl_output: ChassisDems,
    pub chassis_ctrl_status_rpt: chassis_ctrl::StatusReport,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,

    // Archiving
    pub(crate) tm_archiver: Archiver,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Request the arm move to a named pose on the next cycle.
    pub fn request_arm_pose(&mut self, pose: ArmPose) {
        self.arm_ctrl_input.cmd = Some(ArmCmd::Pose(pose));
    }

    /// Set the driver's chassis demand. Inputs are normalised to `[-1, 1]`.
    pub fn request_chassis_drive(&mut self, forward: f64, strafe: f64, rotation: f64, slow: bool) {
        self.chassis_ctrl_input.cmd = Some(ChassisCmd::Drive {
            forward,
            strafe,
            rotation,
            slow,
        });
    }

    /// Start the charge station balance behaviour.
    pub fn start_balance(&mut self) {
        if self.imu_init_fault {
            warn!("Balance started without an inertial sensor, the chassis will not move");
        }

        self.chassis_ctrl.stop();
        self.balance_ctrl.start();
    }

    /// Cancel the balance behaviour.
    ///
    /// The chassis demand is zeroed (without the brake) before this returns.
    pub fn cancel_balance(&mut self) -> ChassisDems {
        self.balance_output = self.balance_ctrl.cancel();
        self.chassis_ctrl.stop();

        self.chassis_ctrl_output = ChassisDems {
            left_voltage: 0.0,
            right_voltage: 0.0,
            brake: false,
        };

        self.chassis_ctrl_output
    }

    /// Queue a vision pose sample for the estimator.
    pub fn add_vision_measurement(&mut self, sample: VisionPose) {
        self.pose_estimator.add_vision_measurement(sample);
    }

    /// Record that the inertial sensor could not be initialised.
    ///
    /// The fault is permanent for the session, and reported only once.
    pub fn report_imu_init_fault(&mut self) {
        if !self.imu_init_fault {
            error!("Inertial sensor unavailable at startup, heading from odometry only and balancing disabled");
            self.imu_init_fault = true;
        }
    }

    /// Puts the robot into safe mode with the given cause.
    pub fn make_safe(&mut self, cause: SafeModeCause) {
        if !self.safe {
            warn!("Make safe requested, cause: {:?}", cause);
            self.safe = true;
            self.safe_cause = Some(cause);

            self.arm_ctrl.make_safe();
            self.chassis_ctrl.make_safe();
            if self.balance_ctrl.is_active() {
                self.balance_output = self.balance_ctrl.cancel();
            }
        }
    }

    /// Attempts to disable the safe mode by clearing the given cause.
    ///
    /// Returns `Ok(())` if this cause was cleared and safe mode was disabled, or `Err(())`
    /// otherwise. To remove safe mode the provided cause must match the initial reason for safe
    /// mode being enabled.
    ///
    /// If safe mode was not enabled `Ok(())` is returned
    pub fn make_unsafe(&mut self, cause: SafeModeCause) -> Result<(), ()> {
        if !self.safe {
            return Ok(());
        }

        match self.safe_cause {
            Some(root_cause) if root_cause != cause => Err(()),
            _ => {
                self.safe = false;
                self.safe_cause = None;

                // Hold wherever the arm ended up while safe
                self.arm_ctrl.make_safe();

                info!("Make unsafe requested, root cause match, safe mode disabled");
                Ok(())
            }
        }
    }

    /// Run one control cycle.
    ///
    /// Order: arm, pose estimation, balance, chassis. In safe mode the modules still run so that
    /// they track the measurements, but all commands are dropped and all outputs are zero.
    pub fn cycle(&mut self, sens: &SensorInputs, dt_s: f64) {
        if self.num_cycles == 0 && sens.chassis.imu.is_none() {
            self.report_imu_init_fault();
        }

        self.num_cycles += 1;
        self.time_s += dt_s;

        // Commands are dropped in safe mode
        let safe = self.safe;
        let arm_cmd = self.arm_ctrl_input.cmd.take().filter(|_| !safe);
        let chassis_cmd = self.chassis_ctrl_input.cmd.take().filter(|_| !safe);

        // ---- ARM ----

        self.arm_ctrl_input = arm_ctrl::InputData {
            cmd: arm_cmd,
            shoulder: sens.shoulder,
            elbow: sens.elbow,
            dt_s,
        };

        match self.arm_ctrl.proc(&self.arm_ctrl_input) {
            Ok((output, report)) => {
                self.arm_ctrl_output = output;
                self.arm_ctrl_status_rpt = report;
            }
            Err(e) => {
                warn!("ArmCtrl processing error: {}", e);
                self.arm_ctrl_output = ArmDems::default();
                self.make_safe(SafeModeCause::ModuleError);
            }
        }
        self.arm_ctrl_input.cmd = None;

        // ---- LOCALISATION ----

        let mut chassis_sens = sens.chassis;
        if self.imu_init_fault {
            chassis_sens.imu = None;
        }

        let loc_input = loc::InputData {
            time_s: self.time_s,
            sens: chassis_sens,
        };
        match self.pose_estimator.proc(&loc_input) {
            Ok((pose, report)) => {
                self.pose = pose;
                self.loc_status_rpt = report;
            }
            Err(e) => warn!("Pose estimation error: {}", e),
        }

        // ---- BALANCE ----

        let mut speed_override = None;
        self.balance_status_rpt = balance_ctrl::StatusReport::default();

        if self.balance_ctrl.is_active() {
            let balance_input = balance_ctrl::InputData {
                pitch_deg: chassis_sens.imu.map(|i| i.pitch_deg),
                dt_s,
            };

            match self.balance_ctrl.proc(&balance_input) {
                Ok((output, report)) => {
                    self.balance_output = output;
                    self.balance_status_rpt = report;
                    speed_override = Some(SpeedOverride {
                        vx_ms: output.speed_ms,
                        brake: output.brake,
                    });
                }
                Err(e) => {
                    warn!("BalanceCtrl processing error: {}", e);
                    self.balance_output = self.balance_ctrl.cancel();
                    speed_override = Some(SpeedOverride::default());
                }
            }
        } else {
            self.balance_output = BalanceOutput::default();
        }

        // ---- CHASSIS ----

        self.chassis_ctrl_input = chassis_ctrl::InputData {
            cmd: chassis_cmd,
            speed_override,
            sens: chassis_sens,
            dt_s,
        };

        match self.chassis_ctrl.proc(&self.chassis_ctrl_input) {
            Ok((output, report)) => {
                self.chassis_ctrl_output = output;
                self.chassis_ctrl_status_rpt = report;
            }
            Err(e) => {
                warn!("ChassisCtrl processing error: {}", e);
                self.chassis_ctrl_output = ChassisDems::default();
                self.make_safe(SafeModeCause::ModuleError);
            }
        }
        self.chassis_ctrl_input.cmd = None;

        if self.safe {
            self.arm_ctrl_output = ArmDems::default();
            self.chassis_ctrl_output = ChassisDems::default();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{arm_ctrl::JointId, balance_ctrl::BalanceState, sim::SimPlant, CYCLE_PERIOD_S};

    fn run(ds: &mut DataStore, sim: &mut SimPlant, cycles: usize) {
        for _ in 0..cycles {
            for v in sim.take_vision() {
                ds.add_vision_measurement(v);
            }
            ds.cycle(&sim.sens(), CYCLE_PERIOD_S);
            sim.step(&ds.arm_ctrl_output, &ds.chassis_ctrl_output, CYCLE_PERIOD_S);
        }
    }

    /// Drive slowly forward until the chassis is pitched up on the charge station ramp.
    fn drive_onto_ramp(ds: &mut DataStore, sim: &mut SimPlant) {
        ds.request_chassis_drive(0.3, 0.0, 0.0, true);

        let mut cycles = 0;
        while sim.true_pitch_deg() < 10.0 && cycles < 2000 {
            run(ds, sim, 1);
            cycles += 1;
        }
        assert!(sim.true_pitch_deg() >= 10.0);
    }

    #[test]
    fn test_arm_pose_round_trip() {
        let mut ds = DataStore::default();
        let mut sim = SimPlant::default();

        ds.request_arm_pose(ArmPose::Mid);
        run(&mut ds, &mut sim, 1);
        assert!(!ds.arm_ctrl_status_rpt.shoulder_rejected);
        assert!(!ds.arm_ctrl_status_rpt.elbow_rejected);
        run(&mut ds, &mut sim, 200);

        let mid = ds.arm_ctrl.params().poses.get(ArmPose::Mid);
        assert!((sim.joint_angle_deg(JointId::Shoulder) - mid.0).abs() < 2.0);
        assert!((sim.joint_angle_deg(JointId::Elbow) - mid.1).abs() < 2.0);
        assert!(ds.arm_ctrl_status_rpt.at_target);

        ds.request_arm_pose(ArmPose::Stow);
        run(&mut ds, &mut sim, 200);

        let stow = ds.arm_ctrl.params().poses.get(ArmPose::Stow);
        assert_eq!(ds.arm_ctrl.shoulder().state().setpoint_deg, stow.0);
        assert_eq!(ds.arm_ctrl.elbow().state().setpoint_deg, stow.1);
        assert!((sim.joint_angle_deg(JointId::Shoulder) - stow.0).abs() < 2.0);
        assert!((sim.joint_angle_deg(JointId::Elbow) - stow.1).abs() < 2.0);
    }

    #[test]
    fn test_safe_mode_zeroes_outputs() {
        let mut ds = DataStore::default();
        let mut sim = SimPlant::default();

        ds.request_chassis_drive(1.0, 0.0, 0.0, false);
        run(&mut ds, &mut sim, 10);
        assert!(ds.chassis_ctrl_output.left_voltage > 0.0);

        ds.make_safe(SafeModeCause::MakeSafeTc);
        let stow = ds.arm_ctrl.params().poses.get(ArmPose::Stow);
        ds.request_arm_pose(ArmPose::High);
        run(&mut ds, &mut sim, 1);

        assert_eq!(ds.chassis_ctrl_output, ChassisDems::default());
        assert_eq!(ds.arm_ctrl_output, ArmDems::default());
        assert!((ds.arm_ctrl.shoulder().state().setpoint_deg - stow.0).abs() < 1.0);

        assert!(ds.make_unsafe(SafeModeCause::ModuleError).is_err());
        assert!(ds.make_unsafe(SafeModeCause::MakeSafeTc).is_ok());
        assert!(!ds.safe);
    }

    #[test]
    fn test_cancel_balance_is_immediate() {
        let mut ds = DataStore::default();
        let mut sim = SimPlant::default();

        drive_onto_ramp(&mut ds, &mut sim);
        ds.start_balance();
        run(&mut ds, &mut sim, 1);
        assert!(ds.balance_ctrl.is_active());
        assert!(ds.chassis_ctrl_output.left_voltage > 0.0);

        let dems = ds.cancel_balance();
        assert_eq!(dems, ChassisDems::default());
        assert_eq!(ds.chassis_ctrl_output, ChassisDems::default());
        assert!(!ds.balance_ctrl.is_active());
    }

    #[test]
    fn test_balance_on_station() {
        let mut ds = DataStore::default();
        let mut sim = SimPlant::default();
        let station = crate::sim::Params::default();

        drive_onto_ramp(&mut ds, &mut sim);
        ds.start_balance();
        run(&mut ds, &mut sim, 750);

        assert!(matches!(
            ds.balance_ctrl.state(),
            BalanceState::Correcting | BalanceState::Settled
        ));

        let x = sim.true_pose().position_m.x;
        assert!(x > station.station_start_m);
        assert!(x < station.station_start_m + station.station_length_m);

        // The estimate follows the truth with vision available
        assert!((ds.pose.position_m.x - x).abs() < 0.05);
    }

    #[test]
    fn test_balance_on_level_ground_brakes() {
        let mut ds = DataStore::default();
        let mut sim = SimPlant::default();

        ds.start_balance();
        run(&mut ds, &mut sim, 1);

        assert_eq!(ds.balance_ctrl.state(), BalanceState::Settled);
        assert!(ds.balance_output.brake);
        assert!(ds.chassis_ctrl_output.brake);
    }

    #[test]
    fn test_imu_init_fault_latches() {
        let mut ds = DataStore::default();
        let mut sim = SimPlant::default();
        sim.set_imu_available(false);

        run(&mut ds, &mut sim, 1);
        assert!(ds.imu_init_fault);

        // The sensor coming back later is not trusted
        sim.set_imu_available(true);
        run(&mut ds, &mut sim, 5);
        assert!(ds.imu_init_fault);
        assert!(!ds.loc_status_rpt.imu_heading);
    }

    #[test]
    fn test_joint_sensor_fault() {
        let mut ds = DataStore::default();
        let mut sim = SimPlant::default();

        sim.set_joint_connected(JointId::Shoulder, false);
        run(&mut ds, &mut sim, 3);

        assert!(ds.arm_ctrl_status_rpt.shoulder_fault);
        assert_eq!(ds.arm_ctrl_output.shoulder_voltage, 0.0);
        assert!(!ds.safe);
    }
}
