//! # Telemetry
//!
//! A flat snapshot of the data store taken once per cycle, written to the session archive.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
use crate::{balance_ctrl::BalanceState, data_store::DataStore};
use util::{
    archive::{ArchiveError, Archived, Archiver},
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// One row of telemetry.
#[derive(Debug, Clone, Serialize)]
pub struct TmSample {
    pub time_s: f64,
    pub safe: bool,

    // Arm
    pub shoulder_angle_deg: f64,
    pub shoulder_setpoint_deg: f64,
    pub shoulder_profile_deg: f64,
    pub shoulder_voltage: f64,
    pub elbow_angle_deg: f64,
    pub elbow_setpoint_deg: f64,
    pub elbow_profile_deg: f64,
    pub elbow_voltage: f64,
    pub arm_at_target: bool,
    pub shoulder_rejected: bool,
    pub elbow_rejected: bool,
    pub shoulder_fault: bool,
    pub elbow_fault: bool,

    // Localisation
    pub pose_x_m: f64,
    pub pose_y_m: f64,
    pub pose_heading_rad: f64,
    pub vision_applied: u32,
    pub vision_stale: bool,
    pub imu_init_fault: bool,

    // Balance
    pub balance_state: BalanceState,
    pub pitch_rate_degs: f64,

    // Chassis
    pub left_voltage: f64,
    pub right_voltage: f64,
    pub brake: bool,
    pub commanded_vx_ms: f64,
    pub commanded_omega_rads: f64,
    pub chassis_sensor_fault: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TmSample {
    pub fn from_ds(ds: &DataStore) -> Self {
        let shoulder = ds.arm_ctrl.shoulder();
        let elbow = ds.arm_ctrl.elbow();

        Self {
            time_s: ds.time_s,
            safe: ds.safe,
            shoulder_angle_deg: shoulder.state().measured_angle_deg,
            shoulder_setpoint_deg: shoulder.state().setpoint_deg,
            shoulder_profile_deg: shoulder.profile_position(),
            shoulder_voltage: ds.arm_ctrl_output.shoulder_voltage,
            elbow_angle_deg: elbow.state().measured_angle_deg,
            elbow_setpoint_deg: elbow.state().setpoint_deg,
            elbow_profile_deg: elbow.profile_position(),
            elbow_voltage: ds.arm_ctrl_output.elbow_voltage,
            arm_at_target: ds.arm_ctrl_status_rpt.at_target,
            shoulder_rejected: ds.arm_ctrl_status_rpt.shoulder_rejected,
            elbow_rejected: ds.arm_ctrl_status_rpt.elbow_rejected,
            shoulder_fault: ds.arm_ctrl_status_rpt.shoulder_fault,
            elbow_fault: ds.arm_ctrl_status_rpt.elbow_fault,
            pose_x_m: ds.pose.position_m.x,
            pose_y_m: ds.pose.position_m.y,
            pose_heading_rad: ds.pose.heading_rad,
            vision_applied: ds.loc_status_rpt.vision_applied,
            vision_stale: ds.loc_status_rpt.vision_stale,
            imu_init_fault: ds.imu_init_fault,
            balance_state: ds.balance_ctrl.state(),
            pitch_rate_degs: ds.balance_status_rpt.pitch_rate_degs,
            left_voltage: ds.chassis_ctrl_output.left_voltage,
            right_voltage: ds.chassis_ctrl_output.right_voltage,
            brake: ds.chassis_ctrl_output.brake,
            commanded_vx_ms: ds.chassis_ctrl_status_rpt.commanded_vx_ms,
            commanded_omega_rads: ds.chassis_ctrl_status_rpt.commanded_omega_rads,
            chassis_sensor_fault: ds.chassis_ctrl_status_rpt.sensor_fault,
        }
    }
}

impl DataStore {
    /// Open the telemetry archive in the session's archive directory.
    pub fn init_archive(&mut self, session: &Session) -> Result<(), ArchiveError> {
        self.tm_archiver = Archiver::from_path(session, "tm.csv")?;
        Ok(())
    }
}

impl Archived for DataStore {
    fn write(&mut self) -> Result<(), ArchiveError> {
        let sample = TmSample::from_ds(self);
        self.tm_archiver.serialise(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_and_archive() {
        let mut ds = DataStore::default();

        let sample = TmSample::from_ds(&ds);
        assert_eq!(sample.balance_state, BalanceState::Inactive);
        assert!(!sample.safe);

        // No archive opened
        assert!(matches!(ds.write(), Err(ArchiveError::NotInit)));

        let path = std::env::temp_dir().join("motion_exec_tm_test.csv");
        ds.tm_archiver = Archiver::from_abs_path(&path).unwrap();
        ds.write().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert!(lines.next().unwrap().starts_with("time_s,safe,shoulder_angle_deg"));
        assert!(lines.next().unwrap().contains("Inactive"));
    }
}
