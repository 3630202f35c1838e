//! # Telecommand processor module
//!
//! The telecommand processor handles TCs coming from any source, turning them into calls on the
//! data store.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, warn};

// Internal
use crate::data_store::{DataStore, SafeModeCause};
use comms_if::tc::Tc;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Execute a telecommand.
///
/// Mutates the datastore to send commands to different modules. In safe mode only the safe mode
/// TCs and balance cancellation are executed, anything else is dropped with a warning.
pub fn exec(ds: &mut DataStore, tc: &Tc) {
    if ds.safe {
        match tc {
            Tc::MakeSafe | Tc::MakeUnsafe | Tc::CancelBalance => (),
            _ => {
                warn!("Cannot execute {:?} in safe mode", tc);
                return;
            }
        }
    }

    // Handle different Tcs
    match tc {
        Tc::MakeSafe => {
            debug!("Recieved MakeSafe command");
            ds.make_safe(SafeModeCause::MakeSafeTc);
        }
        Tc::MakeUnsafe => {
            debug!("Recieved MakeUnsafe command");
            if ds.make_unsafe(SafeModeCause::MakeSafeTc).is_err() {
                warn!("MakeUnsafe rejected, safe mode cause is {:?}", ds.safe_cause);
            }
        }
        Tc::ArmCtrl(cmd) => ds.arm_ctrl_input.cmd = Some(*cmd),
        Tc::ChassisCtrl(cmd) => ds.chassis_ctrl_input.cmd = Some(*cmd),
        Tc::StartBalance => ds.start_balance(),
        Tc::CancelBalance => {
            ds.cancel_balance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use comms_if::tc::arm_ctrl::{ArmCmd, ArmPose};

    #[test]
    fn test_safe_mode_filter() {
        let mut ds = DataStore::default();

        exec(&mut ds, &Tc::MakeSafe);
        assert!(ds.safe);

        exec(&mut ds, &Tc::ArmCtrl(ArmCmd::Pose(ArmPose::High)));
        assert!(ds.arm_ctrl_input.cmd.is_none());

        exec(&mut ds, &Tc::StartBalance);
        assert!(!ds.balance_ctrl.is_active());

        exec(&mut ds, &Tc::MakeUnsafe);
        assert!(!ds.safe);

        exec(&mut ds, &Tc::ArmCtrl(ArmCmd::Pose(ArmPose::High)));
        assert_eq!(ds.arm_ctrl_input.cmd, Some(ArmCmd::Pose(ArmPose::High)));
    }

    #[test]
    fn test_balance_tcs() {
        let mut ds = DataStore::default();

        exec(&mut ds, &Tc::StartBalance);
        assert!(ds.balance_ctrl.is_active());

        exec(&mut ds, &Tc::CancelBalance);
        assert!(!ds.balance_ctrl.is_active());
    }
}
