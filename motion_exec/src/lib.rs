//! # Motion library
//!
//! The control modules of the motion core, and the data store which composes them into one
//! control cycle. The `motion_exec` binary drives this library against the simulated plant.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

/// Arm control - guarded, profiled control of the shoulder and elbow joints
pub mod arm_ctrl;

/// Balance control - levels the chassis on the charge station
pub mod balance_ctrl;

/// Chassis control - converts drive demands into side voltages
pub mod chassis_ctrl;

/// Shared control primitives (motion profiles, PID)
pub mod ctrl;

/// Data store - owns the modules and runs the control cycle
pub mod data_store;

/// Localisation - the chassis pose estimate
pub mod loc;

/// Executable parameters
pub mod params;

/// Simulated plant for running without hardware
pub mod sim;

/// Telecommand processor - applies TCs to the data store
pub mod tc_processor;

/// Telemetry
pub mod tm;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target period of one cycle.
pub const CYCLE_PERIOD_S: f64 = 0.02;

/// Number of cycles per second
pub const CYCLE_FREQUENCY_HZ: f64 = 1.0 / CYCLE_PERIOD_S;
