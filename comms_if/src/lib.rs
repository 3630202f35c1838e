//! # Communications interface crate.
//!
//! Provides all common interfaces between the motion core and its collaborators: the commands
//! the binding layer may issue, and the sensor/actuator data exchanged with the equipment.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod tc;

/// Sensor readings and actuator demands for equipment (joints, drive sides, IMU, vision)
pub mod eqpt;
