//! # Equipment Interface
//!
//! This module defines the sensor readings consumed by the motion core and the actuator demands
//! it produces. Readings are synchronous: they are sampled once at the start of a tick, and
//! demands are written once at the end of it.

pub mod arm;
pub mod chassis;
