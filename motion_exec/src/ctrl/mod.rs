//! Shared closed-loop control primitives
//!
//! The joint controllers and the chassis controller are built from the same two pieces: a
//! trapezoidal motion profile which bounds how quickly a target may be approached, and a PID
//! controller which corrects the error between the profiled target and the measurement.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod pid;
mod profile;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use pid::*;
pub use profile::*;
