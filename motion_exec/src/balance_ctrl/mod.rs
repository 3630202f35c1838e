//! # Balance control module
//!
//! Levels the chassis on a tilting platform (the charge station) by driving towards whichever
//! side is low, then holds it with the brakes once level.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use params::Params;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during BalanceCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum BalanceCtrlError {
    #[error("Could not load the BalanceCtrl parameters: {0}")]
    ParamLoadError(util::params::LoadError),
}
